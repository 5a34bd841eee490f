//! GameSession - the explicit context for a two-player adventure.
//!
//! All game state lives here: the roster, the single session dice roller,
//! the turn counter and the rules configuration. Nothing is global, so
//! two sessions never share state.

use crate::character::Character;
use crate::dice::DiceRoller;
use crate::error::RulesError;
use crate::inventory::{self, add_item, InventoryOutcome, DEFAULT_ATTUNEMENT_LIMIT};
use crate::narration::{CharacterSnapshot, Narration, Narrator, NarratorError, TurnContext};
use crate::orchestrator::{
    self, generate_scene_loot, suggest_actions, ActionRequest, ActionResult,
    KeywordSceneClassifier, RollConsequences, SceneClassifier, SceneType,
};
use crate::progression::{self, RestKind, MAX_LEVEL, TURNS_PER_LEVEL};
use crate::spells::{SpellAttackAc, SpellcastingRules};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Players per session.
pub const MAX_PLAYERS: usize = 2;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("The party is full (2 players)")]
    RosterFull,

    #[error("A character named {0} is already in the party")]
    DuplicateName(String),

    #[error("No character named {0}")]
    CharacterNotFound(String),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Narrator error: {0}")]
    Narrator(#[from] NarratorError),
}

/// Configuration for creating a new game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Fixes the dice for reproducible sessions.
    pub seed: Option<u64>,

    /// Level cap for auto leveling.
    pub max_level: u8,

    /// Completed turns per level gained.
    pub turns_per_level: u32,

    /// Maximum attuned items per character.
    pub attunement_limit: usize,

    /// Armor class spell attack rolls are compared against.
    pub spell_attack_ac: SpellAttackAc,

    /// Whether casting spends spell slots.
    pub enforce_spell_slots: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_level: MAX_LEVEL,
            turns_per_level: TURNS_PER_LEVEL,
            attunement_limit: DEFAULT_ATTUNEMENT_LIMIT,
            spell_attack_ac: SpellAttackAc::default(),
            enforce_spell_slots: true,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_level(mut self, max_level: u8) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_turns_per_level(mut self, turns: u32) -> Self {
        self.turns_per_level = turns;
        self
    }

    pub fn with_attunement_limit(mut self, limit: usize) -> Self {
        self.attunement_limit = limit;
        self
    }

    pub fn with_spell_attack_ac(mut self, ac: SpellAttackAc) -> Self {
        self.spell_attack_ac = ac;
        self
    }

    pub fn with_spell_slots_enforced(mut self, enforce: bool) -> Self {
        self.enforce_spell_slots = enforce;
        self
    }

    pub fn casting_rules(&self) -> SpellcastingRules {
        SpellcastingRules {
            attack_ac: self.spell_attack_ac,
            enforce_slots: self.enforce_spell_slots,
        }
    }
}

/// Everything that happened in one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub turn: u32,
    pub actor: String,
    pub description: String,
    pub roll: u32,
    pub scene: SceneType,
    pub action: Option<ActionResult>,
    pub consequences: RollConsequences,
    pub loot: Vec<String>,
    pub progression: Vec<String>,
    pub suggestions: Vec<String>,
}

/// A D&D game session.
pub struct GameSession {
    config: SessionConfig,
    dice: DiceRoller,
    roster: Vec<Character>,
    turn: u32,
    classifier: Box<dyn SceneClassifier>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        let dice = match config.seed {
            Some(seed) => DiceRoller::seeded(seed),
            None => DiceRoller::from_entropy(),
        };
        Self {
            config,
            dice,
            roster: Vec::new(),
            turn: 0,
            classifier: Box::new(KeywordSceneClassifier),
        }
    }

    /// Replace the keyword scene classifier.
    pub fn with_classifier(mut self, classifier: impl SceneClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Completed turns.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn dice_mut(&mut self) -> &mut DiceRoller {
        &mut self.dice
    }

    pub fn characters(&self) -> &[Character] {
        &self.roster
    }

    pub fn character(&self, name: &str) -> Option<&Character> {
        self.roster.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn character_mut(&mut self, name: &str) -> Option<&mut Character> {
        self.roster
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn add_character(&mut self, character: Character) -> Result<(), SessionError> {
        if self.roster.len() >= MAX_PLAYERS {
            return Err(SessionError::RosterFull);
        }
        if self.character(&character.name).is_some() {
            return Err(SessionError::DuplicateName(character.name));
        }
        info!(character = %character.name, class = character.class.name(), "Joined the party");
        self.roster.push(character);
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize, SessionError> {
        self.roster
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SessionError::CharacterNotFound(name.to_string()))
    }

    /// Resolve a narrator-proposed action for `actor`.
    ///
    /// Rules failures come back as an unsuccessful [`ActionResult`]; only
    /// an unknown actor is an error.
    pub fn resolve_action(
        &mut self,
        actor: &str,
        request: &ActionRequest,
    ) -> Result<ActionResult, SessionError> {
        let actor = self.index_of(actor)?;
        let action = match request.to_action() {
            Ok(action) => action,
            Err(err) => return Ok(err.into()),
        };
        let target = match request.target.as_deref() {
            Some(name) => match self.index_of(name) {
                Ok(index) => Some(index),
                Err(_) => {
                    return Ok(RulesError::invalid_target(format!("No character named {name}")).into())
                }
            },
            None => None,
        };

        let rules = self.config.casting_rules();
        let (actor, target) = actor_and_target(&mut self.roster, actor, target);
        Ok(orchestrator::resolve_action(
            actor,
            &action,
            target,
            &rules,
            &mut self.dice,
        ))
    }

    /// Play one turn: the optional action, the roll consequences, scene loot
    /// and the party's auto level-up.
    pub fn play_turn(
        &mut self,
        actor: &str,
        description: &str,
        roll: u32,
        request: Option<&ActionRequest>,
    ) -> Result<TurnReport, SessionError> {
        let index = self.index_of(actor)?;
        let action = match request {
            Some(request) => Some(self.resolve_action(actor, request)?),
            None => None,
        };

        let scene = self.classifier.classify(description);
        let character = &mut self.roster[index];
        let consequences =
            orchestrator::apply_roll_consequences(character, description, roll, &mut self.dice);

        let found = generate_scene_loot(character.level, scene, &mut self.dice);
        let mut loot = Vec::new();
        for (item, message) in found.items.into_iter().zip(found.messages) {
            let name = item.name.clone();
            match add_item(character, item) {
                Ok(_) => loot.push(message),
                Err(err) => {
                    warn!(character = %character.name, item = %name, error = %err, "Left loot behind");
                    loot.push(format!("Left {name} behind: too heavy to carry"));
                }
            }
        }

        self.turn += 1;
        let mut progression = Vec::new();
        for member in &mut self.roster {
            let messages = progression::auto_level_up(
                member,
                self.turn,
                self.config.turns_per_level,
                self.config.max_level,
                &mut self.dice,
            );
            progression.extend(messages.into_iter().map(|m| format!("{}: {m}", member.name)));
        }

        let character = &self.roster[index];
        let suggestions = suggest_actions(character, scene);
        debug!(turn = self.turn, actor = %character.name, roll, scene = %scene, "Turn complete");

        Ok(TurnReport {
            turn: self.turn,
            actor: character.name.clone(),
            description: description.to_string(),
            roll,
            scene,
            action,
            consequences,
            loot,
            progression,
            suggestions,
        })
    }

    pub fn rest(&mut self, name: &str, kind: RestKind) -> Result<Vec<String>, SessionError> {
        let index = self.index_of(name)?;
        Ok(progression::perform_rest(
            &mut self.roster[index],
            kind,
            &mut self.dice,
        ))
    }

    /// Equip an item under the session's attunement limit.
    pub fn equip(&mut self, name: &str, item_id: &str) -> Result<InventoryOutcome, SessionError> {
        let limit = self.config.attunement_limit;
        let index = self.index_of(name)?;
        Ok(inventory::equip_item(&mut self.roster[index], item_id, limit)?)
    }

    /// Structured context for narrating `report`.
    pub fn turn_context(&self, report: &TurnReport) -> TurnContext {
        TurnContext {
            turn: report.turn,
            scene: report.scene,
            actor: report.actor.clone(),
            action_description: report.description.clone(),
            roll: report.roll,
            success: report.consequences.success,
            action: report.action.clone(),
            consequences: report.consequences.consequences.clone(),
            rewards: report.consequences.rewards.clone(),
            loot: report.loot.clone(),
            progression: report.progression.clone(),
            roster: self.roster.iter().map(CharacterSnapshot::from).collect(),
            suggestions: report.suggestions.clone(),
        }
    }

    /// Hand a resolved turn to `narrator`. Game state is already final; a
    /// narrator failure is returned as is.
    pub async fn narrate(
        &self,
        narrator: &dyn Narrator,
        report: &TurnReport,
    ) -> Result<Narration, SessionError> {
        let context = self.turn_context(report);
        match narrator.narrate(&context).await {
            Ok(narration) => Ok(narration),
            Err(err) => {
                warn!(narrator = narrator.name(), turn = report.turn, error = %err, "Narration failed");
                Err(err.into())
            }
        }
    }
}

/// Borrow the actor and, when it is someone else, the target.
fn actor_and_target(
    roster: &mut [Character],
    actor: usize,
    target: Option<usize>,
) -> (&mut Character, Option<&mut Character>) {
    match target {
        Some(target) if target != actor => {
            let (low, high) = roster.split_at_mut(actor.max(target));
            if actor < target {
                (&mut low[actor], Some(&mut high[0]))
            } else {
                (&mut high[0], Some(&mut low[target]))
            }
        }
        _ => (&mut roster[actor], None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, RaceType};

    fn session() -> GameSession {
        let mut session = GameSession::new(SessionConfig::new().with_seed(7));
        session
            .add_character(Character::new("Aria", RaceType::Human, CharacterClass::Fighter, "Neutral"))
            .unwrap();
        session
            .add_character(Character::new("Elara", RaceType::Elf, CharacterClass::Wizard, "Neutral Good"))
            .unwrap();
        session
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = SessionConfig::from_json(r#"{"seed": 3, "spellAttackAc": "defender"}"#).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.spell_attack_ac, SpellAttackAc::Defender);
        assert_eq!(config.max_level, 10);
        assert_eq!(config.turns_per_level, 5);
        assert_eq!(config.attunement_limit, 3);
        assert!(config.casting_rules().enforce_slots);

        assert!(SessionConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_roster_limits() {
        let mut s = session();
        let err = s
            .add_character(Character::new("Third", RaceType::Gnome, CharacterClass::Bard, "Neutral"))
            .unwrap_err();
        assert!(matches!(err, SessionError::RosterFull));

        let mut s = GameSession::new(SessionConfig::new().with_seed(1));
        s.add_character(Character::new("Aria", RaceType::Human, CharacterClass::Fighter, "Neutral"))
            .unwrap();
        let err = s
            .add_character(Character::new("aria", RaceType::Elf, CharacterClass::Rogue, "Neutral"))
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateName(_)));
    }

    #[test]
    fn test_resolve_action_targets_other_player() {
        let mut s = session();
        s.dice_mut().force([20, 4, 4]);
        let result = s
            .resolve_action("Aria", &ActionRequest::attack("Elara"))
            .unwrap();
        assert!(result.success);
        assert!(result.message.starts_with("Aria hits Elara"));
        let elara = s.character("Elara").unwrap();
        let expected = (elara.hit_points.maximum - result.damage.unwrap()).max(0);
        assert_eq!(elara.hit_points.current, expected);
    }

    #[test]
    fn test_resolve_action_reports_bad_input() {
        let mut s = session();
        let unknown = s.resolve_action("Aria", &ActionRequest::new("dance")).unwrap();
        assert!(!unknown.success);
        assert_eq!(unknown.message, "Unknown action type: dance");

        let missing = s.resolve_action("Aria", &ActionRequest::attack("Nobody")).unwrap();
        assert!(!missing.success);

        assert!(matches!(
            s.resolve_action("Nobody", &ActionRequest::attack("Aria")),
            Err(SessionError::CharacterNotFound(_))
        ));
    }

    #[test]
    fn test_healing_spell_without_target_heals_caster() {
        let mut s = GameSession::new(SessionConfig::new().with_seed(2));
        let mut cleric = Character::new("Mira", RaceType::Human, CharacterClass::Cleric, "Lawful Good");
        cleric.hit_points.current = 1;
        s.add_character(cleric).unwrap();
        let result = s
            .resolve_action("Mira", &ActionRequest::spell("healing_word"))
            .unwrap();
        assert!(result.success);
        assert!(s.character("Mira").unwrap().hit_points.current > 1);
    }

    #[test]
    fn test_turns_advance_and_level_the_party() {
        let mut s = session();
        for _ in 0..5 {
            s.play_turn("Aria", "Ask the innkeeper about rumors", 15, None).unwrap();
        }
        assert_eq!(s.turn(), 5);
        assert!(s.characters().iter().all(|c| c.level == 2));
    }

    #[test]
    fn test_play_turn_report() {
        let mut s = session();
        let report = s
            .play_turn("Elara", "Talk to the guard", 16, None)
            .unwrap();
        assert_eq!(report.turn, 1);
        assert_eq!(report.scene, SceneType::Social);
        assert!(report.consequences.success);
        assert_eq!(report.consequences.consequences, vec!["Strong success!".to_string()]);
        assert!(report.loot.is_empty());
        assert!(report.suggestions.contains(&"Try to persuade".to_string()));
    }

    #[test]
    fn test_rest_through_session() {
        let mut s = session();
        s.character_mut("Aria").unwrap().hit_points.current = 1;
        let messages = s.rest("Aria", RestKind::Long).unwrap();
        assert_eq!(messages[0], "Recovered 11 HP");
        assert!(s.rest("Nobody", RestKind::Short).is_err());
    }
}
