//! Action dispatch and per-turn pacing.
//!
//! The narrator proposes an action for a character; [`resolve_action`]
//! routes it to the matching resolver and folds every outcome, failures
//! included, into one [`ActionResult`]. [`apply_roll_consequences`] is the
//! separate pacing layer driven by the player's raw roll.

use crate::abilities::{available_class_abilities, use_class_ability};
use crate::character::{Character, Skill};
use crate::checks::skill_check;
use crate::combat::{self, combat_stats, CombatStats};
use crate::conditions::{
    advantage_against, advantage_from_conditions, can_take_action, ActionKind, CheckType,
};
use crate::dice::{Advantage, DiceRoller};
use crate::error::RulesError;
use crate::inventory::{self, add_item, use_consumable};
use crate::items::{create_item_from_template, Acquisition, Item, ItemType, Rarity};
use crate::spells::{cast_spell, get_spell, SpellTarget, SpellcastingRules};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

// ============================================================================
// Actions
// ============================================================================

/// The loosely-typed action shape the narrator emits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the character the action is aimed at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_level: Option<u8>,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            ..Default::default()
        }
    }

    pub fn attack(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new("attack")
        }
    }

    pub fn spell(spell_id: impl Into<String>) -> Self {
        Self {
            spell_id: Some(spell_id.into()),
            ..Self::new("spell")
        }
    }

    pub fn ability(ability_id: impl Into<String>) -> Self {
        Self {
            ability_id: Some(ability_id.into()),
            ..Self::new("ability")
        }
    }

    pub fn item(item_id: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            ..Self::new("item")
        }
    }

    pub fn skill(skill_name: impl Into<String>, dc: i32) -> Self {
        Self {
            skill_name: Some(skill_name.into()),
            dc: Some(dc),
            ..Self::new("skill")
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_slot_level(mut self, slot_level: u8) -> Self {
        self.slot_level = Some(slot_level);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate into a typed [`Action`].
    pub fn to_action(&self) -> Result<Action, RulesError> {
        match self.action_type.trim().to_lowercase().as_str() {
            "attack" => Ok(Action::Attack),
            "spell" => {
                let spell_id = required(&self.spell_id, "No spell specified")?;
                Ok(Action::Spell {
                    spell_id,
                    slot_level: self.slot_level,
                })
            }
            "ability" => Ok(Action::Ability {
                ability_id: required(&self.ability_id, "No ability specified")?,
            }),
            "item" => Ok(Action::Item {
                item_id: required(&self.item_id, "No item specified")?,
            }),
            "skill" => {
                let (Some(name), Some(dc)) = (self.skill_name.as_deref(), self.dc) else {
                    return Err(RulesError::precondition(
                        "Skill check requires skill name and DC",
                    ));
                };
                let skill = name
                    .parse::<Skill>()
                    .map_err(|_| RulesError::not_found("Skill", name))?;
                Ok(Action::Skill { skill, dc })
            }
            _ => Err(RulesError::UnknownAction(self.action_type.clone())),
        }
    }
}

fn required(field: &Option<String>, message: &str) -> Result<String, RulesError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RulesError::precondition(message))
}

/// A validated action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Attack with the equipped weapon (unarmed without one).
    Attack,
    /// Cast a spell; `slot_level` defaults to the spell's own level.
    Spell {
        spell_id: String,
        slot_level: Option<u8>,
    },
    Ability {
        ability_id: String,
    },
    /// Use a consumable.
    Item {
        item_id: String,
    },
    Skill {
        skill: Skill,
        dc: i32,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Attack => "attack",
            Action::Spell { .. } => "spell",
            Action::Ability { .. } => "ability",
            Action::Item { .. } => "item",
            Action::Skill { .. } => "skill",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Attack => write!(f, "attack"),
            Action::Spell { spell_id, .. } => write!(f, "cast {spell_id}"),
            Action::Ability { ability_id } => write!(f, "use {ability_id}"),
            Action::Item { item_id } => write!(f, "use item {item_id}"),
            Action::Skill { skill, dc } => write!(f, "{skill} check (DC {dc})"),
        }
    }
}

/// Uniform result of any action. A failed or rejected action still
/// produces one, with `success == false` and the reason in `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healing: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects_applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items_gained: Vec<String>,
}

impl ActionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

impl From<RulesError> for ActionResult {
    fn from(err: RulesError) -> Self {
        ActionResult::failure(err.to_string())
    }
}

/// Resolve `action` for `actor` against an optional `target`.
///
/// Never fails: errors become an unsuccessful [`ActionResult`], and a
/// rejected action leaves both characters untouched.
pub fn resolve_action(
    actor: &mut Character,
    action: &Action,
    target: Option<&mut Character>,
    rules: &SpellcastingRules,
    dice: &mut DiceRoller,
) -> ActionResult {
    match dispatch(actor, action, target, rules, dice) {
        Ok(result) => result,
        Err(err) => {
            warn!(actor = %actor.name, action = %action, error = %err, "Action rejected");
            err.into()
        }
    }
}

fn dispatch(
    actor: &mut Character,
    action: &Action,
    target: Option<&mut Character>,
    rules: &SpellcastingRules,
    dice: &mut DiceRoller,
) -> Result<ActionResult, RulesError> {
    let gated = matches!(action, Action::Attack | Action::Spell { .. } | Action::Ability { .. });
    if gated && !can_take_action(&actor.conditions, ActionKind::Action) {
        return Err(RulesError::precondition(format!(
            "{} cannot act right now",
            actor.name
        )));
    }

    match action {
        Action::Attack => {
            let target = target
                .ok_or_else(|| RulesError::invalid_target("No target specified for attack"))?;
            Ok(attack(actor, target, dice))
        }
        Action::Spell {
            spell_id,
            slot_level,
        } => {
            let spell = get_spell(spell_id)
                .ok_or_else(|| RulesError::not_found("Spell", spell_id.as_str()))?;
            let slot_level = slot_level.unwrap_or(spell.level);
            let spell_target = match target {
                Some(other) => SpellTarget::Other(other),
                None if spell.healing_dice.is_some() => SpellTarget::Caster,
                None => SpellTarget::None,
            };
            let outcome = cast_spell(actor, spell.id, slot_level, spell_target, rules, dice)?;
            Ok(ActionResult {
                success: outcome.hit != Some(false),
                message: outcome.message,
                damage: (outcome.damage > 0).then_some(outcome.damage),
                healing: (outcome.healing > 0).then_some(outcome.healing),
                effects_applied: outcome
                    .condition_applied
                    .map(|c| c.name().to_string())
                    .into_iter()
                    .collect(),
                items_gained: Vec::new(),
            })
        }
        Action::Ability { ability_id } => {
            let outcome = use_class_ability(actor, ability_id, dice)?;
            Ok(ActionResult {
                success: true,
                message: outcome.message,
                damage: (outcome.bonus_damage > 0).then_some(outcome.bonus_damage),
                healing: (outcome.healing > 0).then_some(outcome.healing),
                ..Default::default()
            })
        }
        Action::Item { item_id } => {
            let outcome = use_consumable(actor, item_id, dice)?;
            Ok(ActionResult {
                success: true,
                message: outcome.message,
                healing: (outcome.healing > 0).then_some(outcome.healing),
                ..Default::default()
            })
        }
        Action::Skill { skill, dc } => {
            let result = skill_check(actor, *skill, *dc, Advantage::Normal, false, dice);
            Ok(ActionResult {
                success: result.check.success,
                message: format!("{} check: {}", skill.name(), result.details),
                ..Default::default()
            })
        }
    }
}

fn attack(attacker: &Character, target: &mut Character, dice: &mut DiceRoller) -> ActionResult {
    let advantage = advantage_from_conditions(&attacker.conditions, CheckType::Attack)
        .combine(advantage_against(&target.conditions));
    let result = combat::resolve_attack(
        attacker,
        attacker.equipped_weapon(),
        i32::from(target.armor_class),
        advantage,
        dice,
    );

    let mut message = if result.hit {
        combat::apply_damage(target, result.damage);
        format!("{} hits {} for {} damage!", attacker.name, target.name, result.damage)
    } else {
        format!("{} misses {}!", attacker.name, target.name)
    };
    if result.critical_hit {
        message.push_str(" CRITICAL HIT!");
    }

    ActionResult {
        success: result.hit,
        message,
        damage: Some(result.damage),
        healing: None,
        effects_applied: result.status_effects.into_iter().map(|e| e.name).collect(),
        items_gained: Vec::new(),
    }
}

// ============================================================================
// Roll consequences
// ============================================================================

/// Band a raw player roll falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    /// 18 and up.
    Exceptional,
    /// 15-17.
    Strong,
    /// 10-14.
    Partial,
    /// 6-9.
    MinorFailure,
    /// 5 and below.
    CriticalFailure,
}

impl OutcomeTier {
    pub fn from_roll(roll: u32) -> Self {
        match roll {
            18.. => OutcomeTier::Exceptional,
            15..=17 => OutcomeTier::Strong,
            10..=14 => OutcomeTier::Partial,
            6..=9 => OutcomeTier::MinorFailure,
            _ => OutcomeTier::CriticalFailure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OutcomeTier::Exceptional | OutcomeTier::Strong | OutcomeTier::Partial
        )
    }

    pub fn headline(&self) -> &'static str {
        match self {
            OutcomeTier::Exceptional => "Exceptional success!",
            OutcomeTier::Strong => "Strong success!",
            OutcomeTier::Partial => "Partial success with complications",
            OutcomeTier::MinorFailure => "Failure with minor consequences",
            OutcomeTier::CriticalFailure => "Critical failure!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollConsequences {
    pub success: bool,
    pub tier: OutcomeTier,
    pub consequences: Vec<String>,
    pub rewards: Vec<String>,
}

const BONUS_LOOT_CHANCE: f64 = 0.4;
const SUCCESS_HEAL_CHANCE: f64 = 0.3;
const MINOR_DAMAGE_CHANCE: f64 = 0.3;
const ITEM_LOSS_CHANCE: f64 = 0.2;

/// Apply the pacing side effects of a raw roll to `character`.
pub fn apply_roll_consequences(
    character: &mut Character,
    description: &str,
    roll: u32,
    dice: &mut DiceRoller,
) -> RollConsequences {
    let tier = OutcomeTier::from_roll(roll);
    let mut consequences = vec![tier.headline().to_string()];
    let mut rewards = Vec::new();
    let max_hp = character.hit_points.maximum;

    match tier {
        OutcomeTier::Exceptional => {
            if dice.chance(BONUS_LOOT_CHANCE) {
                for item in inventory::generate_random_loot(character.level, Rarity::Common, dice) {
                    let name = item.name.clone();
                    match add_item(character, item) {
                        Ok(_) => rewards.push(format!("Bonus loot: {name}")),
                        Err(err) => warn!(character = %character.name, error = %err, "Bonus loot dropped"),
                    }
                }
            }
            if !character.hit_points.is_full() && dice.chance(SUCCESS_HEAL_CHANCE) {
                let healed = combat::perform_healing(character, max_hp / 10);
                if healed > 0 {
                    consequences.push(format!("Recovered {healed} HP from success"));
                }
            }
        }
        OutcomeTier::Strong | OutcomeTier::Partial => {}
        OutcomeTier::MinorFailure => {
            if dice.chance(MINOR_DAMAGE_CHANCE) {
                let damage = (max_hp / 10).min(3);
                combat::apply_damage(character, damage);
                consequences.push(format!("Took {damage} damage from failure"));
            }
        }
        OutcomeTier::CriticalFailure => {
            let damage = (max_hp * 15 / 100).min(5);
            combat::apply_damage(character, damage);
            consequences.push(format!("Took {damage} damage from critical failure"));

            if dice.chance(ITEM_LOSS_CHANCE) {
                let expendable: Vec<usize> = character
                    .inventory
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| is_expendable(item))
                    .map(|(index, _)| index)
                    .collect();
                if let Some(&index) = dice.pick(&expendable) {
                    let lost = character.inventory.remove(index);
                    consequences.push(format!("Lost {} in the chaos", lost.name));
                }
            }
        }
    }

    debug!(
        character = %character.name,
        action = description,
        roll,
        tier = ?tier,
        "Applied roll consequences"
    );

    RollConsequences {
        success: tier.is_success(),
        tier,
        consequences,
        rewards,
    }
}

fn is_expendable(item: &Item) -> bool {
    !item.is_equipped()
        && item.rarity == Rarity::Common
        && !matches!(item.item_type, ItemType::Weapon | ItemType::Armor)
}

// ============================================================================
// Scenes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    Combat,
    Exploration,
    Social,
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneType::Combat => write!(f, "combat"),
            SceneType::Exploration => write!(f, "exploration"),
            SceneType::Social => write!(f, "social"),
        }
    }
}

/// Infers the kind of scene an action happens in.
///
/// Best effort only: callers that know the scene should not rely on this.
pub trait SceneClassifier: Send + Sync {
    fn classify(&self, description: &str) -> SceneType;
}

/// Keyword matching on the action description.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSceneClassifier;

const COMBAT_KEYWORDS: &[&str] = &["attack", "fight", "cast", "defend", "strike", "shoot"];
const EXPLORATION_KEYWORDS: &[&str] = &["search", "investigate", "climb", "sneak", "explore", "look"];

impl SceneClassifier for KeywordSceneClassifier {
    fn classify(&self, description: &str) -> SceneType {
        let text = description.to_lowercase();
        if COMBAT_KEYWORDS.iter().any(|k| text.contains(k)) {
            SceneType::Combat
        } else if EXPLORATION_KEYWORDS.iter().any(|k| text.contains(k)) {
            SceneType::Exploration
        } else {
            SceneType::Social
        }
    }
}

/// Items found after a scene, with one message per item.
#[derive(Debug, Clone, Default)]
pub struct SceneLoot {
    pub items: Vec<Item>,
    pub messages: Vec<String>,
}

const UTILITY_ITEMS: &[&str] = &["rope_hemp", "thieves_tools", "healing_potion"];
const EXPLORATION_FIND_CHANCE: f64 = 0.3;

/// Rarity of post-combat loot: rare needs level 5, uncommon level 3.
pub fn combat_loot_rarity(level: u8, roll: f64) -> Rarity {
    if roll < 0.05 && level >= 5 {
        Rarity::Rare
    } else if roll < 0.2 && level >= 3 {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

/// Roll the loot a scene of `scene` yields for a character of `level`.
pub fn generate_scene_loot(level: u8, scene: SceneType, dice: &mut DiceRoller) -> SceneLoot {
    let mut loot = SceneLoot::default();
    match scene {
        SceneType::Combat => {
            let rarity = combat_loot_rarity(level, dice.between(0, 999) as f64 / 1000.0);
            for item in inventory::generate_random_loot(level, rarity, dice) {
                loot.messages
                    .push(format!("Found: {} ({})", item.name, item.rarity.name()));
                loot.items.push(item);
            }
        }
        SceneType::Exploration => {
            if dice.chance(EXPLORATION_FIND_CHANCE) {
                let acquisition = Acquisition::new("found", "world", format!("Level {level} exploration"));
                if let Some(key) = dice.pick(UTILITY_ITEMS).copied() {
                    match create_item_from_template(key, &acquisition, dice) {
                        Ok(item) => {
                            loot.messages.push(format!("Discovered: {}", item.name));
                            loot.items.push(item);
                        }
                        Err(err) => warn!(template = key, error = %err, "Missing utility template"),
                    }
                }
            }
        }
        SceneType::Social => {}
    }
    if !loot.items.is_empty() {
        info!(level, scene = %scene, count = loot.items.len(), "Scene loot");
    }
    loot
}

// ============================================================================
// Suggestions
// ============================================================================

/// Spells offered to a class in play suggestions.
pub fn suggested_spells(character: &Character) -> Vec<&'static str> {
    use crate::character::CharacterClass::*;
    let ids: &[&str] = match character.class {
        Wizard => &["fire_bolt", "magic_missile", "shield", "fireball"],
        Sorcerer => &["fire_bolt", "magic_missile", "fireball"],
        Cleric | Bard => &["healing_word", "cure_wounds"],
        Druid => &["cure_wounds", "thunderwave"],
        Warlock => &["eldritch_blast"],
        Paladin | Ranger => &["cure_wounds"],
        _ => &[],
    };
    ids.iter()
        .filter_map(|id| get_spell(id))
        .filter(|spell| {
            spell.is_cantrip()
                || character
                    .spell_slots
                    .as_ref()
                    .is_some_and(|slots| (spell.level..=9).any(|l| slots.available(l) > 0))
        })
        .map(|spell| spell.id)
        .collect()
}

/// Short action prompts fitting the character's state and the scene.
pub fn suggest_actions(character: &Character, scene: SceneType) -> Vec<String> {
    let mut suggestions = Vec::new();

    if character.hit_points.current * 2 < character.hit_points.maximum {
        suggestions.push("Use healing potion".to_string());
        suggestions.push("Take defensive stance".to_string());
    }

    match scene {
        SceneType::Combat => {
            suggestions.push("Attack with weapon".to_string());
            if !suggested_spells(character).is_empty() {
                suggestions.push("Cast a spell".to_string());
            }
            for ability in available_class_abilities(character) {
                suggestions.push(format!("Use {}", ability.name));
            }
        }
        SceneType::Exploration => {
            suggestions.extend(
                ["Search the area carefully", "Check for traps", "Look for hidden passages"]
                    .map(String::from),
            );
        }
        SceneType::Social => {
            suggestions.extend(
                ["Try to persuade", "Attempt deception", "Use intimidation", "Show insight"]
                    .map(String::from),
            );
        }
    }
    suggestions
}

/// What a character can do this turn, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatInfo {
    pub stats: CombatStats,
    pub conditions: Vec<String>,
    pub can_take_action: bool,
    pub can_take_bonus_action: bool,
    pub can_take_reaction: bool,
}

pub fn combat_info(character: &Character) -> CombatInfo {
    CombatInfo {
        stats: combat_stats(character),
        conditions: character.conditions.iter().map(|c| c.name().to_string()).collect(),
        can_take_action: can_take_action(&character.conditions, ActionKind::Action),
        can_take_bonus_action: can_take_action(&character.conditions, ActionKind::BonusAction),
        can_take_reaction: can_take_action(&character.conditions, ActionKind::Reaction),
    }
}
