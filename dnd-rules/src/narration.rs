//! Boundary to the external story narrator.
//!
//! The rules engine never waits on narration. A turn is fully resolved
//! first; its structured outcome is then packed into a [`TurnContext`] and
//! handed to a [`Narrator`], whose failure leaves game state untouched.

use crate::character::Character;
use crate::orchestrator::{ActionResult, SceneType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a narrator implementation.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("Narrator unavailable: {0}")]
    Unavailable(String),

    #[error("Narrator timed out")]
    Timeout,

    #[error("Invalid narrator response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What the narrator is told about one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u8,
    pub hp: i32,
    pub max_hp: i32,
    pub armor_class: u8,
    pub health: String,
    pub conditions: Vec<String>,
    pub equipped: Vec<String>,
}

impl From<&Character> for CharacterSnapshot {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            race: character.race.name().to_string(),
            class: character.class.name().to_string(),
            level: character.level,
            hp: character.hit_points.current,
            max_hp: character.hit_points.maximum,
            armor_class: character.armor_class,
            health: character.health_status().to_string(),
            conditions: character
                .conditions
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            equipped: character
                .inventory
                .iter()
                .filter(|item| item.is_equipped())
                .map(|item| item.name.clone())
                .collect(),
        }
    }
}

/// Structured outcome of one turn, as handed to the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub turn: u32,
    pub scene: SceneType,
    pub actor: String,
    pub action_description: String,
    pub roll: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionResult>,
    pub consequences: Vec<String>,
    pub rewards: Vec<String>,
    pub loot: Vec<String>,
    pub progression: Vec<String>,
    pub roster: Vec<CharacterSnapshot>,
    pub suggestions: Vec<String>,
}

impl TurnContext {
    pub fn to_json(&self) -> Result<String, NarratorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every mechanical line of the turn, in the order it happened.
    pub fn outcome_lines(&self) -> impl Iterator<Item = &str> {
        self.action
            .iter()
            .map(|a| a.message.as_str())
            .chain(self.consequences.iter().map(String::as_str))
            .chain(self.rewards.iter().map(String::as_str))
            .chain(self.loot.iter().map(String::as_str))
            .chain(self.progression.iter().map(String::as_str))
    }
}

/// Narrated text for a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narration {
    pub text: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

/// Anything that can turn a resolved turn into story.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, context: &TurnContext) -> Result<Narration, NarratorError>;

    /// Name for logs.
    fn name(&self) -> &str;
}

/// Offline narrator that reads the mechanical outcome back as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryNarrator;

#[async_trait]
impl Narrator for SummaryNarrator {
    async fn narrate(&self, context: &TurnContext) -> Result<Narration, NarratorError> {
        let mut text = format!(
            "Turn {}: {} tries to {} (rolled {}).",
            context.turn, context.actor, context.action_description, context.roll
        );
        for line in context.outcome_lines() {
            text.push(' ');
            text.push_str(line);
        }
        Ok(Narration {
            text,
            suggested_actions: context.suggestions.clone(),
        })
    }

    fn name(&self) -> &str {
        "summary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, RaceType};

    fn context() -> TurnContext {
        let hero = Character::new("Aria", RaceType::Human, CharacterClass::Fighter, "Neutral");
        TurnContext {
            turn: 3,
            scene: SceneType::Exploration,
            actor: "Aria".into(),
            action_description: "search the crypt".into(),
            roll: 16,
            success: true,
            action: None,
            consequences: vec!["Strong success!".into()],
            rewards: Vec::new(),
            loot: vec!["Discovered: Thieves' Tools".into()],
            progression: Vec::new(),
            roster: vec![CharacterSnapshot::from(&hero)],
            suggestions: vec!["Check for traps".into()],
        }
    }

    #[test]
    fn test_context_json_shape() {
        let json = context().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scene"], "exploration");
        assert_eq!(value["actionDescription"], "search the crypt");
        assert_eq!(value["roster"][0]["maxHp"], 12);
        assert!(value.get("action").is_none());
    }

    #[tokio::test]
    async fn test_summary_narrator() {
        let narration = SummaryNarrator.narrate(&context()).await.unwrap();
        assert_eq!(
            narration.text,
            "Turn 3: Aria tries to search the crypt (rolled 16). Strong success! Discovered: Thieves' Tools"
        );
        assert_eq!(narration.suggested_actions, vec!["Check for traps".to_string()]);
    }
}
