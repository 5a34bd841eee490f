//! D&D 5e rules engine for a two-player, AI-narrated adventure.
//!
//! This crate provides:
//! - Dice, ability modifiers and character stats
//! - Combat, spellcasting, class abilities, checks and death saves
//! - Inventory, equipment, attunement and loot
//! - Leveling and rests
//! - An action orchestrator that folds every outcome into an `ActionResult`
//! - A session context and an async boundary to the story narrator
//!
//! # Quick Start
//!
//! ```ignore
//! use dnd_rules::{ActionRequest, CharacterBuilder, CharacterClass, DiceRoller,
//!     GameSession, RaceType, SessionConfig, SummaryNarrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::new(SessionConfig::new().with_seed(42));
//!     let mut dice = DiceRoller::seeded(42);
//!     session.add_character(
//!         CharacterBuilder::new()
//!             .name("Thorin")
//!             .race(RaceType::Dwarf)
//!             .class(CharacterClass::Fighter)
//!             .build(&mut dice)?,
//!     )?;
//!
//!     let report = session.play_turn("Thorin", "search the crypt", 17, None)?;
//!     let narration = session.narrate(&SummaryNarrator, &report).await?;
//!     println!("{}", narration.text);
//!     Ok(())
//! }
//! ```

pub mod abilities;
pub mod character;
pub mod character_builder;
pub mod checks;
pub mod combat;
pub mod conditions;
pub mod dice;
pub mod error;
pub mod inventory;
pub mod items;
pub mod narration;
pub mod orchestrator;
pub mod progression;
pub mod session;
pub mod spells;

// Primary public API
pub use character::{Ability, Character, CharacterClass, RaceType, Skill};
pub use character_builder::{BuilderError, CharacterBuilder};
pub use dice::{Advantage, DicePool, DiceRoller, DieType};
pub use error::{ErrorKind, RulesError};
pub use narration::{Narration, Narrator, NarratorError, SummaryNarrator, TurnContext};
pub use orchestrator::{
    apply_roll_consequences, resolve_action, Action, ActionRequest, ActionResult,
    KeywordSceneClassifier, RollConsequences, SceneClassifier, SceneType,
};
pub use progression::{auto_level_up, level_up, perform_rest, RestKind};
pub use session::{GameSession, SessionConfig, SessionError, TurnReport};
pub use spells::{SpellAttackAc, SpellcastingRules};
