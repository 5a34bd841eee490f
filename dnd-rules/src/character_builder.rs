//! Character builder for new adventurers.
//!
//! Builds on [`Character::new`]: class preset ability scores, a starting
//! level and the class starting kit.

use crate::character::{max_hit_points, Ability, Character, CharacterClass, RaceType};
use crate::dice::DiceRoller;
use crate::error::RulesError;
use crate::inventory::{add_item, starting_equipment};
use crate::progression::MAX_LEVEL;
use crate::spells::SpellSlots;
use thiserror::Error;
use tracing::info;

/// Error from character building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("Character name is required")]
    MissingName,

    #[error("Race selection is required")]
    MissingRace,

    #[error("Class selection is required")]
    MissingClass,

    #[error("Level {0} is out of range (1-10)")]
    InvalidLevel(u8),

    #[error("Starting equipment: {0}")]
    Equipment(#[from] RulesError),
}

/// Builder for new characters.
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    name: Option<String>,
    race: Option<RaceType>,
    class: Option<CharacterClass>,
    alignment: String,
    level: u8,
    with_equipment: bool,
}

impl Default for CharacterBuilder {
    fn default() -> Self {
        Self {
            name: None,
            race: None,
            class: None,
            alignment: "True Neutral".to_string(),
            level: 1,
            with_equipment: true,
        }
    }
}

impl CharacterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn race(mut self, race: RaceType) -> Self {
        self.race = Some(race);
        self
    }

    pub fn class(mut self, class: CharacterClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn alignment(mut self, alignment: impl Into<String>) -> Self {
        self.alignment = alignment.into();
        self
    }

    /// Start above level 1. Hit points and spell slots follow the level.
    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Skip the class starting kit.
    pub fn without_equipment(mut self) -> Self {
        self.with_equipment = false;
        self
    }

    /// Build the character, returning an error if any required field is missing.
    pub fn build(self, dice: &mut DiceRoller) -> Result<Character, BuilderError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(BuilderError::MissingName)?;
        let race = self.race.ok_or(BuilderError::MissingRace)?;
        let class = self.class.ok_or(BuilderError::MissingClass)?;
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(BuilderError::InvalidLevel(self.level));
        }

        let mut character = Character::new(name, race, class, self.alignment);
        character.level = self.level;
        let con = character.ability_modifier(Ability::Constitution);
        character.hit_points.maximum = max_hit_points(class, self.level, con);
        character.hit_points.current = character.hit_points.maximum;
        character.spell_slots = SpellSlots::for_class(class, self.level);

        if self.with_equipment {
            for item in starting_equipment(class, dice)? {
                add_item(&mut character, item)?;
            }
        }
        character.refresh_armor_class();

        info!(
            character = %character.name,
            class = class.name(),
            level = character.level,
            "Built character"
        );
        Ok(character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fighter() {
        let mut dice = DiceRoller::seeded(42);
        let fighter = CharacterBuilder::new()
            .name("Thorin")
            .race(RaceType::Dwarf)
            .class(CharacterClass::Fighter)
            .alignment("Lawful Good")
            .build(&mut dice)
            .unwrap();

        assert_eq!(fighter.name, "Thorin");
        assert_eq!(fighter.level, 1);
        assert_eq!(fighter.hit_points.maximum, 12);
        assert_eq!(fighter.equipped_weapon().map(|w| w.name.as_str()), Some("Longsword"));
        assert!(fighter.has_equipped_shield());
        // chain mail 16 + shield 2
        assert_eq!(fighter.armor_class, 18);
        assert!(fighter
            .inventory
            .iter()
            .all(|item| item.location_state == "player:Thorin"));
        assert!(fighter.spell_slots.is_none());
    }

    #[test]
    fn test_build_wizard_at_level() {
        let mut dice = DiceRoller::seeded(42);
        let wizard = CharacterBuilder::new()
            .name("Elara")
            .race(RaceType::Elf)
            .class(CharacterClass::Wizard)
            .level(3)
            .build(&mut dice)
            .unwrap();

        assert_eq!(wizard.level, 3);
        // d6 + 2, then 2 x (3 + 1 + 2)
        assert_eq!(wizard.hit_points.maximum, 20);
        let slots = wizard.spell_slots.as_ref().unwrap();
        assert_eq!(slots.available(1), 4);
        assert_eq!(slots.available(2), 2);
    }

    #[test]
    fn test_missing_fields() {
        let mut dice = DiceRoller::seeded(1);
        assert_eq!(
            CharacterBuilder::new().build(&mut dice).unwrap_err(),
            BuilderError::MissingName
        );
        assert_eq!(
            CharacterBuilder::new().name("X").build(&mut dice).unwrap_err(),
            BuilderError::MissingRace
        );
        assert_eq!(
            CharacterBuilder::new()
                .name("X")
                .race(RaceType::Human)
                .build(&mut dice)
                .unwrap_err(),
            BuilderError::MissingClass
        );
    }

    #[test]
    fn test_level_out_of_range() {
        let mut dice = DiceRoller::seeded(1);
        let err = CharacterBuilder::new()
            .name("X")
            .race(RaceType::Human)
            .class(CharacterClass::Rogue)
            .level(11)
            .build(&mut dice)
            .unwrap_err();
        assert_eq!(err, BuilderError::InvalidLevel(11));
    }

    #[test]
    fn test_scores_come_from_class_preset() {
        use crate::character::AbilityScores;
        let mut dice = DiceRoller::seeded(1);
        let rogue = CharacterBuilder::new()
            .name("Vex")
            .race(RaceType::Halfling)
            .class(CharacterClass::Rogue)
            .without_equipment()
            .build(&mut dice)
            .unwrap();
        assert_eq!(rogue.ability_scores, AbilityScores::preset_for(CharacterClass::Rogue));
        assert!(rogue.inventory.is_empty());
        assert_eq!(rogue.armor_class, 10 + rogue.ability_modifier(Ability::Dexterity) as u8);
    }
}
