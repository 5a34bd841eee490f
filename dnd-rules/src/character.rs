//! Characters and their derived statistics.
//!
//! A [`Character`] is owned by the session and mutated in place by the
//! resolvers. Everything derived from it (modifiers, proficiency, armor
//! class, health status) is computed from the stored fields.

use crate::abilities::AbilityUses;
use crate::combat;
use crate::conditions::Condition;
use crate::dice::{ability_modifier, proficiency_bonus, DieType};
use crate::items::{Item, ItemType};
use crate::spells::SpellSlots;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A name that did not match any known class, race or skill.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {name}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for Ability {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Ability::all()
            .into_iter()
            .find(|a| normalize(a.name()) == key || normalize(a.abbreviation()) == key)
            .ok_or_else(|| UnknownName {
                kind: "ability",
                name: s.to_string(),
            })
    }
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    /// Preset array used at character creation: the class's key abilities
    /// get 15/14/13, everything else 10.
    pub fn preset_for(class: CharacterClass) -> Self {
        use CharacterClass::*;
        let mut scores = Self::new(10, 10, 10, 10, 10, 10);
        let (first, second, third) = match class {
            Fighter | Barbarian | Paladin => {
                (Ability::Strength, Ability::Constitution, Ability::Dexterity)
            }
            Rogue | Ranger | Monk => (Ability::Dexterity, Ability::Wisdom, Ability::Strength),
            Wizard | Sorcerer | Warlock => {
                (Ability::Intelligence, Ability::Constitution, Ability::Charisma)
            }
            Cleric | Druid => (Ability::Wisdom, Ability::Constitution, Ability::Strength),
            Bard => (Ability::Charisma, Ability::Dexterity, Ability::Constitution),
        };
        scores.set(first, 15);
        scores.set(second, 14);
        scores.set(third, 13);
        scores
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i8 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn all() -> [Skill; 18] {
        use Skill::*;
        [
            Athletics,
            Acrobatics,
            SleightOfHand,
            Stealth,
            Arcana,
            History,
            Investigation,
            Nature,
            Religion,
            AnimalHandling,
            Insight,
            Medicine,
            Perception,
            Survival,
            Deception,
            Intimidation,
            Performance,
            Persuasion,
        ]
    }

    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Skill {
    type Err = UnknownName;

    /// Accepts "Sleight of Hand", "sleight_of_hand" and "SleightOfHand".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Skill::all()
            .into_iter()
            .find(|skill| normalize(skill.name()) == key)
            .ok_or_else(|| UnknownName {
                kind: "skill",
                name: s.to_string(),
            })
    }
}

/// Proficiency level for skills and saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProficiencyLevel {
    #[default]
    None,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    pub fn bonus(&self, proficiency_bonus: i8) -> i8 {
        match self {
            ProficiencyLevel::None => 0,
            ProficiencyLevel::Proficient => proficiency_bonus,
            ProficiencyLevel::Expertise => proficiency_bonus * 2,
        }
    }
}

// ============================================================================
// Classes and Races
// ============================================================================

/// How a class gains spell slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasterProgression {
    Full,
    Half,
    /// Pact magic: slots come back on a short rest.
    Pact,
    None,
}

/// D&D 5e character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
}

impl CharacterClass {
    pub fn all() -> [CharacterClass; 12] {
        use CharacterClass::*;
        [
            Barbarian, Bard, Cleric, Druid, Fighter, Monk, Paladin, Ranger, Rogue, Sorcerer,
            Warlock, Wizard,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Wizard => "Wizard",
        }
    }

    pub fn hit_die(&self) -> DieType {
        match self {
            CharacterClass::Barbarian => DieType::D12,
            CharacterClass::Fighter | CharacterClass::Paladin | CharacterClass::Ranger => {
                DieType::D10
            }
            CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Monk
            | CharacterClass::Rogue
            | CharacterClass::Warlock => DieType::D8,
            CharacterClass::Sorcerer | CharacterClass::Wizard => DieType::D6,
        }
    }

    /// The ability that governs spell attacks and save DCs, if the class casts.
    pub fn spellcasting_ability(&self) -> Option<Ability> {
        match self {
            CharacterClass::Wizard => Some(Ability::Intelligence),
            CharacterClass::Cleric | CharacterClass::Druid | CharacterClass::Ranger => {
                Some(Ability::Wisdom)
            }
            CharacterClass::Bard
            | CharacterClass::Paladin
            | CharacterClass::Sorcerer
            | CharacterClass::Warlock => Some(Ability::Charisma),
            _ => None,
        }
    }

    pub fn caster_progression(&self) -> CasterProgression {
        match self {
            CharacterClass::Wizard
            | CharacterClass::Sorcerer
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Bard => CasterProgression::Full,
            CharacterClass::Paladin | CharacterClass::Ranger => CasterProgression::Half,
            CharacterClass::Warlock => CasterProgression::Pact,
            _ => CasterProgression::None,
        }
    }

    /// Classes that add proficiency to concentration saves.
    pub fn is_spellcaster(&self) -> bool {
        self.spellcasting_ability().is_some()
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CharacterClass {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        CharacterClass::all()
            .into_iter()
            .find(|c| normalize(c.name()) == key)
            .ok_or_else(|| UnknownName {
                kind: "class",
                name: s.to_string(),
            })
    }
}

/// Playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceType {
    Human,
    Elf,
    Dwarf,
    Halfling,
    HalfOrc,
    HalfElf,
    Tiefling,
    Gnome,
    Dragonborn,
}

impl RaceType {
    pub fn all() -> [RaceType; 9] {
        use RaceType::*;
        [
            Human, Elf, Dwarf, Halfling, HalfOrc, HalfElf, Tiefling, Gnome, Dragonborn,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            RaceType::Human => "Human",
            RaceType::Elf => "Elf",
            RaceType::Dwarf => "Dwarf",
            RaceType::Halfling => "Halfling",
            RaceType::HalfOrc => "Half-Orc",
            RaceType::HalfElf => "Half-Elf",
            RaceType::Tiefling => "Tiefling",
            RaceType::Gnome => "Gnome",
            RaceType::Dragonborn => "Dragonborn",
        }
    }

    /// Walking speed in feet.
    pub fn base_speed(&self) -> u32 {
        match self {
            RaceType::Dwarf | RaceType::Halfling | RaceType::Gnome => 25,
            _ => 30,
        }
    }
}

impl fmt::Display for RaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RaceType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        RaceType::all()
            .into_iter()
            .find(|r| normalize(r.name()) == key)
            .ok_or_else(|| UnknownName {
                kind: "race",
                name: s.to_string(),
            })
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking. `0 <= current <= maximum` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        let maximum = maximum.max(1);
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Apply damage, never dropping below zero. Returns hit points lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = self.current.saturating_sub(amount.max(0)).max(0);
        old - self.current
    }

    /// Heal, never exceeding the maximum. Returns hit points gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = self.current.saturating_add(amount.max(0)).min(self.maximum);
        self.current - old
    }

    pub fn missing(&self) -> i32 {
        self.maximum - self.current
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.maximum
    }

    pub fn is_down(&self) -> bool {
        self.current <= 0
    }

    pub fn percentage(&self) -> i32 {
        if self.maximum <= 0 {
            return 0;
        }
        self.current * 100 / self.maximum
    }
}

/// Coarse health band shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Wounded,
    Bloodied,
    Critical,
}

impl HealthStatus {
    pub fn from_hit_points(hp: &HitPoints) -> Self {
        match hp.percentage() {
            p if p <= 25 => HealthStatus::Critical,
            p if p <= 50 => HealthStatus::Bloodied,
            p if p <= 75 => HealthStatus::Wounded,
            _ => HealthStatus::Healthy,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Wounded => "Wounded",
            HealthStatus::Bloodied => "Bloodied",
            HealthStatus::Critical => "Critical",
        };
        write!(f, "{name}")
    }
}

/// When a limited-use resource comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RechargeType {
    #[default]
    None,
    ShortRest,
    LongRest,
    Dawn,
}

/// Maximum hit points: full hit die + CON at first level, then
/// `max(1, die/2 + 1 + CON)` for every level after.
pub fn max_hit_points(class: CharacterClass, level: u8, con_modifier: i8) -> i32 {
    let die = class.hit_die().sides() as i32;
    let con = con_modifier as i32;
    let per_level = (die / 2 + 1 + con).max(1);
    let extra_levels = (level.max(1) - 1) as i32;
    (die + con + extra_levels * per_level).max(1)
}

// ============================================================================
// Character
// ============================================================================

/// A player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: RaceType,
    pub class: CharacterClass,
    pub alignment: String,
    pub level: u8,
    pub hit_points: HitPoints,
    /// Cached; refresh with [`Character::refresh_armor_class`] after equipment changes.
    pub armor_class: u8,
    pub ability_scores: AbilityScores,
    pub inventory: Vec<Item>,
    pub conditions: BTreeSet<Condition>,
    pub spell_slots: Option<SpellSlots>,
    pub ability_uses: BTreeMap<String, AbilityUses>,
    /// Held inspiration, spent for a reroll.
    #[serde(default)]
    pub inspiration: bool,
}

impl Character {
    /// A bare level-1 character with the class preset scores, full hit
    /// points, spell slots and class-ability uses, and an empty inventory.
    /// Use [`crate::CharacterBuilder`] for a fully equipped character.
    pub fn new(
        name: impl Into<String>,
        race: RaceType,
        class: CharacterClass,
        alignment: impl Into<String>,
    ) -> Self {
        let ability_scores = AbilityScores::preset_for(class);
        let con = ability_scores.modifier(Ability::Constitution);
        let mut character = Self {
            name: name.into(),
            race,
            class,
            alignment: alignment.into(),
            level: 1,
            hit_points: HitPoints::new(max_hit_points(class, 1, con)),
            armor_class: 10,
            ability_scores,
            inventory: Vec::new(),
            conditions: BTreeSet::new(),
            spell_slots: SpellSlots::for_class(class, 1),
            ability_uses: crate::abilities::initial_uses(class),
            inspiration: false,
        };
        character.refresh_armor_class();
        character
    }

    pub fn ability_modifier(&self, ability: Ability) -> i8 {
        self.ability_scores.modifier(ability)
    }

    pub fn proficiency_bonus(&self) -> i8 {
        proficiency_bonus(self.level)
    }

    pub fn equipped_weapon(&self) -> Option<&Item> {
        self.inventory
            .iter()
            .find(|item| item.item_type == ItemType::Weapon && item.is_equipped())
    }

    /// Equipped body armor (shields excluded).
    pub fn equipped_armor(&self) -> Option<&Item> {
        self.inventory
            .iter()
            .find(|item| item.item_type == ItemType::Armor && !item.is_shield() && item.is_equipped())
    }

    pub fn has_equipped_shield(&self) -> bool {
        self.inventory
            .iter()
            .any(|item| item.is_shield() && item.is_equipped())
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.inventory.iter().find(|item| item.id.matches(id))
    }

    pub fn refresh_armor_class(&mut self) {
        self.armor_class = combat::armor_class(self, self.equipped_armor());
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn add_condition(&mut self, condition: Condition) -> bool {
        self.conditions.insert(condition)
    }

    pub fn remove_condition(&mut self, condition: Condition) -> bool {
        self.conditions.remove(&condition)
    }

    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_hit_points(&self.hit_points)
    }

    /// Number of items currently attuned.
    pub fn attuned_count(&self) -> usize {
        self.inventory.iter().filter(|item| item.is_attuned()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_scores() {
        let fighter = AbilityScores::preset_for(CharacterClass::Fighter);
        assert_eq!(fighter.strength, 15);
        assert_eq!(fighter.constitution, 14);
        assert_eq!(fighter.dexterity, 13);
        assert_eq!(fighter.intelligence, 10);

        let bard = AbilityScores::preset_for(CharacterClass::Bard);
        assert_eq!(bard.charisma, 15);
        assert_eq!(bard.dexterity, 14);
        assert_eq!(bard.constitution, 13);
    }

    #[test]
    fn test_max_hit_points() {
        // d10 + 2 at level 1
        assert_eq!(max_hit_points(CharacterClass::Fighter, 1, 2), 12);
        // + (5 + 1 + 2) per level after
        assert_eq!(max_hit_points(CharacterClass::Fighter, 3, 2), 28);
        // A terrible constitution still gains one per level
        assert_eq!(max_hit_points(CharacterClass::Wizard, 3, -5), 3);
    }

    #[test]
    fn test_hit_points_clamp() {
        let mut hp = HitPoints::new(10);
        assert_eq!(hp.take_damage(25), 10);
        assert_eq!(hp.current, 0);
        assert!(hp.is_down());

        assert_eq!(hp.heal(50), 10);
        assert_eq!(hp.current, 10);

        assert_eq!(hp.take_damage(-4), 0);
        assert_eq!(hp.heal(-4), 0);
        assert_eq!(hp.current, 10);
    }

    #[test]
    fn test_hit_points_extreme_amounts() {
        let mut hp = HitPoints::new(10);
        hp.current = 3;
        assert_eq!(hp.heal(i32::MAX), 7);
        assert_eq!(hp.current, 10);
        assert_eq!(hp.take_damage(i32::MAX), 10);
        assert_eq!(hp.current, 0);
        assert_eq!(hp.heal(i32::MAX), 10);
    }

    #[test]
    fn test_health_status_bands() {
        let mut hp = HitPoints::new(20);
        assert_eq!(HealthStatus::from_hit_points(&hp), HealthStatus::Healthy);
        hp.current = 15;
        assert_eq!(HealthStatus::from_hit_points(&hp), HealthStatus::Wounded);
        hp.current = 10;
        assert_eq!(HealthStatus::from_hit_points(&hp), HealthStatus::Bloodied);
        hp.current = 5;
        assert_eq!(HealthStatus::from_hit_points(&hp), HealthStatus::Critical);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("wizard".parse::<CharacterClass>(), Ok(CharacterClass::Wizard));
        assert_eq!("half-orc".parse::<RaceType>(), Ok(RaceType::HalfOrc));
        assert_eq!("Sleight of Hand".parse::<Skill>(), Ok(Skill::SleightOfHand));
        assert_eq!("animal_handling".parse::<Skill>(), Ok(Skill::AnimalHandling));
        assert_eq!("dex".parse::<Ability>(), Ok(Ability::Dexterity));
        assert!("artificer".parse::<CharacterClass>().is_err());
    }

    #[test]
    fn test_new_character_derived_state() {
        let wizard = Character::new("Elara", RaceType::Elf, CharacterClass::Wizard, "Neutral Good");
        assert_eq!(wizard.level, 1);
        assert_eq!(wizard.hit_points.maximum, 8);
        assert_eq!(wizard.armor_class, 10);
        assert_eq!(wizard.proficiency_bonus(), 2);
        assert!(wizard.spell_slots.is_some());
        assert!(wizard.ability_uses.contains_key("arcane_recovery"));

        let fighter = Character::new("Bruni", RaceType::Dwarf, CharacterClass::Fighter, "Lawful Good");
        assert!(fighter.spell_slots.is_none());
        assert_eq!(fighter.armor_class, 11);
    }
}
