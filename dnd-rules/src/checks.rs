//! Ability checks, skill checks, saving throws and death saves.

use crate::character::{Ability, Character, CharacterClass, ProficiencyLevel, Skill};
use crate::conditions::{advantage_from_conditions, auto_fails_save, CheckType, Condition};
use crate::dice::{Advantage, DiceRoller};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard difficulty classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
    NearlyImpossible,
}

impl Difficulty {
    pub fn dc(&self) -> i32 {
        match self {
            Difficulty::VeryEasy => 5,
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
            Difficulty::VeryHard => 25,
            Difficulty::NearlyImpossible => 30,
        }
    }
}

/// Skills each class is trained in.
pub fn class_skill_proficiencies(class: CharacterClass) -> &'static [Skill] {
    use Skill::*;
    match class {
        CharacterClass::Fighter => &[Athletics, Intimidation],
        CharacterClass::Rogue => &[Stealth, SleightOfHand, Acrobatics, Deception],
        CharacterClass::Wizard => &[Arcana, History, Investigation, Religion],
        CharacterClass::Cleric => &[History, Medicine, Persuasion, Religion],
        CharacterClass::Ranger => &[
            AnimalHandling,
            Athletics,
            Insight,
            Nature,
            Perception,
            Stealth,
            Survival,
        ],
        CharacterClass::Barbarian => &[Athletics, Survival],
        CharacterClass::Bard => &[Performance, Persuasion, Deception],
        CharacterClass::Druid => &[Nature, Medicine],
        CharacterClass::Monk => &[Acrobatics, Insight],
        CharacterClass::Paladin => &[Athletics, Religion],
        CharacterClass::Sorcerer => &[Arcana, Persuasion],
        CharacterClass::Warlock => &[Arcana, Deception],
    }
}

/// The two saving throws each class is proficient in.
pub fn class_saving_throws(class: CharacterClass) -> [Ability; 2] {
    use Ability::*;
    match class {
        CharacterClass::Barbarian | CharacterClass::Fighter => [Strength, Constitution],
        CharacterClass::Bard => [Dexterity, Charisma],
        CharacterClass::Cleric | CharacterClass::Paladin | CharacterClass::Warlock => {
            [Wisdom, Charisma]
        }
        CharacterClass::Druid | CharacterClass::Wizard => [Intelligence, Wisdom],
        CharacterClass::Monk | CharacterClass::Ranger => [Strength, Dexterity],
        CharacterClass::Rogue => [Dexterity, Intelligence],
        CharacterClass::Sorcerer => [Constitution, Charisma],
    }
}

pub fn is_skill_proficient(character: &Character, skill: Skill) -> bool {
    class_skill_proficiencies(character.class).contains(&skill)
}

pub fn is_save_proficient(character: &Character, ability: Ability) -> bool {
    class_saving_throws(character.class).contains(&ability)
}

/// Outcome of any d20 test against a DC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub natural_roll: u32,
    pub modifier: i32,
    pub total: i32,
    pub dc: i32,
    pub success: bool,
    pub advantage: Advantage,
}

/// d20 + ability modifier + proficiency (doubled for expertise) against `dc`.
///
/// Conditions such as poisoned or frightened fold into the roll mode.
pub fn ability_check(
    character: &Character,
    ability: Ability,
    dc: i32,
    proficiency: ProficiencyLevel,
    advantage: Advantage,
    dice: &mut DiceRoller,
) -> CheckResult {
    let mode = advantage.combine(advantage_from_conditions(
        &character.conditions,
        CheckType::AbilityCheck,
    ));
    roll_against(character, ability, dc, proficiency, mode, dice)
}

/// A saving throw. Paralyzed, stunned and unconscious creatures fail STR
/// and DEX saves without rolling well enough to matter.
pub fn saving_throw(
    character: &Character,
    ability: Ability,
    dc: i32,
    proficient: bool,
    advantage: Advantage,
    dice: &mut DiceRoller,
) -> CheckResult {
    let mode = advantage.combine(advantage_from_conditions(
        &character.conditions,
        CheckType::SavingThrow(ability),
    ));
    let proficiency = if proficient {
        ProficiencyLevel::Proficient
    } else {
        ProficiencyLevel::None
    };
    let mut result = roll_against(character, ability, dc, proficiency, mode, dice);
    if auto_fails_save(&character.conditions, ability) {
        result.success = false;
    }
    result
}

fn roll_against(
    character: &Character,
    ability: Ability,
    dc: i32,
    proficiency: ProficiencyLevel,
    advantage: Advantage,
    dice: &mut DiceRoller,
) -> CheckResult {
    let d20 = dice.roll_d20(advantage);
    let modifier = character.ability_modifier(ability) as i32
        + proficiency.bonus(character.proficiency_bonus()) as i32;
    let total = d20.kept as i32 + modifier;
    CheckResult {
        natural_roll: d20.kept,
        modifier,
        total,
        dc,
        success: total >= dc,
        advantage,
    }
}

/// A skill check with its human-readable breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCheckResult {
    pub skill: Skill,
    pub check: CheckResult,
    /// e.g. `Stealth (DEX): 12 + 5 = 17 vs DC 15`
    pub details: String,
}

/// Skill check using the class proficiency table. `expertise` only doubles
/// the bonus for skills the class is trained in.
pub fn skill_check(
    character: &Character,
    skill: Skill,
    dc: i32,
    advantage: Advantage,
    expertise: bool,
    dice: &mut DiceRoller,
) -> SkillCheckResult {
    let proficiency = match (is_skill_proficient(character, skill), expertise) {
        (false, _) => ProficiencyLevel::None,
        (true, false) => ProficiencyLevel::Proficient,
        (true, true) => ProficiencyLevel::Expertise,
    };
    let ability = skill.ability();
    let check = ability_check(character, ability, dc, proficiency, advantage, dice);
    let details = format!(
        "{} ({}): {} + {} = {} vs DC {}",
        skill.name(),
        ability.abbreviation(),
        check.natural_roll,
        check.modifier,
        check.total,
        dc
    );
    debug!(character = %character.name, %details, success = check.success, "Skill check");
    SkillCheckResult {
        skill,
        check,
        details,
    }
}

// ============================================================================
// Death saves
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathSaveOutcome {
    /// Natural 20: back up at 1 hit point.
    CriticalSuccess,
    Success,
    Failure,
    /// Natural 1: counts as two failures.
    CriticalFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathSaveResult {
    pub roll: u32,
    pub outcome: DeathSaveOutcome,
    pub message: String,
}

/// Roll a death save. Only a natural 20 changes the character.
pub fn death_saving_throw(character: &mut Character, dice: &mut DiceRoller) -> DeathSaveResult {
    let roll = dice.roll_d20(Advantage::Normal).kept;
    let (outcome, message) = match roll {
        20 => {
            character.hit_points.current = 1;
            character.remove_condition(Condition::Unconscious);
            (
                DeathSaveOutcome::CriticalSuccess,
                format!("{} rolled a natural 20! Regains 1 hit point!", character.name),
            )
        }
        1 => (
            DeathSaveOutcome::CriticalFailure,
            format!("{} rolled a natural 1! Counts as two failures!", character.name),
        ),
        r if r >= 10 => (
            DeathSaveOutcome::Success,
            format!("{} succeeds on death saving throw.", character.name),
        ),
        _ => (
            DeathSaveOutcome::Failure,
            format!("{} fails death saving throw.", character.name),
        ),
    };
    debug!(character = %character.name, roll, ?outcome, "Death save");
    DeathSaveResult {
        roll,
        outcome,
        message,
    }
}

/// Where a dying character stands after a death save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DyingState {
    Dying,
    Stable,
    Dead,
    Revived,
}

/// Running tally of death saves, kept by the caller between turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u8,
    pub failures: u8,
}

impl DeathSaves {
    pub fn record(&mut self, outcome: DeathSaveOutcome) -> DyingState {
        match outcome {
            DeathSaveOutcome::CriticalSuccess => {
                *self = DeathSaves::default();
                return DyingState::Revived;
            }
            DeathSaveOutcome::Success => self.successes += 1,
            DeathSaveOutcome::Failure => self.failures += 1,
            DeathSaveOutcome::CriticalFailure => self.failures += 2,
        }
        self.state()
    }

    pub fn state(&self) -> DyingState {
        if self.failures >= 3 {
            DyingState::Dead
        } else if self.successes >= 3 {
            DyingState::Stable
        } else {
            DyingState::Dying
        }
    }
}

// ============================================================================
// Inspiration
// ============================================================================

/// Grant inspiration. A character holds at most one.
pub fn grant_inspiration(character: &mut Character) -> String {
    character.inspiration = true;
    debug!(character = %character.name, "Inspiration granted");
    format!("{} gains inspiration!", character.name)
}

/// Spend held inspiration on a reroll. False when there is none to spend.
pub fn spend_inspiration(character: &mut Character) -> bool {
    std::mem::take(&mut character.inspiration)
}

// ============================================================================
// Challenge rating
// ============================================================================

/// Rough challenge rating for a foe: the mean of a defensive rating (hit
/// points, shifted by armor class) and an offensive rating (damage per round,
/// shifted by attack bonus), rounded.
pub fn challenge_rating(
    hit_points: i32,
    armor_class: i32,
    damage_per_round: i32,
    attack_bonus: i32,
) -> u32 {
    let defensive = defensive_rating(hit_points, armor_class);
    let offensive = offensive_rating(damage_per_round, attack_bonus);
    ((defensive + offensive) / 2.0).round() as u32
}

fn defensive_rating(hit_points: i32, armor_class: i32) -> f64 {
    let mut rating: f64 = if hit_points <= 6 {
        0.0
    } else if hit_points <= 35 {
        0.125
    } else if hit_points <= 49 {
        0.25
    } else if hit_points <= 70 {
        0.5
    } else if hit_points <= 85 {
        1.0
    } else if hit_points <= 100 {
        2.0
    } else if hit_points <= 115 {
        3.0
    } else if hit_points <= 130 {
        4.0
    } else {
        5.0
    };
    if armor_class >= 17 {
        rating += 1.0;
    } else if armor_class <= 13 {
        rating -= 1.0;
    }
    rating.max(0.0)
}

fn offensive_rating(damage_per_round: i32, attack_bonus: i32) -> f64 {
    let mut rating: f64 = if damage_per_round <= 3 {
        0.0
    } else if damage_per_round <= 5 {
        0.125
    } else if damage_per_round <= 8 {
        0.25
    } else if damage_per_round <= 14 {
        0.5
    } else if damage_per_round <= 20 {
        1.0
    } else if damage_per_round <= 26 {
        2.0
    } else if damage_per_round <= 32 {
        3.0
    } else {
        4.0
    };
    let expected = 3.0 + rating * 2.0;
    let bonus = attack_bonus as f64;
    if bonus >= expected + 2.0 {
        rating += 1.0;
    } else if bonus <= expected - 2.0 {
        rating -= 1.0;
    }
    rating.max(0.0)
}
