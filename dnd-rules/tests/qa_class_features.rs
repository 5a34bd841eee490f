//! QA tests for class abilities, checks, death saves and progression.
//!
//! Run with: `cargo test -p dnd-rules --test qa_class_features`

use dnd_rules::abilities::use_class_ability;
use dnd_rules::checks::{death_saving_throw, saving_throw, DeathSaveOutcome, DeathSaves, DyingState};
use dnd_rules::conditions::Condition;
use dnd_rules::progression::{expected_level, short_rest, MAX_LEVEL, TURNS_PER_LEVEL};
use dnd_rules::spells::SpellSlots;
use dnd_rules::{
    auto_level_up, level_up, perform_rest, Ability, Advantage, Character, CharacterClass,
    DiceRoller, ErrorKind, RaceType, RestKind,
};

fn fighter() -> Character {
    Character::new("Bruni", RaceType::Dwarf, CharacterClass::Fighter, "Lawful Good")
}

// =============================================================================
// TEST 1: Class abilities
// =============================================================================

#[test]
fn test_second_wind_heals_once_per_rest() {
    let mut c = fighter();
    c.hit_points.current = 2;

    // 1d10 = 5, plus level 1
    let mut dice = DiceRoller::scripted([5]);
    let outcome = use_class_ability(&mut c, "second_wind", &mut dice).unwrap();
    assert_eq!(outcome.healing, 6);
    assert_eq!(c.hit_points.current, 8);
    assert_eq!(c.ability_uses["second_wind"].current, 0);

    let err = use_class_ability(&mut c, "second_wind", &mut dice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_eq!(err.to_string(), "No uses of Second Wind remaining.");
    assert_eq!(c.hit_points.current, 8);
}

#[test]
fn test_level_gated_ability() {
    let mut c = fighter();
    let mut dice = DiceRoller::seeded(1);
    let err = use_class_ability(&mut c, "action_surge", &mut dice).unwrap_err();
    assert_eq!(err.to_string(), "Not high enough level for Action Surge.");

    c.level = 2;
    let outcome = use_class_ability(&mut c, "action_surge", &mut dice).unwrap();
    assert!(outcome.extra_action);
}

#[test]
fn test_unknown_ability() {
    let mut c = fighter();
    let mut dice = DiceRoller::seeded(1);
    let err = use_class_ability(&mut c, "fireball", &mut dice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_arcane_recovery_restores_slots() {
    let mut wizard = Character::new("Elara", RaceType::Elf, CharacterClass::Wizard, "Neutral Good");
    wizard.level = 3;
    wizard.spell_slots = SpellSlots::for_class(CharacterClass::Wizard, 3);
    let slots = wizard.spell_slots.as_mut().unwrap();
    slots.use_slot(2);
    slots.use_slot(1);

    let mut dice = DiceRoller::seeded(1);
    let outcome = use_class_ability(&mut wizard, "arcane_recovery", &mut dice).unwrap();
    // budget ceil(3 / 2) = 2 spell levels, highest first
    assert_eq!(outcome.slots_recovered, vec![2]);
    let slots = wizard.spell_slots.as_ref().unwrap();
    assert_eq!(slots.available(2), 2);
    assert_eq!(slots.available(1), 3);
}

// =============================================================================
// TEST 2: Saves and death saves
// =============================================================================

#[test]
fn test_stunned_character_fails_strength_save() {
    let mut c = fighter();
    c.add_condition(Condition::Stunned);
    let mut dice = DiceRoller::scripted([20]);
    let result = saving_throw(&c, Ability::Strength, 5, true, Advantage::Normal, &mut dice);
    assert!(!result.success);
}

#[test]
fn test_death_save_bands() {
    let mut c = fighter();
    c.hit_points.current = 0;
    c.add_condition(Condition::Unconscious);

    let mut dice = DiceRoller::scripted([10, 9, 1, 20]);
    let mut tally = DeathSaves::default();

    let first = death_saving_throw(&mut c, &mut dice);
    assert_eq!(first.outcome, DeathSaveOutcome::Success);
    assert_eq!(tally.record(first.outcome), DyingState::Dying);

    let second = death_saving_throw(&mut c, &mut dice);
    assert_eq!(second.outcome, DeathSaveOutcome::Failure);
    tally.record(second.outcome);

    let third = death_saving_throw(&mut c, &mut dice);
    assert_eq!(third.message, "Bruni rolled a natural 1! Counts as two failures!");
    assert_eq!(tally.record(third.outcome), DyingState::Dead);
    assert_eq!(c.hit_points.current, 0);

    let fourth = death_saving_throw(&mut c, &mut dice);
    assert_eq!(fourth.outcome, DeathSaveOutcome::CriticalSuccess);
    assert_eq!(c.hit_points.current, 1);
    assert!(!c.has_condition(Condition::Unconscious));
}

// =============================================================================
// TEST 3: Progression and rests
// =============================================================================

#[test]
fn test_short_rest_scenario() {
    let mut c = fighter(); // CON +2
    c.level = 2;
    c.hit_points.maximum = 20;
    c.hit_points.current = 5;
    for uses in c.ability_uses.values_mut() {
        uses.current = 0;
    }

    let mut dice = DiceRoller::scripted([8]);
    let messages = short_rest(&mut c, &mut dice);
    assert!(c.ability_uses.values().all(|uses| uses.current == uses.max));
    assert_eq!(c.hit_points.current, 15);
    assert!(messages.contains(&"Recovered 10 HP from Hit Die".to_string()));
}

#[test]
fn test_short_rest_healing_is_bounded_by_missing_hp() {
    let mut c = fighter();
    c.hit_points.current = c.hit_points.maximum - 1;
    let mut dice = DiceRoller::scripted([10]);
    let messages = perform_rest(&mut c, RestKind::Short, &mut dice);
    assert_eq!(c.hit_points.current, c.hit_points.maximum);
    assert!(messages.contains(&"Recovered 1 HP from Hit Die".to_string()));

    let messages = perform_rest(&mut c, RestKind::Short, &mut dice);
    assert!(messages.iter().all(|m| !m.ends_with("from Hit Die")));
}

#[test]
fn test_long_rest_recovers_slots() {
    let mut cleric = Character::new("Mira", RaceType::Human, CharacterClass::Cleric, "Lawful Good");
    cleric.spell_slots.as_mut().unwrap().use_slot(1);
    cleric.spell_slots.as_mut().unwrap().use_slot(1);
    let mut dice = DiceRoller::seeded(1);
    perform_rest(&mut cleric, RestKind::Long, &mut dice);
    assert_eq!(cleric.spell_slots.as_ref().unwrap().available(1), 2);
}

#[test]
fn test_auto_level_every_five_turns_to_cap() {
    let mut c = fighter();
    let mut dice = DiceRoller::seeded(3);
    let mut last_max = c.hit_points.maximum;
    for turn in 1..=100 {
        auto_level_up(&mut c, turn, TURNS_PER_LEVEL, MAX_LEVEL, &mut dice);
        assert_eq!(c.level, expected_level(turn, TURNS_PER_LEVEL, MAX_LEVEL));
        assert!(c.hit_points.maximum >= last_max);
        last_max = c.hit_points.maximum;
    }
    assert_eq!(c.level, 10);
    assert!(level_up(&mut c, MAX_LEVEL, &mut dice).is_err());
}
