//! Leveling and rest recovery.

use crate::character::{Ability, CasterProgression, Character, RechargeType};
use crate::conditions::Condition;
use crate::dice::DiceRoller;
use crate::error::RulesError;
use crate::spells::SpellSlots;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Highest level reachable in a session.
pub const MAX_LEVEL: u8 = 10;

/// Turns a character plays per level gained.
pub const TURNS_PER_LEVEL: u32 = 5;

/// Gain a level: roll the class hit die plus CON (at least 1) onto current
/// and maximum hit points, and widen spell slots.
pub fn level_up(
    character: &mut Character,
    max_level: u8,
    dice: &mut DiceRoller,
) -> Result<Vec<String>, RulesError> {
    if character.level >= max_level {
        return Err(RulesError::precondition(format!(
            "{} is already at the maximum level ({max_level})",
            character.name
        )));
    }

    character.level += 1;
    let mut messages = vec![format!("Level up! Now level {}", character.level)];

    let con = character.ability_modifier(Ability::Constitution) as i32;
    let gain = (dice.roll_die(character.class.hit_die()) as i32 + con).max(1);
    character.hit_points.maximum += gain;
    character.hit_points.current += gain;
    messages.push(format!(
        "Gained {gain} hit points (total: {})",
        character.hit_points.maximum
    ));

    if let Some(fresh) = SpellSlots::for_class(character.class, character.level) {
        let slots = character.spell_slots.get_or_insert_with(SpellSlots::default);
        let before = slots.highest_level();
        slots.update_totals(&fresh);
        if slots.highest_level() > before {
            messages.push(format!("Unlocked level {} spell slots", slots.highest_level()));
        }
    }

    if character.level % 4 == 0 {
        messages.push("You can increase your ability scores!".to_string());
    }

    info!(character = %character.name, level = character.level, gain, "Level up");
    Ok(messages)
}

/// Level expected after `turn_index` completed turns, capped at `max_level`.
pub fn expected_level(turn_index: u32, turns_per_level: u32, max_level: u8) -> u8 {
    let earned = turn_index / turns_per_level.max(1) + 1;
    earned.min(max_level as u32) as u8
}

/// Level up once if the character has fallen behind the turn cadence.
pub fn auto_level_up(
    character: &mut Character,
    turn_index: u32,
    turns_per_level: u32,
    max_level: u8,
    dice: &mut DiceRoller,
) -> Vec<String> {
    if character.level < expected_level(turn_index, turns_per_level, max_level) {
        level_up(character, max_level, dice).unwrap_or_default()
    } else {
        Vec::new()
    }
}

// ============================================================================
// Rests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestKind {
    Short,
    Long,
}

impl fmt::Display for RestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestKind::Short => write!(f, "short"),
            RestKind::Long => write!(f, "long"),
        }
    }
}

impl FromStr for RestKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" | "short_rest" => Ok(RestKind::Short),
            "long" | "long_rest" => Ok(RestKind::Long),
            other => Err(RulesError::not_found("Rest type", other)),
        }
    }
}

fn ability_name(id: &str, character: &Character) -> String {
    crate::abilities::get_class_ability(character.class, id)
        .map(|a| a.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Recharge short-rest abilities and spend one hit die.
pub fn short_rest(character: &mut Character, dice: &mut DiceRoller) -> Vec<String> {
    let mut messages = Vec::new();

    let recharged: Vec<String> = character
        .ability_uses
        .iter_mut()
        .filter(|(_, uses)| uses.recharge == RechargeType::ShortRest)
        .filter_map(|(id, uses)| uses.restore().then(|| id.clone()))
        .collect();
    for id in recharged {
        messages.push(format!("Recharged {}", ability_name(&id, character)));
    }

    if character.class.caster_progression() == CasterProgression::Pact {
        if let Some(slots) = character.spell_slots.as_mut() {
            if slots.expended() > 0 {
                slots.recover_all();
                messages.push("Recovered pact magic spell slots".to_string());
            }
        }
    }

    let con = character.ability_modifier(Ability::Constitution) as i32;
    let rolled = dice.roll_die(character.class.hit_die()) as i32 + con;
    let healed = character.hit_points.heal(rolled.max(0));
    if healed > 0 {
        messages.push(format!("Recovered {healed} HP from Hit Die"));
    }

    info!(character = %character.name, healed, "Short rest");
    messages
}

/// Restore hit points, every ability use and every spell slot.
pub fn long_rest(character: &mut Character) -> Vec<String> {
    let healed = character.hit_points.missing();
    character.hit_points.current = character.hit_points.maximum;
    let mut messages = vec![format!("Recovered {healed} HP")];

    let ids: Vec<String> = character.ability_uses.keys().cloned().collect();
    for uses in character.ability_uses.values_mut() {
        uses.restore();
    }
    for id in ids {
        messages.push(format!("Recharged {}", ability_name(&id, character)));
    }

    if let Some(slots) = character.spell_slots.as_mut() {
        slots.recover_all();
        if slots.highest_level() > 0 {
            messages.push("Recovered all spell slots".to_string());
        }
    }

    if character.remove_condition(Condition::Unconscious) {
        messages.push(format!("{} wakes up", character.name));
    }

    info!(character = %character.name, healed, "Long rest");
    messages
}

pub fn perform_rest(character: &mut Character, kind: RestKind, dice: &mut DiceRoller) -> Vec<String> {
    match kind {
        RestKind::Short => short_rest(character, dice),
        RestKind::Long => long_rest(character),
    }
}
