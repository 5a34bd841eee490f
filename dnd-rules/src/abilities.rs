//! Class features with limited uses.
//!
//! The catalog is shared reference data. Each character owns its own
//! [`AbilityUses`] counters, cloned from the catalog when it is created.

use crate::character::{Ability, Character, CharacterClass, RechargeType};
use crate::dice::{DicePool, DiceRoller, DieType};
use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Remaining uses of a limited class ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityUses {
    pub max: u8,
    pub current: u8,
    pub recharge: RechargeType,
}

impl AbilityUses {
    pub fn new(max: u8, recharge: RechargeType) -> Self {
        Self {
            max,
            current: max,
            recharge,
        }
    }

    pub fn restore(&mut self) -> bool {
        let changed = self.current < self.max;
        self.current = self.max;
        changed
    }
}

/// What using an ability does, parsed from the catalog's effect code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Heal the user; `plus_level` adds the character level.
    Healing { dice: DicePool, plus_level: bool },
    /// Heal a touched creature from a pool of `per_level` x level.
    HealingPool { per_level: u8 },
    ExtraAction,
    /// `ceil(level / 2)` d6 of extra damage.
    SneakDamage,
    BonusActionOptions,
    /// Regain expended slots worth up to `ceil(level / 2)` spell levels.
    RecoverSpellSlots,
    Rage { damage_bonus: u8 },
    Inspiration { die: DieType },
    TurnUndead,
    Other,
}

impl AbilityEffect {
    /// Parse an effect code such as `healing:1d10+level` or `extra_action`.
    pub fn parse(code: &str) -> AbilityEffect {
        let code = code.trim().to_lowercase();
        if let Some(rest) = code.strip_prefix("healing:") {
            let plus_level = rest.ends_with("+level");
            let dice = DicePool::parse(rest.trim_end_matches("+level"));
            return match dice {
                Ok(dice) => AbilityEffect::Healing { dice, plus_level },
                Err(_) => AbilityEffect::Other,
            };
        }
        if let Some(rest) = code.strip_prefix("healing_pool:") {
            return rest
                .parse()
                .map(|per_level| AbilityEffect::HealingPool { per_level })
                .unwrap_or(AbilityEffect::Other);
        }
        if let Some(rest) = code.strip_prefix("inspiration:") {
            return DicePool::parse(rest)
                .map(|pool| AbilityEffect::Inspiration { die: pool.die })
                .unwrap_or(AbilityEffect::Other);
        }
        match code.as_str() {
            "extra_action" => AbilityEffect::ExtraAction,
            "sneak_damage" => AbilityEffect::SneakDamage,
            "bonus_action_options" => AbilityEffect::BonusActionOptions,
            "recover_spell_slots" => AbilityEffect::RecoverSpellSlots,
            "rage" => AbilityEffect::Rage { damage_bonus: 2 },
            "turn_undead" => AbilityEffect::TurnUndead,
            _ => AbilityEffect::Other,
        }
    }
}

/// A class feature from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAbility {
    pub id: &'static str,
    pub name: &'static str,
    pub class: CharacterClass,
    pub description: &'static str,
    /// Minimum character level.
    pub level: u8,
    /// Uses granted at creation; `None` means unlimited.
    pub uses: Option<AbilityUses>,
    pub effect: AbilityEffect,
    pub tags: &'static [&'static str],
}

struct RawAbility {
    id: &'static str,
    name: &'static str,
    class: CharacterClass,
    description: &'static str,
    level: u8,
    uses: Option<(u8, RechargeType)>,
    effect: &'static str,
    tags: &'static [&'static str],
}

static CLASS_ABILITIES: LazyLock<Vec<ClassAbility>> = LazyLock::new(|| {
    use CharacterClass::*;
    use RechargeType::{LongRest, ShortRest};

    let raw = [
        RawAbility {
            id: "second_wind",
            name: "Second Wind",
            class: Fighter,
            description: "You have a limited well of stamina. As a bonus action, regain 1d10 + your fighter level hit points.",
            level: 1,
            uses: Some((1, ShortRest)),
            effect: "healing:1d10+level",
            tags: &["healing", "bonus_action", "self"],
        },
        RawAbility {
            id: "action_surge",
            name: "Action Surge",
            class: Fighter,
            description: "You can push yourself beyond your normal limits for a moment and take one additional action.",
            level: 2,
            uses: Some((1, ShortRest)),
            effect: "extra_action",
            tags: &["action", "combat"],
        },
        RawAbility {
            id: "sneak_attack",
            name: "Sneak Attack",
            class: Rogue,
            description: "Once per turn, deal extra damage when you hit with a finesse or ranged weapon.",
            level: 1,
            uses: None,
            effect: "sneak_damage",
            tags: &["damage", "stealth"],
        },
        RawAbility {
            id: "cunning_action",
            name: "Cunning Action",
            class: Rogue,
            description: "You can take a Dash, Disengage, or Hide action as a bonus action.",
            level: 2,
            uses: None,
            effect: "bonus_action_options",
            tags: &["bonus_action", "mobility"],
        },
        RawAbility {
            id: "arcane_recovery",
            name: "Arcane Recovery",
            class: Wizard,
            description: "Once per day, study your spellbook to regain some expended spell slots.",
            level: 1,
            uses: Some((1, LongRest)),
            effect: "recover_spell_slots",
            tags: &["spell_slots", "recovery"],
        },
        RawAbility {
            id: "rage",
            name: "Rage",
            class: Barbarian,
            description: "Enter a rage: bonus melee damage and resistance to bludgeoning, piercing and slashing damage.",
            level: 1,
            uses: Some((2, LongRest)),
            effect: "rage",
            tags: &["buff", "bonus_action", "combat"],
        },
        RawAbility {
            id: "bardic_inspiration",
            name: "Bardic Inspiration",
            class: Bard,
            description: "Inspire an ally with a d6 they can add to one ability check, attack roll, or saving throw.",
            level: 1,
            uses: Some((3, LongRest)),
            effect: "inspiration:1d6",
            tags: &["support", "bonus_action"],
        },
        RawAbility {
            id: "channel_divinity",
            name: "Channel Divinity: Turn Undead",
            class: Cleric,
            description: "Present your holy symbol; undead that see or hear you must make a Wisdom saving throw or flee.",
            level: 2,
            uses: Some((1, ShortRest)),
            effect: "turn_undead",
            tags: &["divine", "control"],
        },
        RawAbility {
            id: "lay_on_hands",
            name: "Lay on Hands",
            class: Paladin,
            description: "Your blessed touch heals wounds from a pool of five hit points per paladin level.",
            level: 1,
            uses: Some((1, LongRest)),
            effect: "healing_pool:5",
            tags: &["healing", "touch"],
        },
    ];

    raw.into_iter()
        .map(|r| ClassAbility {
            id: r.id,
            name: r.name,
            class: r.class,
            description: r.description,
            level: r.level,
            uses: r.uses.map(|(max, recharge)| AbilityUses::new(max, recharge)),
            effect: AbilityEffect::parse(r.effect),
            tags: r.tags,
        })
        .collect()
});

/// Catalog entries for a class, in catalog order.
pub fn class_abilities(class: CharacterClass) -> impl Iterator<Item = &'static ClassAbility> {
    CLASS_ABILITIES.iter().filter(move |a| a.class == class)
}

pub fn get_class_ability(class: CharacterClass, id: &str) -> Option<&'static ClassAbility> {
    let id = id.trim().to_lowercase();
    class_abilities(class).find(|a| a.id == id)
}

/// Fresh per-character counters for every limited ability of a class.
pub fn initial_uses(class: CharacterClass) -> BTreeMap<String, AbilityUses> {
    class_abilities(class)
        .filter_map(|a| a.uses.map(|uses| (a.id.to_string(), uses)))
        .collect()
}

/// Abilities the character can use right now.
pub fn available_class_abilities(character: &Character) -> Vec<&'static ClassAbility> {
    class_abilities(character.class)
        .filter(|a| a.level <= character.level)
        .filter(|a| {
            a.uses.is_none()
                || character
                    .ability_uses
                    .get(a.id)
                    .is_some_and(|uses| uses.current > 0)
        })
        .collect()
}

/// Result of using a class ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityOutcome {
    pub ability_id: String,
    pub ability_name: String,
    pub message: String,
    pub healing: i32,
    /// Extra damage to add to an attack (sneak attack).
    pub bonus_damage: i32,
    pub extra_action: bool,
    pub slots_recovered: Vec<u8>,
}

/// Use `id`, spending one use when it is limited.
///
/// Rejections (unknown ability, level too low, no uses left, nothing to
/// recover) leave the character untouched.
pub fn use_class_ability(
    character: &mut Character,
    id: &str,
    dice: &mut DiceRoller,
) -> Result<AbilityOutcome, RulesError> {
    let ability = get_class_ability(character.class, id)
        .ok_or_else(|| RulesError::not_found("Ability", id))?;

    if character.level < ability.level {
        warn!(character = %character.name, ability = ability.id, "Level too low for ability");
        return Err(RulesError::precondition(format!(
            "Not high enough level for {}.",
            ability.name
        )));
    }

    if ability.uses.is_some() {
        let remaining = character
            .ability_uses
            .get(ability.id)
            .map(|uses| uses.current)
            .unwrap_or(0);
        if remaining == 0 {
            warn!(character = %character.name, ability = ability.id, "No uses remaining");
            return Err(RulesError::precondition(format!(
                "No uses of {} remaining.",
                ability.name
            )));
        }
    }

    let recovery = match ability.effect {
        AbilityEffect::RecoverSpellSlots => {
            let plan = plan_arcane_recovery(character);
            if plan.is_empty() {
                return Err(RulesError::precondition("No expended spell slots to recover."));
            }
            plan
        }
        _ => Vec::new(),
    };

    let mut outcome = AbilityOutcome {
        ability_id: ability.id.to_string(),
        ability_name: ability.name.to_string(),
        message: String::new(),
        healing: 0,
        bonus_damage: 0,
        extra_action: false,
        slots_recovered: Vec::new(),
    };

    let effect_message = match ability.effect {
        AbilityEffect::Healing { dice: pool, plus_level } => {
            let bonus = if plus_level { character.level as i32 } else { 0 };
            let amount = dice.roll_pool(pool).total + bonus;
            outcome.healing = character.hit_points.heal(amount);
            format!("Healed for {} HP.", outcome.healing)
        }
        AbilityEffect::HealingPool { per_level } => {
            let pool = per_level as i32 * character.level as i32;
            outcome.healing = character.hit_points.heal(pool);
            format!("Healed for {} HP.", outcome.healing)
        }
        AbilityEffect::ExtraAction => {
            outcome.extra_action = true;
            "Gain an extra action this turn!".to_string()
        }
        AbilityEffect::SneakDamage => {
            let count = (character.level as u32).div_ceil(2);
            outcome.bonus_damage = dice.roll_pool(DicePool::new(count, DieType::D6)).total;
            format!("+{} sneak attack damage!", outcome.bonus_damage)
        }
        AbilityEffect::BonusActionOptions => {
            "Dash, Disengage, or Hide as a bonus action.".to_string()
        }
        AbilityEffect::RecoverSpellSlots => {
            if let Some(slots) = character.spell_slots.as_mut() {
                for level in &recovery {
                    slots.restore_slot(*level);
                }
            }
            outcome.slots_recovered = recovery;
            let levels: Vec<String> = outcome.slots_recovered.iter().map(|l| l.to_string()).collect();
            format!("Recovered spell slots of level {}.", levels.join(", "))
        }
        AbilityEffect::Rage { damage_bonus } => format!(
            "+{damage_bonus} melee damage and resistance to bludgeoning, piercing and slashing."
        ),
        AbilityEffect::Inspiration { die } => format!("An ally gains a {die} inspiration die."),
        AbilityEffect::TurnUndead => {
            let dc = 8 + character.ability_modifier(Ability::Wisdom) + character.proficiency_bonus();
            format!("Undead must succeed on a DC {dc} Wisdom saving throw or flee.")
        }
        AbilityEffect::Other => "Effect applied.".to_string(),
    };

    if ability.uses.is_some() {
        if let Some(uses) = character.ability_uses.get_mut(ability.id) {
            uses.current = uses.current.saturating_sub(1);
        }
    }

    outcome.message = format!("Used {}! {}", ability.name, effect_message);
    debug!(character = %character.name, ability = ability.id, "Used class ability");
    Ok(outcome)
}

/// Highest expended slots first, spending a budget of `ceil(level / 2)`
/// spell levels; slots above 5th level are never recovered.
fn plan_arcane_recovery(character: &Character) -> Vec<u8> {
    let Some(slots) = character.spell_slots.as_ref() else {
        return Vec::new();
    };
    let mut budget = (character.level as u32).div_ceil(2) as u8;
    let mut plan = Vec::new();
    for level in (1..=5u8).rev() {
        let mut expended = slots.slots[level as usize - 1].used;
        while expended > 0 && level <= budget {
            plan.push(level);
            budget -= level;
            expended -= 1;
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::RaceType;

    fn fighter(level: u8) -> Character {
        let mut c = Character::new("Bruni", RaceType::Dwarf, CharacterClass::Fighter, "Lawful Good");
        c.level = level;
        c
    }

    #[test]
    fn test_effect_parsing() {
        assert_eq!(
            AbilityEffect::parse("healing:1d10+level"),
            AbilityEffect::Healing {
                dice: DicePool::new(1, DieType::D10),
                plus_level: true
            }
        );
        assert_eq!(AbilityEffect::parse("extra_action"), AbilityEffect::ExtraAction);
        assert_eq!(
            AbilityEffect::parse("inspiration:1d6"),
            AbilityEffect::Inspiration { die: DieType::D6 }
        );
        assert_eq!(AbilityEffect::parse("juggle"), AbilityEffect::Other);
    }

    #[test]
    fn test_uses_are_per_character() {
        let mut a = fighter(3);
        let b = fighter(3);
        a.hit_points.current = 1;
        let mut dice = DiceRoller::scripted([5]);
        use_class_ability(&mut a, "second_wind", &mut dice).unwrap();

        assert_eq!(a.ability_uses["second_wind"].current, 0);
        assert_eq!(b.ability_uses["second_wind"].current, 1);
        assert_eq!(get_class_ability(CharacterClass::Fighter, "second_wind").unwrap().uses.unwrap().current, 1);
    }

    #[test]
    fn test_second_wind_heals_die_plus_level() {
        let mut c = fighter(3);
        c.hit_points.current = 2;
        let mut dice = DiceRoller::scripted([6]);
        let outcome = use_class_ability(&mut c, "second_wind", &mut dice).unwrap();
        assert_eq!(outcome.healing, 9);
        assert_eq!(outcome.message, "Used Second Wind! Healed for 9 HP.");
    }

    #[test]
    fn test_rejections_do_not_mutate() {
        let mut c = fighter(1);
        let mut dice = DiceRoller::seeded(1);

        let err = use_class_ability(&mut c, "action_surge", &mut dice).unwrap_err();
        assert_eq!(err.to_string(), "Not high enough level for Action Surge.");
        assert_eq!(c.ability_uses["action_surge"].current, 1);

        let err = use_class_ability(&mut c, "fireball", &mut dice).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);

        use_class_ability(&mut c, "second_wind", &mut dice).unwrap();
        let hp = c.hit_points.current;
        let err = use_class_ability(&mut c, "second_wind", &mut dice).unwrap_err();
        assert_eq!(err.to_string(), "No uses of Second Wind remaining.");
        assert_eq!(c.hit_points.current, hp);
    }

    #[test]
    fn test_sneak_attack_dice() {
        let mut rogue = Character::new("Vex", RaceType::Halfling, CharacterClass::Rogue, "Chaotic Neutral");
        rogue.level = 5;
        let mut dice = DiceRoller::scripted([1, 2, 3]);
        let outcome = use_class_ability(&mut rogue, "sneak_attack", &mut dice).unwrap();
        assert_eq!(outcome.bonus_damage, 6);
        assert_eq!(outcome.message, "Used Sneak Attack! +6 sneak attack damage!");
        // Unlimited: still available.
        assert!(use_class_ability(&mut rogue, "sneak_attack", &mut dice).is_ok());
    }

    #[test]
    fn test_arcane_recovery() {
        let mut wizard = Character::new("Elara", RaceType::Elf, CharacterClass::Wizard, "Neutral Good");
        wizard.level = 3;
        wizard.spell_slots = crate::spells::SpellSlots::for_class(CharacterClass::Wizard, 3);
        let mut dice = DiceRoller::seeded(1);

        let err = use_class_ability(&mut wizard, "arcane_recovery", &mut dice).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionFailed);
        assert_eq!(wizard.ability_uses["arcane_recovery"].current, 1);

        let slots = wizard.spell_slots.as_mut().unwrap();
        slots.use_slot(2);
        slots.use_slot(1);
        slots.use_slot(1);

        let outcome = use_class_ability(&mut wizard, "arcane_recovery", &mut dice).unwrap();
        assert_eq!(outcome.slots_recovered, vec![2]);
        let slots = wizard.spell_slots.as_ref().unwrap();
        assert_eq!(slots.available(2), 2);
        assert_eq!(slots.available(1), 2);
    }

    #[test]
    fn test_available_abilities() {
        let mut c = fighter(1);
        let ids: Vec<_> = available_class_abilities(&c).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["second_wind"]);

        c.level = 2;
        c.ability_uses.get_mut("second_wind").unwrap().current = 0;
        let ids: Vec<_> = available_class_abilities(&c).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["action_surge"]);
    }

    #[test]
    fn test_lay_on_hands_pool() {
        let mut paladin = Character::new("Aric", RaceType::Human, CharacterClass::Paladin, "Lawful Good");
        paladin.level = 2;
        paladin.hit_points.maximum = 30;
        paladin.hit_points.current = 5;
        let mut dice = DiceRoller::seeded(1);
        let outcome = use_class_ability(&mut paladin, "lay_on_hands", &mut dice).unwrap();
        assert_eq!(outcome.healing, 10);
        assert_eq!(paladin.hit_points.current, 15);
    }
}
