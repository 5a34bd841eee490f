//! Combat resolution: armor class, attack rolls, damage and healing.

use crate::character::{Ability, Character};
use crate::dice::{Advantage, DicePool, DiceRoller, DieType};
use crate::items::{ArmorWeight, Item};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Damage dealt by an unarmed strike or a weapon with no readable dice.
pub const FALLBACK_DAMAGE: DicePool = DicePool::new(1, DieType::D4);

/// Common D&D damage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn all() -> [DamageType; 13] {
        use DamageType::*;
        [
            Slashing,
            Piercing,
            Bludgeoning,
            Fire,
            Cold,
            Lightning,
            Thunder,
            Acid,
            Poison,
            Necrotic,
            Radiant,
            Force,
            Psychic,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }

    pub fn from_name(name: &str) -> Option<DamageType> {
        let name = name.trim().to_lowercase();
        DamageType::all().into_iter().find(|t| t.name() == name)
    }

    /// First damage type named in free text, e.g. "1d8 slashing damage".
    pub fn find_in(text: &str) -> Option<DamageType> {
        let lower = text.to_lowercase();
        lower
            .split(|c: char| !c.is_ascii_alphabetic())
            .find_map(DamageType::from_name)
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Derived stats
// ============================================================================

/// Armor class from DEX and the given body armor, plus 2 for an equipped shield.
///
/// Armor whose description carries no readable `AC n` leaves the
/// unarmored base in place.
pub fn armor_class(character: &Character, armor: Option<&Item>) -> u8 {
    let dex = character.ability_modifier(Ability::Dexterity) as i32;
    let mut ac = 10 + dex;

    if let Some((armor, base)) = armor.and_then(|a| a.base_armor_class.map(|base| (a, base))) {
        let dex_bonus = match armor.armor_weight() {
            ArmorWeight::Light => dex,
            ArmorWeight::Medium => dex.min(2),
            ArmorWeight::Heavy => 0,
        };
        ac = base as i32 + dex_bonus;
    }

    if character.has_equipped_shield() {
        ac += 2;
    }

    ac.clamp(0, u8::MAX as i32) as u8
}

/// Headline combat numbers for a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack_bonus: i8,
    pub armor_class: u8,
    pub initiative: i8,
    pub spell_attack_bonus: Option<i8>,
    pub spell_save_dc: Option<i8>,
}

pub fn combat_stats(character: &Character) -> CombatStats {
    let str_mod = character.ability_modifier(Ability::Strength);
    let dex_mod = character.ability_modifier(Ability::Dexterity);
    let proficiency = character.proficiency_bonus();

    let casting = character
        .class
        .spellcasting_ability()
        .map(|ability| character.ability_modifier(ability) + proficiency);

    CombatStats {
        attack_bonus: str_mod.max(dex_mod) + proficiency,
        armor_class: armor_class(character, character.equipped_armor()),
        initiative: dex_mod,
        spell_attack_bonus: casting,
        spell_save_dc: casting.map(|bonus| 8 + bonus),
    }
}

impl fmt::Display for CombatStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AC {} | Attack {:+} | Initiative {:+}",
            self.armor_class, self.attack_bonus, self.initiative
        )?;
        if let (Some(bonus), Some(dc)) = (self.spell_attack_bonus, self.spell_save_dc) {
            write!(f, " | Spell Attack {bonus:+} | Spell DC {dc}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Attacks
// ============================================================================

/// A lingering effect described by an attack. Durations are informational:
/// nothing in the engine ticks them down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub debuff: bool,
    pub duration_rounds: u32,
    pub description: String,
    pub value: Option<i32>,
}

impl StatusEffect {
    pub fn poisoned() -> Self {
        Self {
            name: "Poisoned".to_string(),
            debuff: true,
            duration_rounds: 3,
            description: "Disadvantage on attack rolls and ability checks".to_string(),
            value: None,
        }
    }

    pub fn burning() -> Self {
        Self {
            name: "Burning".to_string(),
            debuff: true,
            duration_rounds: 2,
            description: "Takes fire damage at start of turn".to_string(),
            value: Some(1),
        }
    }
}

/// Outcome of a single weapon attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub hit: bool,
    pub critical_hit: bool,
    /// The kept d20 face.
    pub natural_roll: u32,
    /// d20 + attack bonus.
    pub attack_roll: i32,
    pub target_ac: i32,
    pub damage: i32,
    pub damage_rolls: Vec<u32>,
    pub damage_type: Option<DamageType>,
    pub status_effects: Vec<StatusEffect>,
}

/// Resolve one weapon attack against a defender's armor class.
///
/// A natural 20 hits whatever `target_ac` is. Does not apply the damage;
/// callers decide who takes it.
pub fn resolve_attack(
    attacker: &Character,
    weapon: Option<&Item>,
    target_ac: i32,
    advantage: Advantage,
    dice: &mut DiceRoller,
) -> AttackResult {
    let stats = combat_stats(attacker);
    let str_mod = attacker.ability_modifier(Ability::Strength) as i32;
    let dex_mod = attacker.ability_modifier(Ability::Dexterity) as i32;

    let enhancement = weapon.map(|w| w.enhancement_bonus() as i32).unwrap_or(0);
    let attack_bonus = stats.attack_bonus as i32 + enhancement;
    let ability_damage = if weapon.is_some_and(|w| w.is_finesse()) {
        dex_mod.max(str_mod)
    } else {
        str_mod
    };
    let damage_bonus = ability_damage + enhancement;

    let d20 = dice.roll_d20(advantage);
    let attack_roll = d20.kept as i32 + attack_bonus;
    let critical_hit = d20.natural_20();
    let hit = critical_hit || attack_roll >= target_ac;

    let mut result = AttackResult {
        hit,
        critical_hit,
        natural_roll: d20.kept,
        attack_roll,
        target_ac,
        damage: 0,
        damage_rolls: Vec::new(),
        damage_type: weapon.and_then(|w| DamageType::find_in(&w.description)),
        status_effects: Vec::new(),
    };

    if hit {
        let base = weapon.and_then(|w| w.damage).unwrap_or(FALLBACK_DAMAGE);
        let pool = if critical_hit {
            base.with_extra_dice(base.count)
        } else {
            base
        };
        let roll = dice.roll_pool(pool);
        result.damage = (roll.total + damage_bonus).max(1);
        result.damage_rolls = roll.rolls;

        if let Some(weapon) = weapon {
            if weapon.deals(DamageType::Poison) {
                result.status_effects.push(StatusEffect::poisoned());
            }
            if weapon.deals(DamageType::Fire) {
                result.status_effects.push(StatusEffect::burning());
            }
        }
    }

    debug!(
        attacker = %attacker.name,
        weapon = weapon.map(|w| w.name.as_str()).unwrap_or("unarmed"),
        natural = d20.kept,
        total = attack_roll,
        target_ac,
        hit,
        critical = critical_hit,
        damage = result.damage,
        "Resolved attack"
    );

    result
}

/// Apply damage, clamping hit points at zero. Returns hit points lost.
pub fn apply_damage(target: &mut Character, amount: i32) -> i32 {
    target.hit_points.take_damage(amount)
}

/// Heal, clamping at maximum hit points. Returns hit points gained.
pub fn perform_healing(target: &mut Character, amount: i32) -> i32 {
    target.hit_points.heal(amount)
}

/// d20 + DEX modifier.
pub fn roll_initiative(character: &Character, dice: &mut DiceRoller) -> i32 {
    dice.roll_d20(Advantage::Normal).kept as i32
        + character.ability_modifier(Ability::Dexterity) as i32
}

/// Outcome of a concentration save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcentrationCheck {
    pub dc: i32,
    pub total: i32,
    pub maintained: bool,
}

/// CON save against `max(10, damage / 2)`. Spellcasting classes add their
/// proficiency bonus.
pub fn concentration_check(
    character: &Character,
    damage: i32,
    dice: &mut DiceRoller,
) -> ConcentrationCheck {
    let dc = (damage / 2).max(10);
    let mut bonus = character.ability_modifier(Ability::Constitution) as i32;
    if character.class.is_spellcaster() {
        bonus += character.proficiency_bonus() as i32;
    }
    let total = dice.roll_d20(Advantage::Normal).kept as i32 + bonus;
    ConcentrationCheck {
        dc,
        total,
        maintained: total >= dc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AbilityScores, CharacterClass, RaceType};
    use crate::items::{create_item_from_template, Acquisition, ItemType, Rarity, EQUIPPED};

    fn fighter() -> Character {
        let mut c = Character::new("Bruni", RaceType::Dwarf, CharacterClass::Fighter, "Lawful Good");
        c.ability_scores = AbilityScores::new(16, 10, 14, 10, 10, 10);
        c.level = 5;
        c
    }

    fn item(key: &str) -> Item {
        let mut dice = DiceRoller::seeded(11);
        create_item_from_template(key, &Acquisition::default(), &mut dice).unwrap()
    }

    #[test]
    fn test_armor_class_by_weight() {
        let mut c = fighter();
        c.ability_scores.dexterity = 16; // +3

        assert_eq!(armor_class(&c, None), 13);
        assert_eq!(armor_class(&c, Some(&item("leather_armor"))), 14);
        assert_eq!(armor_class(&c, Some(&item("breastplate"))), 16);
        assert_eq!(armor_class(&c, Some(&item("chain_mail"))), 16);
    }

    #[test]
    fn test_armor_without_readable_ac_keeps_base() {
        let c = fighter();
        let odd = Item::new("Mystery Plate", ItemType::Armor, Rarity::Common)
            .with_description("Very shiny")
            .with_property("heavy");
        assert_eq!(armor_class(&c, Some(&odd)), 10);
    }

    #[test]
    fn test_equipped_shield_adds_two() {
        let mut c = fighter();
        let shield = item("shield");
        c.inventory.push(shield.clone());
        assert_eq!(armor_class(&c, None), 10);

        c.inventory[0].properties.insert(EQUIPPED.to_string());
        assert_eq!(armor_class(&c, None), 12);
    }

    #[test]
    fn test_combat_stats() {
        let c = fighter();
        let stats = combat_stats(&c);
        assert_eq!(stats.attack_bonus, 6);
        assert_eq!(stats.initiative, 0);
        assert_eq!(stats.spell_attack_bonus, None);
        assert_eq!(stats.spell_save_dc, None);

        let mut wizard = Character::new("Elara", RaceType::Elf, CharacterClass::Wizard, "NG");
        wizard.ability_scores.intelligence = 18;
        wizard.level = 5;
        let stats = combat_stats(&wizard);
        assert_eq!(stats.spell_attack_bonus, Some(7));
        assert_eq!(stats.spell_save_dc, Some(15));
    }

    #[test]
    fn test_plus_one_longsword_hits() {
        let mut c = fighter();
        c.level = 4;
        let mut sword = item("longsword");
        sword.properties.insert("+1".to_string());

        let mut dice = DiceRoller::scripted([10, 1]);
        let result = resolve_attack(&c, Some(&sword), 15, Advantage::Normal, &mut dice);
        assert_eq!(result.attack_roll, 16);
        assert!(result.hit);
        assert!(!result.critical_hit);
        assert_eq!(result.damage_rolls, vec![1]);
        assert_eq!(result.damage, 5);
        assert_eq!(result.damage_type, Some(DamageType::Slashing));
    }

    #[test]
    fn test_natural_20_always_hits_and_doubles_dice() {
        let c = fighter();
        let sword = item("longsword");
        let mut dice = DiceRoller::scripted([20, 3, 4]);
        let result = resolve_attack(&c, Some(&sword), 999, Advantage::Normal, &mut dice);
        assert!(result.hit);
        assert!(result.critical_hit);
        assert_eq!(result.damage_rolls, vec![3, 4]);
        assert_eq!(result.damage, 3 + 4 + 3);
    }

    #[test]
    fn test_miss_deals_nothing() {
        let c = fighter();
        let mut dice = DiceRoller::scripted([2]);
        let result = resolve_attack(&c, None, 18, Advantage::Normal, &mut dice);
        assert!(!result.hit);
        assert_eq!(result.damage, 0);
        assert!(result.damage_rolls.is_empty());
    }

    #[test]
    fn test_minimum_one_damage() {
        let mut c = fighter();
        c.ability_scores.strength = 1; // -5
        let mut dice = DiceRoller::scripted([19, 1]);
        let result = resolve_attack(&c, None, 5, Advantage::Normal, &mut dice);
        assert!(result.hit);
        assert_eq!(result.damage, 1);
    }

    #[test]
    fn test_finesse_uses_better_ability_for_damage() {
        let mut c = fighter();
        c.ability_scores.strength = 8; // -1
        c.ability_scores.dexterity = 18; // +4
        let rapier = item("rapier");
        let mut dice = DiceRoller::scripted([15, 5]);
        let result = resolve_attack(&c, Some(&rapier), 10, Advantage::Normal, &mut dice);
        assert_eq!(result.damage, 9);
    }

    #[test]
    fn test_fire_weapon_burns() {
        let c = fighter();
        let blade = item("flaming_sword");
        let mut dice = DiceRoller::scripted([18, 4]);
        let result = resolve_attack(&c, Some(&blade), 10, Advantage::Normal, &mut dice);
        assert_eq!(result.status_effects, vec![StatusEffect::burning()]);

        let frost = item("frost_brand");
        let mut dice = DiceRoller::scripted([18, 4]);
        let result = resolve_attack(&c, Some(&frost), 10, Advantage::Normal, &mut dice);
        assert!(result.status_effects.is_empty());
    }

    #[test]
    fn test_damage_and_healing_clamp() {
        let mut c = fighter();
        let max = c.hit_points.maximum;
        assert_eq!(apply_damage(&mut c, max + 50), max);
        assert_eq!(c.hit_points.current, 0);
        assert_eq!(perform_healing(&mut c, max + 50), max);
        assert_eq!(c.hit_points.current, max);
    }

    #[test]
    fn test_concentration_dc() {
        let c = fighter();
        let mut dice = DiceRoller::scripted([10]);
        let check = concentration_check(&c, 30, &mut dice);
        assert_eq!(check.dc, 15);
        assert_eq!(check.total, 12);
        assert!(!check.maintained);

        let mut dice = DiceRoller::scripted([8]);
        let check = concentration_check(&c, 4, &mut dice);
        assert_eq!(check.dc, 10);
        assert!(check.maintained);
    }
}
