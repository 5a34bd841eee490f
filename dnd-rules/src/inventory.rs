//! Inventory management: carrying, stacking, consumables, equipment and loot.

use crate::character::{Ability, Character, CharacterClass};
use crate::dice::DiceRoller;
use crate::error::RulesError;
use crate::items::{
    create_item_from_template, templates_of_rarity, Acquisition, Item, ItemType, Rarity, ATTUNED,
    EQUIPPED,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// D&D 5e attunement limit.
pub const DEFAULT_ATTUNEMENT_LIMIT: usize = 3;

/// Kilograms carried per point of Strength.
const KG_PER_STRENGTH: f64 = 7.0;

/// Successful inventory operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryOutcome {
    pub message: String,
    /// The item as it now stands (or as it was, when it left the inventory).
    pub item: Item,
    pub healing: i32,
}

impl InventoryOutcome {
    fn new(message: String, item: Item) -> Self {
        Self {
            message,
            item,
            healing: 0,
        }
    }
}

// ============================================================================
// Weight
// ============================================================================

pub fn total_weight(character: &Character) -> f64 {
    character.inventory.iter().map(Item::carried_weight).sum()
}

/// Weight thresholds derived from Strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryingCapacity {
    pub maximum: f64,
    pub push_drag_lift: f64,
    pub encumbered_at: f64,
    pub heavily_encumbered_at: f64,
}

pub fn carrying_capacity(character: &Character) -> CarryingCapacity {
    let maximum = character.ability_scores.get(Ability::Strength) as f64 * KG_PER_STRENGTH;
    CarryingCapacity {
        maximum,
        push_drag_lift: maximum * 2.0,
        encumbered_at: maximum / 3.0,
        heavily_encumbered_at: maximum * 2.0 / 3.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encumbrance {
    Unencumbered,
    Encumbered,
    HeavilyEncumbered,
    OverCapacity,
}

pub fn encumbrance(character: &Character) -> Encumbrance {
    let capacity = carrying_capacity(character);
    let carried = total_weight(character);
    if carried > capacity.maximum {
        Encumbrance::OverCapacity
    } else if carried > capacity.heavily_encumbered_at {
        Encumbrance::HeavilyEncumbered
    } else if carried > capacity.encumbered_at {
        Encumbrance::Encumbered
    } else {
        Encumbrance::Unencumbered
    }
}

// ============================================================================
// Add / remove / use
// ============================================================================

/// Add an item, merging stackable items into an existing stack of the same
/// name and rarity.
///
/// A merged item is absorbed: its id is dropped and the outcome carries the
/// existing stack, whose id is the one to use afterwards.
pub fn add_item(character: &mut Character, mut item: Item) -> Result<InventoryOutcome, RulesError> {
    let capacity = carrying_capacity(character).maximum;
    if total_weight(character) + item.carried_weight() > capacity {
        warn!(character = %character.name, item = %item.name, "Over carrying capacity");
        return Err(RulesError::precondition(format!(
            "Cannot carry {}. Exceeds carrying capacity.",
            item.name
        )));
    }

    if item.is_stackable() {
        if let Some(incoming) = item.uses {
            let existing = character.inventory.iter_mut().find(|held| {
                held.name == item.name && held.rarity == item.rarity && held.uses.is_some()
            });
            if let Some(existing) = existing {
                if let Some(uses) = existing.uses.as_mut() {
                    uses.max += incoming.max;
                    uses.current += incoming.current;
                }
                return Ok(InventoryOutcome::new(
                    format!(
                        "Added {} {}(s) to existing stack.",
                        incoming.current, item.name
                    ),
                    existing.clone(),
                ));
            }
        }
    }

    item.location_state = format!("player:{}", character.name);
    debug!(character = %character.name, item = %item.name, "Added item");
    let message = format!("Added {} to inventory.", item.name);
    character.inventory.push(item.clone());
    Ok(InventoryOutcome::new(message, item))
}

fn position(character: &Character, item_id: &str) -> Result<usize, RulesError> {
    character
        .inventory
        .iter()
        .position(|item| item.id.matches(item_id))
        .ok_or_else(|| RulesError::not_found("Item", item_id))
}

pub fn remove_item(character: &mut Character, item_id: &str) -> Result<InventoryOutcome, RulesError> {
    let index = position(character, item_id)?;
    let item = character.inventory.remove(index);
    if item.is_equipped() {
        character.refresh_armor_class();
    }
    Ok(InventoryOutcome::new(
        format!("Removed {} from inventory.", item.name),
        item,
    ))
}

/// Spend one use of a consumable, applying its healing. The item leaves the
/// inventory when its last use is spent.
pub fn use_consumable(
    character: &mut Character,
    item_id: &str,
    dice: &mut DiceRoller,
) -> Result<InventoryOutcome, RulesError> {
    let index = position(character, item_id)?;
    let item = &character.inventory[index];

    let remaining = match item.uses {
        Some(uses) if item.item_type == ItemType::Consumable => uses.current,
        _ => {
            return Err(RulesError::precondition(format!(
                "{} is not consumable.",
                item.name
            )))
        }
    };
    if remaining == 0 {
        return Err(RulesError::precondition(format!(
            "{} has no uses remaining.",
            item.name
        )));
    }

    let healing = match item.healing_dice() {
        Some(pool) => {
            let rolled = dice.roll_pool(pool).total;
            character.hit_points.heal(rolled)
        }
        None => 0,
    };

    let item = &mut character.inventory[index];
    let left = match item.uses.as_mut() {
        Some(uses) => {
            uses.current -= 1;
            uses.current
        }
        None => 0,
    };
    let snapshot = item.clone();
    if left == 0 {
        character.inventory.remove(index);
    }

    debug!(character = %character.name, item = %snapshot.name, healing, left, "Used consumable");
    Ok(InventoryOutcome {
        message: format!("Used {}. {} uses remaining.", snapshot.name, left),
        item: snapshot,
        healing,
    })
}

// ============================================================================
// Equipment
// ============================================================================

/// Equip a weapon, armor or wondrous item, attuning first when it needs
/// attunement. Equipping a weapon or body armor takes off the previous one.
pub fn equip_item(
    character: &mut Character,
    item_id: &str,
    attunement_limit: usize,
) -> Result<InventoryOutcome, RulesError> {
    let index = position(character, item_id)?;
    let item = &character.inventory[index];

    if !item.item_type.is_equippable() {
        return Err(RulesError::precondition(format!(
            "{} cannot be equipped.",
            item.name
        )));
    }
    if item.is_equipped() {
        return Ok(InventoryOutcome::new(
            format!("{} is already equipped.", item.name),
            item.clone(),
        ));
    }

    let attune = item.requires_attunement() && !item.is_attuned();
    if attune && character.attuned_count() >= attunement_limit {
        warn!(character = %character.name, item = %item.name, "Attunement limit reached");
        return Err(RulesError::precondition(format!(
            "Cannot attune to {}. Maximum of {} attuned items.",
            item.name, attunement_limit
        )));
    }

    let replaces = match item.item_type {
        ItemType::Weapon => Some(ItemType::Weapon),
        ItemType::Armor if !item.is_shield() => Some(ItemType::Armor),
        _ => None,
    };
    if let Some(kind) = replaces {
        for other in character.inventory.iter_mut() {
            if other.item_type == kind && !other.is_shield() && other.is_equipped() {
                other.properties.remove(EQUIPPED);
            }
        }
    }

    let item = &mut character.inventory[index];
    if attune {
        item.properties.insert(ATTUNED.to_string());
    }
    item.properties.insert(EQUIPPED.to_string());
    let item = item.clone();
    character.refresh_armor_class();

    let message = if attune {
        format!("Successfully attuned to and equipped {}.", item.name)
    } else {
        format!("Equipped {}.", item.name)
    };
    Ok(InventoryOutcome::new(message, item))
}

/// Take an item off. Attunement is kept.
pub fn unequip_item(character: &mut Character, item_id: &str) -> Result<InventoryOutcome, RulesError> {
    let index = position(character, item_id)?;
    let item = &mut character.inventory[index];
    if !item.properties.remove(EQUIPPED) {
        return Err(RulesError::precondition(format!(
            "{} is not equipped.",
            item.name
        )));
    }
    let item = item.clone();
    character.refresh_armor_class();
    Ok(InventoryOutcome::new(format!("Unequipped {}.", item.name), item))
}

// ============================================================================
// Queries
// ============================================================================

pub fn inventory_value(character: &Character) -> f64 {
    character
        .inventory
        .iter()
        .map(|item| item.value * item.quantity() as f64)
        .sum()
}

/// Case-insensitive search over name, description, tags and type.
pub fn search_inventory<'a>(character: &'a Character, query: &str) -> Vec<&'a Item> {
    let lowered = query.to_lowercase();
    character
        .inventory
        .iter()
        .filter(|item| item.matches_query(query) || item.item_type.name().contains(&lowered))
        .collect()
}

pub fn find_by_type(character: &Character, item_type: ItemType) -> Vec<&Item> {
    character
        .inventory
        .iter()
        .filter(|item| item.item_type == item_type)
        .collect()
}

pub fn equippable_items(character: &Character) -> Vec<&Item> {
    character
        .inventory
        .iter()
        .filter(|item| item.item_type.is_equippable())
        .collect()
}

// ============================================================================
// Loot and starting gear
// ============================================================================

/// One to three fresh items of `rarity`, provenance `Level N loot`.
pub fn generate_random_loot(level: u8, rarity: Rarity, dice: &mut DiceRoller) -> Vec<Item> {
    let pool = templates_of_rarity(rarity);
    if pool.is_empty() {
        return Vec::new();
    }
    let acquisition = Acquisition::new("loot", "world", format!("Level {level} loot"));
    let count = dice.between(1, 3);
    let mut loot = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if let Some(template) = dice.pick(&pool).copied() {
            loot.push(template.instantiate(&acquisition, dice));
        }
    }
    info!(level, rarity = rarity.name(), count = loot.len(), "Generated loot");
    loot
}

fn starting_kit(class: CharacterClass) -> &'static [&'static str] {
    use CharacterClass::*;
    match class {
        Fighter | Paladin => &["longsword", "chain_mail", "shield", "dagger"],
        Rogue => &["shortsword", "leather_armor", "thieves_tools", "dagger"],
        Wizard | Sorcerer => &["quarterstaff", "dagger"],
        Cleric => &["mace", "scale_mail", "shield", "dagger"],
        Barbarian => &["greataxe", "dagger"],
        Bard => &["rapier", "leather_armor", "dagger"],
        Druid => &["club", "leather_armor", "dagger"],
        Monk => &["shortsword"],
        Ranger => &["longbow", "shortsword", "leather_armor", "dagger"],
        Warlock => &["quarterstaff", "leather_armor", "dagger"],
    }
}

/// Class starting gear with the first weapon, body armor and shield equipped.
pub fn starting_equipment(class: CharacterClass, dice: &mut DiceRoller) -> Result<Vec<Item>, RulesError> {
    let acquisition = Acquisition::new("purchase", "player", "Starting equipment");
    let mut items = starting_kit(class)
        .iter()
        .map(|key| create_item_from_template(key, &acquisition, dice))
        .collect::<Result<Vec<_>, _>>()?;

    let first_weapon = items.iter().position(|i| i.item_type == ItemType::Weapon);
    let first_armor = items
        .iter()
        .position(|i| i.item_type == ItemType::Armor && !i.is_shield());
    let first_shield = items.iter().position(|i| i.is_shield());
    for index in [first_weapon, first_armor, first_shield].into_iter().flatten() {
        items[index].properties.insert(EQUIPPED.to_string());
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::RaceType;
    use crate::items::get_template;

    fn fighter() -> Character {
        Character::new("Bruni", RaceType::Dwarf, CharacterClass::Fighter, "Lawful Good")
    }

    fn make(key: &str, dice: &mut DiceRoller) -> Item {
        create_item_from_template(key, &Acquisition::default(), dice).unwrap()
    }

    #[test]
    fn test_add_and_remove_round_trip_weight() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(4);
        let before = total_weight(&c);
        let sword = make("longsword", &mut dice);
        let id = sword.id.to_string();

        let added = add_item(&mut c, sword).unwrap();
        assert_eq!(added.item.location_state, "player:Bruni");
        assert!((total_weight(&c) - before - 1.4).abs() < 1e-9);

        remove_item(&mut c, &id).unwrap();
        assert!((total_weight(&c) - before).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_rejects_without_mutation() {
        let mut c = fighter();
        c.ability_scores.strength = 1; // 7 kg
        let mut dice = DiceRoller::seeded(4);
        let err = add_item(&mut c, make("chain_mail", &mut dice)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot carry Chain Mail. Exceeds carrying capacity.");
        assert!(c.inventory.is_empty());
    }

    #[test]
    fn test_consumables_stack() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(4);
        add_item(&mut c, make("healing_potion", &mut dice)).unwrap();
        let outcome = add_item(&mut c, make("healing_potion", &mut dice)).unwrap();
        assert_eq!(outcome.message, "Added 1 Potion of Healing(s) to existing stack.");
        assert_eq!(c.inventory.len(), 1);
        let uses = c.inventory[0].uses.unwrap();
        assert_eq!((uses.current, uses.max), (2, 2));
        assert!((total_weight(&c) - 0.4).abs() < 1e-9);
        assert_eq!(outcome.item.id, c.inventory[0].id);
    }

    #[test]
    fn test_stack_counts_against_capacity() {
        let mut c = fighter();
        c.ability_scores.strength = 1; // 7 kg
        let mut dice = DiceRoller::seeded(4);
        let capacity = carrying_capacity(&c).maximum;

        let mut accepted = 0;
        let err = loop {
            match add_item(&mut c, make("healing_potion", &mut dice)) {
                Ok(_) => accepted += 1,
                Err(err) => break err,
            }
            assert!(accepted < 100, "stack grew past capacity");
        };
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionFailed);
        assert!((34..=35).contains(&accepted));
        assert_eq!(c.inventory.len(), 1);
        assert_eq!(c.inventory[0].uses.unwrap().current, accepted);
        assert!(total_weight(&c) <= capacity);

        let id = c.inventory[0].id.to_string();
        let before = total_weight(&c);
        use_consumable(&mut c, &id, &mut dice).unwrap();
        assert!((before - total_weight(&c) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_last_use_removes_consumable() {
        let mut c = fighter();
        c.hit_points.current = 1;
        let mut dice = DiceRoller::scripted([2, 3]);
        let potion = make("healing_potion", &mut dice);
        let id = potion.id.to_string();
        add_item(&mut c, potion).unwrap();

        let outcome = use_consumable(&mut c, &id, &mut dice).unwrap();
        assert_eq!(outcome.healing, 7);
        assert_eq!(outcome.message, "Used Potion of Healing. 0 uses remaining.");
        assert!(c.inventory.is_empty());
        assert_eq!(c.hit_points.current, 8);
    }

    #[test]
    fn test_non_consumable_rejected() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(4);
        let sword = make("longsword", &mut dice);
        let id = sword.id.to_string();
        add_item(&mut c, sword).unwrap();
        let err = use_consumable(&mut c, &id, &mut dice).unwrap_err();
        assert_eq!(err.to_string(), "Longsword is not consumable.");
        assert_eq!(c.inventory.len(), 1);

        let err = use_consumable(&mut c, "missing", &mut dice).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_fourth_attunement_fails_cleanly() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(9);
        let keys = ["ring_of_protection", "cloak_of_protection", "boots_of_speed", "gauntlets_of_ogre_power"];
        let mut ids = Vec::new();
        for key in keys {
            let item = make(key, &mut dice);
            ids.push(item.id.to_string());
            add_item(&mut c, item).unwrap();
        }
        for id in &ids[..3] {
            equip_item(&mut c, id, DEFAULT_ATTUNEMENT_LIMIT).unwrap();
        }
        assert_eq!(c.attuned_count(), 3);

        let before = c.inventory[3].clone();
        let err = equip_item(&mut c, &ids[3], DEFAULT_ATTUNEMENT_LIMIT).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionFailed);
        assert_eq!(c.attuned_count(), 3);
        assert_eq!(c.inventory[3].properties, before.properties);
    }

    #[test]
    fn test_equip_swaps_weapon_and_updates_ac() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(2);
        let sword = make("longsword", &mut dice);
        let dagger = make("dagger", &mut dice);
        let mail = make("chain_mail", &mut dice);
        let (sword_id, dagger_id, mail_id) =
            (sword.id.to_string(), dagger.id.to_string(), mail.id.to_string());
        for item in [sword, dagger, mail] {
            add_item(&mut c, item).unwrap();
        }

        equip_item(&mut c, &sword_id, 3).unwrap();
        equip_item(&mut c, &dagger_id, 3).unwrap();
        assert_eq!(c.equipped_weapon().map(|w| w.name.as_str()), Some("Dagger"));
        assert!(!c.find_item(&sword_id).unwrap().is_equipped());

        equip_item(&mut c, &mail_id, 3).unwrap();
        assert_eq!(c.armor_class, 16);
        unequip_item(&mut c, &mail_id).unwrap();
        assert_eq!(c.armor_class, 11);
        assert!(unequip_item(&mut c, &mail_id).is_err());
    }

    #[test]
    fn test_tools_cannot_be_equipped() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(2);
        let tools = make("thieves_tools", &mut dice);
        let id = tools.id.to_string();
        add_item(&mut c, tools).unwrap();
        assert!(equip_item(&mut c, &id, 3).is_err());
    }

    #[test]
    fn test_queries() {
        let mut c = fighter();
        let mut dice = DiceRoller::seeded(2);
        for key in ["longsword", "healing_potion", "rope_hemp"] {
            add_item(&mut c, make(key, &mut dice)).unwrap();
        }
        assert_eq!(search_inventory(&c, "potion").len(), 1);
        assert_eq!(search_inventory(&c, "WEAPON").len(), 1);
        assert_eq!(find_by_type(&c, ItemType::Misc).len(), 1);
        assert_eq!(equippable_items(&c).len(), 1);
        let expected: f64 = ["longsword", "healing_potion", "rope_hemp"]
            .iter()
            .map(|k| get_template(k).unwrap().value)
            .sum();
        assert!((inventory_value(&c) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_encumbrance_levels() {
        let mut c = fighter(); // STR 15: 105 kg
        assert_eq!(encumbrance(&c), Encumbrance::Unencumbered);
        c.inventory.push(Item::new("Anvil", ItemType::Misc, Rarity::Common).with_weight(50.0));
        assert_eq!(encumbrance(&c), Encumbrance::Encumbered);
        c.inventory.push(Item::new("Anvil", ItemType::Misc, Rarity::Common).with_weight(30.0));
        assert_eq!(encumbrance(&c), Encumbrance::HeavilyEncumbered);
        assert_eq!(carrying_capacity(&c).push_drag_lift, 210.0);
    }

    #[test]
    fn test_random_loot() {
        let mut dice = DiceRoller::seeded(42);
        let loot = generate_random_loot(3, Rarity::Uncommon, &mut dice);
        assert!((1..=3).contains(&loot.len()));
        for item in &loot {
            assert_eq!(item.rarity, Rarity::Uncommon);
            assert_eq!(item.provenance, "Level 3 loot");
        }
        assert!(generate_random_loot(3, Rarity::Artifact, &mut dice).is_empty());
    }

    #[test]
    fn test_starting_equipment() {
        let mut dice = DiceRoller::seeded(8);
        let kit = starting_equipment(CharacterClass::Fighter, &mut dice).unwrap();
        let equipped: Vec<_> = kit.iter().filter(|i| i.is_equipped()).map(|i| i.name.as_str()).collect();
        assert_eq!(equipped, vec!["Longsword", "Chain Mail", "Shield"]);

        let monk = starting_equipment(CharacterClass::Monk, &mut dice).unwrap();
        assert!(monk.iter().all(|i| i.name != "Dagger"));
    }
}
