//! Items, their typed effects, and the standard item catalog.
//!
//! Effect strings such as `"healing:2d4+2"` or `"ac_base:14,dex_max:2"` are
//! parsed into [`ItemEffect`] values once, when the catalog is built. Weapon
//! damage dice and armor base AC are likewise read out of the description
//! text once, when an item is created or its description changes.

use crate::character::RechargeType;
use crate::combat::DamageType;
use crate::dice::{DicePool, DiceRoller};
use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Property tag set on an equipped item.
pub const EQUIPPED: &str = "equipped";
/// Property tag set on an item bonded through attunement.
pub const ATTUNED: &str = "attuned";
/// Property/prerequisite tag for items that must be attuned before use.
pub const ATTUNEMENT_REQUIRED: &str = "attunement_required";

// ============================================================================
// Identity and classification
// ============================================================================

/// Unique identifier for an item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// An id drawn from the session's random source, so seeded sessions
    /// produce the same ids.
    pub fn from_dice(dice: &mut DiceRoller) -> Self {
        Self(uuid::Builder::from_random_bytes(dice.random_bytes()).into_uuid())
    }

    /// Does this id match a caller-supplied string?
    pub fn matches(&self, text: &str) -> bool {
        Uuid::parse_str(text.trim()).map(|u| u == self.0).unwrap_or(false)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Tool,
    Consumable,
    Wondrous,
    Quest,
    Currency,
    Misc,
}

impl ItemType {
    /// Types that can carry the `equipped` tag.
    pub fn is_equippable(&self) -> bool {
        matches!(self, ItemType::Weapon | ItemType::Armor | ItemType::Wondrous)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemType::Weapon => "weapon",
            ItemType::Armor => "armor",
            ItemType::Tool => "tool",
            ItemType::Consumable => "consumable",
            ItemType::Wondrous => "wondrous",
            ItemType::Quest => "quest",
            ItemType::Currency => "currency",
            ItemType::Misc => "misc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    VeryRare,
    Legendary,
    Artifact,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::VeryRare => "very rare",
            Rarity::Legendary => "legendary",
            Rarity::Artifact => "artifact",
        }
    }
}

/// How much Dexterity an armor lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorWeight {
    Light,
    Medium,
    Heavy,
}

// ============================================================================
// Effects
// ============================================================================

/// A single parsed effect of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemEffect {
    Heal { dice: DicePool },
    AcBase { value: u8 },
    DexMax { value: u8 },
    AcBonus { value: i8 },
    AttackBonus { value: i8 },
    DamageBonus { value: i8 },
    ExtraDamage { dice: DicePool, damage_type: DamageType },
    Resistance { damage_type: DamageType },
    SavingThrowBonus { value: i8 },
    StealthDisadvantage,
    Light { bright: u32, dim: u32 },
    SetStrength { value: u8 },
    Restrain,
    PoisonSaveAdvantage,
    SpeedDouble,
    ExtraStorage { kg: u32 },
    ToolBonus { activity: String, value: i8 },
    Other { key: String, value: Option<String> },
}

impl ItemEffect {
    /// Parse a comma-separated effect list. Unrecognized entries are kept
    /// as [`ItemEffect::Other`] rather than rejected.
    pub fn parse_list(text: &str) -> Vec<ItemEffect> {
        text.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ItemEffect::parse)
            .collect()
    }

    pub fn parse(entry: &str) -> ItemEffect {
        let (key, value) = match entry.split_once(':') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (entry.trim(), None),
        };
        let signed = || value.and_then(|v| v.trim_start_matches('+').parse::<i8>().ok());
        let unsigned = || value.and_then(|v| v.parse::<u8>().ok());

        let parsed = match key {
            "healing" => value
                .and_then(|v| DicePool::parse(v).ok())
                .map(|dice| ItemEffect::Heal { dice }),
            "ac_base" => unsigned().map(|value| ItemEffect::AcBase { value }),
            "dex_max" => unsigned().map(|value| ItemEffect::DexMax { value }),
            "ac_bonus" => signed().map(|value| ItemEffect::AcBonus { value }),
            "attack_bonus" => signed().map(|value| ItemEffect::AttackBonus { value }),
            "damage_bonus" => signed().map(|value| ItemEffect::DamageBonus { value }),
            "saving_throws" => signed().map(|value| ItemEffect::SavingThrowBonus { value }),
            "str_set" => unsigned().map(|value| ItemEffect::SetStrength { value }),
            "stealth_disadvantage" => Some(ItemEffect::StealthDisadvantage),
            "restrain" => Some(ItemEffect::Restrain),
            "poison_advantage" => Some(ItemEffect::PoisonSaveAdvantage),
            "speed_double" => Some(ItemEffect::SpeedDouble),
            "extra_storage" => value
                .and_then(|v| v.parse().ok())
                .map(|kg| ItemEffect::ExtraStorage { kg }),
            "light" => value.and_then(|v| {
                let (bright, dim) = v.split_once('/')?;
                Some(ItemEffect::Light {
                    bright: bright.parse().ok()?,
                    dim: dim.parse().ok()?,
                })
            }),
            "lockpicking" | "trap_disarm" | "metalwork" => {
                signed().map(|value| ItemEffect::ToolBonus {
                    activity: key.to_string(),
                    value,
                })
            }
            _ => {
                if let Some(kind) = key.strip_suffix("_damage") {
                    let damage_type = DamageType::from_name(kind);
                    let dice = value.and_then(|v| DicePool::parse(v).ok());
                    damage_type
                        .zip(dice)
                        .map(|(damage_type, dice)| ItemEffect::ExtraDamage { dice, damage_type })
                } else if let Some(kind) = key.strip_suffix("_resistance") {
                    DamageType::from_name(kind)
                        .map(|damage_type| ItemEffect::Resistance { damage_type })
                } else {
                    None
                }
            }
        };

        parsed.unwrap_or_else(|| ItemEffect::Other {
            key: key.to_string(),
            value: value.map(str::to_string),
        })
    }
}

/// Limited charges on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUses {
    pub max: u32,
    pub current: u32,
    pub recharge: RechargeType,
}

impl ItemUses {
    pub fn single() -> Self {
        Self {
            max: 1,
            current: 1,
            recharge: RechargeType::None,
        }
    }
}

/// Read `AC <n>` out of free text (case-insensitive).
pub fn parse_armor_class(description: &str) -> Option<u8> {
    let lower = description.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find("ac") {
        let mut i = search_from + offset + 2;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i > digits_start {
            return lower[digits_start..i].parse().ok();
        }
        search_from += offset + 2;
    }
    None
}

// ============================================================================
// Item
// ============================================================================

/// An item instance carried by a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Catalog key the item was created from, if any.
    pub template_key: Option<String>,
    pub name: String,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub properties: BTreeSet<String>,
    /// Kilograms per unit. A stack weighs this times its remaining uses.
    pub weight: f64,
    /// Value per unit.
    pub value: f64,
    pub description: String,
    pub prerequisites: Vec<String>,
    pub effects: Vec<ItemEffect>,
    pub uses: Option<ItemUses>,
    pub location_state: String,
    pub discovery_requirements: String,
    pub acquisition_method: String,
    pub provenance: String,
    pub tags: BTreeSet<String>,
    /// Damage dice read from the description.
    pub damage: Option<DicePool>,
    /// Base armor class read from the description.
    pub base_armor_class: Option<u8>,
}

impl Item {
    pub fn new(name: impl Into<String>, item_type: ItemType, rarity: Rarity) -> Self {
        Self {
            id: ItemId::new(),
            template_key: None,
            name: name.into(),
            item_type,
            rarity,
            properties: BTreeSet::new(),
            weight: 0.0,
            value: 0.0,
            description: String::new(),
            prerequisites: Vec::new(),
            effects: Vec::new(),
            uses: (item_type == ItemType::Consumable).then(ItemUses::single),
            location_state: String::new(),
            discovery_requirements: String::new(),
            acquisition_method: String::new(),
            provenance: String::new(),
            tags: BTreeSet::new(),
            damage: None,
            base_armor_class: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self.damage = DicePool::find_in(&self.description);
        self.base_armor_class = parse_armor_class(&self.description);
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties.insert(property.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value.max(0.0);
        self
    }

    pub fn with_effects(mut self, effects: &str) -> Self {
        self.effects = ItemEffect::parse_list(effects);
        self
    }

    pub fn with_uses(mut self, uses: ItemUses) -> Self {
        self.uses = Some(uses);
        self
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains(property)
    }

    pub fn is_equipped(&self) -> bool {
        self.has_property(EQUIPPED)
    }

    pub fn is_attuned(&self) -> bool {
        self.has_property(ATTUNED)
    }

    pub fn requires_attunement(&self) -> bool {
        self.has_property(ATTUNEMENT_REQUIRED)
            || self.prerequisites.iter().any(|p| p == ATTUNEMENT_REQUIRED)
    }

    pub fn is_shield(&self) -> bool {
        self.item_type == ItemType::Armor && self.has_property("shield")
    }

    pub fn is_finesse(&self) -> bool {
        self.has_property("finesse")
    }

    /// Consumables, currency and anything tagged `stackable` merge into an
    /// existing stack of the same name and rarity.
    pub fn is_stackable(&self) -> bool {
        matches!(self.item_type, ItemType::Consumable | ItemType::Currency)
            || self.tags.contains("stackable")
    }

    /// Units held: remaining uses for a stack, otherwise one.
    pub fn quantity(&self) -> u32 {
        match self.uses {
            Some(uses) if self.is_stackable() => uses.current,
            _ => 1,
        }
    }

    /// Kilograms carried for the whole stack.
    pub fn carried_weight(&self) -> f64 {
        self.weight * self.quantity() as f64
    }

    /// Numeric enhancement from a `+N` property tag.
    pub fn enhancement_bonus(&self) -> i8 {
        self.properties
            .iter()
            .filter_map(|p| p.strip_prefix('+'))
            .filter_map(|n| n.parse::<i8>().ok())
            .max()
            .unwrap_or(0)
    }

    pub fn armor_weight(&self) -> ArmorWeight {
        if self.has_property("heavy") {
            ArmorWeight::Heavy
        } else if self.has_property("medium") {
            ArmorWeight::Medium
        } else {
            ArmorWeight::Light
        }
    }

    pub fn healing_dice(&self) -> Option<DicePool> {
        self.effects.iter().find_map(|effect| match effect {
            ItemEffect::Heal { dice } => Some(*dice),
            _ => None,
        })
    }

    pub fn extra_damage(&self) -> impl Iterator<Item = (DicePool, DamageType)> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            ItemEffect::ExtraDamage { dice, damage_type } => Some((*dice, *damage_type)),
            _ => None,
        })
    }

    /// Does this item deal extra damage of the given type?
    pub fn deals(&self, damage_type: DamageType) -> bool {
        self.extra_damage().any(|(_, t)| t == damage_type)
    }

    /// Case-insensitive match against name, description and tags.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A catalog entry items are instantiated from.
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub properties: &'static [&'static str],
    pub weight: f64,
    pub value: f64,
    pub description: &'static str,
    pub effects: Vec<ItemEffect>,
    pub tags: &'static [&'static str],
    pub damage: Option<DicePool>,
    pub base_armor_class: Option<u8>,
}

/// Where a freshly created item came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub method: String,
    pub location: String,
    pub provenance: String,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            method: "loot".to_string(),
            location: "world".to_string(),
            provenance: "Generated".to_string(),
        }
    }
}

impl Acquisition {
    pub fn new(
        method: impl Into<String>,
        location: impl Into<String>,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            location: location.into(),
            provenance: provenance.into(),
        }
    }
}

impl ItemTemplate {
    /// Create a fresh item instance with a new id.
    pub fn instantiate(&self, acquisition: &Acquisition, dice: &mut DiceRoller) -> Item {
        let requires_attunement = self.properties.contains(&ATTUNEMENT_REQUIRED);
        Item {
            id: ItemId::from_dice(dice),
            template_key: Some(self.key.to_string()),
            name: self.name.to_string(),
            item_type: self.item_type,
            rarity: self.rarity,
            properties: self.properties.iter().map(|p| p.to_string()).collect(),
            weight: self.weight,
            value: self.value,
            description: self.description.to_string(),
            prerequisites: if requires_attunement {
                vec![ATTUNEMENT_REQUIRED.to_string()]
            } else {
                Vec::new()
            },
            effects: self.effects.clone(),
            uses: (self.item_type == ItemType::Consumable).then(ItemUses::single),
            location_state: acquisition.location.clone(),
            discovery_requirements: String::new(),
            acquisition_method: acquisition.method.clone(),
            provenance: acquisition.provenance.clone(),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            damage: self.damage,
            base_armor_class: self.base_armor_class,
        }
    }
}

type RawTemplate = (
    &'static str,
    &'static str,
    ItemType,
    Rarity,
    &'static [&'static str],
    f64,
    f64,
    &'static str,
    &'static str,
    &'static [&'static str],
);

fn build_catalog(raw: &[RawTemplate]) -> BTreeMap<&'static str, ItemTemplate> {
    raw.iter()
        .map(
            |&(key, name, item_type, rarity, properties, weight, value, description, effects, tags)| {
                let template = ItemTemplate {
                    key,
                    name,
                    item_type,
                    rarity,
                    properties,
                    weight,
                    value,
                    description,
                    effects: ItemEffect::parse_list(effects),
                    tags,
                    damage: DicePool::find_in(description),
                    base_armor_class: parse_armor_class(description),
                };
                (key, template)
            },
        )
        .collect()
}

lazy_static::lazy_static! {
    /// Every item template, keyed by template key.
    pub static ref ITEM_TEMPLATES: BTreeMap<&'static str, ItemTemplate> = {
        use ItemType::*;
        use Rarity::*;
        let raw: &[RawTemplate] = &[
            // Simple melee weapons
            ("club", "Club", Weapon, Common, &["light", "simple"], 0.9, 0.1,
                "1d4 bludgeoning damage", "", &["melee", "simple", "light"]),
            ("dagger", "Dagger", Weapon, Common, &["finesse", "light", "thrown", "simple"], 0.5, 2.0,
                "1d4 piercing damage. Range 20/60 feet when thrown", "", &["melee", "ranged", "finesse", "thrown"]),
            ("handaxe", "Handaxe", Weapon, Common, &["light", "thrown", "simple"], 0.9, 5.0,
                "1d6 slashing damage. Range 20/60 feet when thrown", "", &["melee", "thrown", "axe"]),
            ("javelin", "Javelin", Weapon, Common, &["thrown", "simple"], 0.9, 0.5,
                "1d6 piercing damage. Range 30/120 feet", "", &["melee", "thrown", "spear"]),
            ("mace", "Mace", Weapon, Common, &["simple"], 1.8, 5.0,
                "1d6 bludgeoning damage", "", &["melee", "bludgeoning"]),
            ("quarterstaff", "Quarterstaff", Weapon, Common, &["versatile", "simple"], 1.8, 0.2,
                "1d6 bludgeoning damage (1d8 when used with two hands)", "", &["melee", "versatile", "staff"]),
            ("spear", "Spear", Weapon, Common, &["thrown", "versatile", "simple"], 1.4, 1.0,
                "1d6 piercing damage (1d8 when used with two hands). Range 20/60 feet when thrown", "", &["melee", "thrown", "versatile", "spear"]),
            // Simple ranged weapons
            ("crossbow_light", "Light Crossbow", Weapon, Common, &["ammunition", "loading", "two_handed", "simple"], 2.3, 25.0,
                "1d8 piercing damage. Range 80/320 feet", "", &["ranged", "crossbow", "two_handed"]),
            ("dart", "Dart", Weapon, Common, &["finesse", "thrown", "simple"], 0.1, 0.05,
                "1d4 piercing damage. Range 20/60 feet", "", &["ranged", "thrown", "finesse"]),
            ("shortbow", "Shortbow", Weapon, Common, &["ammunition", "two_handed", "simple"], 0.9, 25.0,
                "1d6 piercing damage. Range 80/320 feet", "", &["ranged", "bow", "two_handed"]),
            ("sling", "Sling", Weapon, Common, &["ammunition", "simple"], 0.0, 0.1,
                "1d4 bludgeoning damage. Range 30/120 feet", "", &["ranged", "sling"]),
            // Martial melee weapons
            ("battleaxe", "Battleaxe", Weapon, Common, &["versatile", "martial"], 1.8, 10.0,
                "1d8 slashing damage (1d10 when used with two hands)", "", &["melee", "axe", "versatile"]),
            ("flail", "Flail", Weapon, Common, &["martial"], 0.9, 10.0,
                "1d8 bludgeoning damage", "", &["melee", "bludgeoning", "chain"]),
            ("glaive", "Glaive", Weapon, Common, &["heavy", "reach", "two_handed", "martial"], 2.7, 20.0,
                "1d10 slashing damage. Reach 10 feet", "", &["melee", "polearm", "reach", "two_handed"]),
            ("greataxe", "Greataxe", Weapon, Common, &["heavy", "two_handed", "martial"], 3.2, 30.0,
                "1d12 slashing damage", "", &["melee", "axe", "two_handed", "heavy"]),
            ("greatsword", "Greatsword", Weapon, Common, &["heavy", "two_handed", "martial"], 2.7, 50.0,
                "2d6 slashing damage", "", &["melee", "sword", "two_handed", "heavy"]),
            ("halberd", "Halberd", Weapon, Common, &["heavy", "reach", "two_handed", "martial"], 2.7, 20.0,
                "1d10 slashing damage. Reach 10 feet", "", &["melee", "polearm", "reach", "two_handed"]),
            ("lance", "Lance", Weapon, Common, &["reach", "special", "martial"], 2.7, 10.0,
                "1d12 piercing damage. Reach 10 feet. Special: disadvantage when attacking targets within 5 feet unless mounted", "", &["melee", "spear", "reach", "mounted"]),
            ("longsword", "Longsword", Weapon, Common, &["versatile", "martial"], 1.4, 15.0,
                "1d8 slashing damage (1d10 when used with two hands)", "", &["melee", "sword", "versatile"]),
            ("maul", "Maul", Weapon, Common, &["heavy", "two_handed", "martial"], 4.5, 10.0,
                "2d6 bludgeoning damage", "", &["melee", "bludgeoning", "two_handed", "heavy"]),
            ("morningstar", "Morningstar", Weapon, Common, &["martial"], 1.8, 15.0,
                "1d8 piercing damage", "", &["melee", "piercing", "spiked"]),
            ("pike", "Pike", Weapon, Common, &["heavy", "reach", "two_handed", "martial"], 8.2, 5.0,
                "1d10 piercing damage. Reach 10 feet", "", &["melee", "spear", "reach", "two_handed"]),
            ("rapier", "Rapier", Weapon, Common, &["finesse", "martial"], 0.9, 25.0,
                "1d8 piercing damage", "", &["melee", "sword", "finesse"]),
            ("scimitar", "Scimitar", Weapon, Common, &["finesse", "light", "martial"], 1.4, 25.0,
                "1d6 slashing damage", "", &["melee", "sword", "finesse", "light"]),
            ("shortsword", "Shortsword", Weapon, Common, &["finesse", "light", "martial"], 0.9, 10.0,
                "1d6 piercing damage", "", &["melee", "sword", "finesse", "light"]),
            ("trident", "Trident", Weapon, Common, &["thrown", "versatile", "martial"], 1.8, 5.0,
                "1d6 piercing damage (1d8 when used with two hands). Range 20/60 feet when thrown", "", &["melee", "thrown", "versatile", "spear"]),
            ("war_pick", "War Pick", Weapon, Common, &["martial"], 0.9, 5.0,
                "1d8 piercing damage", "", &["melee", "pick", "piercing"]),
            ("warhammer", "Warhammer", Weapon, Common, &["versatile", "martial"], 0.9, 15.0,
                "1d8 bludgeoning damage (1d10 when used with two hands)", "", &["melee", "hammer", "versatile"]),
            ("whip", "Whip", Weapon, Common, &["finesse", "reach", "martial"], 1.4, 2.0,
                "1d4 slashing damage. Reach 10 feet", "", &["melee", "whip", "finesse", "reach"]),
            // Martial ranged weapons
            ("blowgun", "Blowgun", Weapon, Common, &["ammunition", "loading", "martial"], 0.5, 10.0,
                "1 piercing damage. Range 25/100 feet", "", &["ranged", "blowgun", "stealth"]),
            ("crossbow_hand", "Hand Crossbow", Weapon, Common, &["ammunition", "light", "loading", "martial"], 1.4, 75.0,
                "1d6 piercing damage. Range 30/120 feet", "", &["ranged", "crossbow", "light"]),
            ("crossbow_heavy", "Heavy Crossbow", Weapon, Common, &["ammunition", "heavy", "loading", "two_handed", "martial"], 8.2, 50.0,
                "1d10 piercing damage. Range 100/400 feet", "", &["ranged", "crossbow", "heavy", "two_handed"]),
            ("longbow", "Longbow", Weapon, Common, &["ammunition", "heavy", "two_handed", "martial"], 0.9, 50.0,
                "1d8 piercing damage. Range 150/600 feet", "", &["ranged", "bow", "heavy", "two_handed"]),
            ("net", "Net", Weapon, Common, &["special", "thrown", "martial"], 1.4, 1.0,
                "No damage. Range 5/15 feet. Special: restrains Large or smaller creatures on hit", "restrain", &["ranged", "thrown", "special", "restraint"]),
            // Light armor
            ("leather_armor", "Leather Armor", Armor, Common, &["light"], 4.5, 10.0,
                "AC 11 + Dex modifier", "ac_base:11", &["armor", "light"]),
            ("studded_leather", "Studded Leather", Armor, Common, &["light"], 6.0, 45.0,
                "AC 12 + Dex modifier", "ac_base:12", &["armor", "light"]),
            ("padded_armor", "Padded Armor", Armor, Common, &["light", "stealth_disadvantage"], 3.6, 5.0,
                "AC 11 + Dex modifier. Disadvantage on Stealth checks", "ac_base:11,stealth_disadvantage", &["armor", "light"]),
            // Medium armor
            ("hide_armor", "Hide Armor", Armor, Common, &["medium"], 5.4, 10.0,
                "AC 12 + Dex modifier (max 2)", "ac_base:12,dex_max:2", &["armor", "medium"]),
            ("chain_shirt", "Chain Shirt", Armor, Common, &["medium"], 9.1, 50.0,
                "AC 13 + Dex modifier (max 2)", "ac_base:13,dex_max:2", &["armor", "medium", "mail"]),
            ("scale_mail", "Scale Mail", Armor, Common, &["medium", "stealth_disadvantage"], 20.4, 50.0,
                "AC 14 + Dex modifier (max 2). Disadvantage on Stealth checks", "ac_base:14,dex_max:2,stealth_disadvantage", &["armor", "medium"]),
            ("breastplate", "Breastplate", Armor, Common, &["medium"], 9.1, 400.0,
                "AC 14 + Dex modifier (max 2)", "ac_base:14,dex_max:2", &["armor", "medium", "plate"]),
            ("half_plate", "Half Plate", Armor, Common, &["medium", "stealth_disadvantage"], 18.1, 750.0,
                "AC 15 + Dex modifier (max 2). Disadvantage on Stealth checks", "ac_base:15,dex_max:2,stealth_disadvantage", &["armor", "medium", "plate"]),
            // Heavy armor
            ("ring_mail", "Ring Mail", Armor, Common, &["heavy", "stealth_disadvantage"], 18.1, 30.0,
                "AC 14. Heavy armor. Disadvantage on Stealth checks", "ac_base:14,stealth_disadvantage", &["armor", "heavy"]),
            ("chain_mail", "Chain Mail", Armor, Common, &["heavy", "stealth_disadvantage"], 25.0, 75.0,
                "AC 16. Heavy armor. Disadvantage on Stealth checks", "ac_base:16,stealth_disadvantage", &["armor", "heavy", "mail"]),
            ("splint_armor", "Splint Armor", Armor, Common, &["heavy", "stealth_disadvantage"], 27.2, 200.0,
                "AC 17. Heavy armor. Disadvantage on Stealth checks", "ac_base:17,stealth_disadvantage", &["armor", "heavy"]),
            ("plate_armor", "Plate Armor", Armor, Common, &["heavy", "stealth_disadvantage"], 29.5, 1500.0,
                "AC 18. Heavy armor. Disadvantage on Stealth checks", "ac_base:18,stealth_disadvantage", &["armor", "heavy", "plate"]),
            ("shield", "Shield", Armor, Common, &["shield"], 2.7, 10.0,
                "+2 AC bonus", "ac_bonus:+2", &["shield", "armor"]),
            // Consumables
            ("healing_potion", "Potion of Healing", Consumable, Common, &["consumable", "magical"], 0.2, 50.0,
                "Heals 2d4 + 2 hit points when consumed", "healing:2d4+2", &["potion", "healing"]),
            ("greater_healing_potion", "Potion of Greater Healing", Consumable, Uncommon, &["consumable", "magical"], 0.2, 150.0,
                "Heals 4d4 + 4 hit points when consumed", "healing:4d4+4", &["potion", "healing", "greater"]),
            ("superior_healing_potion", "Potion of Superior Healing", Consumable, Rare, &["consumable", "magical"], 0.2, 500.0,
                "Heals 8d4 + 8 hit points when consumed", "healing:8d4+8", &["potion", "healing", "superior"]),
            ("supreme_healing_potion", "Potion of Supreme Healing", Consumable, VeryRare, &["consumable", "magical"], 0.2, 1350.0,
                "Heals 10d4 + 20 hit points when consumed", "healing:10d4+20", &["potion", "healing", "supreme"]),
            ("antitoxin", "Antitoxin", Consumable, Common, &["consumable"], 0.2, 50.0,
                "Advantage on saving throws against poison for 1 hour", "poison_advantage:1h", &["potion", "poison", "medicine"]),
            // Tools and gear
            ("thieves_tools", "Thieves' Tools", Tool, Common, &["tool"], 0.5, 25.0,
                "Used for picking locks and disarming traps", "lockpicking:+2,trap_disarm:+2", &["tools", "rogue", "stealth"]),
            ("smiths_tools", "Smith's Tools", Tool, Common, &["tool"], 3.6, 20.0,
                "Used for crafting and repairing metal items", "metalwork:+2", &["tools", "crafting", "smith"]),
            ("rope_hemp", "Hemp Rope (50 feet)", Misc, Common, &[], 4.5, 2.0,
                "50 feet of sturdy hemp rope", "", &["utility", "rope", "climbing"]),
            ("rope_silk", "Silk Rope (50 feet)", Misc, Common, &[], 2.3, 10.0,
                "50 feet of strong silk rope", "", &["utility", "rope", "climbing", "light"]),
            ("grappling_hook", "Grappling Hook", Misc, Common, &[], 1.8, 2.0,
                "Iron hook for climbing and utility", "", &["utility", "climbing", "iron"]),
            ("crowbar", "Crowbar", Tool, Common, &["tool"], 2.3, 2.0,
                "Advantage on Strength checks where leverage can be applied", "leverage:advantage", &["tool", "utility", "strength"]),
            ("torch", "Torch", Misc, Common, &["light"], 0.5, 0.01,
                "Bright light 20 feet, dim light 20 feet beyond. Burns for 1 hour", "light:20/40,duration:1h", &["utility", "light", "fire"]),
            ("lantern_hooded", "Hooded Lantern", Misc, Common, &["light"], 0.9, 5.0,
                "Bright light 30 feet, dim light 30 feet beyond. Burns for 6 hours on a flask of oil", "light:30/60,duration:6h", &["utility", "light", "oil"]),
            // Magic items
            ("weapon_plus_1", "+1 Weapon", Weapon, Uncommon, &["magical", "+1"], 1.4, 500.0,
                "+1 bonus to attack and damage rolls", "attack_bonus:+1,damage_bonus:+1", &["magical", "enhancement"]),
            ("armor_plus_1", "+1 Armor", Armor, Rare, &["magical", "+1"], 15.0, 1000.0,
                "+1 bonus to AC", "ac_bonus:+1", &["magical", "armor", "enhancement"]),
            ("shield_plus_1", "+1 Shield", Armor, Uncommon, &["shield", "magical", "+1"], 2.7, 750.0,
                "+3 AC bonus total (+2 base +1 enhancement)", "ac_bonus:+3", &["shield", "magical", "enhancement"]),
            ("flaming_sword", "Flame Tongue", Weapon, Rare, &["versatile", "martial", "magical", ATTUNEMENT_REQUIRED], 1.4, 2000.0,
                "Longsword. Bonus action to ignite: sheds bright light and deals extra 2d6 fire damage", "fire_damage:2d6,light:40/40", &["melee", "sword", "magical", "fire", "light"]),
            ("frost_brand", "Frost Brand", Weapon, VeryRare, &["versatile", "martial", "magical", ATTUNEMENT_REQUIRED], 1.4, 5000.0,
                "+1 sword. Extra 1d6 cold damage. Fire resistance. Extinguishes fires.", "attack_bonus:+1,damage_bonus:+1,cold_damage:1d6,fire_resistance", &["melee", "sword", "magical", "cold", "resistance"]),
            ("cloak_of_protection", "Cloak of Protection", Wondrous, Uncommon, &["magical", ATTUNEMENT_REQUIRED], 1.0, 500.0,
                "+1 bonus to AC and saving throws while worn", "ac_bonus:+1,saving_throws:+1", &["cloak", "protection", "magical", "saves"]),
            ("ring_of_protection", "Ring of Protection", Wondrous, Rare, &["magical", ATTUNEMENT_REQUIRED], 0.0, 1000.0,
                "+1 bonus to AC and saving throws while worn", "ac_bonus:+1,saving_throws:+1", &["ring", "protection", "magical", "saves"]),
            ("bag_of_holding", "Bag of Holding", Wondrous, Uncommon, &["magical"], 6.8, 2000.0,
                "This bag has an interior space considerably larger than its outside dimensions", "extra_storage:500", &["bag", "storage", "magical", "utility"]),
            ("boots_of_speed", "Boots of Speed", Wondrous, Rare, &["magical", ATTUNEMENT_REQUIRED], 0.5, 2000.0,
                "Double speed for 10 minutes. Once per day.", "speed_double:10min,uses:1/day", &["boots", "speed", "magical", "movement"]),
            ("gauntlets_of_ogre_power", "Gauntlets of Ogre Power", Wondrous, Uncommon, &["magical", ATTUNEMENT_REQUIRED], 0.9, 1000.0,
                "Your Strength score is 19 while you wear these gauntlets", "str_set:19", &["gauntlets", "strength", "magical", "enhancement"]),
        ];
        build_catalog(raw)
    };
}

/// Look up a template by key.
pub fn get_template(key: &str) -> Option<&'static ItemTemplate> {
    ITEM_TEMPLATES.get(key.trim())
}

/// Instantiate a catalog item with a fresh id.
pub fn create_item_from_template(
    key: &str,
    acquisition: &Acquisition,
    dice: &mut DiceRoller,
) -> Result<Item, RulesError> {
    get_template(key)
        .map(|template| template.instantiate(acquisition, dice))
        .ok_or_else(|| RulesError::not_found("Item template", key))
}

/// Templates of a given rarity, in catalog order.
pub fn templates_of_rarity(rarity: Rarity) -> Vec<&'static ItemTemplate> {
    ITEM_TEMPLATES
        .values()
        .filter(|template| template.rarity == rarity)
        .collect()
}
