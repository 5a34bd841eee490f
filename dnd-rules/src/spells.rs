//! Spell catalog, spell slot bookkeeping and spell resolution.

use crate::character::{Ability, CasterProgression, Character, CharacterClass};
use crate::combat::DamageType;
use crate::conditions::{advantage_from_conditions, auto_fails_save, CheckType, Condition};
use crate::dice::{Advantage, DicePool, DiceRoller};
use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Schools of magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl SpellSchool {
    pub fn name(&self) -> &'static str {
        match self {
            SpellSchool::Abjuration => "Abjuration",
            SpellSchool::Conjuration => "Conjuration",
            SpellSchool::Divination => "Divination",
            SpellSchool::Enchantment => "Enchantment",
            SpellSchool::Evocation => "Evocation",
            SpellSchool::Illusion => "Illusion",
            SpellSchool::Necromancy => "Necromancy",
            SpellSchool::Transmutation => "Transmutation",
        }
    }
}

/// A catalog spell. Reference data, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spell {
    pub id: &'static str,
    pub name: &'static str,
    /// 0 for cantrips.
    pub level: u8,
    pub school: SpellSchool,
    pub casting_time: &'static str,
    pub range: &'static str,
    pub components: &'static str,
    pub duration: &'static str,
    pub description: &'static str,
    pub damage_type: Option<DamageType>,
    pub damage_dice: Option<DicePool>,
    pub saving_throw: Option<Ability>,
    pub attack_roll: bool,
    pub healing_dice: Option<DicePool>,
    /// Condition a failed save imposes.
    pub inflicts: Option<Condition>,
    pub tags: &'static [&'static str],
}

impl Spell {
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }

    pub fn requires_concentration(&self) -> bool {
        self.duration.starts_with("Concentration")
    }

    /// Damage with neither an attack roll nor a save always lands.
    pub fn auto_hits(&self) -> bool {
        self.damage_dice.is_some() && !self.attack_roll && self.saving_throw.is_none()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

// ============================================================================
// Catalog
// ============================================================================

static SPELL_DATABASE: LazyLock<BTreeMap<&'static str, Spell>> = LazyLock::new(build_spell_database);

/// Look a spell up by id (`fire_bolt`) or by name (`Fire Bolt`), ignoring case.
pub fn get_spell(id: &str) -> Option<&'static Spell> {
    let key = id.trim().to_lowercase().replace([' ', '-'], "_");
    SPELL_DATABASE.get(key.as_str()).or_else(|| {
        SPELL_DATABASE
            .values()
            .find(|spell| spell.name.eq_ignore_ascii_case(id.trim()))
    })
}

pub fn all_spells() -> impl Iterator<Item = &'static Spell> {
    SPELL_DATABASE.values()
}

pub fn spells_by_level(level: u8) -> impl Iterator<Item = &'static Spell> {
    SPELL_DATABASE.values().filter(move |s| s.level == level)
}

const fn pool(count: u32, die: crate::dice::DieType) -> Option<DicePool> {
    Some(DicePool::new(count, die))
}

fn spell(
    id: &'static str,
    name: &'static str,
    level: u8,
    school: SpellSchool,
    casting_time: &'static str,
    range: &'static str,
    components: &'static str,
    duration: &'static str,
) -> Spell {
    Spell {
        id,
        name,
        level,
        school,
        casting_time,
        range,
        components,
        duration,
        description: "",
        damage_type: None,
        damage_dice: None,
        saving_throw: None,
        attack_roll: false,
        healing_dice: None,
        inflicts: None,
        tags: &[],
    }
}

fn build_spell_database() -> BTreeMap<&'static str, Spell> {
    use crate::dice::DieType::*;
    use Ability::*;
    use SpellSchool::*;

    let spells = vec![
        // Cantrips
        Spell {
            description: "You hurl a bubble of acid. A target must succeed on a Dexterity saving throw or take 1d6 acid damage.",
            damage_type: Some(DamageType::Acid),
            damage_dice: pool(1, D6),
            saving_throw: Some(Dexterity),
            tags: &["cantrip", "damage", "acid", "area_small"],
            ..spell("acid_splash", "Acid Splash", 0, Conjuration, "1 action", "60 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "A ghostly, skeletal hand assails a creature within range with the chill of the grave.",
            damage_type: Some(DamageType::Necrotic),
            damage_dice: pool(1, D8),
            attack_roll: true,
            tags: &["cantrip", "damage", "necrotic", "debuff"],
            ..spell("chill_touch", "Chill Touch", 0, Necromancy, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "A beam of crackling energy streaks toward a creature within range. On a hit, the target takes 1d10 force damage.",
            damage_type: Some(DamageType::Force),
            damage_dice: pool(1, D10),
            attack_roll: true,
            tags: &["cantrip", "damage", "force", "warlock"],
            ..spell("eldritch_blast", "Eldritch Blast", 0, Evocation, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "You hurl a mote of fire at a creature or object within range. On a hit, the target takes 1d10 fire damage.",
            damage_type: Some(DamageType::Fire),
            damage_dice: pool(1, D10),
            attack_roll: true,
            tags: &["cantrip", "damage", "fire"],
            ..spell("fire_bolt", "Fire Bolt", 0, Evocation, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "The object you touch sheds bright light in a 20-foot radius.",
            tags: &["cantrip", "utility", "light"],
            ..spell("light", "Light", 0, Evocation, "1 action", "Touch", "V, M", "1 hour")
        },
        Spell {
            description: "A spectral, floating hand appears at a point you choose within range.",
            tags: &["cantrip", "utility", "manipulation"],
            ..spell("mage_hand", "Mage Hand", 0, Conjuration, "1 action", "30 feet", "V, S", "1 minute")
        },
        Spell {
            description: "You create a sound or an image of an object within range.",
            tags: &["cantrip", "utility", "illusion", "deception"],
            ..spell("minor_illusion", "Minor Illusion", 0, Illusion, "1 action", "30 feet", "S, M", "1 minute")
        },
        Spell {
            description: "A minor magical trick that novice spellcasters use for practice.",
            tags: &["cantrip", "utility", "versatile"],
            ..spell("prestidigitation", "Prestidigitation", 0, Transmutation, "1 action", "10 feet", "V, S", "Up to 1 hour")
        },
        Spell {
            description: "A frigid beam of blue-white light streaks toward a creature within range.",
            damage_type: Some(DamageType::Cold),
            damage_dice: pool(1, D8),
            attack_roll: true,
            tags: &["cantrip", "damage", "cold", "slow"],
            ..spell("ray_of_frost", "Ray of Frost", 0, Evocation, "1 action", "60 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "Flame-like radiance descends on a creature you can see. It must succeed on a Dexterity saving throw or take 1d8 radiant damage.",
            damage_type: Some(DamageType::Radiant),
            damage_dice: pool(1, D8),
            saving_throw: Some(Dexterity),
            tags: &["cantrip", "damage", "radiant", "cleric"],
            ..spell("sacred_flame", "Sacred Flame", 0, Evocation, "1 action", "60 feet", "V, S", "Instantaneous")
        },
        // 1st level
        Spell {
            description: "A thin sheet of flames shoots forth from your outstretched fingertips.",
            damage_type: Some(DamageType::Fire),
            damage_dice: pool(3, D6),
            saving_throw: Some(Dexterity),
            tags: &["damage", "fire", "area", "cone"],
            ..spell("burning_hands", "Burning Hands", 1, Evocation, "1 action", "Self (15-foot cone)", "V, S", "Instantaneous")
        },
        Spell {
            description: "You attempt to charm a humanoid you can see within range. It must make a Wisdom saving throw.",
            saving_throw: Some(Wisdom),
            inflicts: Some(Condition::Charmed),
            tags: &["enchantment", "charm", "social"],
            ..spell("charm_person", "Charm Person", 1, Enchantment, "1 action", "30 feet", "V, S", "1 hour")
        },
        Spell {
            description: "A creature you touch regains hit points.",
            healing_dice: pool(1, D8),
            tags: &["healing", "touch"],
            ..spell("cure_wounds", "Cure Wounds", 1, Evocation, "1 action", "Touch", "V, S", "Instantaneous")
        },
        Spell {
            description: "You sense the presence of magic within 30 feet of you.",
            tags: &["divination", "detection", "concentration"],
            ..spell("detect_magic", "Detect Magic", 1, Divination, "1 action", "Self", "V, S", "Concentration, up to 10 minutes")
        },
        Spell {
            description: "A creature of your choice that you can see within range regains hit points.",
            healing_dice: pool(1, D4),
            tags: &["healing", "bonus_action", "ranged"],
            ..spell("healing_word", "Healing Word", 1, Evocation, "1 bonus action", "60 feet", "V", "Instantaneous")
        },
        Spell {
            description: "You create three glowing darts of magical force. Each dart hits a creature of your choice.",
            damage_type: Some(DamageType::Force),
            damage_dice: Some(DicePool::new(1, D4).with_bonus(1)),
            tags: &["damage", "force", "auto_hit", "multiple"],
            ..spell("magic_missile", "Magic Missile", 1, Evocation, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "An invisible barrier of magical force appears and protects you.",
            tags: &["protection", "reaction", "ac_bonus"],
            ..spell("shield", "Shield", 1, Abjuration, "1 reaction", "Self", "V, S", "1 round")
        },
        Spell {
            description: "This spell sends creatures into a magical slumber.",
            tags: &["enchantment", "area", "incapacitate"],
            ..spell("sleep", "Sleep", 1, Enchantment, "1 action", "90 feet", "V, S, M", "1 minute")
        },
        Spell {
            description: "A wave of thunderous force sweeps out from you.",
            damage_type: Some(DamageType::Thunder),
            damage_dice: pool(2, D8),
            saving_throw: Some(Constitution),
            tags: &["damage", "thunder", "area", "knockback"],
            ..spell("thunderwave", "Thunderwave", 1, Evocation, "1 action", "Self (15-foot cube)", "V, S", "Instantaneous")
        },
        // 2nd level
        Spell {
            description: "A shimmering green arrow streaks toward a target within range and bursts in a spray of acid.",
            damage_type: Some(DamageType::Acid),
            damage_dice: pool(4, D4),
            attack_roll: true,
            tags: &["damage", "acid", "persistent"],
            ..spell("acid_arrow", "Melf's Acid Arrow", 2, Evocation, "1 action", "90 feet", "V, S, M", "Instantaneous")
        },
        Spell {
            description: "Your body becomes blurred, shifting and wavering to all who can see you.",
            tags: &["illusion", "protection", "concentration", "disadvantage"],
            ..spell("blur", "Blur", 2, Illusion, "1 action", "Self", "V", "Concentration, up to 1 minute")
        },
        Spell {
            description: "Choose a humanoid that you can see within range. The target must succeed on a Wisdom saving throw or be paralyzed.",
            saving_throw: Some(Wisdom),
            inflicts: Some(Condition::Paralyzed),
            tags: &["enchantment", "paralysis", "concentration", "control"],
            ..spell("hold_person", "Hold Person", 2, Enchantment, "1 action", "60 feet", "V, S, M", "Concentration, up to 1 minute")
        },
        Spell {
            description: "A creature you touch becomes invisible until the spell ends.",
            tags: &["illusion", "stealth", "concentration", "buff"],
            ..spell("invisibility", "Invisibility", 2, Illusion, "1 action", "Touch", "V, S, M", "Concentration, up to 1 hour")
        },
        Spell {
            description: "Briefly surrounded by silvery mist, you teleport up to 30 feet.",
            tags: &["conjuration", "teleport", "bonus_action", "mobility"],
            ..spell("misty_step", "Misty Step", 2, Conjuration, "1 bonus action", "Self", "V", "Instantaneous")
        },
        Spell {
            description: "You create three rays of fire and hurl them at targets within range.",
            damage_type: Some(DamageType::Fire),
            damage_dice: pool(2, D6),
            attack_roll: true,
            tags: &["damage", "fire", "multiple", "rays"],
            ..spell("scorching_ray", "Scorching Ray", 2, Evocation, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "You conjure a mass of thick, sticky webbing. A creature caught in it must succeed on a Dexterity saving throw or be restrained.",
            saving_throw: Some(Dexterity),
            inflicts: Some(Condition::Restrained),
            tags: &["conjuration", "area", "restrain", "concentration"],
            ..spell("web", "Web", 2, Conjuration, "1 action", "60 feet", "V, S, M", "Concentration, up to 1 hour")
        },
        // 3rd level
        Spell {
            description: "You attempt to interrupt a creature in the process of casting a spell.",
            tags: &["abjuration", "reaction", "counter", "interrupt"],
            ..spell("counterspell", "Counterspell", 3, Abjuration, "1 reaction", "60 feet", "S", "Instantaneous")
        },
        Spell {
            description: "Any spell of 3rd level or lower on the target ends.",
            tags: &["abjuration", "dispel", "utility"],
            ..spell("dispel_magic", "Dispel Magic", 3, Abjuration, "1 action", "120 feet", "V, S", "Instantaneous")
        },
        Spell {
            description: "A bright streak blossoms with a low roar into an explosion of flame. Each creature in a 20-foot radius must make a Dexterity saving throw.",
            damage_type: Some(DamageType::Fire),
            damage_dice: pool(8, D6),
            saving_throw: Some(Dexterity),
            tags: &["damage", "fire", "area", "explosion"],
            ..spell("fireball", "Fireball", 3, Evocation, "1 action", "150 feet", "V, S, M", "Instantaneous")
        },
        Spell {
            description: "You touch a willing creature. The target gains a flying speed of 60 feet.",
            tags: &["transmutation", "movement", "fly", "concentration"],
            ..spell("fly", "Fly", 3, Transmutation, "1 action", "Touch", "V, S, M", "Concentration, up to 10 minutes")
        },
        Spell {
            description: "Choose a willing creature. Its speed is doubled and it gains an additional action on each of its turns.",
            tags: &["transmutation", "buff", "concentration", "speed"],
            ..spell("haste", "Haste", 3, Transmutation, "1 action", "30 feet", "V, S, M", "Concentration, up to 1 minute")
        },
        Spell {
            description: "A stroke of lightning forming a line 100 feet long blasts out from you.",
            damage_type: Some(DamageType::Lightning),
            damage_dice: pool(8, D6),
            saving_throw: Some(Dexterity),
            tags: &["damage", "lightning", "line", "area"],
            ..spell("lightning_bolt", "Lightning Bolt", 3, Evocation, "1 action", "Self (100-foot line)", "V, S, M", "Instantaneous")
        },
        // 4th level and up
        Spell {
            description: "You or a creature you touch becomes invisible, even while attacking or casting spells.",
            tags: &["illusion", "stealth", "concentration", "buff", "greater"],
            ..spell("greater_invisibility", "Greater Invisibility", 4, Illusion, "1 action", "Touch", "V, S", "Concentration, up to 1 minute")
        },
        Spell {
            description: "A hail of rock-hard ice pounds to the ground in a 20-foot-radius cylinder.",
            damage_type: Some(DamageType::Bludgeoning),
            damage_dice: pool(2, D8),
            saving_throw: Some(Dexterity),
            tags: &["damage", "cold", "bludgeoning", "area", "cylinder"],
            ..spell("ice_storm", "Ice Storm", 4, Evocation, "1 action", "300 feet", "V, S, M", "Instantaneous")
        },
        Spell {
            description: "This spell transforms a creature that you can see within range into a new form.",
            saving_throw: Some(Wisdom),
            tags: &["transmutation", "shapechange", "concentration", "control"],
            ..spell("polymorph", "Polymorph", 4, Transmutation, "1 action", "60 feet", "V, S, M", "Concentration, up to 1 hour")
        },
        Spell {
            description: "You create a wall of fire on a solid surface within range.",
            damage_type: Some(DamageType::Fire),
            damage_dice: pool(5, D8),
            saving_throw: Some(Dexterity),
            tags: &["damage", "fire", "area", "wall", "concentration"],
            ..spell("wall_of_fire", "Wall of Fire", 4, Evocation, "1 action", "120 feet", "V, S, M", "Concentration, up to 1 minute")
        },
        Spell {
            description: "A blast of cold air erupts from your hands.",
            damage_type: Some(DamageType::Cold),
            damage_dice: pool(8, D8),
            saving_throw: Some(Constitution),
            tags: &["damage", "cold", "cone", "area"],
            ..spell("cone_of_cold", "Cone of Cold", 5, Evocation, "1 action", "Self (60-foot cone)", "V, S, M", "Instantaneous")
        },
        Spell {
            description: "You attempt to beguile a humanoid that you can see within range. It must succeed on a Wisdom saving throw or be charmed.",
            saving_throw: Some(Wisdom),
            inflicts: Some(Condition::Charmed),
            tags: &["enchantment", "dominate", "concentration", "control"],
            ..spell("dominate_person", "Dominate Person", 5, Enchantment, "1 action", "60 feet", "V, S", "Concentration, up to 1 minute")
        },
        Spell {
            description: "This spell instantly transports you and up to eight willing creatures to a destination you select.",
            tags: &["conjuration", "teleport", "travel", "group"],
            ..spell("teleport", "Teleport", 7, Conjuration, "1 action", "10 feet", "V", "Instantaneous")
        },
    ];

    spells.into_iter().map(|s| (s.id, s)).collect()
}

// ============================================================================
// Spell slots
// ============================================================================

/// Slots available per spell level for a single class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub total: u8,
    pub used: u8,
}

impl SlotInfo {
    pub fn available(&self) -> u8 {
        self.total.saturating_sub(self.used)
    }
}

const FULL_CASTER_SLOTS: [&[u8]; 10] = [
    &[2],
    &[3],
    &[4, 2],
    &[4, 3],
    &[4, 3, 2],
    &[4, 3, 3],
    &[4, 3, 3, 1],
    &[4, 3, 3, 2],
    &[4, 3, 3, 3, 1],
    &[4, 3, 3, 3, 2],
];

/// Half casters use the full-caster row for half their level, starting at 2nd.
const HALF_CASTER_SLOTS: [&[u8]; 6] = [&[], &[2], &[3], &[3], &[4, 2], &[4, 3]];

/// `(slot count, slot level)` for warlocks by character level.
fn pact_slots(level: u8) -> (u8, u8) {
    match level {
        0 | 1 => (1, 1),
        2 => (2, 1),
        3 | 4 => (2, 2),
        5 | 6 => (2, 3),
        7 | 8 => (2, 4),
        _ => (2, 5),
    }
}

/// Per-level slot counters, index 0 holding 1st-level slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlots {
    pub slots: [SlotInfo; 9],
}

impl SpellSlots {
    /// Fresh slots for a class at a level, `None` for classes without spellcasting.
    pub fn for_class(class: CharacterClass, level: u8) -> Option<SpellSlots> {
        let mut slots = SpellSlots::default();
        let level = level.clamp(1, 10);
        match class.caster_progression() {
            CasterProgression::None => return None,
            CasterProgression::Full => {
                for (i, total) in FULL_CASTER_SLOTS[level as usize - 1].iter().enumerate() {
                    slots.slots[i].total = *total;
                }
            }
            CasterProgression::Half => {
                let row = HALF_CASTER_SLOTS[(level as usize / 2).min(HALF_CASTER_SLOTS.len() - 1)];
                for (i, total) in row.iter().enumerate() {
                    slots.slots[i].total = *total;
                }
            }
            CasterProgression::Pact => {
                let (count, slot_level) = pact_slots(level);
                slots.slots[slot_level as usize - 1].total = count;
            }
        }
        Some(slots)
    }

    /// Replace the totals for a new level, keeping what was already spent.
    pub fn update_totals(&mut self, fresh: &SpellSlots) {
        for (slot, new) in self.slots.iter_mut().zip(fresh.slots.iter()) {
            slot.total = new.total;
            slot.used = slot.used.min(slot.total);
        }
    }

    pub fn available(&self, level: u8) -> u8 {
        match level {
            1..=9 => self.slots[level as usize - 1].available(),
            _ => 0,
        }
    }

    pub fn use_slot(&mut self, level: u8) -> bool {
        if self.available(level) == 0 {
            return false;
        }
        self.slots[level as usize - 1].used += 1;
        true
    }

    /// Give back one expended slot. Returns false when none were spent.
    pub fn restore_slot(&mut self, level: u8) -> bool {
        match level {
            1..=9 if self.slots[level as usize - 1].used > 0 => {
                self.slots[level as usize - 1].used -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn recover_all(&mut self) {
        for slot in &mut self.slots {
            slot.used = 0;
        }
    }

    /// Highest spell level with at least one slot, spent or not.
    pub fn highest_level(&self) -> u8 {
        self.slots
            .iter()
            .rposition(|slot| slot.total > 0)
            .map(|i| i as u8 + 1)
            .unwrap_or(0)
    }

    pub fn expended(&self) -> u8 {
        self.slots.iter().map(|slot| slot.used).sum()
    }
}

// ============================================================================
// Casting
// ============================================================================

/// Which armor class a spell attack roll is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellAttackAc {
    Fixed(u8),
    Defender,
}

impl Default for SpellAttackAc {
    fn default() -> Self {
        SpellAttackAc::Fixed(15)
    }
}

/// Session-wide switches that change how spells resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellcastingRules {
    pub attack_ac: SpellAttackAc,
    pub enforce_slots: bool,
}

impl Default for SpellcastingRules {
    fn default() -> Self {
        Self {
            attack_ac: SpellAttackAc::default(),
            enforce_slots: true,
        }
    }
}

/// Who a spell lands on.
pub enum SpellTarget<'a> {
    None,
    Caster,
    Other(&'a mut Character),
}

impl SpellTarget<'_> {
    fn is_none(&self) -> bool {
        matches!(self, SpellTarget::None)
    }
}

/// The target's side of a saving throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSave {
    pub ability: Ability,
    pub dc: i32,
    pub natural_roll: u32,
    pub total: i32,
    pub success: bool,
}

/// What a cast did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellOutcome {
    pub spell_id: String,
    pub spell_name: String,
    /// 0 for cantrips.
    pub slot_level: u8,
    pub damage: i32,
    pub damage_type: Option<DamageType>,
    pub healing: i32,
    /// Set for spell attack rolls.
    pub hit: Option<bool>,
    pub attack_roll: Option<i32>,
    pub save: Option<SpellSave>,
    pub condition_applied: Option<Condition>,
    pub message: String,
}

struct TargetView {
    armor_class: u8,
    save_bonus: i32,
    save_advantage: Advantage,
    auto_fail: bool,
}

fn view_target(target: &Character, save: Option<Ability>) -> TargetView {
    let ability = save.unwrap_or(Ability::Dexterity);
    TargetView {
        armor_class: target.armor_class,
        save_bonus: target.ability_modifier(ability) as i32,
        save_advantage: advantage_from_conditions(&target.conditions, CheckType::SavingThrow(ability)),
        auto_fail: auto_fails_save(&target.conditions, ability),
    }
}

/// Cast `spell_id` using a slot of `slot_level`, resolving its effect on `target`.
///
/// All preconditions are checked before anything is spent, so a rejected
/// cast leaves the caster and target untouched. Cantrips ignore
/// `slot_level`.
pub fn cast_spell(
    caster: &mut Character,
    spell_id: &str,
    slot_level: u8,
    target: SpellTarget<'_>,
    rules: &SpellcastingRules,
    dice: &mut DiceRoller,
) -> Result<SpellOutcome, RulesError> {
    let spell = get_spell(spell_id).ok_or_else(|| RulesError::not_found("Spell", spell_id))?;
    let ability = caster.class.spellcasting_ability().ok_or_else(|| {
        RulesError::precondition(format!("{} cannot cast spells", caster.class.name()))
    })?;

    let slot_level = if spell.is_cantrip() { 0 } else { slot_level };
    if !spell.is_cantrip() {
        if slot_level < spell.level {
            return Err(RulesError::precondition(format!(
                "{} requires a level {} slot",
                spell.name, spell.level
            )));
        }
        if slot_level > 9 {
            return Err(RulesError::precondition(format!(
                "There are no level {slot_level} spell slots"
            )));
        }
    }

    let needs_target =
        spell.damage_dice.is_some() || spell.healing_dice.is_some() || spell.inflicts.is_some();
    if needs_target && target.is_none() {
        return Err(RulesError::invalid_target(format!(
            "{} needs a target",
            spell.name
        )));
    }

    if rules.enforce_slots && slot_level > 0 {
        let available = caster
            .spell_slots
            .as_ref()
            .map(|slots| slots.available(slot_level))
            .unwrap_or(0);
        if available == 0 {
            warn!(caster = %caster.name, spell = spell.id, slot_level, "No spell slot available");
            return Err(RulesError::InsufficientSlots { level: slot_level });
        }
    }

    let modifier = caster.ability_modifier(ability) as i32;
    let proficiency = caster.proficiency_bonus() as i32;
    let attack_bonus = modifier + proficiency;
    let save_dc = 8 + modifier + proficiency;
    let upcast = slot_level.saturating_sub(spell.level) as u32;

    if rules.enforce_slots && slot_level > 0 {
        if let Some(slots) = caster.spell_slots.as_mut() {
            slots.use_slot(slot_level);
        }
    }

    let caster_name = caster.name.clone();
    let target: Option<&mut Character> = match target {
        SpellTarget::None => None,
        SpellTarget::Caster => Some(caster),
        SpellTarget::Other(other) => Some(other),
    };

    let mut outcome = SpellOutcome {
        spell_id: spell.id.to_string(),
        spell_name: spell.name.to_string(),
        slot_level,
        damage: 0,
        damage_type: spell.damage_type,
        healing: 0,
        hit: None,
        attack_roll: None,
        save: None,
        condition_applied: None,
        message: format!("Cast {}!", spell.name),
    };

    let Some(target) = target else {
        debug!(caster = %caster_name, spell = spell.id, "Cast utility spell");
        return Ok(outcome);
    };

    let view = view_target(target, spell.saving_throw);
    let damage_label = spell.damage_type.map(|t| t.name()).unwrap_or("magical");

    if let Some(damage_dice) = spell.damage_dice {
        let pool = damage_dice.with_extra_dice(upcast);
        if spell.attack_roll {
            let target_ac = match rules.attack_ac {
                SpellAttackAc::Fixed(ac) => ac,
                SpellAttackAc::Defender => view.armor_class,
            };
            let d20 = dice.roll_d20(Advantage::Normal);
            let total = d20.kept as i32 + attack_bonus;
            let hit = total >= target_ac as i32;
            outcome.hit = Some(hit);
            outcome.attack_roll = Some(total);
            if hit {
                let damage = dice.roll_pool(pool).total.max(0);
                target.hit_points.take_damage(damage);
                outcome.damage = damage;
                outcome.message += &format!(" Hit for {damage} {damage_label} damage!");
            } else {
                outcome.message += " Missed!";
            }
        } else if let Some(save_ability) = spell.saving_throw {
            let save = roll_save(save_ability, save_dc, &view, dice);
            let rolled = dice.roll_pool(pool).total.max(0);
            let damage = if save.success { rolled / 2 } else { rolled };
            target.hit_points.take_damage(damage);
            outcome.damage = damage;
            outcome.message += &if save.success {
                format!(" Save successful! {damage} {damage_label} damage.")
            } else {
                format!(" Save failed! {damage} {damage_label} damage!")
            };
            outcome.save = Some(save);
        } else {
            let damage = dice.roll_pool(pool).total.max(0);
            target.hit_points.take_damage(damage);
            outcome.damage = damage;
            outcome.message += &format!(" {damage} {damage_label} damage!");
        }
    } else if let (Some(save_ability), Some(condition)) = (spell.saving_throw, spell.inflicts) {
        let save = roll_save(save_ability, save_dc, &view, dice);
        if save.success {
            outcome.message += &format!(" {} resists!", target.name);
        } else {
            target.add_condition(condition);
            outcome.condition_applied = Some(condition);
            outcome.message += &format!(" {} is {}!", target.name, condition.name().to_lowercase());
        }
        outcome.save = Some(save);
    }

    if let Some(healing_dice) = spell.healing_dice {
        let rolled = dice.roll_pool(healing_dice.with_extra_dice(upcast)).total.max(0);
        let healed = target.hit_points.heal(rolled);
        outcome.healing = healed;
        outcome.message += &format!(" Healed for {healed} HP!");
    }

    debug!(
        caster = %caster_name,
        target = %target.name,
        spell = spell.id,
        slot_level,
        damage = outcome.damage,
        healing = outcome.healing,
        "Resolved spell"
    );

    Ok(outcome)
}

fn roll_save(ability: Ability, dc: i32, target: &TargetView, dice: &mut DiceRoller) -> SpellSave {
    let d20 = dice.roll_d20(target.save_advantage);
    let total = d20.kept as i32 + target.save_bonus;
    SpellSave {
        ability,
        dc,
        natural_roll: d20.kept,
        total,
        success: !target.auto_fail && total >= dc,
    }
}
