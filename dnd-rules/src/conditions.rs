//! Condition catalog and the modifiers conditions impose.

use crate::character::{Ability, UnknownName};
use crate::dice::Advantage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// D&D 5e conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

/// Mechanical tags attached to a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionEffect {
    AttacksAdvantage,
    AttacksDisadvantage,
    TargetAttacksAdvantage,
    TargetAttacksDisadvantage,
    AbilityChecksDisadvantage,
    DexSavesDisadvantage,
    AutoFailStrDexSaves,
    SightChecksFail,
    HearingChecksFail,
    CannotAttackCharmer,
    CharmerAdvantageSocial,
    SpeedZero,
    NoSpeedBonus,
    NoActions,
    NoReactions,
    Incapacitated,
    CannotMove,
    CannotSpeak,
    SpeakFalteringly,
    HideAnywhere,
    MeleeCrits,
    MeleeTargetAdvantage,
    RangedTargetDisadvantage,
    CrawlMovement,
    Unaware,
    Prone,
}

impl Condition {
    pub fn all() -> [Condition; 13] {
        use Condition::*;
        [
            Blinded,
            Charmed,
            Deafened,
            Frightened,
            Grappled,
            Incapacitated,
            Invisible,
            Paralyzed,
            Poisoned,
            Prone,
            Restrained,
            Stunned,
            Unconscious,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::Blinded => "Blinded",
            Condition::Charmed => "Charmed",
            Condition::Deafened => "Deafened",
            Condition::Frightened => "Frightened",
            Condition::Grappled => "Grappled",
            Condition::Incapacitated => "Incapacitated",
            Condition::Invisible => "Invisible",
            Condition::Paralyzed => "Paralyzed",
            Condition::Poisoned => "Poisoned",
            Condition::Prone => "Prone",
            Condition::Restrained => "Restrained",
            Condition::Stunned => "Stunned",
            Condition::Unconscious => "Unconscious",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Condition::Blinded => "A blinded creature cannot see and automatically fails any ability check that requires sight.",
            Condition::Charmed => "A charmed creature cannot attack the charmer or target the charmer with harmful abilities or magical effects.",
            Condition::Deafened => "A deafened creature cannot hear and automatically fails any ability check that requires hearing.",
            Condition::Frightened => "A frightened creature has disadvantage on ability checks and attack rolls while the source of its fear is within line of sight.",
            Condition::Grappled => "A grappled creature's speed becomes 0, and it cannot benefit from any bonus to its speed.",
            Condition::Incapacitated => "An incapacitated creature cannot take actions or reactions.",
            Condition::Invisible => "An invisible creature is impossible to see without the aid of magic or a special sense.",
            Condition::Paralyzed => "A paralyzed creature is incapacitated and cannot move or speak.",
            Condition::Poisoned => "A poisoned creature has disadvantage on attack rolls and ability checks.",
            Condition::Prone => "A prone creature's only movement option is to crawl, unless it stands up.",
            Condition::Restrained => "A restrained creature's speed becomes 0, and it cannot benefit from any bonus to its speed.",
            Condition::Stunned => "A stunned creature is incapacitated, cannot move, and can speak only falteringly.",
            Condition::Unconscious => "An unconscious creature is incapacitated, cannot move or speak, and is unaware of its surroundings.",
        }
    }

    pub fn effects(&self) -> &'static [ConditionEffect] {
        use ConditionEffect::*;
        match self {
            Condition::Blinded => &[AttacksDisadvantage, TargetAttacksAdvantage, SightChecksFail],
            Condition::Charmed => &[CannotAttackCharmer, CharmerAdvantageSocial],
            Condition::Deafened => &[HearingChecksFail],
            Condition::Frightened => &[AttacksDisadvantage, AbilityChecksDisadvantage],
            Condition::Grappled => &[SpeedZero, NoSpeedBonus],
            Condition::Incapacitated => &[NoActions, NoReactions],
            Condition::Invisible => &[AttacksAdvantage, TargetAttacksDisadvantage, HideAnywhere],
            Condition::Paralyzed => &[
                Incapacitated,
                CannotMove,
                CannotSpeak,
                AutoFailStrDexSaves,
                MeleeCrits,
            ],
            Condition::Poisoned => &[AttacksDisadvantage, AbilityChecksDisadvantage],
            Condition::Prone => &[
                AttacksDisadvantage,
                MeleeTargetAdvantage,
                RangedTargetDisadvantage,
                CrawlMovement,
            ],
            Condition::Restrained => &[
                SpeedZero,
                AttacksDisadvantage,
                DexSavesDisadvantage,
                TargetAttacksAdvantage,
            ],
            Condition::Stunned => &[
                Incapacitated,
                CannotMove,
                SpeakFalteringly,
                AutoFailStrDexSaves,
            ],
            Condition::Unconscious => &[
                Incapacitated,
                CannotMove,
                CannotSpeak,
                Unaware,
                Prone,
                AutoFailStrDexSaves,
                MeleeCrits,
            ],
        }
    }

    pub fn has_effect(&self, effect: ConditionEffect) -> bool {
        self.effects().contains(&effect)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Condition {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Condition::all()
            .into_iter()
            .find(|c| c.name().to_lowercase() == key)
            .ok_or_else(|| UnknownName {
                kind: "condition",
                name: s.to_string(),
            })
    }
}

/// What kind of d20 test a condition modifier is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    Attack,
    AbilityCheck,
    SavingThrow(Ability),
}

/// Tally `+1`/`-1` per matching effect tag across the active conditions and
/// collapse the sum into a roll mode.
pub fn advantage_from_conditions(conditions: &BTreeSet<Condition>, check: CheckType) -> Advantage {
    let tally: i32 = conditions
        .iter()
        .flat_map(|c| c.effects().iter())
        .map(|effect| match (check, effect) {
            (CheckType::Attack, ConditionEffect::AttacksAdvantage) => 1,
            (CheckType::Attack, ConditionEffect::AttacksDisadvantage) => -1,
            (CheckType::AbilityCheck, ConditionEffect::AbilityChecksDisadvantage) => -1,
            (
                CheckType::SavingThrow(Ability::Dexterity),
                ConditionEffect::DexSavesDisadvantage,
            ) => -1,
            _ => 0,
        })
        .sum();
    Advantage::from_tally(tally)
}

/// Advantage an attacker gets from the defender's conditions.
pub fn advantage_against(defender: &BTreeSet<Condition>) -> Advantage {
    let tally: i32 = defender
        .iter()
        .flat_map(|c| c.effects().iter())
        .map(|effect| match effect {
            ConditionEffect::TargetAttacksAdvantage => 1,
            ConditionEffect::TargetAttacksDisadvantage => -1,
            _ => 0,
        })
        .sum();
    Advantage::from_tally(tally)
}

fn any_effect(conditions: &BTreeSet<Condition>, effect: ConditionEffect) -> bool {
    conditions.iter().any(|c| c.has_effect(effect))
}

/// Paralysis, stunning and unconsciousness make STR and DEX saves fail outright.
pub fn auto_fails_save(conditions: &BTreeSet<Condition>, ability: Ability) -> bool {
    matches!(ability, Ability::Strength | Ability::Dexterity)
        && any_effect(conditions, ConditionEffect::AutoFailStrDexSaves)
}

/// Which kind of action economy slot is being spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Action,
    BonusAction,
    Reaction,
}

pub fn can_take_action(conditions: &BTreeSet<Condition>, kind: ActionKind) -> bool {
    let blocked = any_effect(conditions, ConditionEffect::NoActions)
        || any_effect(conditions, ConditionEffect::Incapacitated);
    let no_reaction =
        kind == ActionKind::Reaction && any_effect(conditions, ConditionEffect::NoReactions);
    !(blocked || no_reaction)
}

/// Walking speed after conditions.
pub fn movement_speed(base_speed: u32, conditions: &BTreeSet<Condition>) -> u32 {
    if any_effect(conditions, ConditionEffect::SpeedZero)
        || any_effect(conditions, ConditionEffect::CannotMove)
    {
        0
    } else {
        base_speed
    }
}
