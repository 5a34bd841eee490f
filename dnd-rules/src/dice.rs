//! Dice rolling for the rules engine.
//!
//! Every random draw in a session goes through one [`DiceRoller`]: die faces,
//! d20 tests with advantage, percentage chances and loot picks. Seeding the
//! roller makes a whole session reproducible, and queuing forced faces lets
//! tests pin exact outcomes.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Combine two advantage states (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (Advantage::Advantage, Advantage::Disadvantage) => Advantage::Normal,
            (Advantage::Disadvantage, Advantage::Advantage) => Advantage::Normal,
            (Advantage::Advantage, Advantage::Advantage) => Advantage::Advantage,
            (Advantage::Disadvantage, Advantage::Disadvantage) => Advantage::Disadvantage,
        }
    }

    /// Collapse a signed tally of advantage sources into a mode.
    pub fn from_tally(tally: i32) -> Advantage {
        match tally.signum() {
            1 => Advantage::Advantage,
            -1 => Advantage::Disadvantage,
            _ => Advantage::Normal,
        }
    }
}

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A pool of identical dice plus a flat bonus, e.g. `2d4+2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    pub count: u32,
    pub die: DieType,
    pub bonus: i32,
}

impl DicePool {
    pub const fn new(count: u32, die: DieType) -> Self {
        Self {
            count,
            die,
            bonus: 0,
        }
    }

    pub const fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = bonus;
        self
    }

    /// The same pool with `extra` additional dice (upcasting, criticals).
    pub fn with_extra_dice(mut self, extra: u32) -> Self {
        self.count += extra;
        self
    }

    /// Parse `XdY`, `XdY+Z` or `XdY-Z`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(notation.clone()))?
        };

        let (sides_str, bonus) = match rest.find(['+', '-']) {
            Some(pos) => {
                let value: i32 = rest[pos + 1..]
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
                let sign = if rest.as_bytes()[pos] == b'-' { -1 } else { 1 };
                (&rest[..pos], sign * value)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
        let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(DicePool { count, die, bonus })
    }

    /// Find the first `NdM` occurrence inside free text, such as an item
    /// description ("1d8 slashing damage (1d10 when used with two hands)").
    pub fn find_in(text: &str) -> Option<DicePool> {
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i].is_ascii_digit() {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && (bytes[i] == b'd' || bytes[i] == b'D') {
                    let sides_start = i + 1;
                    let mut j = sides_start;
                    while j < bytes.len() && bytes[j].is_ascii_digit() {
                        j += 1;
                    }
                    if j > sides_start {
                        let count = text[start..i].parse().ok();
                        let die = text[sides_start..j]
                            .parse()
                            .ok()
                            .and_then(DieType::from_sides);
                        if let (Some(count), Some(die)) = (count, die) {
                            return Some(DicePool::new(count, die));
                        }
                    }
                    i = j;
                }
            } else {
                i += 1;
            }
        }
        None
    }
}

impl FromStr for DicePool {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DicePool::parse(s)
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}

/// Result of rolling a [`DicePool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRoll {
    pub rolls: Vec<u32>,
    pub bonus: i32,
    pub total: i32,
}

impl fmt::Display for PoolRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.rolls.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}]", faces.join(", "))?;
        match self.bonus {
            0 => {}
            b if b > 0 => write!(f, " + {b}")?,
            b => write!(f, " - {}", b.abs())?,
        }
        write!(f, " = {}", self.total)
    }
}

/// A d20 roll, possibly with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// Every d20 thrown, in order (two under advantage/disadvantage).
    pub rolls: Vec<u32>,
    /// The face that counts.
    pub kept: u32,
    pub advantage: Advantage,
}

impl D20Roll {
    pub fn natural_20(&self) -> bool {
        self.kept == 20
    }

    pub fn natural_1(&self) -> bool {
        self.kept == 1
    }
}

/// The session's single source of randomness.
#[derive(Debug, Clone)]
pub struct DiceRoller {
    rng: StdRng,
    forced: VecDeque<u32>,
}

impl DiceRoller {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            forced: VecDeque::new(),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            forced: VecDeque::new(),
        }
    }

    /// A seeded roller whose next die rolls come out as `faces`, in order.
    /// Forced faces are clamped into the range of the die they land on.
    pub fn scripted(faces: impl IntoIterator<Item = u32>) -> Self {
        let mut roller = Self::seeded(0);
        roller.force(faces);
        roller
    }

    /// Queue faces for upcoming die rolls.
    pub fn force(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.forced.extend(faces);
    }

    /// Number of forced faces not yet consumed.
    pub fn forced_remaining(&self) -> usize {
        self.forced.len()
    }

    /// Roll a single die: uniform over `1..=sides`.
    pub fn roll_die(&mut self, die: DieType) -> u32 {
        let sides = die.sides();
        match self.forced.pop_front() {
            Some(face) => face.clamp(1, sides),
            None => self.rng.gen_range(1..=sides),
        }
    }

    /// Roll a d20. Advantage and disadvantage throw two independent dice and
    /// keep the higher or lower face.
    pub fn roll_d20(&mut self, advantage: Advantage) -> D20Roll {
        let first = self.roll_die(DieType::D20);
        match advantage {
            Advantage::Normal => D20Roll {
                rolls: vec![first],
                kept: first,
                advantage,
            },
            Advantage::Advantage | Advantage::Disadvantage => {
                let second = self.roll_die(DieType::D20);
                let kept = if advantage == Advantage::Advantage {
                    first.max(second)
                } else {
                    first.min(second)
                };
                D20Roll {
                    rolls: vec![first, second],
                    kept,
                    advantage,
                }
            }
        }
    }

    pub fn roll_pool(&mut self, pool: DicePool) -> PoolRoll {
        let rolls: Vec<u32> = (0..pool.count).map(|_| self.roll_die(pool.die)).collect();
        let total = rolls.iter().sum::<u32>() as i32 + pool.bonus;
        PoolRoll {
            rolls,
            bonus: pool.bonus,
            total,
        }
    }

    /// True with probability `p` (clamped into `0.0..=1.0`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform integer in `low..=high`.
    pub fn between(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Pick one element uniformly; `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.rng.gen_range(0..items.len()))
        }
    }

    /// Sixteen random bytes, for identifiers.
    pub fn random_bytes(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// `floor((score - 10) / 2)`.
pub fn ability_modifier(score: u8) -> i8 {
    (score as i16 - 10).div_euclid(2) as i8
}

/// `ceil(level / 4) + 1`.
pub fn proficiency_bonus(level: u8) -> i8 {
    (level as i16 + 3).div_euclid(4) as i8 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pool() {
        let pool = DicePool::parse("2d4+2").unwrap();
        assert_eq!(pool.count, 2);
        assert_eq!(pool.die, DieType::D4);
        assert_eq!(pool.bonus, 2);

        let pool: DicePool = "1d8".parse().unwrap();
        assert_eq!(pool, DicePool::new(1, DieType::D8));

        let pool = DicePool::parse("d6-1").unwrap();
        assert_eq!(pool.count, 1);
        assert_eq!(pool.bonus, -1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(DicePool::parse(""), Err(DiceError::NoDice));
        assert!(matches!(
            DicePool::parse("2d7"),
            Err(DiceError::InvalidDieSize(7))
        ));
        assert!(DicePool::parse("fireball").is_err());
        assert!(DicePool::parse("2d6+x").is_err());
    }

    #[test]
    fn test_find_in_description() {
        let pool = DicePool::find_in("1d8 slashing damage (1d10 when used with two hands)");
        assert_eq!(pool, Some(DicePool::new(1, DieType::D8)));
        assert_eq!(DicePool::find_in("1 piercing damage"), None);
        assert_eq!(DicePool::find_in("AC 16, disadvantage on Stealth"), None);
    }

    #[test]
    fn test_display_pool() {
        assert_eq!(DicePool::new(8, DieType::D6).to_string(), "8d6");
        assert_eq!(
            DicePool::new(1, DieType::D4).with_bonus(1).to_string(),
            "1d4+1"
        );
    }

    #[test]
    fn test_roll_die_range() {
        let mut dice = DiceRoller::seeded(7);
        for _ in 0..500 {
            let face = dice.roll_die(DieType::D6);
            assert!((1..=6).contains(&face));
        }
    }

    #[test]
    fn test_seeded_rollers_agree() {
        let mut a = DiceRoller::seeded(42);
        let mut b = DiceRoller::seeded(42);
        for _ in 0..50 {
            assert_eq!(
                a.roll_d20(Advantage::Advantage),
                b.roll_d20(Advantage::Advantage)
            );
        }
    }

    #[test]
    fn test_forced_faces_are_clamped() {
        let mut dice = DiceRoller::scripted([25, 0, 3]);
        assert_eq!(dice.roll_die(DieType::D20), 20);
        assert_eq!(dice.roll_die(DieType::D6), 1);
        assert_eq!(dice.roll_die(DieType::D4), 3);
        assert_eq!(dice.forced_remaining(), 0);
    }

    #[test]
    fn test_advantage_keeps_higher() {
        let mut dice = DiceRoller::scripted([4, 17, 4, 17]);
        let roll = dice.roll_d20(Advantage::Advantage);
        assert_eq!(roll.rolls, vec![4, 17]);
        assert_eq!(roll.kept, 17);

        let roll = dice.roll_d20(Advantage::Disadvantage);
        assert_eq!(roll.kept, 4);
    }

    #[test]
    fn test_advantage_statistics() {
        let mut dice = DiceRoller::seeded(1234);
        let trials = 4000;
        let adv: u32 = (0..trials)
            .map(|_| dice.roll_d20(Advantage::Advantage).kept)
            .sum();
        let normal: u32 = (0..trials)
            .map(|_| dice.roll_d20(Advantage::Normal).kept)
            .sum();
        let dis: u32 = (0..trials)
            .map(|_| dice.roll_d20(Advantage::Disadvantage).kept)
            .sum();
        assert!(adv > normal);
        assert!(normal > dis);
    }

    #[test]
    fn test_roll_pool_total() {
        let mut dice = DiceRoller::scripted([2, 3]);
        let roll = dice.roll_pool(DicePool::new(2, DieType::D4).with_bonus(2));
        assert_eq!(roll.rolls, vec![2, 3]);
        assert_eq!(roll.total, 7);
        assert_eq!(roll.to_string(), "[2, 3] + 2 = 7");
    }

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(18), 4);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn test_proficiency_bonus() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(8), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn test_advantage_combine() {
        assert_eq!(
            Advantage::Normal.combine(Advantage::Advantage),
            Advantage::Advantage
        );
        assert_eq!(
            Advantage::Advantage.combine(Advantage::Disadvantage),
            Advantage::Normal
        );
        assert_eq!(Advantage::from_tally(2), Advantage::Advantage);
        assert_eq!(Advantage::from_tally(-1), Advantage::Disadvantage);
        assert_eq!(Advantage::from_tally(0), Advantage::Normal);
    }
}
