//! Companion dice roller. Independent of the map state.

use rand::Rng;

pub const MAX_DICE: u32 = 20;
pub const MIN_SIDES: u32 = 2;
pub const MAX_SIDES: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub rolls: Vec<u32>,
}

impl DiceRoll {
    pub fn total(&self) -> u32 {
        self.rolls.iter().sum()
    }
}

/// Rolls `count` dice with `sides` faces each. Out-of-range requests are
/// clamped to `1..=MAX_DICE` dice and `MIN_SIDES..=MAX_SIDES` faces.
pub fn roll<R: Rng>(count: i64, sides: i64, rng: &mut R) -> DiceRoll {
    let count = count.clamp(1, i64::from(MAX_DICE)) as u32;
    let sides = sides.clamp(i64::from(MIN_SIDES), i64::from(MAX_SIDES)) as u32;
    let rolls = (0..count).map(|_| rng.random_range(1..=sides)).collect();
    DiceRoll {
        count,
        sides,
        rolls,
    }
}
