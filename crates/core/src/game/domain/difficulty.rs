use std::fmt;

use crate::shared::constants::{MAX_TARGET_PERSONS, MIN_TARGET_PERSONS};

/// Box size range for tier 3, also used for any count outside 3..=7.
const DEFAULT_SIZE_RATIOS: (f64, f64) = (0.25, 0.45);

/// Difficulty tier: the number of faces that must fit inside the box.
///
/// Larger groups get larger boxes. Counts outside the standard tiers are
/// accepted and play with the tier-3 box range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Difficulty {
    target_persons: u32,
}

impl Difficulty {
    pub fn new(target_persons: u32) -> Self {
        Self { target_persons }
    }

    /// The tiers offered on the selection screen.
    pub fn standard_tiers() -> impl Iterator<Item = Difficulty> {
        (MIN_TARGET_PERSONS..=MAX_TARGET_PERSONS).map(Difficulty::new)
    }

    pub fn target_persons(&self) -> u32 {
        self.target_persons
    }

    pub fn is_standard(&self) -> bool {
        (MIN_TARGET_PERSONS..=MAX_TARGET_PERSONS).contains(&self.target_persons)
    }

    /// `(min, max)` box width as a fraction of the frame's shorter side.
    pub fn size_ratios(&self) -> (f64, f64) {
        match self.target_persons {
            3 => (0.25, 0.45),
            4 => (0.35, 0.55),
            5 => (0.45, 0.65),
            6 => (0.55, 0.75),
            7 => (0.65, 0.85),
            _ => DEFAULT_SIZE_RATIOS,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} people", self.target_persons)
    }
}
