//! Stat - A single bounded integer value

use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// A named stat bounded by `[min, max]`
///
/// `current` is private so that every write goes through [`Stat::set_current`],
/// which clamps to the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub kind: StatKind,
    /// Value the stat was created with (percentage modifiers scale from this)
    pub base: i32,
    current: i32,
    min: i32,
    max: i32,
}

impl Stat {
    /// Create a stat whose current value starts at `base` (clamped)
    pub fn new(kind: StatKind, base: i32, min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Stat {
            kind,
            base,
            current: base.clamp(min, max),
            min,
            max,
        }
    }

    /// Create a resource stat (health, energy) bounded by `[0, max]` and starting full
    pub fn resource(kind: StatKind, max: i32) -> Self {
        Stat::new(kind, max, 0, max.max(0))
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Set the current value, clamped to bounds. Returns the previous value.
    pub fn set_current(&mut self, value: i32) -> i32 {
        let old = self.current;
        self.current = value.clamp(self.min, self.max);
        old
    }

    /// Current value as a fraction of max (0.0 when max is not positive)
    pub fn ratio(&self) -> f64 {
        if self.max <= 0 {
            return 0.0;
        }
        (self.current as f64 / self.max as f64).clamp(0.0, 1.0)
    }
}
