//! Core types shared across the combat systems

use serde::{Deserialize, Serialize};

/// Named stat kinds a combatant can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    // Resources
    Health,
    Energy,
    // Attributes
    Strength,
    Intelligence,
    Agility,
    Luck,
    // Combat
    Attack,
    Defense,
    Speed,
}

/// Which side of an encounter a combatant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

/// Tolerance used when comparing accumulated time values
pub const TIME_EPSILON: f64 = 1e-9;
