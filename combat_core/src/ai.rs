//! Opponent decision policy
//!
//! A pure function from (pattern, health ratios, thresholds, one uniform draw)
//! to an action. No state is kept between decisions.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opponent behavior rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiPattern {
    /// Weighted roll across all actions
    #[default]
    Random,
    /// Attacks until hurt, then turtles
    Aggressive,
    /// Defends whenever below half health
    Defensive,
    /// Goes for the kill when the player is low
    Finisher,
}

/// Action chosen for the opponent's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentAction {
    Attack,
    Defend,
    SpecialAttack,
}

/// Per-opponent tuning for the decision policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiThresholds {
    /// Aggressive opponents defend below this health ratio
    #[serde(default = "default_low_health")]
    pub low_health_threshold: f64,
    /// Finishers special-attack when the player is below this ratio
    #[serde(default = "default_finisher")]
    pub finisher_threshold: f64,
    #[serde(default = "default_defend_chance")]
    pub defend_chance: f64,
    #[serde(default = "default_special_chance")]
    pub special_attack_chance: f64,
}

impl Default for AiThresholds {
    fn default() -> Self {
        AiThresholds {
            low_health_threshold: default_low_health(),
            finisher_threshold: default_finisher(),
            defend_chance: default_defend_chance(),
            special_attack_chance: default_special_chance(),
        }
    }
}

fn default_low_health() -> f64 {
    0.3
}
fn default_finisher() -> f64 {
    0.3
}
fn default_defend_chance() -> f64 {
    0.2
}
fn default_special_chance() -> f64 {
    0.2
}

/// Defensive opponents defend below this health ratio
pub const DEFENSIVE_HEALTH_THRESHOLD: f64 = 0.5;

/// Normalized health of both sides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthRatios {
    pub opponent: f64,
    pub player: f64,
}

/// Choose an action given one uniform draw in `[0, 1)`
///
/// Cumulative thresholds use strict less-than and are checked in a fixed
/// order: Defend, then SpecialAttack, then Attack.
pub fn decide(
    pattern: AiPattern,
    ratios: HealthRatios,
    thresholds: &AiThresholds,
    roll: f64,
) -> OpponentAction {
    match pattern {
        AiPattern::Random => {
            if roll < thresholds.defend_chance {
                OpponentAction::Defend
            } else if roll < thresholds.defend_chance + thresholds.special_attack_chance {
                OpponentAction::SpecialAttack
            } else {
                OpponentAction::Attack
            }
        }
        AiPattern::Aggressive => {
            if ratios.opponent < thresholds.low_health_threshold {
                OpponentAction::Defend
            } else if roll < thresholds.special_attack_chance {
                OpponentAction::SpecialAttack
            } else {
                OpponentAction::Attack
            }
        }
        AiPattern::Defensive => {
            if ratios.opponent < DEFENSIVE_HEALTH_THRESHOLD {
                OpponentAction::Defend
            } else {
                OpponentAction::Attack
            }
        }
        AiPattern::Finisher => {
            if ratios.player < thresholds.finisher_threshold {
                OpponentAction::SpecialAttack
            } else {
                OpponentAction::Attack
            }
        }
    }
}

/// Choose an action drawing from `rng`
pub fn decide_with_rng(
    pattern: AiPattern,
    ratios: HealthRatios,
    thresholds: &AiThresholds,
    rng: &mut impl Rng,
) -> OpponentAction {
    decide(pattern, ratios, thresholds, rng.gen::<f64>())
}
