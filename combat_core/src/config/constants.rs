//! Combat tuning constants

use serde::{Deserialize, Serialize};

/// Tunable combat constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConstants {
    #[serde(default)]
    pub timing: TimingConstants,
    #[serde(default)]
    pub crit: CritConstants,
    #[serde(default)]
    pub defense: DefenseConstants,
    #[serde(default)]
    pub recovery: RecoveryConstants,
}

impl Default for CombatConstants {
    fn default() -> Self {
        CombatConstants {
            timing: TimingConstants::default(),
            crit: CritConstants::default(),
            defense: DefenseConstants::default(),
            recovery: RecoveryConstants::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConstants {
    /// Pause after an action resolves before the next turn starts (seconds)
    #[serde(default = "default_turn_delay")]
    pub turn_delay: f64,
    /// Pause between the opponent's turn starting and its action (seconds)
    #[serde(default = "default_enemy_action_delay")]
    pub enemy_action_delay: f64,
}

impl Default for TimingConstants {
    fn default() -> Self {
        TimingConstants {
            turn_delay: default_turn_delay(),
            enemy_action_delay: default_enemy_action_delay(),
        }
    }
}

fn default_turn_delay() -> f64 {
    1.0
}
fn default_enemy_action_delay() -> f64 {
    0.75
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritConstants {
    /// Base critical chance (0.05 = 5%)
    #[serde(default = "default_base_chance")]
    pub base_chance: f64,
    /// Critical damage multiplier (1.5 = 150%)
    #[serde(default = "default_damage_multiplier")]
    pub damage_multiplier: f64,
    /// Crit chance gained per point of luck
    #[serde(default = "default_luck_factor")]
    pub luck_factor: f64,
}

impl Default for CritConstants {
    fn default() -> Self {
        CritConstants {
            base_chance: default_base_chance(),
            damage_multiplier: default_damage_multiplier(),
            luck_factor: default_luck_factor(),
        }
    }
}

fn default_base_chance() -> f64 {
    0.05
}
fn default_damage_multiplier() -> f64 {
    1.5
}
fn default_luck_factor() -> f64 {
    0.01
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseConstants {
    /// Cap on a turn-scoped defense bonus
    #[serde(default = "default_max_bonus")]
    pub max_bonus: i32,
    /// Defense bonus lost by both sides after each opponent turn
    #[serde(default = "default_decay")]
    pub decay_per_round: i32,
}

impl Default for DefenseConstants {
    fn default() -> Self {
        DefenseConstants {
            max_bonus: default_max_bonus(),
            decay_per_round: default_decay(),
        }
    }
}

fn default_max_bonus() -> i32 {
    50
}
fn default_decay() -> i32 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConstants {
    /// Energy given back to the player whenever combat ends
    #[serde(default = "default_energy_restore")]
    pub energy_restore_on_end: i32,
    /// Player health (fraction of max) after a defeat
    #[serde(default = "default_defeat_health")]
    pub defeat_health_fraction: f64,
}

impl Default for RecoveryConstants {
    fn default() -> Self {
        RecoveryConstants {
            energy_restore_on_end: default_energy_restore(),
            defeat_health_fraction: default_defeat_health(),
        }
    }
}

fn default_energy_restore() -> i32 {
    30
}
fn default_defeat_health() -> f64 {
    0.25
}

impl CombatConstants {
    /// Check for values the orchestrator cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.timing.turn_delay <= 0.0 || self.timing.enemy_action_delay <= 0.0 {
            return Err("timing delays must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.crit.base_chance) {
            return Err("crit.base_chance must be within [0, 1]".to_string());
        }
        if self.crit.damage_multiplier < 1.0 {
            return Err("crit.damage_multiplier must be at least 1".to_string());
        }
        if self.defense.max_bonus < 0 || self.defense.decay_per_round < 0 {
            return Err("defense constants must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.recovery.defeat_health_fraction) {
            return Err("recovery.defeat_health_fraction must be within [0, 1]".to_string());
        }
        Ok(())
    }
}
