//! DamageOutcome - Breakdown of one pass through the damage pipeline

use serde::{Deserialize, Serialize};

/// Result of computing (and optionally applying) one hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    // === Offense ===
    /// Base damage plus scaling plus equipment, before crit
    pub raw_damage: i32,
    /// Crit chance that was rolled against (1.0 when guaranteed)
    pub crit_chance: f64,
    pub is_critical: bool,
    /// Damage after crit and the attacker's buff multiplier
    pub buffed_damage: f64,

    // === Mitigation ===
    /// Defense actually subtracted after penetration
    pub effective_defense: i32,
    /// Damage after defense and the attacker's effect multiplier (at least 1)
    pub mitigated_damage: i32,
    /// Reduction fraction applied last
    pub reduction: f64,
    /// Damage dealt to health
    pub final_damage: i32,

    // === State Changes ===
    pub health_before: i32,
    pub health_after: i32,
    pub is_killing_blow: bool,
}

impl DamageOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Damage removed by defense, multipliers and reduction combined
    pub fn total_mitigated(&self) -> i32 {
        (self.buffed_damage.round() as i32 - self.final_damage).max(0)
    }

    /// Health actually lost (can be less than `final_damage` at the floor)
    pub fn health_lost(&self) -> i32 {
        self.health_before - self.health_after
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} damage", self.final_damage)];

        if self.is_critical {
            parts.push("critical".to_string());
        }

        if self.effective_defense > 0 {
            parts.push(format!("{} blocked by defense", self.effective_defense));
        }

        if self.reduction > 0.0 {
            parts.push(format!("{:.0}% reduced", self.reduction * 100.0));
        }

        if self.is_killing_blow {
            parts.push("FATAL".to_string());
        }

        parts.join(", ")
    }
}
