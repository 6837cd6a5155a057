//! Combat buffs - Short-lived modifiers scoped to one combat session
//!
//! Unlike status effects these never touch stats and are cleared
//! unconditionally when combat ends.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A temporary damage modifier granted during combat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatBuff {
    /// Buff identifier (non-stackable buffs refresh by id)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Lifetime in seconds
    pub duration: f64,
    /// Clock time at which the buff expires (set when granted)
    #[serde(default)]
    pub end_time: f64,
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f64,
    #[serde(default)]
    pub damage_reduction: f64,
    #[serde(default)]
    pub stackable: bool,
}

fn default_multiplier() -> f64 {
    1.0
}

impl CombatBuff {
    /// Create a neutral buff
    pub fn new(id: &str, name: &str, duration: f64) -> Self {
        CombatBuff {
            id: id.to_string(),
            name: name.to_string(),
            duration,
            end_time: 0.0,
            damage_multiplier: 1.0,
            damage_reduction: 0.0,
            stackable: false,
        }
    }

    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn with_damage_reduction(mut self, reduction: f64) -> Self {
        self.damage_reduction = reduction;
        self
    }

    pub fn stackable(mut self) -> Self {
        self.stackable = true;
        self
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.end_time <= now
    }

    /// Seconds left at clock time `now`
    pub fn remaining(&self, now: f64) -> f64 {
        (self.end_time - now).max(0.0)
    }
}

/// Active combat buffs on the player
#[derive(Debug, Clone, Default)]
pub struct CombatBuffTracker {
    buffs: Vec<CombatBuff>,
}

impl CombatBuffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a buff at clock time `now`
    ///
    /// A non-stackable buff whose id is already active refreshes that
    /// buff's end time instead of adding a second copy.
    pub fn add(&mut self, mut buff: CombatBuff, now: f64) {
        buff.end_time = now + buff.duration;

        if !buff.stackable {
            if let Some(existing) = self.buffs.iter_mut().find(|b| b.id == buff.id) {
                existing.end_time = buff.end_time;
                debug!(buff = %buff.id, "combat buff refreshed");
                return;
            }
        }

        debug!(buff = %buff.id, end_time = buff.end_time, "combat buff granted");
        self.buffs.push(buff);
    }

    /// Remove buffs whose end time has passed. Returns true if any were removed.
    pub fn update(&mut self, now: f64) -> bool {
        let before = self.buffs.len();
        self.buffs.retain(|b| !b.is_expired(now));
        let removed = before - self.buffs.len();
        if removed > 0 {
            debug!(removed, "combat buffs expired");
        }
        removed > 0
    }

    /// Product of all active multipliers (1.0 when empty)
    pub fn damage_multiplier(&self) -> f64 {
        self.buffs.iter().map(|b| b.damage_multiplier).product()
    }

    /// Sum of all active reductions, clamped to [0, 1]
    pub fn damage_reduction(&self) -> f64 {
        self.buffs
            .iter()
            .map(|b| b.damage_reduction)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// Drop every buff regardless of remaining time
    pub fn clear_all(&mut self) {
        self.buffs.clear();
    }

    pub fn has(&self, id: &str) -> bool {
        self.buffs.iter().any(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatBuff> {
        self.buffs.iter()
    }

    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }
}

/// Common buff presets
pub struct BuffPresets;

impl BuffPresets {
    /// Flat damage boost
    pub fn battle_cry(duration: f64) -> CombatBuff {
        CombatBuff::new("buff_battle_cry", "Battle Cry", duration).with_damage_multiplier(1.25)
    }

    /// Damage taken reduced
    pub fn iron_skin(duration: f64) -> CombatBuff {
        CombatBuff::new("buff_iron_skin", "Iron Skin", duration).with_damage_reduction(0.2)
    }

    /// Stackable small damage boost
    pub fn momentum(duration: f64) -> CombatBuff {
        CombatBuff::new("buff_momentum", "Momentum", duration)
            .with_damage_multiplier(1.1)
            .stackable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buff_expires_on_update() {
        let mut tracker = CombatBuffTracker::new();
        tracker.add(BuffPresets::battle_cry(3.0), 10.0);
        assert!(!tracker.update(12.0));
        assert!(tracker.has("buff_battle_cry"));
        assert!(tracker.update(13.0));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_non_stackable_refreshes() {
        let mut tracker = CombatBuffTracker::new();
        tracker.add(BuffPresets::battle_cry(3.0), 0.0);
        tracker.add(BuffPresets::battle_cry(3.0), 2.0);

        assert_eq!(tracker.len(), 1);
        let buff = tracker.iter().next().unwrap();
        assert!((buff.end_time - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stackable_duplicates() {
        let mut tracker = CombatBuffTracker::new();
        tracker.add(BuffPresets::momentum(5.0), 0.0);
        tracker.add(BuffPresets::momentum(5.0), 1.0);

        assert_eq!(tracker.len(), 2);
        assert!((tracker.damage_multiplier() - 1.21).abs() < 1e-9);
    }

    #[test]
    fn test_empty_multiplier_is_one() {
        let tracker = CombatBuffTracker::new();
        assert!((tracker.damage_multiplier() - 1.0).abs() < f64::EPSILON);
        assert!((tracker.damage_reduction() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reduction_clamps() {
        let mut tracker = CombatBuffTracker::new();
        for i in 0..6 {
            tracker.add(
                CombatBuff::new(&format!("ward_{}", i), "Ward", 5.0).with_damage_reduction(0.2),
                0.0,
            );
        }
        assert!((tracker.damage_reduction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_all() {
        let mut tracker = CombatBuffTracker::new();
        tracker.add(BuffPresets::iron_skin(100.0), 0.0);
        tracker.clear_all();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_buff_from_toml_defaults() {
        let buff: CombatBuff = toml::from_str(
            r#"
id = "focus"
duration = 4.0
"#,
        )
        .unwrap();
        assert!((buff.damage_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(!buff.stackable);
    }
}
