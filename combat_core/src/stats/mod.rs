//! StatContainer - Bounded stat store with change notification

mod stat;

pub use stat::Stat;

use crate::types::StatKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Notification queued by a [`StatContainer`] when a stat changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatEvent {
    /// A stat's clamped value changed
    Changed { kind: StatKind, old: i32, new: i32 },
    /// Health crossed from above zero to zero
    Died,
}

/// Mapping from stat kind to stat for one combatant
///
/// Writes clamp to the stat's bounds. Notifications are queued and handed out
/// by [`StatContainer::drain_events`]; a `Changed` event is only queued when the
/// clamped value actually differs, and `Died` is queued exactly once per
/// crossing of health from positive to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatContainer {
    stats: HashMap<StatKind, Stat>,
    #[serde(skip)]
    events: Vec<StatEvent>,
}

impl StatContainer {
    /// Create an empty container
    pub fn new() -> Self {
        StatContainer {
            stats: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Starting stats for a fresh player character
    pub fn starting_player() -> Self {
        StatContainer::new()
            .with_stat(Stat::resource(StatKind::Health, 100))
            .with_stat(Stat::resource(StatKind::Energy, 50))
            .with_attribute(StatKind::Strength, 10)
            .with_attribute(StatKind::Intelligence, 10)
            .with_attribute(StatKind::Agility, 10)
            .with_attribute(StatKind::Luck, 5)
            .with_attribute(StatKind::Attack, 0)
            .with_attribute(StatKind::Defense, 5)
            .with_attribute(StatKind::Speed, 10)
    }

    /// Add a stat (replacing any existing stat of the same kind)
    pub fn with_stat(mut self, stat: Stat) -> Self {
        self.insert(stat);
        self
    }

    /// Add an attribute bounded by `[0, MAX_ATTRIBUTE]`
    pub fn with_attribute(self, kind: StatKind, base: i32) -> Self {
        self.with_stat(Stat::new(kind, base, 0, MAX_ATTRIBUTE))
    }

    /// Insert a stat, replacing any existing stat of the same kind
    pub fn insert(&mut self, stat: Stat) {
        self.stats.insert(stat.kind, stat);
    }

    /// Whether a stat of this kind exists
    pub fn has(&self, kind: StatKind) -> bool {
        self.stats.contains_key(&kind)
    }

    /// Current value of a stat. Missing stats read as 0.
    pub fn get(&self, kind: StatKind) -> i32 {
        match self.stats.get(&kind) {
            Some(stat) => stat.current(),
            None => {
                warn!(?kind, "stat not present on container, reading as 0");
                0
            }
        }
    }

    /// Base value of a stat. Missing stats read as 0.
    pub fn base(&self, kind: StatKind) -> i32 {
        self.stats.get(&kind).map(|s| s.base).unwrap_or(0)
    }

    /// Upper bound of a stat. Missing stats read as 0.
    pub fn max(&self, kind: StatKind) -> i32 {
        self.stats.get(&kind).map(|s| s.max()).unwrap_or(0)
    }

    /// Set a stat, clamped, with change notification. Returns the applied delta.
    pub fn set(&mut self, kind: StatKind, value: i32) -> i32 {
        self.write(kind, value, true)
    }

    /// Set a stat without queuing a `Changed` event
    pub fn set_quiet(&mut self, kind: StatKind, value: i32) -> i32 {
        self.write(kind, value, false)
    }

    /// Add `delta` to a stat. Returns the delta actually applied after clamping.
    pub fn modify(&mut self, kind: StatKind, delta: i32) -> i32 {
        self.adjust(kind, delta, true)
    }

    /// Add `delta` to a stat without queuing a `Changed` event
    pub fn modify_quiet(&mut self, kind: StatKind, delta: i32) -> i32 {
        self.adjust(kind, delta, false)
    }

    /// Current health
    pub fn health(&self) -> i32 {
        self.get(StatKind::Health)
    }

    /// Health as a fraction of max health
    pub fn health_ratio(&self) -> f64 {
        self.stats
            .get(&StatKind::Health)
            .map(|s| s.ratio())
            .unwrap_or(0.0)
    }

    /// Whether current health is above zero
    pub fn is_alive(&self) -> bool {
        self.stats
            .get(&StatKind::Health)
            .map(|s| s.current() > 0)
            .unwrap_or(false)
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> Vec<StatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether any notifications are queued
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn adjust(&mut self, kind: StatKind, delta: i32, notify: bool) -> i32 {
        let Some(stat) = self.stats.get(&kind) else {
            warn!(?kind, delta, "cannot modify missing stat");
            return 0;
        };
        let target = stat.current().saturating_add(delta);
        self.write(kind, target, notify)
    }

    fn write(&mut self, kind: StatKind, value: i32, notify: bool) -> i32 {
        let Some(stat) = self.stats.get_mut(&kind) else {
            warn!(?kind, value, "cannot set missing stat");
            return 0;
        };

        let old = stat.set_current(value);
        let new = stat.current();
        self.record(kind, old, new, notify)
    }

    fn record(&mut self, kind: StatKind, old: i32, new: i32, notify: bool) -> i32 {
        if new == old {
            return 0;
        }

        if notify {
            self.events.push(StatEvent::Changed { kind, old, new });
        }
        // Death is derived from the old/new pair, never polled
        if kind == StatKind::Health && old > 0 && new <= 0 {
            self.events.push(StatEvent::Died);
        }

        new - old
    }
}

/// Upper bound for non-resource attributes
pub const MAX_ATTRIBUTE: i32 = 999;

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> StatContainer {
        StatContainer::new()
            .with_stat(Stat::resource(StatKind::Health, 100))
            .with_attribute(StatKind::Strength, 10)
    }

    #[test]
    fn test_get_missing_returns_zero() {
        let stats = container();
        assert_eq!(stats.get(StatKind::Luck), 0);
    }

    #[test]
    fn test_set_clamps_and_notifies() {
        let mut stats = container();
        let delta = stats.set(StatKind::Health, 150);
        assert_eq!(delta, 0);
        assert!(stats.drain_events().is_empty());

        let delta = stats.set(StatKind::Health, 40);
        assert_eq!(delta, -60);
        assert_eq!(
            stats.drain_events(),
            vec![StatEvent::Changed {
                kind: StatKind::Health,
                old: 100,
                new: 40
            }]
        );
    }

    #[test]
    fn test_modify_returns_applied_delta() {
        let mut stats = container();
        assert_eq!(stats.modify(StatKind::Health, -30), -30);
        // Only 30 headroom left
        assert_eq!(stats.modify(StatKind::Health, 50), 30);
        assert_eq!(stats.get(StatKind::Health), 100);
    }

    #[test]
    fn test_modify_quiet_suppresses_change_event() {
        let mut stats = container();
        stats.modify_quiet(StatKind::Strength, 5);
        assert_eq!(stats.get(StatKind::Strength), 15);
        assert!(!stats.has_pending_events());
    }

    #[test]
    fn test_death_fires_once() {
        let mut stats = container();
        stats.modify(StatKind::Health, -100);
        stats.modify(StatKind::Health, -10);
        stats.set(StatKind::Health, 0);

        let deaths = stats
            .drain_events()
            .into_iter()
            .filter(|e| *e == StatEvent::Died)
            .count();
        assert_eq!(deaths, 1);
        assert!(!stats.is_alive());
    }

    #[test]
    fn test_death_fires_again_after_revive() {
        let mut stats = container();
        stats.set(StatKind::Health, 0);
        stats.set(StatKind::Health, 10);
        stats.set(StatKind::Health, 0);

        let deaths = stats
            .drain_events()
            .into_iter()
            .filter(|e| *e == StatEvent::Died)
            .count();
        assert_eq!(deaths, 2);
    }

    #[test]
    fn test_quiet_write_still_reports_death() {
        let mut stats = container();
        stats.set_quiet(StatKind::Health, 0);
        assert_eq!(stats.drain_events(), vec![StatEvent::Died]);
    }

    #[test]
    fn test_modify_missing_is_noop() {
        let mut stats = container();
        assert_eq!(stats.modify(StatKind::Energy, 10), 0);
        assert!(!stats.has(StatKind::Energy));
    }

    #[test]
    fn test_health_ratio() {
        let mut stats = container();
        stats.set(StatKind::Health, 25);
        assert!((stats.health_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
