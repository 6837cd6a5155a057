//! StatusEffectEngine - Applies, stacks, ticks and expires effects on one entity
//!
//! The engine never holds its owner. Every mutating call takes the owner's
//! [`StatContainer`] so modifiers and tick damage always land on the entity
//! the effects belong to.

use super::{ActiveStatusEffect, StatusEffectTemplate};
use crate::stats::StatContainer;
use crate::types::{StatKind, TIME_EPSILON};
use tracing::{debug, warn};

/// Notification queued by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EffectEvent {
    Applied { id: String, name: String },
    Stacked { id: String, name: String, stacks: u32 },
    Refreshed { id: String, name: String },
    /// `amount` is health removed (negative when healing)
    Ticked { id: String, name: String, amount: i32 },
    Expired { id: String, name: String },
    Removed { id: String, name: String },
}

/// Collection of active status effects for one entity
#[derive(Debug, Clone, Default)]
pub struct StatusEffectEngine {
    active: Vec<ActiveStatusEffect>,
    events: Vec<EffectEvent>,
}

impl StatusEffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a template, stacking and/or refreshing an existing instance
    pub fn apply(&mut self, template: &StatusEffectTemplate, owner: &mut StatContainer) {
        let Some(index) = self.position(&template.id) else {
            let mut effect = ActiveStatusEffect::new(template.clone());
            apply_modifiers(&mut effect, owner);
            debug!(effect = %template.id, "status effect applied");
            self.events.push(EffectEvent::Applied {
                id: template.id.clone(),
                name: template.name.clone(),
            });
            self.active.push(effect);
            return;
        };

        let effect = &mut self.active[index];

        if template.stacking.stackable && effect.stack_count() < template.max_stacks() {
            reverse_modifiers(effect, owner);
            effect.add_stack();
            apply_modifiers(effect, owner);
            self.events.push(EffectEvent::Stacked {
                id: template.id.clone(),
                name: template.name.clone(),
                stacks: effect.stack_count(),
            });
        }

        if template.stacking.refresh_on_reapply {
            effect.refresh();
            self.events.push(EffectEvent::Refreshed {
                id: template.id.clone(),
                name: template.name.clone(),
            });
        }
    }

    /// Apply a template that may be missing (e.g. an unresolved catalog lookup)
    pub fn apply_opt(&mut self, template: Option<&StatusEffectTemplate>, owner: &mut StatContainer) {
        match template {
            Some(template) => self.apply(template, owner),
            None => warn!("tried to apply a missing status effect template"),
        }
    }

    /// Advance all effects by `delta` seconds
    ///
    /// Periodic ticks are processed before expiry, so an effect whose final
    /// tick lands on its last instant still deals that tick. Multiple elapsed
    /// ticks in one update are all applied, but never past the effect's end.
    pub fn tick(&mut self, delta: f64, owner: &mut StatContainer) {
        if delta <= 0.0 {
            return;
        }

        for effect in self.active.iter_mut() {
            let window = if effect.is_permanent() {
                delta
            } else {
                delta.min(effect.remaining_duration.max(0.0))
            };

            if effect.template.ticks() {
                effect.time_until_next_tick -= window;
                while effect.time_until_next_tick <= TIME_EPSILON {
                    let amount = effect.tick_amount();
                    owner.modify(StatKind::Health, -amount);
                    self.events.push(EffectEvent::Ticked {
                        id: effect.template.id.clone(),
                        name: effect.template.name.clone(),
                        amount,
                    });
                    effect.time_until_next_tick += effect.template.tick_interval;
                }
            }

            if !effect.is_permanent() {
                effect.remaining_duration -= delta;
            }
        }

        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|e| e.is_expired());
        self.active = kept;

        for mut effect in expired {
            reverse_modifiers(&mut effect, owner);
            debug!(effect = %effect.id(), "status effect expired");
            self.events.push(EffectEvent::Expired {
                id: effect.template.id.clone(),
                name: effect.template.name.clone(),
            });
        }
    }

    /// Remove a single effect by id. Returns true if it was active.
    pub fn remove(&mut self, id: &str, owner: &mut StatContainer) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let effect = self.active.remove(index);
        self.finish_removal(effect, owner);
        true
    }

    /// Remove every active effect
    pub fn clear(&mut self, owner: &mut StatContainer) {
        for effect in std::mem::take(&mut self.active) {
            self.finish_removal(effect, owner);
        }
    }

    /// Remove debuffs the player is allowed to cleanse. Returns how many were removed.
    pub fn purge_debuffs(&mut self, owner: &mut StatContainer) -> usize {
        let (purged, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|e| e.template.is_debuff && e.template.purgeable);
        self.active = kept;

        let count = purged.len();
        for effect in purged {
            self.finish_removal(effect, owner);
        }
        count
    }

    /// Product of all active damage multipliers
    ///
    /// A multiplier of exactly 0 counts as "no multiplier" (1.0), not as a
    /// zeroing factor.
    pub fn damage_multiplier(&self) -> f64 {
        self.active
            .iter()
            .map(|e| e.template.damage_multiplier)
            .map(|m| if m == 0.0 { 1.0 } else { m })
            .product()
    }

    /// Sum of all active damage reductions, clamped to [0, 1]
    pub fn damage_reduction(&self) -> f64 {
        self.active
            .iter()
            .map(|e| e.template.damage_reduction)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    pub fn can_act(&self) -> bool {
        !self.active.iter().any(|e| e.template.prevents_actions)
    }

    pub fn can_move(&self) -> bool {
        !self.active.iter().any(|e| e.template.prevents_movement)
    }

    pub fn has(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&ActiveStatusEffect> {
        self.active.iter().find(|e| e.id() == id)
    }

    /// Stack count of an effect (0 if not active)
    pub fn stacks(&self, id: &str) -> u32 {
        self.get(id).map(|e| e.stack_count()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveStatusEffect> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active debuffs (for display)
    pub fn debuffs(&self) -> impl Iterator<Item = &ActiveStatusEffect> {
        self.active.iter().filter(|e| e.template.is_debuff)
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.active.iter().position(|e| e.id() == id)
    }

    fn finish_removal(&mut self, mut effect: ActiveStatusEffect, owner: &mut StatContainer) {
        reverse_modifiers(&mut effect, owner);
        debug!(effect = %effect.id(), "status effect removed");
        self.events.push(EffectEvent::Removed {
            id: effect.template.id.clone(),
            name: effect.template.name.clone(),
        });
    }
}

/// Write an effect's modifiers to its owner at the current stack count
fn apply_modifiers(effect: &mut ActiveStatusEffect, owner: &mut StatContainer) {
    let stacks = effect.stack_count();
    let modifiers = effect.template.modifiers.clone();
    for modifier in &modifiers {
        if !owner.has(modifier.stat) {
            warn!(effect = %effect.id(), stat = ?modifier.stat, "modifier targets a stat the owner lacks");
            continue;
        }
        let delta = modifier.delta_for(owner.base(modifier.stat), stacks);
        let applied = owner.modify(modifier.stat, delta);
        effect.record_applied(modifier.stat, applied);
    }
}

/// Undo everything an effect wrote to its owner
fn reverse_modifiers(effect: &mut ActiveStatusEffect, owner: &mut StatContainer) {
    for (stat, delta) in effect.take_applied() {
        owner.modify(stat, -delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::StatModifier;
    use crate::stats::Stat;

    fn owner() -> StatContainer {
        StatContainer::new()
            .with_stat(Stat::resource(StatKind::Health, 100))
            .with_attribute(StatKind::Strength, 20)
            .with_attribute(StatKind::Defense, 10)
    }

    fn poison() -> StatusEffectTemplate {
        StatusEffectTemplate::new("poison", "Poison", 5.0)
            .with_tick(1.0, 5)
            .purgeable_debuff()
    }

    fn bleed() -> StatusEffectTemplate {
        StatusEffectTemplate::new("bleed", "Bleed", 4.0)
            .with_tick(1.0, 2)
            .stackable(3)
            .debuff()
    }

    #[test]
    fn test_poison_runs_full_duration() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(&poison(), &mut stats);

        // 11 updates of 0.5s = 5.5s
        for _ in 0..11 {
            engine.tick(0.5, &mut stats);
        }

        assert_eq!(stats.get(StatKind::Health), 75);
        assert!(!engine.has("poison"));
    }

    #[test]
    fn test_single_large_update_catches_all_ticks() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(&poison(), &mut stats);

        engine.tick(3.0, &mut stats);
        assert_eq!(stats.get(StatKind::Health), 85);

        // Overshooting the end does not add ticks past expiry
        engine.tick(10.0, &mut stats);
        assert_eq!(stats.get(StatKind::Health), 75);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_reapply_refreshes_without_stacking() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let template = poison();

        engine.apply(&template, &mut stats);
        engine.tick(2.5, &mut stats);
        engine.apply(&template, &mut stats);

        let effect = engine.get("poison").unwrap();
        assert_eq!(effect.stack_count(), 1);
        assert!((effect.remaining_duration - 5.0).abs() < f64::EPSILON);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_reapply_without_refresh_keeps_duration() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let template = poison().with_refresh(false);

        engine.apply(&template, &mut stats);
        engine.tick(2.0, &mut stats);
        engine.apply(&template, &mut stats);

        let effect = engine.get("poison").unwrap();
        assert!((effect.remaining_duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stacking_caps_at_max_stacks() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let template = bleed();

        for _ in 0..4 {
            engine.apply(&template, &mut stats);
        }
        assert_eq!(engine.stacks("bleed"), 3);

        engine.tick(1.0, &mut stats);
        // tick_damage 2 * 3 stacks
        assert_eq!(stats.get(StatKind::Health), 94);
    }

    #[test]
    fn test_flat_modifier_stacks_and_reverses() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let template = StatusEffectTemplate::new("rage", "Rage", 3.0)
            .with_modifier(StatModifier::flat(StatKind::Strength, 5.0))
            .stackable(3);

        engine.apply(&template, &mut stats);
        assert_eq!(stats.get(StatKind::Strength), 25);
        engine.apply(&template, &mut stats);
        assert_eq!(stats.get(StatKind::Strength), 30);

        engine.tick(3.0, &mut stats);
        assert_eq!(stats.get(StatKind::Strength), 20);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_percent_modifier_uses_base() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let template = StatusEffectTemplate::new("sunder", "Sunder", 3.0)
            .with_modifier(StatModifier::percent(StatKind::Defense, -50.0))
            .stackable(2);

        engine.apply(&template, &mut stats);
        assert_eq!(stats.get(StatKind::Defense), 5);
        engine.apply(&template, &mut stats);
        assert_eq!(stats.get(StatKind::Defense), 0);

        assert!(engine.remove("sunder", &mut stats));
        assert_eq!(stats.get(StatKind::Defense), 10);
    }

    #[test]
    fn test_clamped_modifier_reverses_exactly() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        // Would take defense to -20, clamps at 0
        let template = StatusEffectTemplate::new("shatter", "Shatter", 2.0)
            .with_modifier(StatModifier::flat(StatKind::Defense, -30.0));

        engine.apply(&template, &mut stats);
        assert_eq!(stats.get(StatKind::Defense), 0);
        engine.remove("shatter", &mut stats);
        assert_eq!(stats.get(StatKind::Defense), 10);
    }

    #[test]
    fn test_negative_tick_heals() {
        let mut stats = owner();
        stats.set(StatKind::Health, 50);
        let mut engine = StatusEffectEngine::new();
        let regen = StatusEffectTemplate::new("regen", "Regeneration", 3.0).with_tick(1.0, -10);

        engine.apply(&regen, &mut stats);
        engine.tick(3.0, &mut stats);
        assert_eq!(stats.get(StatKind::Health), 80);
    }

    #[test]
    fn test_permanent_effect_keeps_ticking() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        let curse = StatusEffectTemplate::new("curse", "Curse", 0.0)
            .permanent()
            .with_tick(2.0, 1);

        engine.apply(&curse, &mut stats);
        engine.tick(10.0, &mut stats);
        assert_eq!(stats.get(StatKind::Health), 95);
        assert!(engine.has("curse"));
    }

    #[test]
    fn test_damage_multiplier_treats_zero_as_one() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(&StatusEffectTemplate::new("plain", "Plain", 5.0), &mut stats);
        engine.apply(
            &StatusEffectTemplate::new("berserk", "Berserk", 5.0).with_damage_multiplier(1.5),
            &mut stats,
        );
        engine.apply(
            &StatusEffectTemplate::new("weak", "Weakness", 5.0).with_damage_multiplier(0.5),
            &mut stats,
        );
        assert!((engine.damage_multiplier() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_damage_reduction_clamps() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(
            &StatusEffectTemplate::new("ward", "Ward", 5.0).with_damage_reduction(0.7),
            &mut stats,
        );
        engine.apply(
            &StatusEffectTemplate::new("shell", "Shell", 5.0).with_damage_reduction(0.6),
            &mut stats,
        );
        assert!((engine.damage_reduction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_control_flags() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        assert!(engine.can_act());
        engine.apply(
            &StatusEffectTemplate::new("stun", "Stun", 1.0).preventing_actions(),
            &mut stats,
        );
        engine.apply(
            &StatusEffectTemplate::new("root", "Root", 2.0).preventing_movement(),
            &mut stats,
        );
        assert!(!engine.can_act());
        assert!(!engine.can_move());

        engine.tick(1.0, &mut stats);
        assert!(engine.can_act());
        assert!(!engine.can_move());
    }

    #[test]
    fn test_purge_only_removes_purgeable_debuffs() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(&poison(), &mut stats);
        engine.apply(&bleed(), &mut stats);
        engine.apply(&StatusEffectTemplate::new("haste", "Haste", 5.0), &mut stats);

        assert_eq!(engine.purge_debuffs(&mut stats), 1);
        assert!(!engine.has("poison"));
        assert!(engine.has("bleed"));
        assert!(engine.has("haste"));
    }

    #[test]
    fn test_clear_reverses_everything() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(
            &StatusEffectTemplate::new("might", "Might", 5.0)
                .with_modifier(StatModifier::flat(StatKind::Strength, 10.0)),
            &mut stats,
        );
        engine.apply(&poison(), &mut stats);
        engine.clear(&mut stats);

        assert!(engine.is_empty());
        assert_eq!(stats.get(StatKind::Strength), 20);
    }

    #[test]
    fn test_missing_template_is_noop() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply_opt(None, &mut stats);
        assert!(engine.is_empty());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_events() {
        let mut stats = owner();
        let mut engine = StatusEffectEngine::new();
        engine.apply(&poison(), &mut stats);
        engine.tick(1.0, &mut stats);
        engine.tick(5.0, &mut stats);

        let events = engine.drain_events();
        assert!(matches!(events.first(), Some(EffectEvent::Applied { .. })));
        let ticks = events
            .iter()
            .filter(|e| matches!(e, EffectEvent::Ticked { amount: 5, .. }))
            .count();
        assert_eq!(ticks, 5);
        assert!(matches!(events.last(), Some(EffectEvent::Expired { .. })));
    }
}
