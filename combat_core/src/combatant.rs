//! Combatant - A stat container paired with its status effects

use crate::effect::{StatusEffectEngine, StatusEffectTemplate};
use crate::stats::StatContainer;

/// One side of an encounter
///
/// The effect engine only ever mutates `stats`, so whichever role the
/// combatant plays (player or opponent) is decided by the caller.
#[derive(Debug, Clone, Default)]
pub struct Combatant {
    pub stats: StatContainer,
    pub effects: StatusEffectEngine,
}

impl Combatant {
    pub fn new(stats: StatContainer) -> Self {
        Combatant {
            stats,
            effects: StatusEffectEngine::new(),
        }
    }

    pub fn apply_effect(&mut self, template: &StatusEffectTemplate) {
        self.effects.apply(template, &mut self.stats);
    }

    pub fn remove_effect(&mut self, id: &str) -> bool {
        self.effects.remove(id, &mut self.stats)
    }

    pub fn purge_debuffs(&mut self) -> usize {
        self.effects.purge_debuffs(&mut self.stats)
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear(&mut self.stats);
    }

    /// Advance effect timers by `delta` seconds
    pub fn tick(&mut self, delta: f64) {
        self.effects.tick(delta, &mut self.stats);
    }

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    pub fn can_act(&self) -> bool {
        self.effects.can_act()
    }

    pub fn health_ratio(&self) -> f64 {
        self.stats.health_ratio()
    }
}
