//! ActiveStatusEffect - A status effect currently attached to an entity

use super::StatusEffectTemplate;
use crate::types::{StatKind, TIME_EPSILON};
use serde::{Deserialize, Serialize};

/// A live instance of a [`StatusEffectTemplate`] on one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveStatusEffect {
    pub template: StatusEffectTemplate,
    /// Seconds left before expiry (unused for permanent effects)
    pub remaining_duration: f64,
    /// Seconds until the next periodic tick
    pub time_until_next_tick: f64,
    stack_count: u32,
    /// Deltas actually written to the owner, reversed on removal
    applied: Vec<(StatKind, i32)>,
}

impl ActiveStatusEffect {
    /// Create a fresh single-stack instance
    pub fn new(template: StatusEffectTemplate) -> Self {
        ActiveStatusEffect {
            remaining_duration: template.duration,
            time_until_next_tick: template.tick_interval,
            stack_count: 1,
            applied: Vec::new(),
            template,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    /// Add a stack if under the template cap. Returns true if a stack was added.
    pub fn add_stack(&mut self) -> bool {
        if self.stack_count < self.template.max_stacks() {
            self.stack_count += 1;
            true
        } else {
            false
        }
    }

    /// Reset the remaining duration to the template's full duration
    pub fn refresh(&mut self) {
        self.remaining_duration = self.template.duration;
    }

    pub fn is_permanent(&self) -> bool {
        self.template.permanent
    }

    pub fn is_expired(&self) -> bool {
        !self.template.permanent && self.remaining_duration <= TIME_EPSILON
    }

    /// Health removed by one tick at the current stack count
    pub fn tick_amount(&self) -> i32 {
        self.template.tick_damage.saturating_mul(self.stack_count as i32)
    }

    pub(crate) fn record_applied(&mut self, stat: StatKind, delta: i32) {
        if delta != 0 {
            self.applied.push((stat, delta));
        }
    }

    pub(crate) fn take_applied(&mut self) -> Vec<(StatKind, i32)> {
        std::mem::take(&mut self.applied)
    }
}
