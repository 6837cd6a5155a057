//! Status effect templates (catalog data)

use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// How a stat modifier's amount is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    /// Amount is added per stack
    #[default]
    Flat,
    /// Amount is a percentage of the stat's base value, per stack
    Percent,
}

/// A stat change contributed by a status effect while it is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub amount: f64,
    #[serde(default)]
    pub mode: ModifierMode,
}

impl StatModifier {
    pub fn flat(stat: StatKind, amount: f64) -> Self {
        StatModifier {
            stat,
            amount,
            mode: ModifierMode::Flat,
        }
    }

    pub fn percent(stat: StatKind, amount: f64) -> Self {
        StatModifier {
            stat,
            amount,
            mode: ModifierMode::Percent,
        }
    }

    /// Delta this modifier contributes at `stacks`, given the stat's base value
    pub fn delta_for(&self, base: i32, stacks: u32) -> i32 {
        let stacks = stacks as f64;
        match self.mode {
            ModifierMode::Flat => (self.amount * stacks).round() as i32,
            ModifierMode::Percent => (base as f64 * self.amount / 100.0 * stacks).round() as i32,
        }
    }
}

/// Reapplication behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingPolicy {
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default = "default_refresh")]
    pub refresh_on_reapply: bool,
}

impl Default for StackingPolicy {
    fn default() -> Self {
        StackingPolicy {
            stackable: false,
            max_stacks: 1,
            refresh_on_reapply: true,
        }
    }
}

fn default_max_stacks() -> u32 {
    1
}

fn default_refresh() -> bool {
    true
}

fn default_tick_interval() -> f64 {
    1.0
}

/// Immutable definition of a status effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectTemplate {
    /// Unique identifier; at most one active instance per id per entity
    pub id: String,
    /// Display name
    pub name: String,
    /// Duration in seconds (ignored when `permanent`)
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub permanent: bool,
    /// Seconds between ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
    /// Health removed per tick per stack (negative heals)
    #[serde(default)]
    pub tick_damage: i32,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub stacking: StackingPolicy,
    #[serde(default)]
    pub prevents_actions: bool,
    #[serde(default)]
    pub prevents_movement: bool,
    /// Multiplier on damage dealt by the owner (0 means "no effect")
    #[serde(default)]
    pub damage_multiplier: f64,
    /// Fraction of incoming damage removed
    #[serde(default)]
    pub damage_reduction: f64,
    /// Whether the player may cleanse this effect
    #[serde(default)]
    pub purgeable: bool,
    #[serde(default)]
    pub is_debuff: bool,
}

impl StatusEffectTemplate {
    /// Create a timed effect with no ticks or modifiers
    pub fn new(id: &str, name: &str, duration: f64) -> Self {
        StatusEffectTemplate {
            id: id.to_string(),
            name: name.to_string(),
            duration,
            permanent: false,
            tick_interval: default_tick_interval(),
            tick_damage: 0,
            modifiers: Vec::new(),
            stacking: StackingPolicy::default(),
            prevents_actions: false,
            prevents_movement: false,
            damage_multiplier: 0.0,
            damage_reduction: 0.0,
            purgeable: false,
            is_debuff: false,
        }
    }

    /// Make the effect last until removed
    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    /// Deal `damage` to the owner every `interval` seconds (negative heals)
    pub fn with_tick(mut self, interval: f64, damage: i32) -> Self {
        self.tick_interval = interval;
        self.tick_damage = damage;
        self
    }

    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Allow up to `max_stacks` stacks
    pub fn stackable(mut self, max_stacks: u32) -> Self {
        self.stacking.stackable = true;
        self.stacking.max_stacks = max_stacks.max(1);
        self
    }

    pub fn with_refresh(mut self, refresh_on_reapply: bool) -> Self {
        self.stacking.refresh_on_reapply = refresh_on_reapply;
        self
    }

    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn with_damage_reduction(mut self, reduction: f64) -> Self {
        self.damage_reduction = reduction;
        self
    }

    pub fn preventing_actions(mut self) -> Self {
        self.prevents_actions = true;
        self
    }

    pub fn preventing_movement(mut self) -> Self {
        self.prevents_movement = true;
        self
    }

    /// Mark as a debuff the player can cleanse
    pub fn purgeable_debuff(mut self) -> Self {
        self.is_debuff = true;
        self.purgeable = true;
        self
    }

    pub fn debuff(mut self) -> Self {
        self.is_debuff = true;
        self
    }

    /// Whether this effect deals or heals on a timer
    pub fn ticks(&self) -> bool {
        self.tick_damage != 0 && self.tick_interval > 0.0
    }

    /// Effective stack cap (1 for non-stackable effects)
    pub fn max_stacks(&self) -> u32 {
        if self.stacking.stackable {
            self.stacking.max_stacks.max(1)
        } else {
            1
        }
    }

    /// Check catalog data for values the engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("effect id must not be empty".to_string());
        }
        if self.stacking.max_stacks == 0 {
            return Err(format!("effect '{}': max_stacks must be at least 1", self.id));
        }
        if self.tick_damage != 0 && self.tick_interval <= 0.0 {
            return Err(format!(
                "effect '{}': tick_interval must be positive when tick_damage is set",
                self.id
            ));
        }
        if !self.permanent && self.duration <= 0.0 {
            return Err(format!("effect '{}': duration must be positive", self.id));
        }
        if !(0.0..=1.0).contains(&self.damage_reduction) {
            return Err(format!(
                "effect '{}': damage_reduction must be within [0, 1]",
                self.id
            ));
        }
        if self.damage_multiplier < 0.0 {
            return Err(format!(
                "effect '{}': damage_multiplier must not be negative",
                self.id
            ));
        }
        Ok(())
    }
}
