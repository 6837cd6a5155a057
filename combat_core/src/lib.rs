//! combat_core - Turn-based combat between a player and one opponent
//!
//! This library provides:
//! - StatContainer: Bounded stats with change and death notification
//! - StatusEffectEngine: Timed, stacking effects that tick and modify stats
//! - CombatBuffTracker: Combat-scoped damage modifiers
//! - AI: Rule-based opponent action selection
//! - Damage pipeline: Action + attacker + defender into health loss
//! - CombatOrchestrator: The turn state machine with delayed transitions

pub mod action;
pub mod ai;
pub mod buff;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod damage;
pub mod effect;
pub mod prelude;
pub mod stats;
pub mod types;

// Re-export core types for convenience
pub use action::{CombatAction, OnHitEffect};
pub use ai::{AiPattern, AiThresholds, HealthRatios, OpponentAction};
pub use buff::{BuffPresets, CombatBuff, CombatBuffTracker};
pub use combat::{
    ActionError, ActionReport, CombatEvent, CombatOrchestrator, CombatOutcome, CombatPhase,
    OpponentTemplate,
};
pub use combatant::Combatant;
pub use config::{CombatConstants, CombatContent, ConfigError};
pub use damage::DamageOutcome;
pub use effect::{ActiveStatusEffect, EffectCatalog, StatusEffectEngine, StatusEffectTemplate};
pub use stats::{Stat, StatContainer, StatEvent};
pub use types::{Side, StatKind};
