//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Stats
pub use crate::stats::{Stat, StatContainer, StatEvent};
pub use crate::types::{Side, StatKind};

// Effects and buffs
pub use crate::buff::{BuffPresets, CombatBuff, CombatBuffTracker};
pub use crate::combatant::Combatant;
pub use crate::effect::{EffectCatalog, StatModifier, StatusEffectEngine, StatusEffectTemplate};

// Actions and AI
pub use crate::action::{CombatAction, OnHitEffect};
pub use crate::ai::{AiPattern, AiThresholds, OpponentAction};

// Combat
pub use crate::combat::{
    ActionError, CombatEvent, CombatOrchestrator, CombatOutcome, CombatPhase, EquipmentBonuses,
    OpponentTemplate, PersistenceTrigger, RewardSink,
};
pub use crate::damage::DamageOutcome;

// Config
pub use crate::config::{CombatConstants, CombatContent};
