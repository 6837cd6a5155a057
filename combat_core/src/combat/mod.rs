//! Combat - Sessions, turn flow and terminal resolution

mod collaborators;
mod events;
mod opponent;
mod orchestrator;
mod scheduler;
mod session;

pub use collaborators::{
    EquipmentBonuses, FixedEquipment, PersistenceTrigger, RewardLedger, RewardSink, SaveCounter,
};
pub use events::{CombatEvent, CombatOutcome, EventBus, SubscriptionId};
pub use opponent::OpponentTemplate;
pub use orchestrator::{ActionReport, CombatOrchestrator};
pub use scheduler::{Scheduler, TimerId};
pub use session::{CombatPhase, CombatSession, SessionId};

use thiserror::Error;

/// Why a player action was rejected
///
/// A rejected action leaves the session untouched and does not use up the turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("no combat is active")]
    NoActiveSession,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("an action is already resolving")]
    AlreadyResolving,
    #[error("not enough energy: need {required}, have {available}")]
    InsufficientEnergy { required: i32, available: i32 },
    #[error("the player cannot act")]
    CannotAct,
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
