//! CombatSession - State of the one active encounter

use super::{CombatOutcome, OpponentTemplate};
use crate::combatant::Combatant;
use serde::{Deserialize, Serialize};

/// Identifies a session so delayed work can tell whether it is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Where the turn state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    /// No active session
    Idle,
    /// Waiting for the player to pick an action
    PlayerTurn,
    /// Player action submitted, waiting for the turn delay
    PlayerResolving,
    /// Opponent deciding or acting
    OpponentTurn,
    /// A combatant is down and resolution is scheduled
    Resolving,
}

/// One encounter between the player and one opponent
#[derive(Debug, Clone)]
pub struct CombatSession {
    pub id: SessionId,
    pub template: OpponentTemplate,
    /// Built fresh from the template, discarded at teardown
    pub opponent: Combatant,
    pub is_player_turn: bool,
    pub waiting_for_input: bool,
    pub player_defense_bonus: i32,
    pub opponent_defense_bonus: i32,
    /// Flipped exactly once; gates rewards and penalties
    pub is_resolved: bool,
    /// First terminal outcome detected, if any
    pub pending_resolution: Option<CombatOutcome>,
    /// Completed opponent turns
    pub round: u32,
}

impl CombatSession {
    pub fn new(id: SessionId, template: &OpponentTemplate) -> Self {
        CombatSession {
            id,
            template: template.clone(),
            opponent: Combatant::new(template.build_stats()),
            is_player_turn: true,
            waiting_for_input: true,
            player_defense_bonus: 0,
            opponent_defense_bonus: 0,
            is_resolved: false,
            pending_resolution: None,
            round: 0,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        if self.pending_resolution.is_some() {
            CombatPhase::Resolving
        } else if !self.is_player_turn {
            CombatPhase::OpponentTurn
        } else if self.waiting_for_input {
            CombatPhase::PlayerTurn
        } else {
            CombatPhase::PlayerResolving
        }
    }

    /// Raise the player's bonus, clamped to `[0, max]`
    pub fn add_player_defense(&mut self, amount: i32, max: i32) {
        self.player_defense_bonus = (self.player_defense_bonus + amount).clamp(0, max);
    }

    /// Raise the opponent's bonus, clamped to `[0, max]`
    pub fn add_opponent_defense(&mut self, amount: i32, max: i32) {
        self.opponent_defense_bonus = (self.opponent_defense_bonus + amount).clamp(0, max);
    }

    /// Both bonuses lose `amount`, never going below zero
    pub fn decay_defense(&mut self, amount: i32) {
        self.player_defense_bonus = (self.player_defense_bonus - amount).max(0);
        self.opponent_defense_bonus = (self.opponent_defense_bonus - amount).max(0);
    }

    pub fn reset_defense(&mut self) {
        self.player_defense_bonus = 0;
        self.opponent_defense_bonus = 0;
    }
}
