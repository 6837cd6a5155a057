//! Encounter simulation - one full fight on the virtual clock

use crate::policy::ScriptedPolicy;
use combat_core::combat::RewardLedger;
use combat_core::prelude::*;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Seconds of virtual time per update
pub const STEP: f64 = 0.1;

/// Stop runaway fights after this much virtual time
pub const TIME_LIMIT: f64 = 600.0;

/// Result of one encounter
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSimulation {
    pub opponent: String,
    pub seed: u64,
    /// `None` if the time limit was hit
    pub outcome: Option<CombatOutcome>,
    pub elapsed: f64,
    pub rounds: u32,
    pub actions: Vec<String>,
    pub hit_count: u32,
    pub crit_count: u32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub player_health: i32,
    pub rewards: RewardLedger,
    #[serde(skip)]
    pub log: Vec<String>,
}

impl EncounterSimulation {
    /// Fight `opponent_id` with the scripted policy. Returns `None` for an unknown opponent.
    pub fn run(
        content: &CombatContent,
        opponent_id: &str,
        seed: u64,
        policy: &ScriptedPolicy,
    ) -> Option<Self> {
        let Some(template) = content.opponents.get(opponent_id) else {
            warn!(opponent = %opponent_id, "unknown opponent");
            return None;
        };

        let ledger = Rc::new(RefCell::new(RewardLedger::default()));
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut orch = CombatOrchestrator::from_content(StatContainer::starting_player(), content)
            .with_seed(seed)
            .with_rewards(Rc::clone(&ledger));

        let sink = Rc::clone(&log);
        orch.subscribe(move |event| {
            if let CombatEvent::Log { message } = event {
                sink.borrow_mut().push(message.clone());
            }
        });

        let mut result = EncounterSimulation {
            opponent: template.name.clone(),
            seed,
            outcome: None,
            elapsed: 0.0,
            rounds: 0,
            actions: Vec::new(),
            hit_count: 0,
            crit_count: 0,
            damage_dealt: 0,
            damage_taken: 0,
            player_health: 0,
            rewards: RewardLedger::default(),
            log: Vec::new(),
        };

        orch.start_combat(template);
        let start = orch.now();

        while orch.is_active() && orch.now() - start < TIME_LIMIT {
            if orch.phase() == CombatPhase::PlayerTurn {
                if let Some(session) = orch.session() {
                    result.rounds = session.round;
                    let id = policy.choose(&orch, session);
                    match orch.execute_player_action_id(&id) {
                        Ok(report) => {
                            if let Some(damage) = report.damage {
                                result.hit_count += 1;
                                result.crit_count += u32::from(damage.is_critical);
                                result.damage_dealt += damage.health_lost();
                            }
                            result.actions.push(id);
                        }
                        Err(error) => debug!(%error, "scripted action rejected"),
                    }
                }
            }

            let before = orch.player().stats.health();
            orch.update(STEP);
            // Heals and the post-defeat restore are not counted
            result.damage_taken += (before - orch.player().stats.health()).max(0);
        }

        if orch.is_active() {
            warn!(opponent = %opponent_id, "time limit reached, aborting");
            orch.abort_combat();
        }

        result.outcome = orch.last_outcome();
        result.elapsed = orch.now() - start;
        result.player_health = orch.player().stats.health();
        result.rewards = ledger.borrow().clone();
        result.log = log.borrow().clone();
        Some(result)
    }

    /// Calculate crit rate
    pub fn crit_rate(&self) -> f64 {
        if self.hit_count > 0 {
            self.crit_count as f64 / self.hit_count as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Calculate average damage per hit
    pub fn avg_damage(&self) -> f64 {
        if self.hit_count > 0 {
            self.damage_dealt as f64 / self.hit_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slime_is_beaten() {
        let content = CombatContent::defaults();
        let sim = EncounterSimulation::run(&content, "slime", 42, &ScriptedPolicy::default()).unwrap();

        assert_eq!(sim.outcome, Some(CombatOutcome::Victory));
        assert_eq!(sim.rewards.experience, 10);
        assert!(sim.hit_count > 0);
        assert!(sim.damage_dealt >= 40);
        assert!(!sim.log.is_empty());
    }

    #[test]
    fn test_same_seed_same_fight() {
        let content = CombatContent::defaults();
        let policy = ScriptedPolicy::default();
        let a = EncounterSimulation::run(&content, "bandit", 5, &policy).unwrap();
        let b = EncounterSimulation::run(&content, "bandit", 5, &policy).unwrap();

        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.log, b.log);
    }

    #[test]
    fn test_unknown_opponent() {
        let content = CombatContent::defaults();
        assert!(EncounterSimulation::run(&content, "dragon", 1, &ScriptedPolicy::default()).is_none());
    }
}
