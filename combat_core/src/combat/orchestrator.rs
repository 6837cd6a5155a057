//! CombatOrchestrator - The turn state machine
//!
//! Owns the active session, the virtual clock and every delayed transition:
//!
//! ```text
//! Idle -> PlayerTurn -> PlayerResolving -[turn_delay]-> OpponentTurn
//!      -[enemy_action_delay]-> opponent acts -[turn_delay]-> PlayerTurn ...
//! ```
//!
//! Either combatant at zero health schedules victory or defeat after
//! `turn_delay`. Resolution runs at most once per session and always ends
//! back in `Idle`. Transitions are never due at the instant they are
//! scheduled, so the clock always moves between turns.

use super::collaborators::{EquipmentBonuses, PersistenceTrigger, RewardSink};
use super::events::{CombatEvent, CombatOutcome, EventBus, SubscriptionId};
use super::scheduler::{Scheduler, TimerId};
use super::session::{CombatPhase, CombatSession, SessionId};
use super::{ActionError, OpponentTemplate};
use crate::action::CombatAction;
use crate::ai::{self, HealthRatios, OpponentAction};
use crate::buff::{CombatBuff, CombatBuffTracker};
use crate::combatant::Combatant;
use crate::config::{CombatConstants, CombatContent};
use crate::damage::{self, AttackerInputs, DamageOutcome, DefenderInputs};
use crate::effect::{EffectCatalog, EffectEvent};
use crate::stats::{StatContainer, StatEvent};
use crate::types::{Side, StatKind, TIME_EPSILON};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const PLAYER_NAME: &str = "Player";

/// Shortest delay between two scheduled transitions (seconds)
const MIN_TRANSITION_DELAY: f64 = 0.001;

/// Delayed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnTask {
    BeginOpponentTurn,
    OpponentAct,
    BeginPlayerTurn,
    Resolve(CombatOutcome),
}

/// A transition tagged with the session that scheduled it
#[derive(Debug, Clone, Copy)]
struct SessionTask {
    session: SessionId,
    task: TurnTask,
}

/// What a player action did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReport {
    pub action_id: String,
    /// Set for offensive actions
    pub damage: Option<DamageOutcome>,
    pub healed: i32,
    /// Player defense bonus after the action
    pub defense_bonus: i32,
    /// Names of on-hit effects that landed
    pub effects_applied: Vec<String>,
    pub debuffs_purged: usize,
    pub buff_granted: Option<String>,
}

/// Drives encounters between the player and one opponent at a time
pub struct CombatOrchestrator {
    constants: CombatConstants,
    effects: EffectCatalog,
    actions: HashMap<String, CombatAction>,

    player: Combatant,
    buffs: CombatBuffTracker,
    session: Option<CombatSession>,
    sessions_started: u64,
    last_outcome: Option<CombatOutcome>,

    scheduler: Scheduler<SessionTask>,
    /// Pending turn transition, cancelled when a resolution takes over
    turn_timer: Option<TimerId>,
    rng: ChaCha8Rng,
    events: EventBus<CombatEvent>,

    equipment: Option<Box<dyn EquipmentBonuses>>,
    rewards: Option<Box<dyn RewardSink>>,
    persistence: Option<Box<dyn PersistenceTrigger>>,
}

impl CombatOrchestrator {
    pub fn new(player: StatContainer, constants: CombatConstants, effects: EffectCatalog) -> Self {
        CombatOrchestrator {
            constants,
            effects,
            actions: HashMap::new(),
            player: Combatant::new(player),
            buffs: CombatBuffTracker::new(),
            session: None,
            sessions_started: 0,
            last_outcome: None,
            scheduler: Scheduler::new(),
            turn_timer: None,
            rng: ChaCha8Rng::from_entropy(),
            events: EventBus::new(),
            equipment: None,
            rewards: None,
            persistence: None,
        }
    }

    /// Build from loaded content, including its action catalog
    pub fn from_content(player: StatContainer, content: &CombatContent) -> Self {
        Self::new(player, content.constants.clone(), content.effects.clone())
            .with_actions(content.actions.clone())
    }

    /// Use a fixed seed for crit, on-hit and AI rolls
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_actions(mut self, actions: HashMap<String, CombatAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_equipment(mut self, equipment: impl EquipmentBonuses + 'static) -> Self {
        self.equipment = Some(Box::new(equipment));
        self
    }

    pub fn with_rewards(mut self, rewards: impl RewardSink + 'static) -> Self {
        self.rewards = Some(Box::new(rewards));
        self
    }

    pub fn with_persistence(mut self, persistence: impl PersistenceTrigger + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    // === Queries ===

    pub fn constants(&self) -> &CombatConstants {
        &self.constants
    }

    pub fn effect_catalog(&self) -> &EffectCatalog {
        &self.effects
    }

    pub fn action(&self, id: &str) -> Option<&CombatAction> {
        self.actions.get(id)
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    /// Player stats for outside collaborators (leveling, equipment swaps)
    pub fn player_stats_mut(&mut self) -> &mut StatContainer {
        &mut self.player.stats
    }

    pub fn buffs(&self) -> &CombatBuffTracker {
        &self.buffs
    }

    pub fn session(&self) -> Option<&CombatSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn phase(&self) -> CombatPhase {
        self.session
            .as_ref()
            .map_or(CombatPhase::Idle, CombatSession::phase)
    }

    /// Outcome of the most recently ended session
    pub fn last_outcome(&self) -> Option<CombatOutcome> {
        self.last_outcome
    }

    /// Virtual clock in seconds
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Number of delayed transitions waiting to run
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&CombatEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // === Session lifecycle ===

    /// Begin an encounter. No-op (returns false) while another is active.
    pub fn start_combat(&mut self, template: &OpponentTemplate) -> bool {
        if let Some(active) = &self.session {
            debug!(active = %active.template.id, requested = %template.id, "combat already active");
            return false;
        }

        self.scheduler.cancel_all();
        self.buffs.clear_all();
        self.sessions_started += 1;
        let id = SessionId(self.sessions_started);
        self.session = Some(CombatSession::new(id, template));
        self.last_outcome = None;
        info!(opponent = %template.id, session = id.0, "combat started");

        self.emit(CombatEvent::CombatStarted {
            opponent: template.name.clone(),
        });
        self.log(format!("{} appears!", template.name));
        self.open_player_turn();
        // The player may already be down from effects that ticked out of combat
        self.pump_events();
        true
    }

    /// Like [`start_combat`](Self::start_combat) for a lookup that may have failed
    pub fn start_combat_opt(&mut self, template: Option<&OpponentTemplate>) -> bool {
        match template {
            Some(template) => self.start_combat(template),
            None => {
                warn!("cannot start combat without an opponent template");
                false
            }
        }
    }

    /// Grant rewards and end the session. Returns false if already resolved.
    pub fn resolve_victory(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.is_resolved {
            debug!("victory ignored, session already resolved");
            return false;
        }
        session.is_resolved = true;
        let template = session.template.clone();

        if let Some(rewards) = self.rewards.as_mut() {
            rewards.grant_experience(template.experience_reward);
            rewards.grant_currency(template.currency_reward);
            if let Some(table) = &template.loot_table {
                rewards.roll_loot(table);
            }
        }

        info!(opponent = %template.id, "victory");
        self.log(format!(
            "{} is defeated! +{} XP, +{} gold",
            template.name, template.experience_reward, template.currency_reward
        ));
        self.teardown(CombatOutcome::Victory);
        true
    }

    /// Apply the defeat penalty and end the session. Returns false if already resolved.
    pub fn resolve_defeat(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.is_resolved {
            debug!("defeat ignored, session already resolved");
            return false;
        }
        session.is_resolved = true;
        let opponent = session.template.id.clone();

        if let Some(rewards) = self.rewards.as_mut() {
            rewards.apply_defeat_penalty();
        }

        self.player.clear_effects();
        let max_health = self.player.stats.max(StatKind::Health);
        let restored = (max_health as f64 * self.constants.recovery.defeat_health_fraction).round() as i32;
        self.player.stats.set(StatKind::Health, restored.max(1));

        info!(%opponent, "defeat");
        self.log("You have been defeated...".to_string());
        self.teardown(CombatOutcome::Defeat);
        true
    }

    /// End the session without rewards or penalties
    pub fn abort_combat(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.is_resolved {
            return false;
        }
        session.is_resolved = true;
        info!(opponent = %session.template.id, "combat aborted");
        self.log("Combat aborted".to_string());
        self.teardown(CombatOutcome::Aborted);
        true
    }

    // === Player input ===

    /// Perform an action on the player's turn
    ///
    /// A rejected action changes nothing and does not consume the turn,
    /// except [`ActionError::CannotAct`]: a player held by a control effect
    /// forfeits the turn.
    pub fn execute_player_action(&mut self, action: &CombatAction) -> Result<ActionReport, ActionError> {
        if let Err(error) = self.check_player_action(action) {
            debug!(action = %action.id, %error, "player action rejected");
            if error == ActionError::CannotAct {
                self.forfeit_player_turn();
            }
            return Err(error);
        }

        if action.energy_cost > 0 {
            self.player.stats.modify(StatKind::Energy, -action.energy_cost);
        }

        let max_bonus = self.constants.defense.max_bonus;
        let mut report = ActionReport {
            action_id: action.id.clone(),
            ..ActionReport::default()
        };

        if let Some(session) = self.session.as_mut() {
            session.waiting_for_input = false;
            if action.is_defensive {
                session.add_player_defense(action.defense_bonus, max_bonus);
                report.defense_bonus = session.player_defense_bonus;
            }
        }

        if action.is_defensive {
            if action.heal_amount > 0 {
                report.healed = self.player.stats.modify(StatKind::Health, action.heal_amount);
            }
            self.log(format!("{} uses {}", PLAYER_NAME, action.name));
        } else if let Some((outcome, applied)) = self.strike(Side::Player, action) {
            self.log(format!("{} uses {}: {}", PLAYER_NAME, action.name, outcome.summary()));
            report.damage = Some(outcome);
            report.effects_applied = applied;
        }

        if action.purges_debuffs {
            report.debuffs_purged = self.player.purge_debuffs();
        }
        if let Some(buff) = &action.grants_buff {
            self.buffs.add(buff.clone(), self.scheduler.now());
            report.buff_granted = Some(buff.id.clone());
        }

        self.emit(CombatEvent::StateChanged);
        self.pump_events();

        if !self.resolution_pending() {
            self.schedule(self.constants.timing.turn_delay, TurnTask::BeginOpponentTurn);
        }
        Ok(report)
    }

    /// Perform a catalog action by id
    pub fn execute_player_action_id(&mut self, id: &str) -> Result<ActionReport, ActionError> {
        let Some(action) = self.actions.get(id).cloned() else {
            warn!(action = %id, "unknown action");
            return Err(ActionError::UnknownAction(id.to_string()));
        };
        self.execute_player_action(&action)
    }

    fn check_player_action(&self, action: &CombatAction) -> Result<(), ActionError> {
        let session = self.session.as_ref().ok_or(ActionError::NoActiveSession)?;
        if session.is_resolved || !session.is_player_turn {
            return Err(ActionError::NotPlayerTurn);
        }
        if !session.waiting_for_input {
            return Err(ActionError::AlreadyResolving);
        }
        if !self.player.can_act() {
            return Err(ActionError::CannotAct);
        }
        let available = self.player.stats.get(StatKind::Energy);
        if available < action.energy_cost {
            return Err(ActionError::InsufficientEnergy {
                required: action.energy_cost,
                available,
            });
        }
        Ok(())
    }

    // === Buffs and effects ===

    /// Grant a combat buff to the player. Only valid during a session.
    pub fn grant_buff(&mut self, buff: CombatBuff) -> bool {
        if self.session.is_none() {
            debug!(buff = %buff.id, "combat buff ignored outside combat");
            return false;
        }
        self.log(format!("{} gains {}", PLAYER_NAME, buff.name));
        self.buffs.add(buff, self.scheduler.now());
        self.emit(CombatEvent::StateChanged);
        true
    }

    /// Apply a catalog effect to the player
    pub fn apply_effect_to_player(&mut self, effect_id: &str) -> bool {
        let Some(template) = self.effects.get(effect_id) else {
            warn!(effect = %effect_id, "unknown status effect");
            return false;
        };
        self.player.apply_effect(template);
        self.pump_events();
        true
    }

    /// Apply a catalog effect to the current opponent
    pub fn apply_effect_to_opponent(&mut self, effect_id: &str) -> bool {
        let Some(template) = self.effects.get(effect_id) else {
            warn!(effect = %effect_id, "unknown status effect");
            return false;
        };
        let Some(session) = self.session.as_mut() else {
            debug!(effect = %effect_id, "no opponent to apply effect to");
            return false;
        };
        session.opponent.apply_effect(template);
        self.pump_events();
        true
    }

    // === Time ===

    /// Advance the clock by `delta` seconds
    ///
    /// Effect ticks, buff expiry and delayed transitions are interleaved in
    /// time order, so one large step behaves like many small ones.
    pub fn update(&mut self, delta: f64) {
        if delta < 0.0 {
            return;
        }
        let target = self.scheduler.now() + delta;

        loop {
            let next = self
                .scheduler
                .next_due()
                .filter(|due| *due <= target + TIME_EPSILON);
            let step = next.unwrap_or(target) - self.scheduler.now();
            if step > 0.0 {
                self.advance_world(step);
            }
            if next.is_none() {
                break;
            }
            self.run_due_tasks();
        }
    }

    fn advance_world(&mut self, step: f64) {
        self.scheduler.advance(step);
        self.player.tick(step);
        if let Some(session) = self.session.as_mut() {
            session.opponent.tick(step);
        }
        if self.buffs.update(self.scheduler.now()) {
            self.log("Combat buffs wore off".to_string());
            self.emit(CombatEvent::StateChanged);
        }
        self.pump_events();
    }

    fn run_due_tasks(&mut self) {
        while let Some((_, SessionTask { session, task })) = self.scheduler.pop_due() {
            if self.session.as_ref().map(|s| s.id) != Some(session) {
                debug!(?task, "dropping task from a finished session");
                continue;
            }
            match task {
                TurnTask::BeginOpponentTurn => self.begin_opponent_turn(),
                TurnTask::OpponentAct => self.opponent_act(),
                TurnTask::BeginPlayerTurn => self.open_player_turn(),
                TurnTask::Resolve(CombatOutcome::Victory) => {
                    self.resolve_victory();
                }
                TurnTask::Resolve(CombatOutcome::Defeat) => {
                    self.resolve_defeat();
                }
                TurnTask::Resolve(CombatOutcome::Aborted) => {
                    self.abort_combat();
                }
            }
        }
    }

    // === Turns ===

    fn open_player_turn(&mut self) {
        if self.resolution_pending() {
            return;
        }
        let can_act = self.player.can_act();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.is_player_turn = true;
        session.waiting_for_input = true;
        self.emit(CombatEvent::TurnChanged { is_player_turn: true });

        if !can_act {
            self.forfeit_player_turn();
        }
    }

    /// Skip the player's turn when their effects prevent acting
    fn forfeit_player_turn(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.waiting_for_input = false;
        self.log(format!("{} is unable to act!", PLAYER_NAME));
        self.emit(CombatEvent::StateChanged);
        self.schedule(self.constants.timing.turn_delay, TurnTask::BeginOpponentTurn);
    }

    fn begin_opponent_turn(&mut self) {
        if self.resolution_pending() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.is_player_turn = false;
        session.waiting_for_input = false;
        self.emit(CombatEvent::TurnChanged { is_player_turn: false });
        self.schedule(self.constants.timing.enemy_action_delay, TurnTask::OpponentAct);
    }

    fn opponent_act(&mut self) {
        if self.resolution_pending() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let template = session.template.clone();

        if !session.opponent.can_act() {
            self.log(format!("{} is unable to act!", template.name));
        } else {
            let ratios = HealthRatios {
                opponent: session.opponent.health_ratio(),
                player: self.player.health_ratio(),
            };
            let choice = ai::decide_with_rng(template.pattern, ratios, &template.thresholds, &mut self.rng);
            debug!(opponent = %template.id, ?choice, "opponent decided");
            self.perform_opponent_action(&template, choice);
        }

        let decay = self.constants.defense.decay_per_round;
        if let Some(session) = self.session.as_mut() {
            session.decay_defense(decay);
            session.round += 1;
        }
        self.emit(CombatEvent::StateChanged);
        self.pump_events();

        if !self.resolution_pending() {
            self.schedule(self.constants.timing.turn_delay, TurnTask::BeginPlayerTurn);
        }
    }

    fn perform_opponent_action(&mut self, template: &OpponentTemplate, choice: OpponentAction) {
        let max_bonus = self.constants.defense.max_bonus;
        let action = match choice {
            OpponentAction::Defend => {
                if let Some(session) = self.session.as_mut() {
                    session.add_opponent_defense(template.defend_bonus, max_bonus);
                }
                self.log(format!("{} takes a defensive stance", template.name));
                return;
            }
            OpponentAction::Attack => template.attack_action(),
            OpponentAction::SpecialAttack => template.special_attack_action(),
        };

        if let Some(session) = self.session.as_mut() {
            session.opponent_defense_bonus = 0;
        }
        if let Some((outcome, applied)) = self.strike(Side::Opponent, &action) {
            self.log(format!("{} uses {}: {}", template.name, action.name, outcome.summary()));
            for name in applied {
                self.log(format!("{} is afflicted by {}", PLAYER_NAME, name));
            }
        }
    }

    // === Damage ===

    /// Run the damage pipeline from `attacker` against the other side,
    /// then roll the action's on-hit effects onto the defender
    fn strike(&mut self, attacker: Side, action: &CombatAction) -> Option<(DamageOutcome, Vec<String>)> {
        let equipment_damage = self.equipment.as_ref().map_or(0, |e| e.total_damage_bonus());
        let equipment_defense = self.equipment.as_ref().map_or(0, |e| e.total_defense_bonus());
        let buff_multiplier = self.buffs.damage_multiplier();
        let buff_reduction = self.buffs.damage_reduction();
        let session = self.session.as_mut()?;

        let (source, target, defense_bonus) = match attacker {
            Side::Player => (&self.player, &mut session.opponent, session.opponent_defense_bonus),
            Side::Opponent => (&session.opponent, &mut self.player, session.player_defense_bonus),
        };

        let mut attacker_inputs = AttackerInputs::from_stats(action, &source.stats);
        attacker_inputs.effect_multiplier = source.effects.damage_multiplier();

        let mut defender_inputs = DefenderInputs {
            base_defense: target.stats.get(StatKind::Defense),
            defense_bonus,
            equipment_defense_bonus: 0,
            reduction: target.effects.damage_reduction(),
        };

        // Equipment and combat buffs belong to the player only
        match attacker {
            Side::Player => {
                attacker_inputs.equipment_damage_bonus = equipment_damage;
                attacker_inputs.buff_multiplier = buff_multiplier;
            }
            Side::Opponent => {
                defender_inputs.equipment_defense_bonus = equipment_defense;
                defender_inputs.reduction = (defender_inputs.reduction + buff_reduction).clamp(0.0, 1.0);
            }
        }

        let mut outcome = damage::compute_damage(
            action,
            &attacker_inputs,
            &defender_inputs,
            &self.constants.crit,
            &mut self.rng,
        );
        damage::apply_damage(&mut outcome, &mut target.stats);
        debug!(
            ?attacker,
            action = %action.id,
            damage = outcome.final_damage,
            critical = outcome.is_critical,
            "hit resolved"
        );

        let mut applied = Vec::new();
        if target.is_alive() {
            for on_hit in &action.on_hit_effects {
                if self.rng.gen::<f64>() >= on_hit.chance {
                    continue;
                }
                match self.effects.get(&on_hit.effect_id) {
                    Some(template) => {
                        target.apply_effect(template);
                        applied.push(template.name.clone());
                    }
                    None => warn!(effect = %on_hit.effect_id, "unknown on-hit effect"),
                }
            }
        }

        Some((outcome, applied))
    }

    // === Resolution ===

    fn resolution_pending(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.pending_resolution.is_some())
    }

    fn schedule_resolution(&mut self, outcome: CombatOutcome) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_resolved {
            return;
        }
        session.waiting_for_input = false;
        if session.pending_resolution.is_none() {
            session.pending_resolution = Some(outcome);
        }
        if let Some(timer) = self.turn_timer.take() {
            self.scheduler.cancel(timer);
        }
        info!(%outcome, "combatant down, resolution scheduled");
        self.schedule(self.constants.timing.turn_delay, TurnTask::Resolve(outcome));
    }

    fn teardown(&mut self, outcome: CombatOutcome) {
        self.turn_timer = None;
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "pending transitions cancelled");
        }
        self.buffs.clear_all();
        if let Some(session) = self.session.as_mut() {
            session.reset_defense();
            session.is_player_turn = true;
            session.waiting_for_input = true;
        }
        self.player
            .stats
            .modify(StatKind::Energy, self.constants.recovery.energy_restore_on_end);

        self.session = None;
        self.last_outcome = Some(outcome);
        self.pump_events();

        self.emit(CombatEvent::CombatEnded { outcome });
        self.emit(CombatEvent::StateChanged);
        if let Some(persistence) = self.persistence.as_mut() {
            persistence.save_now();
        }
    }

    // === Plumbing ===

    fn schedule(&mut self, delay: f64, task: TurnTask) {
        let Some(session) = &self.session else {
            return;
        };
        let task = SessionTask {
            session: session.id,
            task,
        };
        let timer = self
            .scheduler
            .schedule(delay.max(MIN_TRANSITION_DELAY), task);
        if !matches!(task.task, TurnTask::Resolve(_)) {
            self.turn_timer = Some(timer);
        }
    }

    /// Forward queued stat and effect notifications, scheduling resolution when a side is down
    fn pump_events(&mut self) {
        let mut changed = false;
        let mut player_down = false;
        for event in self.player.stats.drain_events() {
            match event {
                StatEvent::Changed { .. } => changed = true,
                StatEvent::Died => player_down = true,
            }
        }
        let mut messages: Vec<String> = self
            .player
            .effects
            .drain_events()
            .iter()
            .map(|e| describe_effect_event(PLAYER_NAME, e))
            .collect();

        let mut opponent_down = false;
        if let Some(session) = self.session.as_mut() {
            for event in session.opponent.stats.drain_events() {
                match event {
                    StatEvent::Changed { .. } => changed = true,
                    StatEvent::Died => opponent_down = true,
                }
            }
            let name = session.template.name.clone();
            messages.extend(
                session
                    .opponent
                    .effects
                    .drain_events()
                    .iter()
                    .map(|e| describe_effect_event(&name, e)),
            );

            // A side already at zero never queues Died, so read the values too
            if !session.is_resolved && session.pending_resolution.is_none() {
                player_down |= !self.player.is_alive();
                opponent_down |= !session.opponent.is_alive();
            }
        }

        for message in messages {
            self.log(message);
        }
        if changed {
            self.emit(CombatEvent::StateChanged);
        }
        if player_down {
            self.schedule_resolution(CombatOutcome::Defeat);
        }
        if opponent_down {
            self.schedule_resolution(CombatOutcome::Victory);
        }
    }

    fn emit(&mut self, event: CombatEvent) {
        self.events.emit(&event);
    }

    fn log(&mut self, message: String) {
        debug!(%message, "combat log");
        self.emit(CombatEvent::Log { message });
    }
}

fn describe_effect_event(owner: &str, event: &EffectEvent) -> String {
    match event {
        EffectEvent::Applied { name, .. } => format!("{} is affected by {}", owner, name),
        EffectEvent::Stacked { name, stacks, .. } => format!("{} on {} stacks to {}", name, owner, stacks),
        EffectEvent::Refreshed { name, .. } => format!("{} on {} is refreshed", name, owner),
        EffectEvent::Ticked { name, amount, .. } if *amount >= 0 => {
            format!("{} deals {} damage to {}", name, amount, owner)
        }
        EffectEvent::Ticked { name, amount, .. } => format!("{} restores {} health to {}", name, -amount, owner),
        EffectEvent::Expired { name, .. } => format!("{} wears off {}", name, owner),
        EffectEvent::Removed { name, .. } => format!("{} is removed from {}", name, owner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{FixedEquipment, RewardLedger, SaveCounter};
    use crate::effect::StatusEffectTemplate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn orchestrator() -> CombatOrchestrator {
        CombatOrchestrator::new(
            StatContainer::starting_player(),
            CombatConstants::default(),
            EffectCatalog::with_defaults(),
        )
        .with_seed(42)
    }

    fn dummy() -> OpponentTemplate {
        OpponentTemplate::new("dummy", "Training Dummy", 100, 5, 5)
    }

    fn record(orch: &mut CombatOrchestrator) -> Rc<RefCell<Vec<CombatEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        orch.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    #[test]
    fn test_start_combat_enters_player_turn() {
        let mut orch = orchestrator();
        let seen = record(&mut orch);

        assert_eq!(orch.phase(), CombatPhase::Idle);
        assert!(orch.start_combat(&dummy()));
        assert_eq!(orch.phase(), CombatPhase::PlayerTurn);

        let events = seen.borrow();
        assert_eq!(
            events[0],
            CombatEvent::CombatStarted {
                opponent: "Training Dummy".to_string()
            }
        );
        assert!(events.contains(&CombatEvent::TurnChanged { is_player_turn: true }));
    }

    #[test]
    fn test_second_start_is_noop() {
        let mut orch = orchestrator();
        assert!(orch.start_combat(&dummy()));
        let id = orch.session().map(|s| s.id);

        assert!(!orch.start_combat(&OpponentTemplate::new("wolf", "Wolf", 60, 8, 3)));
        assert_eq!(orch.session().map(|s| s.id), id);
        assert!(!orch.start_combat_opt(None));
    }

    #[test]
    fn test_rejected_actions_change_nothing() {
        let mut orch = orchestrator();
        let strike = CombatAction::basic_attack();
        assert_eq!(orch.execute_player_action(&strike), Err(ActionError::NoActiveSession));

        orch.start_combat(&dummy());
        let expensive = CombatAction::attack("nova", "Nova", 50).with_cost(80);
        assert_eq!(
            orch.execute_player_action(&expensive),
            Err(ActionError::InsufficientEnergy {
                required: 80,
                available: 50
            })
        );
        assert_eq!(orch.phase(), CombatPhase::PlayerTurn);
        assert_eq!(orch.player().stats.get(StatKind::Energy), 50);
        assert_eq!(orch.pending_tasks(), 0);

        assert!(orch.execute_player_action(&strike).is_ok());
        assert_eq!(orch.execute_player_action(&strike), Err(ActionError::AlreadyResolving));

        assert_eq!(
            orch.execute_player_action_id("nope"),
            Err(ActionError::UnknownAction("nope".to_string()))
        );
    }

    #[test]
    fn test_player_attack_uses_pipeline() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());

        // 10 + round(10 x 0.5) = 15 raw, guaranteed crit -> 23, minus 5 defense
        let action = CombatAction::attack("strike", "Strike", 10)
            .with_scaling(StatKind::Strength, 0.5)
            .with_guaranteed_crit();
        let report = orch.execute_player_action(&action).unwrap();

        let outcome = report.damage.unwrap();
        assert_eq!(outcome.final_damage, 18);
        assert_eq!(orch.session().unwrap().opponent.stats.health(), 82);
        assert_eq!(orch.phase(), CombatPhase::PlayerResolving);
    }

    #[test]
    fn test_equipment_bonus_applies_to_player() {
        let mut orch = orchestrator().with_equipment(FixedEquipment::new(4, 0));
        orch.start_combat(&dummy());

        let action = CombatAction::attack("strike", "Strike", 10)
            .with_scaling(StatKind::Strength, 0.5)
            .with_guaranteed_crit();
        let report = orch.execute_player_action(&action).unwrap();

        // (15 + 4) x 1.5 = 28.5 -> 29, minus 5
        assert_eq!(report.damage.unwrap().final_damage, 24);
    }

    #[test]
    fn test_defensive_action_caps_bonus_and_heals() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());
        orch.player_stats_mut().set(StatKind::Health, 50);

        let guard = CombatAction::defensive("guard", "Guard", 80, 15);
        let report = orch.execute_player_action(&guard).unwrap();

        assert_eq!(report.defense_bonus, 50);
        assert_eq!(report.healed, 15);
        assert_eq!(orch.player().stats.health(), 65);
        assert!(report.damage.is_none());
    }

    #[test]
    fn test_turn_cycle_returns_to_player() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());
        orch.execute_player_action(&CombatAction::basic_attack()).unwrap();

        orch.update(1.0);
        assert_eq!(orch.phase(), CombatPhase::OpponentTurn);

        orch.update(0.75);
        // Opponent acted; next player turn is scheduled
        assert_eq!(orch.phase(), CombatPhase::OpponentTurn);
        assert_eq!(orch.session().unwrap().round, 1);

        orch.update(1.0);
        assert_eq!(orch.phase(), CombatPhase::PlayerTurn);
    }

    #[test]
    fn test_resolve_victory_runs_once() {
        let ledger = Rc::new(RefCell::new(RewardLedger::default()));
        let saves = Rc::new(RefCell::new(SaveCounter::default()));
        let mut orch = orchestrator()
            .with_rewards(Rc::clone(&ledger))
            .with_persistence(Rc::clone(&saves));

        orch.start_combat(&dummy().with_rewards(40, 10, Some("dummy_loot")));
        assert!(orch.resolve_victory());
        assert!(!orch.resolve_victory());
        assert!(!orch.resolve_defeat());

        let ledger = ledger.borrow();
        assert_eq!(ledger.experience, 40);
        assert_eq!(ledger.currency, 10);
        assert_eq!(ledger.loot_rolls, vec!["dummy_loot".to_string()]);
        assert_eq!(saves.borrow().saves, 1);
        assert_eq!(orch.last_outcome(), Some(CombatOutcome::Victory));
        assert_eq!(orch.phase(), CombatPhase::Idle);
    }

    #[test]
    fn test_defeat_restores_fraction_of_health() {
        let ledger = Rc::new(RefCell::new(RewardLedger::default()));
        let mut orch = orchestrator().with_rewards(Rc::clone(&ledger));
        orch.start_combat(&dummy());
        orch.apply_effect_to_player("poison");

        assert!(orch.resolve_defeat());
        assert_eq!(orch.player().stats.health(), 25);
        assert!(orch.player().effects.is_empty());
        assert_eq!(ledger.borrow().defeat_penalties, 1);
        assert_eq!(ledger.borrow().experience, 0);
    }

    #[test]
    fn test_teardown_clears_buffs_and_restores_energy() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());
        orch.player_stats_mut().set(StatKind::Energy, 10);
        assert!(orch.grant_buff(crate::buff::BuffPresets::battle_cry(30.0)));

        assert!(orch.abort_combat());
        assert!(orch.buffs().is_empty());
        assert_eq!(orch.player().stats.get(StatKind::Energy), 40);
        assert_eq!(orch.last_outcome(), Some(CombatOutcome::Aborted));
        assert!(!orch.abort_combat());
        assert!(!orch.grant_buff(crate::buff::BuffPresets::battle_cry(30.0)));
    }

    #[test]
    fn test_buff_and_purge_extras() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());
        orch.apply_effect_to_player("poison");
        orch.apply_effect_to_player("bleed");

        let cleanse = CombatAction::defensive("cleanse", "Cleanse", 0, 0)
            .purging()
            .with_buff(crate::buff::BuffPresets::iron_skin(5.0));
        let report = orch.execute_player_action(&cleanse).unwrap();

        // Bleed is a debuff but not purgeable
        assert_eq!(report.debuffs_purged, 1);
        assert!(orch.player().effects.has("bleed"));
        assert_eq!(report.buff_granted.as_deref(), Some("buff_iron_skin"));
        assert!(orch.buffs().has("buff_iron_skin"));
    }

    #[test]
    fn test_zero_delays_still_advance_the_clock() {
        let mut constants = CombatConstants::default();
        constants.timing.turn_delay = 0.0;
        constants.timing.enemy_action_delay = 0.0;
        let mut effects = EffectCatalog::with_defaults();
        effects.register(
            StatusEffectTemplate::new("ward", "Ward", 0.0)
                .permanent()
                .with_damage_reduction(1.0),
        );
        let mut orch =
            CombatOrchestrator::new(StatContainer::starting_player(), constants, effects).with_seed(42);
        orch.apply_effect_to_player("stun");
        orch.apply_effect_to_player("ward");
        orch.start_combat(&dummy());

        // Stunned and untouchable: turns keep passing but the clock still moves
        orch.update(0.5);
        assert!((orch.now() - 0.5).abs() < 1e-9);
        assert!(orch.is_active());

        orch.update(1.5);
        assert_eq!(orch.phase(), CombatPhase::PlayerTurn);
        assert_eq!(orch.player().stats.health(), 100);
    }

    #[test]
    fn test_resolution_cancels_pending_turn() {
        let mut orch = orchestrator();
        orch.start_combat(&dummy());
        orch.execute_player_action(&CombatAction::basic_attack()).unwrap();
        assert_eq!(orch.pending_tasks(), 1);

        // Opponent drops before its turn comes up
        if let Some(session) = orch.session.as_mut() {
            session.opponent.stats.set(StatKind::Health, 0);
        }
        orch.pump_events();

        assert_eq!(orch.phase(), CombatPhase::Resolving);
        assert_eq!(orch.pending_tasks(), 1);
        orch.update(1.0);
        assert_eq!(orch.last_outcome(), Some(CombatOutcome::Victory));
    }

    #[test]
    fn test_unknown_effect_is_rejected() {
        let mut orch = orchestrator();
        assert!(!orch.apply_effect_to_player("doom"));
        assert!(!orch.apply_effect_to_opponent("poison"));
    }
}
