//! OpponentTemplate - Static data an opponent is built from

use crate::action::{CombatAction, OnHitEffect};
use crate::ai::{AiPattern, AiThresholds};
use crate::stats::{Stat, StatContainer};
use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// Catalog entry for an opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentTemplate {
    pub id: String,
    pub name: String,

    // === Stats ===
    pub health: i32,
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub luck: i32,

    // === Behavior ===
    #[serde(default)]
    pub pattern: AiPattern,
    #[serde(default)]
    pub thresholds: AiThresholds,
    /// Attack scaling for the special attack
    #[serde(default = "default_special_multiplier")]
    pub special_attack_multiplier: f64,
    /// Armor penetration of the special attack
    #[serde(default)]
    pub special_armor_penetration: f64,
    /// Defense bonus gained by defending
    #[serde(default = "default_defend_bonus")]
    pub defend_bonus: i32,
    #[serde(default)]
    pub on_hit_effects: Vec<OnHitEffect>,

    // === Rewards ===
    #[serde(default)]
    pub experience_reward: u32,
    #[serde(default)]
    pub currency_reward: u32,
    #[serde(default)]
    pub loot_table: Option<String>,
}

fn default_special_multiplier() -> f64 {
    1.5
}

fn default_defend_bonus() -> i32 {
    10
}

impl OpponentTemplate {
    /// Minimal template, mostly for tests
    pub fn new(id: &str, name: &str, health: i32, attack: i32, defense: i32) -> Self {
        OpponentTemplate {
            id: id.to_string(),
            name: name.to_string(),
            health,
            attack,
            defense,
            speed: 0,
            luck: 0,
            pattern: AiPattern::default(),
            thresholds: AiThresholds::default(),
            special_attack_multiplier: default_special_multiplier(),
            special_armor_penetration: 0.0,
            defend_bonus: default_defend_bonus(),
            on_hit_effects: Vec::new(),
            experience_reward: 0,
            currency_reward: 0,
            loot_table: None,
        }
    }

    pub fn with_pattern(mut self, pattern: AiPattern, thresholds: AiThresholds) -> Self {
        self.pattern = pattern;
        self.thresholds = thresholds;
        self
    }

    pub fn with_rewards(mut self, experience: u32, currency: u32, loot_table: Option<&str>) -> Self {
        self.experience_reward = experience;
        self.currency_reward = currency;
        self.loot_table = loot_table.map(str::to_string);
        self
    }

    pub fn with_on_hit(mut self, effect: OnHitEffect) -> Self {
        self.on_hit_effects.push(effect);
        self
    }

    /// Build a fresh stat container for one encounter
    pub fn build_stats(&self) -> StatContainer {
        StatContainer::new()
            .with_stat(Stat::resource(StatKind::Health, self.health))
            .with_attribute(StatKind::Attack, self.attack)
            .with_attribute(StatKind::Defense, self.defense)
            .with_attribute(StatKind::Speed, self.speed)
            .with_attribute(StatKind::Luck, self.luck)
    }

    /// Plain attack, scaling fully with the opponent's current attack stat
    pub fn attack_action(&self) -> CombatAction {
        let mut action = CombatAction::attack(&format!("{}_attack", self.id), "Attack", 0)
            .with_scaling(StatKind::Attack, 1.0);
        action.on_hit_effects = self.on_hit_effects.clone();
        action
    }

    /// Heavier attack used by the special branch of the policy
    pub fn special_attack_action(&self) -> CombatAction {
        let mut action = CombatAction::attack(&format!("{}_special", self.id), "Special Attack", 0)
            .with_scaling(StatKind::Attack, self.special_attack_multiplier)
            .with_armor_penetration(self.special_armor_penetration);
        action.on_hit_effects = self.on_hit_effects.clone();
        action
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("opponent id must not be empty".to_string());
        }
        if self.health <= 0 {
            return Err(format!("opponent '{}': health must be positive", self.id));
        }
        if self.attack < 0 || self.defense < 0 {
            return Err(format!(
                "opponent '{}': attack and defense must not be negative",
                self.id
            ));
        }
        if !(0.0..=1.0).contains(&self.special_armor_penetration) {
            return Err(format!(
                "opponent '{}': special_armor_penetration must be within [0, 1]",
                self.id
            ));
        }
        let t = &self.thresholds;
        if t.defend_chance < 0.0
            || t.special_attack_chance < 0.0
            || t.defend_chance + t.special_attack_chance > 1.0
        {
            return Err(format!(
                "opponent '{}': defend and special chances must be non-negative and sum to at most 1",
                self.id
            ));
        }
        Ok(())
    }
}
