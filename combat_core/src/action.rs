//! CombatAction - Catalog data for what a combatant can do on its turn

use crate::buff::CombatBuff;
use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// A status effect rolled onto the defender after a landed hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHitEffect {
    pub effect_id: String,
    /// Chance in [0, 1]
    #[serde(default = "default_chance")]
    pub chance: f64,
}

fn default_chance() -> f64 {
    1.0
}

impl OnHitEffect {
    pub fn new(effect_id: &str, chance: f64) -> Self {
        OnHitEffect {
            effect_id: effect_id.to_string(),
            chance,
        }
    }
}

/// A single combat action
///
/// Offensive actions use the damage fields; defensive actions use
/// `heal_amount` and `defense_bonus`. The two sets are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatAction {
    pub id: String,
    pub name: String,

    // === Offense ===
    #[serde(default)]
    pub base_damage: i32,
    /// Stat whose current value scales damage
    #[serde(default)]
    pub scaling_stat: Option<StatKind>,
    #[serde(default)]
    pub stat_scaling: f64,
    #[serde(default)]
    pub guaranteed_crit: bool,
    #[serde(default)]
    pub crit_chance_bonus: f64,
    #[serde(default)]
    pub ignore_defense: bool,
    /// Fraction of the defender's defense ignored, in [0, 1]
    #[serde(default)]
    pub armor_penetration: f64,
    #[serde(default)]
    pub on_hit_effects: Vec<OnHitEffect>,

    // === Defense ===
    #[serde(default)]
    pub is_defensive: bool,
    #[serde(default)]
    pub heal_amount: i32,
    #[serde(default)]
    pub defense_bonus: i32,

    // === Shared ===
    #[serde(default)]
    pub energy_cost: i32,
    /// Cleanse purgeable debuffs from the user
    #[serde(default)]
    pub purges_debuffs: bool,
    /// Combat buff granted to the user
    #[serde(default)]
    pub grants_buff: Option<CombatBuff>,
}

impl CombatAction {
    /// Create an offensive action
    pub fn attack(id: &str, name: &str, base_damage: i32) -> Self {
        CombatAction {
            id: id.to_string(),
            name: name.to_string(),
            base_damage,
            scaling_stat: None,
            stat_scaling: 0.0,
            guaranteed_crit: false,
            crit_chance_bonus: 0.0,
            ignore_defense: false,
            armor_penetration: 0.0,
            on_hit_effects: Vec::new(),
            is_defensive: false,
            heal_amount: 0,
            defense_bonus: 0,
            energy_cost: 0,
            purges_debuffs: false,
            grants_buff: None,
        }
    }

    /// Create a defensive action
    pub fn defensive(id: &str, name: &str, defense_bonus: i32, heal_amount: i32) -> Self {
        CombatAction {
            is_defensive: true,
            defense_bonus,
            heal_amount,
            ..CombatAction::attack(id, name, 0)
        }
    }

    /// Fallback when no action catalog is available
    pub fn basic_attack() -> Self {
        CombatAction::attack("basic_attack", "Basic Attack", 5).with_scaling(StatKind::Strength, 0.5)
    }

    pub fn with_scaling(mut self, stat: StatKind, coefficient: f64) -> Self {
        self.scaling_stat = Some(stat);
        self.stat_scaling = coefficient;
        self
    }

    pub fn with_cost(mut self, energy_cost: i32) -> Self {
        self.energy_cost = energy_cost;
        self
    }

    pub fn with_guaranteed_crit(mut self) -> Self {
        self.guaranteed_crit = true;
        self
    }

    pub fn with_crit_bonus(mut self, bonus: f64) -> Self {
        self.crit_chance_bonus = bonus;
        self
    }

    pub fn ignoring_defense(mut self) -> Self {
        self.ignore_defense = true;
        self
    }

    pub fn with_armor_penetration(mut self, fraction: f64) -> Self {
        self.armor_penetration = fraction;
        self
    }

    pub fn with_on_hit(mut self, effect: OnHitEffect) -> Self {
        self.on_hit_effects.push(effect);
        self
    }

    pub fn with_buff(mut self, buff: CombatBuff) -> Self {
        self.grants_buff = Some(buff);
        self
    }

    pub fn purging(mut self) -> Self {
        self.purges_debuffs = true;
        self
    }

    /// Check catalog data for contradictory or out-of-range fields
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("action id must not be empty".to_string());
        }
        if self.energy_cost < 0 {
            return Err(format!("action '{}': energy_cost must not be negative", self.id));
        }
        if self.is_defensive
            && (self.base_damage != 0
                || self.scaling_stat.is_some()
                || self.guaranteed_crit
                || self.ignore_defense
                || !self.on_hit_effects.is_empty())
        {
            return Err(format!(
                "action '{}': defensive actions cannot carry damage fields",
                self.id
            ));
        }
        if !(0.0..=1.0).contains(&self.armor_penetration) {
            return Err(format!(
                "action '{}': armor_penetration must be within [0, 1]",
                self.id
            ));
        }
        if let Some(bad) = self
            .on_hit_effects
            .iter()
            .find(|e| !(0.0..=1.0).contains(&e.chance))
        {
            return Err(format!(
                "action '{}': on-hit chance for '{}' must be within [0, 1]",
                self.id, bad.effect_id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defensive_constructor() {
        let action = CombatAction::defensive("guard", "Guard", 10, 5);
        assert!(action.is_defensive);
        assert_eq!(action.base_damage, 0);
        assert!(action.validate().is_ok());
    }

    #[test]
    fn test_defensive_with_damage_is_invalid() {
        let mut action = CombatAction::defensive("guard", "Guard", 10, 0);
        action.base_damage = 5;
        assert!(action.validate().is_err());
    }

    #[test]
    fn test_armor_penetration_range() {
        let action = CombatAction::attack("pierce", "Pierce", 10).with_armor_penetration(1.5);
        assert!(action.validate().is_err());
    }

    #[test]
    fn test_parse_action() {
        let action: CombatAction = toml::from_str(
            r#"
id = "venom_strike"
name = "Venom Strike"
base_damage = 6
scaling_stat = "agility"
stat_scaling = 0.4
energy_cost = 10

[[on_hit_effects]]
effect_id = "poison"
chance = 0.5
"#,
        )
        .unwrap();
        assert_eq!(action.scaling_stat, Some(StatKind::Agility));
        assert_eq!(action.on_hit_effects.len(), 1);
        assert!(!action.is_defensive);
        assert!(action.validate().is_ok());
    }
}
