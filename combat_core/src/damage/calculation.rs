//! Damage pipeline - turning an action plus both sides' state into health loss
//!
//! Order matters and is fixed:
//! 1. raw = base + round(scaling stat x coefficient) + equipment damage
//! 2. crit roll, raw = round(raw x crit multiplier)
//! 3. x attacker combat-buff multiplier
//! 4. effective defense = round(total defense x (1 - penetration)), or 0
//! 5. max(1, round((damage - defense) x attacker effect multiplier))
//! 6. round(damage x (1 - defender reduction)), no second floor
//! 7. subtract from defender health

use super::DamageOutcome;
use crate::action::CombatAction;
use crate::config::CritConstants;
use crate::stats::StatContainer;
use crate::types::StatKind;
use rand::Rng;

/// Everything the pipeline reads from the attacking side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackerInputs {
    /// Current value of the action's scaling stat (0 if none)
    pub scaling_value: i32,
    pub equipment_damage_bonus: i32,
    pub luck: i32,
    /// Product of active combat buffs
    pub buff_multiplier: f64,
    /// Product of active status effects
    pub effect_multiplier: f64,
}

impl Default for AttackerInputs {
    fn default() -> Self {
        AttackerInputs {
            scaling_value: 0,
            equipment_damage_bonus: 0,
            luck: 0,
            buff_multiplier: 1.0,
            effect_multiplier: 1.0,
        }
    }
}

impl AttackerInputs {
    /// Read the scaling stat and luck from the attacker's stats
    pub fn from_stats(action: &CombatAction, stats: &StatContainer) -> Self {
        AttackerInputs {
            scaling_value: action.scaling_stat.map_or(0, |kind| stats.get(kind)),
            luck: if stats.has(StatKind::Luck) {
                stats.get(StatKind::Luck)
            } else {
                0
            },
            ..Self::default()
        }
    }
}

/// Everything the pipeline reads from the defending side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefenderInputs {
    pub base_defense: i32,
    /// Turn-scoped bonus from defending
    pub defense_bonus: i32,
    pub equipment_defense_bonus: i32,
    /// Damage-taken reduction in [0, 1]
    pub reduction: f64,
}

impl DefenderInputs {
    pub fn total_defense(&self) -> i32 {
        self.base_defense + self.defense_bonus + self.equipment_defense_bonus
    }
}

/// Crit chance for an action, clamped to [0, 1]
pub fn crit_chance(action: &CombatAction, luck: i32, crit: &CritConstants) -> f64 {
    if action.guaranteed_crit {
        return 1.0;
    }
    (crit.base_chance + action.crit_chance_bonus + luck as f64 * crit.luck_factor).clamp(0.0, 1.0)
}

/// Compute a hit, drawing the crit roll from `rng`
///
/// No draw is made for guaranteed crits.
pub fn compute_damage(
    action: &CombatAction,
    attacker: &AttackerInputs,
    defender: &DefenderInputs,
    crit: &CritConstants,
    rng: &mut impl Rng,
) -> DamageOutcome {
    let roll = if action.guaranteed_crit {
        0.0
    } else {
        rng.gen::<f64>()
    };
    compute_damage_with_roll(action, attacker, defender, crit, roll)
}

/// Compute a hit given a uniform crit roll in `[0, 1)`
pub fn compute_damage_with_roll(
    action: &CombatAction,
    attacker: &AttackerInputs,
    defender: &DefenderInputs,
    crit: &CritConstants,
    crit_roll: f64,
) -> DamageOutcome {
    let mut outcome = DamageOutcome::new();

    // Step 1: raw damage
    let scaled = (attacker.scaling_value as f64 * action.stat_scaling).round() as i32;
    let mut damage = action.base_damage + scaled + attacker.equipment_damage_bonus;
    outcome.raw_damage = damage;

    // Step 2: crit
    outcome.crit_chance = crit_chance(action, attacker.luck, crit);
    outcome.is_critical = action.guaranteed_crit || crit_roll < outcome.crit_chance;
    if outcome.is_critical {
        damage = (damage as f64 * crit.damage_multiplier).round() as i32;
    }

    // Step 3: combat buffs
    let buffed = damage as f64 * attacker.buff_multiplier;
    outcome.buffed_damage = buffed;

    // Step 4: defense
    outcome.effective_defense = if action.ignore_defense {
        0
    } else {
        let penetration = action.armor_penetration.clamp(0.0, 1.0);
        (defender.total_defense() as f64 * (1.0 - penetration)).round() as i32
    };

    // Step 5: floor of 1
    let mitigated = ((buffed - outcome.effective_defense as f64) * attacker.effect_multiplier).round() as i32;
    outcome.mitigated_damage = mitigated.max(1);

    // Step 6: reduction last
    outcome.reduction = defender.reduction.clamp(0.0, 1.0);
    outcome.final_damage = (outcome.mitigated_damage as f64 * (1.0 - outcome.reduction)).round() as i32;

    outcome
}

/// Step 7: subtract the outcome from the defender's health
pub fn apply_damage(outcome: &mut DamageOutcome, defender: &mut StatContainer) {
    outcome.health_before = defender.health();
    defender.modify(StatKind::Health, -outcome.final_damage);
    outcome.health_after = defender.health();
    outcome.is_killing_blow = outcome.health_before > 0 && outcome.health_after <= 0;
}
