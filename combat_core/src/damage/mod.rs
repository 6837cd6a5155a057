//! Damage system - the hit pipeline and its result

mod calculation;
mod result;

pub use calculation::{
    apply_damage, compute_damage, compute_damage_with_roll, crit_chance, AttackerInputs,
    DefenderInputs,
};
pub use result::DamageOutcome;
