//! Interfaces to systems outside the combat core
//!
//! Every collaborator is optional. A missing one contributes nothing and
//! combat proceeds unaffected.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Read-only equipment totals, queried on every hit
pub trait EquipmentBonuses {
    fn total_damage_bonus(&self) -> i32;
    fn total_defense_bonus(&self) -> i32;
}

/// Experience, currency and loot ledgers
pub trait RewardSink {
    fn grant_experience(&mut self, amount: u32);
    fn grant_currency(&mut self, amount: u32);
    fn roll_loot(&mut self, table: &str);
    /// Called once when the player is defeated
    fn apply_defeat_penalty(&mut self) {}
}

/// Game-state persistence
pub trait PersistenceTrigger {
    fn save_now(&mut self);
}

impl<T: EquipmentBonuses + ?Sized> EquipmentBonuses for Rc<RefCell<T>> {
    fn total_damage_bonus(&self) -> i32 {
        self.borrow().total_damage_bonus()
    }

    fn total_defense_bonus(&self) -> i32 {
        self.borrow().total_defense_bonus()
    }
}

impl<T: RewardSink + ?Sized> RewardSink for Rc<RefCell<T>> {
    fn grant_experience(&mut self, amount: u32) {
        self.borrow_mut().grant_experience(amount);
    }

    fn grant_currency(&mut self, amount: u32) {
        self.borrow_mut().grant_currency(amount);
    }

    fn roll_loot(&mut self, table: &str) {
        self.borrow_mut().roll_loot(table);
    }

    fn apply_defeat_penalty(&mut self) {
        self.borrow_mut().apply_defeat_penalty();
    }
}

impl<T: PersistenceTrigger + ?Sized> PersistenceTrigger for Rc<RefCell<T>> {
    fn save_now(&mut self) {
        self.borrow_mut().save_now();
    }
}

/// Fixed equipment totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEquipment {
    pub damage_bonus: i32,
    pub defense_bonus: i32,
}

impl FixedEquipment {
    pub fn new(damage_bonus: i32, defense_bonus: i32) -> Self {
        FixedEquipment {
            damage_bonus,
            defense_bonus,
        }
    }
}

impl EquipmentBonuses for FixedEquipment {
    fn total_damage_bonus(&self) -> i32 {
        self.damage_bonus
    }

    fn total_defense_bonus(&self) -> i32 {
        self.defense_bonus
    }
}

/// Reward sink that just records what it was given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardLedger {
    pub experience: u32,
    pub currency: u32,
    pub loot_rolls: Vec<String>,
    pub defeat_penalties: u32,
}

impl RewardSink for RewardLedger {
    fn grant_experience(&mut self, amount: u32) {
        self.experience += amount;
    }

    fn grant_currency(&mut self, amount: u32) {
        self.currency += amount;
    }

    fn roll_loot(&mut self, table: &str) {
        self.loot_rolls.push(table.to_string());
    }

    fn apply_defeat_penalty(&mut self) {
        self.defeat_penalties += 1;
    }
}

/// Persistence trigger that counts saves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveCounter {
    pub saves: u32,
}

impl PersistenceTrigger for SaveCounter {
    fn save_now(&mut self) {
        self.saves += 1;
    }
}
