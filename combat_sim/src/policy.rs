//! Scripted player policy for headless runs

use combat_core::prelude::*;
use combat_core::combat::CombatSession;

/// Health ratio below which the policy heals
const HEAL_BELOW: f64 = 0.35;

/// Picks the player's action from a fixed priority list
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    /// Action ids in the order they are considered
    pub heal: String,
    pub cleanse: String,
    pub buff: String,
    pub heavy: String,
    pub fallback: String,
}

impl Default for ScriptedPolicy {
    fn default() -> Self {
        ScriptedPolicy {
            heal: "second_wind".to_string(),
            cleanse: "cleanse".to_string(),
            buff: "battle_cry".to_string(),
            heavy: "heavy_strike".to_string(),
            fallback: "basic_attack".to_string(),
        }
    }
}

impl ScriptedPolicy {
    /// Choose an action id for the current player turn
    ///
    /// Priority: heal when low, cleanse purgeable debuffs, keep the damage
    /// buff up, heavy attack when affordable, otherwise the fallback.
    pub fn choose(&self, orch: &CombatOrchestrator, session: &CombatSession) -> String {
        let player = orch.player();
        let energy = player.stats.get(StatKind::Energy);
        let affordable = |id: &str| {
            orch.action(id)
                .map_or(false, |action| action.energy_cost <= energy)
        };

        if player.health_ratio() < HEAL_BELOW && affordable(&self.heal) {
            return self.heal.clone();
        }

        let has_cleansable = player
            .effects
            .debuffs()
            .any(|e| e.template.purgeable);
        if has_cleansable && affordable(&self.cleanse) {
            return self.cleanse.clone();
        }

        let buff_id = orch
            .action(&self.buff)
            .and_then(|a| a.grants_buff.as_ref())
            .map(|b| b.id.clone());
        let buff_missing = buff_id.map_or(false, |id| !orch.buffs().has(&id));
        // Not worth buffing for a finishing blow
        if buff_missing && session.opponent.health_ratio() > 0.3 && affordable(&self.buff) {
            return self.buff.clone();
        }

        if affordable(&self.heavy) {
            return self.heavy.clone();
        }

        self.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> CombatOrchestrator {
        let content = CombatContent::defaults();
        let mut orch = CombatOrchestrator::from_content(StatContainer::starting_player(), &content)
            .with_seed(1);
        orch.start_combat(&content.opponents["wolf"]);
        orch
    }

    fn choose(orch: &CombatOrchestrator) -> String {
        let session = orch.session().unwrap();
        ScriptedPolicy::default().choose(orch, session)
    }

    #[test]
    fn test_opens_with_buff() {
        let orch = setup();
        assert_eq!(choose(&orch), "battle_cry");
    }

    #[test]
    fn test_heals_when_low() {
        let mut orch = setup();
        orch.player_stats_mut().set(StatKind::Health, 20);
        assert_eq!(choose(&orch), "second_wind");
    }

    #[test]
    fn test_cleanses_poison() {
        let mut orch = setup();
        orch.apply_effect_to_player("poison");
        assert_eq!(choose(&orch), "cleanse");
    }

    #[test]
    fn test_falls_back_without_energy() {
        let mut orch = setup();
        orch.player_stats_mut().set(StatKind::Energy, 0);
        assert_eq!(choose(&orch), "basic_attack");
    }
}
