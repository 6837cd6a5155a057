//! Player action catalog loading

use crate::action::CombatAction;
use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Container for action configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    #[serde(rename = "actions")]
    pub actions: Vec<CombatAction>,
}

/// Load action configurations from a TOML file
pub fn load_actions(path: &Path) -> Result<HashMap<String, CombatAction>, ConfigError> {
    let config: ActionsConfig = super::load_toml(path)?;
    build_map(config)
}

/// Load action configurations from a TOML string
pub fn parse_actions(content: &str) -> Result<HashMap<String, CombatAction>, ConfigError> {
    let config: ActionsConfig = super::parse_toml(content)?;
    build_map(config)
}

fn build_map(config: ActionsConfig) -> Result<HashMap<String, CombatAction>, ConfigError> {
    let mut map = HashMap::new();
    for action in config.actions {
        action.validate().map_err(ConfigError::ValidationError)?;
        map.insert(action.id.clone(), action);
    }
    Ok(map)
}

/// Get the bundled player actions
pub fn default_actions() -> HashMap<String, CombatAction> {
    let toml = include_str!("../../config/actions.toml");
    parse_actions(toml).unwrap_or_else(|_| {
        let mut map = HashMap::new();
        map.insert("basic_attack".to_string(), CombatAction::basic_attack());
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        let toml = r#"
[[actions]]
id = "shield_wall"
name = "Shield Wall"
is_defensive = true
defense_bonus = 15
energy_cost = 10

[actions.grants_buff]
id = "buff_shield_wall"
name = "Shield Wall"
duration = 3.0
damage_reduction = 0.2
"#;

        let actions = parse_actions(toml).unwrap();
        let wall = &actions["shield_wall"];
        assert!(wall.is_defensive);
        assert_eq!(wall.defense_bonus, 15);
        let buff = wall.grants_buff.as_ref().unwrap();
        assert!((buff.damage_reduction - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_actions_loads_all() {
        let actions = default_actions();

        let expected = [
            "basic_attack",
            "heavy_strike",
            "precise_strike",
            "piercing_thrust",
            "venom_blade",
            "defend",
            "second_wind",
            "cleanse",
            "battle_cry",
        ];

        assert_eq!(actions.len(), expected.len());
        for id in expected {
            assert!(actions.contains_key(id), "Missing action: {}", id);
        }
    }
}
