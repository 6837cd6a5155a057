//! Opponent catalog loading

use crate::combat::OpponentTemplate;
use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Container for opponent templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentsConfig {
    #[serde(rename = "opponents")]
    pub opponents: Vec<OpponentTemplate>,
}

/// Load opponent templates from a TOML file
pub fn load_opponents(path: &Path) -> Result<HashMap<String, OpponentTemplate>, ConfigError> {
    let config: OpponentsConfig = super::load_toml(path)?;
    build_map(config)
}

/// Load opponent templates from a TOML string
pub fn parse_opponents(content: &str) -> Result<HashMap<String, OpponentTemplate>, ConfigError> {
    let config: OpponentsConfig = super::parse_toml(content)?;
    build_map(config)
}

fn build_map(config: OpponentsConfig) -> Result<HashMap<String, OpponentTemplate>, ConfigError> {
    let mut map = HashMap::new();
    for opponent in config.opponents {
        opponent.validate().map_err(ConfigError::ValidationError)?;
        map.insert(opponent.id.clone(), opponent);
    }
    Ok(map)
}

/// Get the bundled opponents
pub fn default_opponents() -> HashMap<String, OpponentTemplate> {
    let toml = include_str!("../../config/opponents.toml");
    parse_opponents(toml).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiPattern;

    #[test]
    fn test_parse_opponents() {
        let toml = r#"
[[opponents]]
id = "bandit"
name = "Bandit"
health = 80
attack = 9
defense = 4
pattern = "finisher"
experience_reward = 25
currency_reward = 12
loot_table = "bandit_common"

[opponents.thresholds]
finisher_threshold = 0.35
"#;

        let opponents = parse_opponents(toml).unwrap();
        let bandit = &opponents["bandit"];
        assert_eq!(bandit.pattern, AiPattern::Finisher);
        assert!((bandit.thresholds.finisher_threshold - 0.35).abs() < f64::EPSILON);
        // Unspecified thresholds keep their defaults
        assert!((bandit.thresholds.low_health_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(bandit.loot_table.as_deref(), Some("bandit_common"));
    }

    #[test]
    fn test_default_opponents_loads_all() {
        let opponents = default_opponents();
        for id in ["slime", "wolf", "bandit", "stone_golem", "cultist"] {
            assert!(opponents.contains_key(id), "Missing opponent: {}", id);
        }
    }
}
