//! Configuration loading from TOML files

mod actions;
mod constants;
mod effects;
mod opponents;

pub use actions::{default_actions, load_actions, parse_actions};
pub use constants::{CombatConstants, CritConstants, DefenseConstants, RecoveryConstants, TimingConstants};
pub use effects::{default_effects, load_effect_catalog, parse_effect_catalog};
pub use opponents::{default_opponents, load_opponents, parse_opponents};

use crate::action::CombatAction;
use crate::combat::OpponentTemplate;
use crate::effect::EffectCatalog;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Everything needed to run encounters
#[derive(Debug, Clone)]
pub struct CombatContent {
    pub constants: CombatConstants,
    pub effects: EffectCatalog,
    pub actions: HashMap<String, CombatAction>,
    pub opponents: HashMap<String, OpponentTemplate>,
}

impl CombatContent {
    /// Bundled content
    pub fn defaults() -> Self {
        CombatContent {
            constants: CombatConstants::default(),
            effects: default_effects(),
            actions: default_actions(),
            opponents: default_opponents(),
        }
    }

    /// Load `combat.toml`, `effects.toml`, `actions.toml` and `opponents.toml` from a directory
    ///
    /// A missing `combat.toml` falls back to default constants; the catalogs are required.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let constants_path = dir.join("combat.toml");
        let constants: CombatConstants = if constants_path.exists() {
            load_toml(&constants_path)?
        } else {
            CombatConstants::default()
        };
        constants.validate().map_err(ConfigError::ValidationError)?;

        let content = CombatContent {
            constants,
            effects: load_effect_catalog(&dir.join("effects.toml"))?,
            actions: load_actions(&dir.join("actions.toml"))?,
            opponents: load_opponents(&dir.join("opponents.toml"))?,
        };
        content.check_references()?;
        Ok(content)
    }

    /// Ensure every on-hit effect id names a catalog entry
    pub fn check_references(&self) -> Result<(), ConfigError> {
        let action_refs = self
            .actions
            .values()
            .flat_map(|a| a.on_hit_effects.iter().map(move |e| (a.id.as_str(), e)));
        let opponent_refs = self
            .opponents
            .values()
            .flat_map(|o| o.on_hit_effects.iter().map(move |e| (o.id.as_str(), e)));

        for (owner, on_hit) in action_refs.chain(opponent_refs) {
            if !self.effects.contains(&on_hit.effect_id) {
                return Err(ConfigError::ValidationError(format!(
                    "'{}' references unknown effect '{}'",
                    owner, on_hit.effect_id
                )));
            }
        }
        Ok(())
    }
}
