//! Status effect catalog loading

use crate::effect::{EffectCatalog, StatusEffectTemplate};
use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for effect templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    #[serde(rename = "effects")]
    pub effects: Vec<StatusEffectTemplate>,
}

/// Load an effect catalog from a TOML file
pub fn load_effect_catalog(path: &Path) -> Result<EffectCatalog, ConfigError> {
    let config: EffectsConfig = super::load_toml(path)?;
    build_catalog(config)
}

/// Load an effect catalog from a TOML string
pub fn parse_effect_catalog(content: &str) -> Result<EffectCatalog, ConfigError> {
    let config: EffectsConfig = super::parse_toml(content)?;
    build_catalog(config)
}

fn build_catalog(config: EffectsConfig) -> Result<EffectCatalog, ConfigError> {
    let mut catalog = EffectCatalog::new();
    for template in config.effects {
        template.validate().map_err(ConfigError::ValidationError)?;
        catalog.register(template);
    }
    Ok(catalog)
}

/// Get the bundled effect catalog
pub fn default_effects() -> EffectCatalog {
    let toml = include_str!("../../config/effects.toml");
    parse_effect_catalog(toml).unwrap_or_else(|_| EffectCatalog::with_defaults())
}
