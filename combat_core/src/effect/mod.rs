//! Status effect system

mod active;
mod engine;
mod template;

pub use active::ActiveStatusEffect;
pub use engine::{EffectEvent, StatusEffectEngine};
pub use template::{ModifierMode, StackingPolicy, StatModifier, StatusEffectTemplate};

use crate::types::StatKind;
use std::collections::HashMap;

/// Status effect template registry
#[derive(Debug, Clone, Default)]
pub struct EffectCatalog {
    /// Mapping from effect id to template
    templates: HashMap<String, StatusEffectTemplate>,
}

impl EffectCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        EffectCatalog {
            templates: HashMap::new(),
        }
    }

    /// Register a template (replacing one with the same id)
    pub fn register(&mut self, template: StatusEffectTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by id
    pub fn get(&self, id: &str) -> Option<&StatusEffectTemplate> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Load the built-in effect set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        // Poison - steady damage, cleansable
        catalog.register(
            StatusEffectTemplate::new("poison", "Poison", 5.0)
                .with_tick(1.0, 5)
                .purgeable_debuff(),
        );

        // Burn - heavier damage, short, cleansable
        catalog.register(
            StatusEffectTemplate::new("burn", "Burn", 3.0)
                .with_tick(1.0, 8)
                .purgeable_debuff(),
        );

        // Bleed - stacks up to 5, cannot be cleansed
        catalog.register(
            StatusEffectTemplate::new("bleed", "Bleed", 4.0)
                .with_tick(1.0, 3)
                .stackable(5)
                .debuff(),
        );

        // Regeneration - heal over time
        catalog.register(StatusEffectTemplate::new("regeneration", "Regeneration", 5.0).with_tick(1.0, -4));

        // Stun - lose actions
        catalog.register(
            StatusEffectTemplate::new("stun", "Stun", 1.5)
                .preventing_actions()
                .preventing_movement()
                .purgeable_debuff(),
        );

        // Weakness - less damage dealt, lower strength
        catalog.register(
            StatusEffectTemplate::new("weakness", "Weakness", 6.0)
                .with_damage_multiplier(0.75)
                .with_modifier(StatModifier::percent(StatKind::Strength, -20.0))
                .purgeable_debuff(),
        );

        // Fortify - damage taken reduced, defense up
        catalog.register(
            StatusEffectTemplate::new("fortify", "Fortify", 6.0)
                .with_damage_reduction(0.25)
                .with_modifier(StatModifier::flat(StatKind::Defense, 5.0)),
        );

        // Berserk - more damage dealt, less defense, stacks up to 3
        catalog.register(
            StatusEffectTemplate::new("berserk", "Berserk", 8.0)
                .with_damage_multiplier(1.25)
                .with_modifier(StatModifier::flat(StatKind::Defense, -2.0))
                .stackable(3),
        );

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let catalog = EffectCatalog::with_defaults();
        assert_eq!(catalog.len(), 8);
        for id in catalog.ids() {
            let template = catalog.get(id).unwrap();
            assert!(template.validate().is_ok(), "invalid default effect: {}", id);
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = EffectCatalog::new();
        catalog.register(StatusEffectTemplate::new("poison", "Poison", 5.0));
        catalog.register(StatusEffectTemplate::new("poison", "Strong Poison", 5.0));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("poison").unwrap().name, "Strong Poison");
    }
}
