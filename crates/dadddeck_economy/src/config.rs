//! # Economy Configuration
//!
//! All balance data lives in one TOML document, loaded once at startup:
//!
//! ```toml
//! [pack]
//! cards_per_pack = 6
//! holo_chance = 0.1667
//!
//! [pack.rarity_table]
//! common = 0.55
//! # ...
//!
//! [[recipes]]
//! id = "common_to_uncommon"
//! input_rarity = "common"
//! input_count = 5
//! output_rarity = "uncommon"
//! success_rate = 1.0
//!
//! [completion]
//! milestone_thresholds = [25, 50, 75, 100]
//! ```
//!
//! Missing sections fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::completion::CompletionConfig;
use crate::crafting::{CraftingRecipe, RecipeBook};
use crate::error::{EconomyError, EconomyResult};
use crate::generator::PackConfig;

/// Every tunable of the drop engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Pack generation tables.
    pub pack: PackConfig,
    /// Crafting recipes.
    pub recipes: Vec<CraftingRecipe>,
    /// Completion milestones and rewards.
    pub completion: CompletionConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            pack: PackConfig::default(),
            recipes: RecipeBook::standard().recipes().to_vec(),
            completion: CompletionConfig::default(),
        }
    }
}

impl EconomyConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] on parse or validation failure.
    pub fn from_toml_str(toml_str: &str) -> EconomyResult<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| EconomyError::InvalidConfig(format!("economy config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] if the file cannot be read or
    /// is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EconomyError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), recipes = config.recipes.len(), "loaded economy config");
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// The first problem found.
    pub fn validate(&self) -> EconomyResult<()> {
        self.pack.validate()?;
        self.recipe_book()?;
        self.completion.validate()
    }

    /// Builds the recipe book.
    ///
    /// # Errors
    ///
    /// Invalid, duplicate or cyclic recipes.
    pub fn recipe_book(&self) -> EconomyResult<RecipeBook> {
        RecipeBook::new(self.recipes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dadddeck_core::Rarity;

    #[test]
    fn test_default_is_valid() {
        assert!(EconomyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EconomyConfig::from_toml_str("").unwrap();
        assert_eq!(config, EconomyConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EconomyConfig::from_toml_str(
            r#"
            [pack]
            cards_per_pack = 10

            [pack.pity]
            threshold = 5
            floor = "legendary"

            [[recipes]]
            id = "rare_up"
            name = "Rare Up"
            input_rarity = "rare"
            input_count = 3
            output_rarity = "epic"
            success_rate = 0.5
            fail_return_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.pack.cards_per_pack, 10);
        assert!((config.pack.holo_chance - 1.0 / 6.0).abs() < 1e-12);
        assert!(config.pack.pity.enabled);
        assert_eq!(config.pack.pity.threshold, 5);
        assert_eq!(config.pack.pity.floor, Rarity::Legendary);
        assert_eq!(config.recipes.len(), 1);
        assert_eq!(config.recipes[0].output_count, 1);
        assert_eq!(config.completion, CompletionConfig::default());
    }

    #[test]
    fn test_bad_rarity_table_rejected() {
        let result = EconomyConfig::from_toml_str(
            r"
            [pack.rarity_table]
            common = 0.5
            ",
        );
        assert!(matches!(result, Err(EconomyError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(EconomyConfig::from_toml_str("[pack\ncards = ").is_err());
    }
}
