//! # Economy Error Types
//!
//! All errors that can occur in the drop engine.

use dadddeck_core::{CatalogError, Rarity};
use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// A rarity was rolled (or requested) but the catalog has no cards of it.
    ///
    /// This is a configuration error and is never masked by substituting
    /// another rarity.
    #[error("no catalog cards of rarity {0}")]
    EmptyRarityPool(Rarity),

    /// Attempted to craft with insufficient materials.
    #[error("insufficient materials: need {required} {rarity} cards, have {available}")]
    InsufficientMaterials {
        /// Material rarity.
        rarity: Rarity,
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// Attempted to craft without enough currency.
    #[error("insufficient currency: need {required}, have {available}")]
    InsufficientCurrency {
        /// The amount required.
        required: u64,
        /// The amount available.
        available: u64,
    },

    /// Recipe not found in the recipe book.
    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// Invalid configuration (drop tables, recipes, pack settings).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catalog error bubbled up from the core crate.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
