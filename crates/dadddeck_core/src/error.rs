//! # Core Error Types

use thiserror::Error;

use crate::card::Rarity;

/// Errors raised while loading or validating the card catalog and ledgers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A card failed structural validation.
    #[error("invalid card {id}: {reason}")]
    InvalidCard {
        /// Offending card id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two catalog entries share an id.
    #[error("duplicate card id: {0}")]
    DuplicateCard(String),

    /// The catalog source could not be parsed.
    #[error("catalog parse error: {0}")]
    Parse(String),

    /// The catalog file could not be read.
    #[error("catalog io error: {0}")]
    Io(String),

    /// Not enough materials of a rarity in the ledger.
    #[error("insufficient {rarity} materials: need {required}, have {available}")]
    InsufficientMaterials {
        /// Material rarity.
        rarity: Rarity,
        /// Amount required.
        required: u32,
        /// Amount held.
        available: u32,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
