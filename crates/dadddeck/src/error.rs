//! # Engine Error Types

use dadddeck_core::CatalogError;
use dadddeck_economy::EconomyError;
use dadddeck_storage::StorageError;
use thiserror::Error;

use crate::rate_limit::RateLimitExceeded;

/// Errors surfaced by the [`Engine`](crate::Engine).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Drop tables, recipes or crafting refused the request.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// The collection could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The card catalog is unusable.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Too many packs opened in the current window.
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    /// The engine configuration could not be loaded.
    #[error("engine config: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the caller can retry later without changing anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Seconds to wait before retrying, for rate-limit errors.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited(e) => Some(e.retry_after_secs),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
