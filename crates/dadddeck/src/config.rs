//! # Engine Configuration
//!
//! The economy tables plus the rate limit, in one TOML file:
//!
//! ```toml
//! [pack]
//! cards_per_pack = 6
//!
//! [rate_limit]
//! max_requests = 10
//! window_ms = 60000
//! burst_allowed = 2
//! ```

use dadddeck_economy::EconomyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::rate_limit::RateLimitConfig;

/// Everything the engine reads at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Drop tables, recipes and milestones.
    #[serde(flatten)]
    pub economy: EconomyConfig,
    /// Pack-open rate limit.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] on parse failure, or the economy validation error.
    pub fn from_toml_str(toml_str: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`Self::from_toml_str`], plus unreadable files.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&contents)?;
        info!(
            path = %path.display(),
            cards_per_pack = config.economy.pack.cards_per_pack,
            max_requests = config.rate_limit.max_requests,
            "loaded engine config"
        );
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// The first problem found.
    pub fn validate(&self) -> EngineResult<()> {
        self.economy.validate()?;
        if self.rate_limit.window_ms <= 0 {
            return Err(EngineError::Config("rate_limit.window_ms must be positive".into()));
        }
        Ok(())
    }
}
