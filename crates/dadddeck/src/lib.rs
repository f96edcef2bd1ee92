//! # DadDeck
//!
//! The engine facade over the core, economy and storage crates, plus the
//! pack-open rate limiter and the clock abstraction it runs on.
//!
//! ## Wiring
//!
//! ```text
//! EngineConfig (TOML) ─┐
//! StaticCatalog ───────┼──> Engine ──> StoredCollectionRepository ──┐
//! Clock ───────────────┤        └────> RateLimiter ─────────────────┼──> StorageBackend
//! SeededPrng ──────────┘                                            │
//!                                                                   ┘
//! ```
//!
//! Storage, clock and PRNG are injected; nothing here is global.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod rate_limit;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{CraftReport, Engine, PackOpening};
pub use error::{EngineError, EngineResult};
pub use rate_limit::{
    RateLimitConfig, RateLimitExceeded, RateLimitStatus, RateLimitWindow, RateLimiter,
    RATE_LIMIT_KEY,
};
