//! # DadDeck Storage
//!
//! Persistence for the player's collection.
//!
//! ## Layers
//!
//! 1. [`StorageBackend`] - key/value strings (memory, file, fallback)
//! 2. [`codec`] - versioned, checksummed JSON envelope
//! 3. [`migration`] - ordered upgrades of old saves
//! 4. [`CollectionRepository`] - load/save of a [`Collection`](dadddeck_core::Collection)
//!
//! Loading is infallible by contract: corrupt or unknown data becomes an
//! empty collection and a `warn!` line.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod codec;
pub mod error;
pub mod migration;
pub mod repository;

pub use backend::{FallbackStorage, FileStorage, MemoryStorage, StorageBackend};
pub use codec::{decode, encode, try_decode, SaveEnvelope};
pub use error::{StorageError, StorageResult};
pub use migration::{migrate, needs_migration, Migration, CURRENT_VERSION, MIGRATIONS};
pub use repository::{CollectionRepository, StoredCollectionRepository, COLLECTION_KEY};
