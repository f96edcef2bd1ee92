//! # Collection Repository
//!
//! Load/save of the player's collection, injected wherever persistence is
//! needed instead of a global store.

use dadddeck_core::Collection;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::codec::{decode, encode};
use crate::error::StorageResult;

/// Storage key of the player's collection.
pub const COLLECTION_KEY: &str = "dadddeck_collection";

/// Persists the player's collection.
pub trait CollectionRepository {
    /// Loads the collection. Never fails; a missing or unreadable save is an
    /// empty collection.
    fn load(&self) -> Collection;

    /// Saves the collection.
    ///
    /// # Errors
    ///
    /// Encoding or backend failure.
    fn save(&self, collection: &Collection) -> StorageResult<()>;
}

/// A repository over any [`StorageBackend`].
#[derive(Clone)]
pub struct StoredCollectionRepository {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl StoredCollectionRepository {
    /// Uses the default key.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_key(backend, COLLECTION_KEY)
    }

    /// Uses a custom key, e.g. one per profile.
    #[must_use]
    pub fn with_key(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Deletes the stored collection.
    ///
    /// # Errors
    ///
    /// Backend failure.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.remove(&self.key)
    }
}

impl std::fmt::Debug for StoredCollectionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCollectionRepository")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CollectionRepository for StoredCollectionRepository {
    fn load(&self) -> Collection {
        match self.backend.get(&self.key) {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => {
                debug!(key = %self.key, "no saved collection");
                Collection::default()
            }
            Err(error) => {
                warn!(key = %self.key, %error, "cannot read saved collection");
                Collection::default()
            }
        }
    }

    fn save(&self, collection: &Collection) -> StorageResult<()> {
        let raw = encode(collection)?;
        self.backend.set(&self.key, &raw)?;
        debug!(key = %self.key, packs = collection.packs.len(), "saved collection");
        Ok(())
    }
}
