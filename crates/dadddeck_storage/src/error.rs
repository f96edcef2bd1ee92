//! # Storage Error Types

use thiserror::Error;

/// Errors from storage backends and the save codec.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode or decode failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The payload does not match its stored checksum.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum in the envelope.
        stored: u32,
        /// Checksum of the payload as read.
        computed: u32,
    },

    /// The save was written by an unknown format version.
    #[error("unsupported save version {found} (current {current})")]
    UnsupportedVersion {
        /// Version in the envelope.
        found: u32,
        /// Version this build writes.
        current: u32,
    },

    /// A migration step could not upgrade the payload.
    #[error("migration from v{from} failed: {reason}")]
    Migration {
        /// Source version of the failing step.
        from: u32,
        /// What was wrong.
        reason: String,
    },

    /// The decoded collection breaks its own invariants.
    #[error("corrupted save: {0}")]
    Corrupted(String),

    /// A key that cannot be used as a storage name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    /// Whether retrying (or falling back to memory) can help.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
