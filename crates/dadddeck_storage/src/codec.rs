//! # Save Codec
//!
//! ## Format
//!
//! ```text
//! {
//!   "version": 3,                 // save format version
//!   "crc32":   2774295120,        // CRC32 of the payload bytes
//!   "payload": "{\"packs\":...}"  // the collection as a JSON string
//! }
//! ```
//!
//! The payload is kept as a string so the checksum covers exactly the bytes
//! that were written.
//!
//! [`decode`] never fails. Any problem (bad JSON, checksum mismatch, failed
//! migration, broken invariant) yields an empty collection and a warning.

use dadddeck_core::Collection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::migration::{migrate, CURRENT_VERSION};

/// The persisted wrapper around a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    /// Save format version.
    pub version: u32,
    /// CRC32 of `payload`.
    pub crc32: u32,
    /// Serialized collection.
    pub payload: String,
}

impl SaveEnvelope {
    /// Wraps a payload at the current version.
    #[must_use]
    pub fn new(payload: String) -> Self {
        Self::with_version(CURRENT_VERSION, payload)
    }

    /// Wraps a payload at an explicit version.
    #[must_use]
    pub fn with_version(version: u32, payload: String) -> Self {
        Self {
            version,
            crc32: crc32fast::hash(payload.as_bytes()),
            payload,
        }
    }

    /// Checks the payload against the stored checksum.
    ///
    /// # Errors
    ///
    /// `ChecksumMismatch` if they differ.
    pub fn verify(&self) -> StorageResult<()> {
        let computed = crc32fast::hash(self.payload.as_bytes());
        if computed == self.crc32 {
            Ok(())
        } else {
            Err(StorageError::ChecksumMismatch {
                stored: self.crc32,
                computed,
            })
        }
    }
}

/// Serializes a collection into a checksummed envelope.
///
/// # Errors
///
/// `Serialization` if JSON encoding fails.
pub fn encode(collection: &Collection) -> StorageResult<String> {
    let payload = serde_json::to_string(collection)?;
    let envelope = SaveEnvelope::new(payload);
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes, verifies, migrates and validates a save.
///
/// # Errors
///
/// The first problem found; see [`StorageError`].
pub fn try_decode(raw: &str) -> StorageResult<Collection> {
    let envelope: SaveEnvelope = serde_json::from_str(raw)?;
    envelope.verify()?;

    let value: Value = serde_json::from_str(&envelope.payload)?;
    let value = migrate(value, envelope.version)?;
    let collection: Collection = serde_json::from_value(value)?;

    if !collection.is_consistent() {
        return Err(StorageError::Corrupted(
            "unique card set does not match pack contents".to_string(),
        ));
    }

    debug!(
        version = envelope.version,
        packs = collection.packs.len(),
        "decoded save"
    );
    Ok(collection)
}

/// Decodes a save, falling back to an empty collection on any failure.
#[must_use]
pub fn decode(raw: &str) -> Collection {
    try_decode(raw).unwrap_or_else(|error| {
        warn!(%error, "discarding unreadable save, starting with an empty collection");
        Collection::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dadddeck_core::{
        Card, CardStats, DadType, HoloVariant, Pack, PackCard, PackDesign, PackSource, Rarity,
    };
    use uuid::Uuid;

    fn card(id: &str, rarity: Rarity) -> Card {
        Card {
            id: id.to_string(),
            name: format!("{id} dad"),
            dad_type: DadType::BbqDad,
            rarity,
            stats: CardStats {
                dad_joke: 80,
                grill_skill: 95,
                ..CardStats::default()
            },
            abilities: Vec::new(),
            series: 1,
            card_number: 1,
            total_in_series: 10,
            flavor_text: Some("Medium rare or nothing.".to_string()),
            artist: None,
        }
    }

    fn sample_collection() -> Collection {
        let opened_at = Utc.with_ymd_and_hms(2024, 6, 16, 12, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123);
        let mut collection = Collection::new();
        collection.add_pack(Pack::new(
            Uuid::from_u128(7),
            vec![
                PackCard::new(card("bbq_dad_001", Rarity::Rare), HoloVariant::Reverse),
                PackCard::new(card("bbq_dad_002", Rarity::Common), HoloVariant::None),
                PackCard::new(card("bbq_dad_002", Rarity::Common), HoloVariant::None),
            ],
            opened_at,
            PackDesign::Bbq,
            PackSource::Opened,
        ));
        collection.metadata.currency = 42;
        collection.metadata.pity.packs_since_floor = 3;
        collection
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let collection = sample_collection();
        let encoded = encode(&collection).unwrap();
        assert_eq!(decode(&encoded), collection);
        assert_eq!(
            decode(&encoded).metadata.last_opened_at,
            collection.metadata.last_opened_at
        );
    }

    #[test]
    fn test_envelope_shape() {
        let encoded = encode(&Collection::new()).unwrap();
        let envelope: SaveEnvelope = serde_json::from_str(&encoded).unwrap();
        assert_eq!(envelope.version, CURRENT_VERSION);
        assert!(envelope.verify().is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let encoded = encode(&sample_collection()).unwrap();
        let mut envelope: SaveEnvelope = serde_json::from_str(&encoded).unwrap();
        envelope.payload = envelope.payload.replace("\"currency\":42", "\"currency\":9000");
        let tampered = serde_json::to_string(&envelope).unwrap();

        assert!(matches!(
            try_decode(&tampered),
            Err(StorageError::ChecksumMismatch { .. })
        ));
        assert_eq!(decode(&tampered), Collection::default());
    }

    #[test]
    fn test_garbage_decodes_to_default() {
        for raw in ["", "not json", "{}", "{\"version\":3}", "[1,2,3]"] {
            assert_eq!(decode(raw), Collection::default(), "{raw:?}");
        }
    }

    #[test]
    fn test_future_version_decodes_to_default() {
        let payload = serde_json::to_string(&Collection::new()).unwrap();
        let envelope = SaveEnvelope::with_version(CURRENT_VERSION + 1, payload);
        let raw = serde_json::to_string(&envelope).unwrap();
        assert!(matches!(
            try_decode(&raw),
            Err(StorageError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_inconsistent_collection_rejected() {
        let mut collection = sample_collection();
        collection.metadata.unique_cards.insert("ghost".to_string());
        let encoded = encode(&collection).unwrap();
        assert!(matches!(try_decode(&encoded), Err(StorageError::Corrupted(_))));
    }
}
