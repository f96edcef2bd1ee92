//! # Save Migrations
//!
//! Old saves are upgraded one version at a time on the raw JSON value,
//! before typed deserialization:
//!
//! | step | change |
//! |------|--------|
//! | v1 -> v2 | adds `materials` (rebuilt from historical duplicates) and `currency` |
//! | v2 -> v3 | adds the `pity` counter |

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Save format version written by this build.
pub const CURRENT_VERSION: u32 = 3;

/// One upgrade step, `from` to `from + 1`.
#[derive(Clone, Copy)]
pub struct Migration {
    /// Version this step upgrades from.
    pub from: u32,
    /// What the step changes.
    pub description: &'static str,
    apply: fn(Value) -> StorageResult<Value>,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Every migration step, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        from: 1,
        description: "add crafting materials and currency",
        apply: migrate_v1_to_v2,
    },
    Migration {
        from: 2,
        description: "add pity counter",
        apply: migrate_v2_to_v3,
    },
];

/// Whether a save at `version` must be migrated before loading.
#[must_use]
pub fn needs_migration(version: u32) -> bool {
    version < CURRENT_VERSION
}

/// Upgrades a payload from `version` to [`CURRENT_VERSION`].
///
/// # Errors
///
/// - `UnsupportedVersion` for version 0 or a version newer than this build
/// - `Migration` when a step cannot be applied
pub fn migrate(mut value: Value, version: u32) -> StorageResult<Value> {
    if version == 0 || version > CURRENT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: version,
            current: CURRENT_VERSION,
        });
    }

    let mut current = version;
    while current < CURRENT_VERSION {
        let step = MIGRATIONS
            .iter()
            .find(|m| m.from == current)
            .ok_or_else(|| StorageError::Migration {
                from: current,
                reason: "no migration registered".to_string(),
            })?;
        value = (step.apply)(value)?;
        info!(from = current, to = current + 1, step = step.description, "migrated save");
        current += 1;
    }

    Ok(value)
}

fn metadata_mut(value: &mut Value, from: u32) -> StorageResult<&mut Map<String, Value>> {
    value
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StorageError::Migration {
            from,
            reason: "missing metadata object".to_string(),
        })
}

/// Replays historical pulls to credit one material per duplicate, then adds
/// an empty currency balance.
fn migrate_v1_to_v2(mut value: Value) -> StorageResult<Value> {
    let mut seen = BTreeSet::new();
    let mut materials: BTreeMap<String, u64> = BTreeMap::new();

    let packs = value
        .get("packs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for pulled in packs
        .iter()
        .filter_map(|p| p.get("cards").and_then(Value::as_array))
        .flatten()
    {
        let card = pulled.get("card");
        let id = card.and_then(|c| c.get("id")).and_then(Value::as_str);
        let rarity = card.and_then(|c| c.get("rarity")).and_then(Value::as_str);
        let (Some(id), Some(rarity)) = (id, rarity) else {
            return Err(StorageError::Migration {
                from: 1,
                reason: "pulled card without id or rarity".to_string(),
            });
        };
        if !seen.insert(id.to_string()) {
            *materials.entry(rarity.to_string()).or_insert(0) += 1;
        }
    }

    let metadata = metadata_mut(&mut value, 1)?;
    metadata
        .entry("materials")
        .or_insert_with(|| Value::from(Map::from_iter(
            materials.into_iter().map(|(r, n)| (r, Value::from(n))),
        )));
    metadata.entry("currency").or_insert(Value::from(0u64));
    Ok(value)
}

fn migrate_v2_to_v3(mut value: Value) -> StorageResult<Value> {
    let metadata = metadata_mut(&mut value, 2)?;
    metadata
        .entry("pity")
        .or_insert_with(|| serde_json::json!({ "packs_since_floor": 0 }));
    Ok(value)
}
