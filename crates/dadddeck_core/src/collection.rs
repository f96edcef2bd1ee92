//! # Player Collection
//!
//! The collection is the only persisted player state besides the rate limit
//! window. It is mutated by exactly two operations, pack opening and
//! crafting, both of which go through [`Collection::add_pack`] and the
//! [`MaterialLedger`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{CardId, Rarity};
use crate::error::{CatalogError, CatalogResult};
use crate::pack::{Pack, PackSource};

/// Per-player pity counter for the pack guarantee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityState {
    /// Consecutive opened packs that missed the guarantee floor.
    pub packs_since_floor: u32,
}

/// Craftable materials, one per duplicate pull, counted per rarity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialLedger {
    counts: BTreeMap<Rarity, u32>,
}

impl MaterialLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materials held of a rarity.
    #[must_use]
    pub fn count(&self, rarity: Rarity) -> u32 {
        self.counts.get(&rarity).copied().unwrap_or(0)
    }

    /// Total materials across all rarities.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Adds materials.
    pub fn credit(&mut self, rarity: Rarity, amount: u32) {
        if amount == 0 {
            return;
        }
        let slot = self.counts.entry(rarity).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Removes materials. Leaves the ledger untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InsufficientMaterials`] if fewer than `amount`
    /// are held.
    pub fn debit(&mut self, rarity: Rarity, amount: u32) -> CatalogResult<()> {
        let available = self.count(rarity);
        if available < amount {
            return Err(CatalogError::InsufficientMaterials {
                rarity,
                required: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.counts.remove(&rarity);
        } else {
            self.counts.insert(rarity, remaining);
        }
        Ok(())
    }

    /// Captures the ledger for rollback.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            counts: self.counts.clone(),
        }
    }

    /// Restores the ledger from a snapshot (rollback).
    pub fn restore(&mut self, snapshot: &LedgerSnapshot) {
        self.counts.clone_from(&snapshot.counts);
    }
}

/// Saved ledger state for transactional rollback.
#[derive(Clone, Debug)]
pub struct LedgerSnapshot {
    counts: BTreeMap<Rarity, u32>,
}

/// Aggregate counters kept alongside the packs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    /// Packs opened by the player (crafted and bonus packs excluded).
    pub total_packs_opened: u64,
    /// Cards pulled at rare or better.
    pub rare_pulls: u64,
    /// Holo cards pulled.
    pub holo_pulls: u64,
    /// Cards pulled per rarity.
    pub rarity_counts: BTreeMap<Rarity, u64>,
    /// Distinct card ids across all packs.
    pub unique_cards: BTreeSet<CardId>,
    /// Timestamp of the most recently added pack.
    pub last_opened_at: Option<DateTime<Utc>>,
    /// Pack guarantee counter.
    #[serde(default)]
    pub pity: PityState,
    /// Duplicate materials available for crafting.
    #[serde(default)]
    pub materials: MaterialLedger,
    /// Crafting currency balance.
    #[serde(default)]
    pub currency: u64,
}

/// A player's collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Every pack ever added, in order.
    pub packs: Vec<Pack>,
    /// Aggregate counters.
    pub metadata: CollectionMetadata,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pack and updates every counter.
    ///
    /// Each card whose id was already owned (including earlier in the same
    /// pack) credits one material of its rarity. Returns the number of
    /// duplicates found.
    pub fn add_pack(&mut self, pack: Pack) -> u32 {
        let meta = &mut self.metadata;
        let mut duplicates = 0;

        for pulled in &pack.cards {
            let rarity = pulled.rarity();
            *meta.rarity_counts.entry(rarity).or_insert(0) += 1;
            if rarity.is_rare_or_better() {
                meta.rare_pulls += 1;
            }
            if pulled.is_holo {
                meta.holo_pulls += 1;
            }
            if !meta.unique_cards.insert(pulled.card.id.clone()) {
                meta.materials.credit(rarity, 1);
                duplicates += 1;
            }
        }

        if pack.source == PackSource::Opened {
            meta.total_packs_opened += 1;
        }
        meta.last_opened_at = Some(
            meta.last_opened_at
                .map_or(pack.opened_at, |last| last.max(pack.opened_at)),
        );
        self.packs.push(pack);
        duplicates
    }

    /// Distinct card ids derived from the packs themselves.
    #[must_use]
    pub fn owned_card_ids(&self) -> BTreeSet<&str> {
        self.packs
            .iter()
            .flat_map(|p| p.cards.iter())
            .map(|c| c.card.id.as_str())
            .collect()
    }

    /// How many copies of a card have been pulled.
    #[must_use]
    pub fn copies_of(&self, card_id: &str) -> usize {
        self.packs
            .iter()
            .flat_map(|p| p.cards.iter())
            .filter(|c| c.card.id == card_id)
            .count()
    }

    /// Total cards across all packs.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.packs.iter().map(|p| p.cards.len()).sum()
    }

    /// Checks that `metadata.unique_cards` matches the packs exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let derived = self.owned_card_ids();
        derived.len() == self.metadata.unique_cards.len()
            && self
                .metadata
                .unique_cards
                .iter()
                .all(|id| derived.contains(id.as_str()))
    }
}
