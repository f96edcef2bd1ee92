//! # Card Catalog
//!
//! The catalog is loaded once at startup and is read-only afterwards.
//! Consumers go through the [`CardCatalog`] trait so tests can supply small
//! hand-built catalogs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::card::{Card, DadType, Rarity};
use crate::error::{CatalogError, CatalogResult};

/// Read-only access to the full card catalog.
pub trait CardCatalog {
    /// Every card, in catalog order.
    fn all_cards(&self) -> &[Card];

    /// Cards of one rarity, in catalog order.
    fn cards_by_rarity(&self, rarity: Rarity) -> Vec<&Card> {
        self.all_cards().iter().filter(|c| c.rarity == rarity).collect()
    }

    /// Cards of one category, in catalog order.
    fn cards_by_type(&self, dad_type: DadType) -> Vec<&Card> {
        self.all_cards()
            .iter()
            .filter(|c| c.dad_type == dad_type)
            .collect()
    }

    /// Looks up a card by id.
    fn get(&self, id: &str) -> Option<&Card> {
        self.all_cards().iter().find(|c| c.id == id)
    }

    /// Number of cards in the catalog.
    fn len(&self) -> usize {
        self.all_cards().len()
    }

    /// Whether the catalog has no cards.
    fn is_empty(&self) -> bool {
        self.all_cards().is_empty()
    }
}

/// File layout for TOML catalogs: a list of `[[cards]]` tables.
#[derive(Deserialize)]
struct CatalogFile {
    cards: Vec<Card>,
}

/// An in-memory catalog with precomputed rarity and id indexes.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    cards: Vec<Card>,
    by_rarity: BTreeMap<Rarity, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

impl StaticCatalog {
    /// Builds a catalog, validating every card and rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidCard`] or [`CatalogError::DuplicateCard`].
    pub fn new(cards: Vec<Card>) -> CatalogResult<Self> {
        let mut seen = HashSet::with_capacity(cards.len());
        let mut by_rarity: BTreeMap<Rarity, Vec<usize>> = BTreeMap::new();
        let mut by_id = HashMap::with_capacity(cards.len());

        for (index, card) in cards.iter().enumerate() {
            card.validate()?;
            if !seen.insert(card.id.as_str()) {
                return Err(CatalogError::DuplicateCard(card.id.clone()));
            }
            by_rarity.entry(card.rarity).or_default().push(index);
            by_id.insert(card.id.clone(), index);
        }

        Ok(Self {
            cards,
            by_rarity,
            by_id,
        })
    }

    /// Parses a JSON array of cards.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed JSON, or a validation error.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let cards: Vec<Card> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(cards)
    }

    /// Parses a TOML document of `[[cards]]` tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed TOML, or a validation error.
    pub fn from_toml_str(toml_str: &str) -> CatalogResult<Self> {
        let file: CatalogFile =
            toml::from_str(toml_str).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.cards)
    }

    /// Loads a catalog from disk, choosing the parser by extension
    /// (`.json`, anything else is read as TOML).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// Number of cards per rarity.
    #[must_use]
    pub fn rarity_histogram(&self) -> BTreeMap<Rarity, usize> {
        self.by_rarity.iter().map(|(r, v)| (*r, v.len())).collect()
    }
}

impl CardCatalog for StaticCatalog {
    fn all_cards(&self) -> &[Card] {
        &self.cards
    }

    fn cards_by_rarity(&self, rarity: Rarity) -> Vec<&Card> {
        self.by_rarity
            .get(&rarity)
            .map(|indices| indices.iter().map(|&i| &self.cards[i]).collect())
            .unwrap_or_default()
    }

    fn get(&self, id: &str) -> Option<&Card> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }
}
