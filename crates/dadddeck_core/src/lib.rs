//! # DadDeck Core
//!
//! The data model shared by every DadDeck crate:
//!
//! - [`Card`] - immutable catalog entries with a closed [`DadType`] category
//! - [`PackCard`] / [`Pack`] - pulled cards with their holo outcome
//! - [`Collection`] - the player's packs plus aggregate counters
//! - [`CardCatalog`] - read-only catalog provider, loaded once at startup
//!
//! ## Invariants
//!
//! 1. `Rarity` is totally ordered, `Common < ... < Mythic`
//! 2. `Pack::best_rarity` is the maximum rarity of its cards
//! 3. `CollectionMetadata::unique_cards` is exactly the set of card ids in `packs`

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod card;
pub mod catalog;
pub mod collection;
pub mod error;
pub mod pack;

pub use card::{Card, CardAbility, CardId, CardStats, DadType, Rarity, MAX_STAT};
pub use catalog::{CardCatalog, StaticCatalog};
pub use collection::{Collection, CollectionMetadata, LedgerSnapshot, MaterialLedger, PityState};
pub use error::{CatalogError, CatalogResult};
pub use pack::{best_rarity, HoloVariant, Pack, PackCard, PackDesign, PackSource};
