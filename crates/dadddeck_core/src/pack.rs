//! # Packs
//!
//! A [`Pack`] is created once per open (or per successful craft) and is
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::{Card, Rarity};

/// Holo finish rolled for a single pulled card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoloVariant {
    /// Regular print.
    #[default]
    None,
    /// Standard holo foil.
    Standard,
    /// Reverse holo (foil background).
    Reverse,
    /// Full-art holo.
    FullArt,
    /// Prismatic rainbow foil, the top tier.
    Prismatic,
}

impl HoloVariant {
    /// Every foil finish, excluding [`HoloVariant::None`].
    pub const FOILS: [Self; 4] = [Self::Standard, Self::Reverse, Self::FullArt, Self::Prismatic];

    /// Whether this is any foil finish.
    #[inline]
    #[must_use]
    pub const fn is_holo(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A card as pulled from a pack: the catalog entry plus its roll outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackCard {
    /// The catalog card.
    pub card: Card,
    /// Whether the holo roll succeeded.
    pub is_holo: bool,
    /// Which foil was rolled; `None` when `is_holo` is false.
    pub holo_type: HoloVariant,
}

impl PackCard {
    /// Wraps a catalog card with a holo outcome.
    #[must_use]
    pub fn new(card: Card, holo_type: HoloVariant) -> Self {
        Self {
            card,
            is_holo: holo_type.is_holo(),
            holo_type,
        }
    }

    /// Shortcut to the card's rarity.
    #[inline]
    #[must_use]
    pub fn rarity(&self) -> Rarity {
        self.card.rarity
    }
}

/// Artwork theme of a pack wrapper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackDesign {
    /// The everyday wrapper.
    #[default]
    Default,
    /// Backyard barbecue.
    Bbq,
    /// Garage workshop.
    FixIt,
    /// Country club.
    Golf,
    /// Seasonal holiday wrapper.
    Holiday,
}

/// How a pack entered the collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackSource {
    /// Opened by the player.
    #[default]
    Opened,
    /// Minted by a successful craft.
    Crafted,
    /// Granted as a milestone reward.
    Bonus,
}

/// An opened pack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    /// Unique pack id.
    pub id: Uuid,
    /// Pulled cards, in slot order.
    pub cards: Vec<PackCard>,
    /// When the pack was opened.
    pub opened_at: DateTime<Utc>,
    /// Highest rarity among `cards`.
    pub best_rarity: Rarity,
    /// Wrapper artwork.
    pub design: PackDesign,
    /// Origin of the pack.
    #[serde(default)]
    pub source: PackSource,
}

impl Pack {
    /// Builds a pack, deriving `best_rarity` from the cards.
    ///
    /// An empty card list yields `Rarity::Common` as the best rarity.
    #[must_use]
    pub fn new(
        id: Uuid,
        cards: Vec<PackCard>,
        opened_at: DateTime<Utc>,
        design: PackDesign,
        source: PackSource,
    ) -> Self {
        let best_rarity = best_rarity(&cards);
        Self {
            id,
            cards,
            opened_at,
            best_rarity,
            design,
            source,
        }
    }

    /// Number of holo cards in the pack.
    #[must_use]
    pub fn holo_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_holo).count()
    }
}

/// Maximum rarity of a card slice, `Common` when empty.
#[must_use]
pub fn best_rarity(cards: &[PackCard]) -> Rarity {
    cards
        .iter()
        .map(PackCard::rarity)
        .max()
        .unwrap_or(Rarity::Common)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::tests::card;
    use crate::card::DadType;

    #[test]
    fn test_best_rarity_is_max() {
        let cards = vec![
            PackCard::new(card("a", Rarity::Common, DadType::BbqDad), HoloVariant::None),
            PackCard::new(card("b", Rarity::Epic, DadType::GolfDad), HoloVariant::Reverse),
            PackCard::new(card("c", Rarity::Rare, DadType::CarDad), HoloVariant::None),
        ];
        let pack = Pack::new(Uuid::nil(), cards, Utc::now(), PackDesign::Bbq, PackSource::Opened);
        assert_eq!(pack.best_rarity, Rarity::Epic);
        assert_eq!(pack.holo_count(), 1);
    }

    #[test]
    fn test_pack_card_holo_flag_follows_variant() {
        let c = card("a", Rarity::Common, DadType::BbqDad);
        assert!(!PackCard::new(c.clone(), HoloVariant::None).is_holo);
        assert!(PackCard::new(c, HoloVariant::Prismatic).is_holo);
    }

    #[test]
    fn test_holo_variant_serde() {
        let json = serde_json::to_string(&HoloVariant::FullArt).unwrap();
        assert_eq!(json, "\"full_art\"");
    }
}
