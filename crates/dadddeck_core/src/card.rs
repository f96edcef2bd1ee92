//! # Card Definitions
//!
//! Static catalog entries. A [`Card`] is loaded once at startup and never
//! mutated; per-pull data (holo rolls) lives on [`crate::pack::PackCard`].

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Unique identifier of a catalog card, e.g. `"bbq_dad_001"`.
pub type CardId = String;

/// Rarity tier of a card.
///
/// Totally ordered: `Common < Uncommon < Rare < Epic < Legendary < Mythic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rarity {
    /// Common cards (gray).
    Common = 0,
    /// Uncommon cards (green).
    Uncommon = 1,
    /// Rare cards (blue).
    Rare = 2,
    /// Epic cards (purple).
    Epic = 3,
    /// Legendary cards (orange).
    Legendary = 4,
    /// Mythic cards (red).
    Mythic = 5,
}

impl Rarity {
    /// All tiers in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Mythic,
    ];

    /// Zero-based rank of the tier.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Converts a rank back to a tier. Returns `None` above mythic.
    #[inline]
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Common),
            1 => Some(Self::Uncommon),
            2 => Some(Self::Rare),
            3 => Some(Self::Epic),
            4 => Some(Self::Legendary),
            5 => Some(Self::Mythic),
            _ => None,
        }
    }

    /// Whether this counts as a "rare pull" in collection telemetry.
    #[inline]
    #[must_use]
    pub const fn is_rare_or_better(self) -> bool {
        self.rank() >= Self::Rare.rank()
    }

    /// Lowercase name used in save data and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thematic category of a dad card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum DadType {
    BbqDad,
    FixItDad,
    GolfDad,
    CouchDad,
    LawnDad,
    CarDad,
    OfficeDad,
    CoolDad,
    CoachDad,
    ChefDad,
    HolidayDad,
    WarriorDad,
    GamerDad,
    FishingDad,
    CampingDad,
    MusicDad,
    TechDad,
    GardenDad,
    FitnessDad,
    TravelDad,
    ThermostatDad,
    PunDad,
    SuburbanDad,
    ScienceDad,
    HistoryDad,
    RetroDad,
    FashionDad,
    PetDad,
    BeerDad,
    ItemCard,
}

impl DadType {
    /// Every category, in declaration order.
    pub const ALL: [Self; 30] = [
        Self::BbqDad,
        Self::FixItDad,
        Self::GolfDad,
        Self::CouchDad,
        Self::LawnDad,
        Self::CarDad,
        Self::OfficeDad,
        Self::CoolDad,
        Self::CoachDad,
        Self::ChefDad,
        Self::HolidayDad,
        Self::WarriorDad,
        Self::GamerDad,
        Self::FishingDad,
        Self::CampingDad,
        Self::MusicDad,
        Self::TechDad,
        Self::GardenDad,
        Self::FitnessDad,
        Self::TravelDad,
        Self::ThermostatDad,
        Self::PunDad,
        Self::SuburbanDad,
        Self::ScienceDad,
        Self::HistoryDad,
        Self::RetroDad,
        Self::FashionDad,
        Self::PetDad,
        Self::BeerDad,
        Self::ItemCard,
    ];

    /// Human-readable category name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BbqDad => "BBQ Dad",
            Self::FixItDad => "Fix-It Dad",
            Self::GolfDad => "Golf Dad",
            Self::CouchDad => "Couch Dad",
            Self::LawnDad => "Lawn Dad",
            Self::CarDad => "Car Dad",
            Self::OfficeDad => "Office Dad",
            Self::CoolDad => "Cool Dad",
            Self::CoachDad => "Coach Dad",
            Self::ChefDad => "Chef Dad",
            Self::HolidayDad => "Holiday Dad",
            Self::WarriorDad => "Weekend Warrior Dad",
            Self::GamerDad => "Gamer Dad",
            Self::FishingDad => "Fishing Dad",
            Self::CampingDad => "Camping Dad",
            Self::MusicDad => "Music Dad",
            Self::TechDad => "Tech Dad",
            Self::GardenDad => "Garden Dad",
            Self::FitnessDad => "Fitness Dad",
            Self::TravelDad => "Road Trip Dad",
            Self::ThermostatDad => "Thermostat Dad",
            Self::PunDad => "Pun Dad",
            Self::SuburbanDad => "Suburban Dad",
            Self::ScienceDad => "Science Dad",
            Self::HistoryDad => "History Buff Dad",
            Self::RetroDad => "Retro Dad",
            Self::FashionDad => "Cargo Shorts Dad",
            Self::PetDad => "Dog Dad",
            Self::BeerDad => "Craft Beer Dad",
            Self::ItemCard => "Item",
        }
    }
}

/// Maximum value of a single stat.
pub const MAX_STAT: u8 = 100;

/// The eight numeric stats printed on every card (0-100).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    /// Dad joke delivery.
    pub dad_joke: u8,
    /// Grilling mastery.
    pub grill_skill: u8,
    /// Household repair.
    pub fix_it: u8,
    /// Ability to nap anywhere.
    pub nap_power: u8,
    /// Remote control custody.
    pub remote_control: u8,
    /// Thermostat vigilance.
    pub thermostat: u8,
    /// Socks-with-sandals confidence.
    pub sock_sandal: u8,
    /// Craft beer snobbery.
    pub beer_snob: u8,
}

impl CardStats {
    /// Stats as an array, in declaration order.
    #[must_use]
    pub const fn as_array(&self) -> [u8; 8] {
        [
            self.dad_joke,
            self.grill_skill,
            self.fix_it,
            self.nap_power,
            self.remote_control,
            self.thermostat,
            self.sock_sandal,
            self.beer_snob,
        ]
    }

    /// Sum of all stats.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.as_array().iter().map(|&s| u32::from(s)).sum()
    }
}

/// A special ability printed on a card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAbility {
    /// Ability name.
    pub name: String,
    /// Rules text.
    pub description: String,
    /// Activation cost, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u8>,
}

/// An immutable catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier.
    pub id: CardId,
    /// Display name.
    pub name: String,
    /// Thematic category.
    pub dad_type: DadType,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Numeric stats.
    pub stats: CardStats,
    /// Special abilities.
    #[serde(default)]
    pub abilities: Vec<CardAbility>,
    /// Series (set) number.
    pub series: u32,
    /// Position within the series, starting at 1.
    pub card_number: u32,
    /// Number of cards in the series.
    pub total_in_series: u32,
    /// Flavor text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
    /// Artist credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl Card {
    /// Checks the card's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidCard`] when the id is blank, a stat is
    /// above [`MAX_STAT`], or the card number is outside the series.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::InvalidCard {
                id: self.id.clone(),
                reason: "blank id".to_string(),
            });
        }
        if let Some(stat) = self.stats.as_array().iter().find(|&&s| s > MAX_STAT) {
            return Err(CatalogError::InvalidCard {
                id: self.id.clone(),
                reason: format!("stat {stat} exceeds {MAX_STAT}"),
            });
        }
        if self.card_number == 0 || self.card_number > self.total_in_series {
            return Err(CatalogError::InvalidCard {
                id: self.id.clone(),
                reason: format!(
                    "card number {} outside series of {}",
                    self.card_number, self.total_in_series
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn card(id: &str, rarity: Rarity, dad_type: DadType) -> Card {
        Card {
            id: id.to_string(),
            name: format!("Test {id}"),
            dad_type,
            rarity,
            stats: CardStats {
                dad_joke: 50,
                grill_skill: 40,
                fix_it: 30,
                nap_power: 70,
                remote_control: 20,
                thermostat: 90,
                sock_sandal: 10,
                beer_snob: 60,
            },
            abilities: Vec::new(),
            series: 1,
            card_number: 1,
            total_in_series: 50,
            flavor_text: None,
            artist: None,
        }
    }

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Legendary < Rarity::Mythic);
        assert_eq!(Rarity::ALL.iter().max(), Some(&Rarity::Mythic));
        for (i, rarity) in Rarity::ALL.iter().enumerate() {
            assert_eq!(Rarity::from_rank(i as u8), Some(*rarity));
        }
        assert_eq!(Rarity::from_rank(6), None);
    }

    #[test]
    fn test_rarity_serde_lowercase() {
        let json = serde_json::to_string(&Rarity::Legendary).unwrap();
        assert_eq!(json, "\"legendary\"");
        let back: Rarity = serde_json::from_str("\"mythic\"").unwrap();
        assert_eq!(back, Rarity::Mythic);
    }

    #[test]
    fn test_dad_type_serde_matches_catalog_format() {
        let json = serde_json::to_string(&DadType::FixItDad).unwrap();
        assert_eq!(json, "\"FIX_IT_DAD\"");
        assert_eq!(DadType::ALL.len(), 30);
        assert_eq!(DadType::BbqDad.display_name(), "BBQ Dad");
    }

    #[test]
    fn test_validate_rejects_stat_over_100() {
        let mut c = card("bbq_dad_001", Rarity::Common, DadType::BbqDad);
        assert!(c.validate().is_ok());
        c.stats.grill_skill = 101;
        assert!(matches!(c.validate(), Err(CatalogError::InvalidCard { .. })));
    }

    #[test]
    fn test_validate_rejects_card_number_outside_series() {
        let mut c = card("golf_dad_001", Rarity::Rare, DadType::GolfDad);
        c.card_number = 51;
        assert!(c.validate().is_err());
        c.card_number = 0;
        assert!(c.validate().is_err());
    }
}
