//! # Pack Generator
//!
//! **Per-slot rarity, holo and card rolls with a pity guarantee**
//!
//! For every slot of a pack, independently:
//!
//! 1. Roll the rarity from the rarity drop table
//! 2. Roll holo as a Bernoulli trial with `holo_chance`
//! 3. If holo, roll the foil from that rarity's holo table
//! 4. Pick a card uniformly among catalog cards of the rarity
//!
//! ## Pity
//!
//! The player's [`PityState`] counts consecutive packs whose best card was
//! below the configured floor. Once it reaches the threshold, the next pack
//! that would miss the floor has its last slot re-rolled at the floor rarity
//! and the counter resets.
//!
//! ## Failure Mode
//!
//! A rolled rarity with no catalog cards is a configuration error
//! ([`EconomyError::EmptyRarityPool`]). We never substitute another rarity.

use chrono::{DateTime, Utc};
use dadddeck_core::{
    best_rarity, Card, CardCatalog, HoloVariant, Pack, PackCard, PackDesign, PackSource,
    PityState, Rarity,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use uuid::{Builder, Uuid};

use crate::error::{EconomyError, EconomyResult};
use crate::rng::SeededPrng;
use crate::weighted::WeightedSelector;

/// Tolerance for "probabilities sum to 1".
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Weight per rarity. Used for the rarity drop table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RarityWeights {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
    pub mythic: f64,
}

impl RarityWeights {
    /// Weight of one tier.
    #[must_use]
    pub const fn weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
            Rarity::Mythic => self.mythic,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        Rarity::ALL.iter().map(|&r| self.weight(r)).sum()
    }

    /// Whether the weights are probabilities summing to 1.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= PROBABILITY_EPSILON
    }

    /// Builds a selector over the tiers at or above `floor`, in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] for negative weights or when
    /// every eligible weight is zero.
    pub fn selector_from(&self, floor: Rarity) -> EconomyResult<WeightedSelector<Rarity>> {
        WeightedSelector::new(
            Rarity::ALL
                .iter()
                .filter(|&&r| r >= floor)
                .map(|&r| (r, self.weight(r))),
        )
    }
}

/// Weight per foil finish. One table per rarity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct HoloWeights {
    pub standard: f64,
    pub reverse: f64,
    pub full_art: f64,
    pub prismatic: f64,
}

impl HoloWeights {
    /// Weight of one foil.
    #[must_use]
    pub const fn weight(&self, variant: HoloVariant) -> f64 {
        match variant {
            HoloVariant::None => 0.0,
            HoloVariant::Standard => self.standard,
            HoloVariant::Reverse => self.reverse,
            HoloVariant::FullArt => self.full_art,
            HoloVariant::Prismatic => self.prismatic,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        HoloVariant::FOILS.iter().map(|&v| self.weight(v)).sum()
    }

    /// Whether the weights are probabilities summing to 1.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= PROBABILITY_EPSILON
    }

    fn selector(&self) -> EconomyResult<WeightedSelector<HoloVariant>> {
        WeightedSelector::new(HoloVariant::FOILS.iter().map(|&v| (v, self.weight(v))))
    }
}

/// Per-rarity holo tables. Higher rarities skew toward rarer foils.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct HoloTables {
    pub common: HoloWeights,
    pub uncommon: HoloWeights,
    pub rare: HoloWeights,
    pub epic: HoloWeights,
    pub legendary: HoloWeights,
    pub mythic: HoloWeights,
}

impl HoloTables {
    /// The holo table for a rarity.
    #[must_use]
    pub const fn for_rarity(&self, rarity: Rarity) -> &HoloWeights {
        match rarity {
            Rarity::Common => &self.common,
            Rarity::Uncommon => &self.uncommon,
            Rarity::Rare => &self.rare,
            Rarity::Epic => &self.epic,
            Rarity::Legendary => &self.legendary,
            Rarity::Mythic => &self.mythic,
        }
    }
}

impl Default for HoloTables {
    fn default() -> Self {
        Self {
            common: HoloWeights { standard: 0.70, reverse: 0.25, full_art: 0.05, prismatic: 0.0 },
            uncommon: HoloWeights { standard: 0.60, reverse: 0.30, full_art: 0.10, prismatic: 0.0 },
            rare: HoloWeights { standard: 0.45, reverse: 0.35, full_art: 0.15, prismatic: 0.05 },
            epic: HoloWeights { standard: 0.25, reverse: 0.35, full_art: 0.30, prismatic: 0.10 },
            legendary: HoloWeights { standard: 0.0, reverse: 0.20, full_art: 0.50, prismatic: 0.30 },
            mythic: HoloWeights { standard: 0.0, reverse: 0.0, full_art: 0.0, prismatic: 1.0 },
        }
    }
}

/// Weight per pack wrapper design.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct DesignWeights {
    pub default: f64,
    pub bbq: f64,
    pub fix_it: f64,
    pub golf: f64,
    pub holiday: f64,
}

impl Default for DesignWeights {
    fn default() -> Self {
        Self {
            default: 0.70,
            bbq: 0.10,
            fix_it: 0.08,
            golf: 0.08,
            holiday: 0.04,
        }
    }
}

impl DesignWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.default + self.bbq + self.fix_it + self.golf + self.holiday
    }

    /// Whether the weights are probabilities summing to 1.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= PROBABILITY_EPSILON
    }

    fn selector(&self) -> EconomyResult<WeightedSelector<PackDesign>> {
        WeightedSelector::new([
            (PackDesign::Default, self.default),
            (PackDesign::Bbq, self.bbq),
            (PackDesign::FixIt, self.fix_it),
            (PackDesign::Golf, self.golf),
            (PackDesign::Holiday, self.holiday),
        ])
    }
}

/// Pack guarantee settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PityConfig {
    /// Whether the guarantee is active.
    pub enabled: bool,
    /// Consecutive misses before the guarantee fires.
    pub threshold: u32,
    /// Minimum best rarity the guarantee enforces.
    pub floor: Rarity,
}

impl Default for PityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 10,
            floor: Rarity::Epic,
        }
    }
}

/// Pack generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Slots per pack.
    pub cards_per_pack: usize,
    /// Probability that any slot is holo.
    pub holo_chance: f64,
    /// Rarity drop table; must sum to 1.
    pub rarity_table: RarityWeights,
    /// Foil tables per rarity.
    pub holo_tables: HoloTables,
    /// Wrapper design table.
    pub design_table: DesignWeights,
    /// Guarantee settings.
    pub pity: PityConfig,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            cards_per_pack: 6,
            holo_chance: 1.0 / 6.0,
            rarity_table: RarityWeights {
                common: 0.55,
                uncommon: 0.25,
                rare: 0.12,
                epic: 0.05,
                legendary: 0.025,
                mythic: 0.005,
            },
            holo_tables: HoloTables::default(),
            design_table: DesignWeights::default(),
            pity: PityConfig::default(),
        }
    }
}

impl PackConfig {
    /// Checks the settings without a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.cards_per_pack == 0 {
            return Err(EconomyError::InvalidConfig(
                "cards_per_pack must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.holo_chance) {
            return Err(EconomyError::InvalidConfig(format!(
                "holo_chance {} outside [0, 1]",
                self.holo_chance
            )));
        }
        if !self.rarity_table.is_normalized() {
            return Err(EconomyError::InvalidConfig(format!(
                "rarity table sums to {}, expected 1.0",
                self.rarity_table.sum()
            )));
        }
        for rarity in Rarity::ALL {
            let table = self.holo_tables.for_rarity(rarity);
            if !table.is_normalized() {
                return Err(EconomyError::InvalidConfig(format!(
                    "holo table for {rarity} sums to {}, expected 1.0",
                    table.sum()
                )));
            }
        }
        if !self.design_table.is_normalized() {
            return Err(EconomyError::InvalidConfig(format!(
                "design table sums to {}, expected 1.0",
                self.design_table.sum()
            )));
        }
        if self.pity.enabled && self.pity.threshold == 0 {
            return Err(EconomyError::InvalidConfig(
                "pity threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Draws a catalog card of a rarity, uniformly.
///
/// # Errors
///
/// Returns [`EconomyError::EmptyRarityPool`] if the catalog has no card of
/// that rarity.
pub fn draw_card<'c>(
    prng: &mut SeededPrng,
    catalog: &'c dyn CardCatalog,
    rarity: Rarity,
) -> EconomyResult<&'c Card> {
    let pool = catalog.cards_by_rarity(rarity);
    if pool.is_empty() {
        return Err(EconomyError::EmptyRarityPool(rarity));
    }
    Ok(pool[prng.index(pool.len())])
}

/// Rolls holo and picks a card for a given rarity.
///
/// Shared by the pack generator and the crafting executor so crafted cards
/// come out of exactly the same selection logic as pulled ones.
#[derive(Clone, Debug)]
pub struct CardMinter {
    holo_chance: f64,
    holo_selectors: Vec<WeightedSelector<HoloVariant>>,
}

impl CardMinter {
    /// Builds a minter from the holo chance and per-rarity holo tables.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] if any rarity's holo table has
    /// a negative weight or no positive weight, whatever `holo_chance` is.
    pub fn new(holo_chance: f64, tables: &HoloTables) -> EconomyResult<Self> {
        let holo_selectors = Rarity::ALL
            .iter()
            .map(|&r| {
                tables.for_rarity(r).selector().map_err(|e| {
                    EconomyError::InvalidConfig(format!("holo table for {r}: {e}"))
                })
            })
            .collect::<EconomyResult<Vec<_>>>()?;

        Ok(Self {
            holo_chance,
            holo_selectors,
        })
    }

    /// Probability that a minted card is holo.
    #[must_use]
    pub fn holo_chance(&self) -> f64 {
        self.holo_chance
    }

    /// Rolls holo, then the foil, then the card.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::EmptyRarityPool`] if no card has the rarity.
    pub fn mint(
        &self,
        prng: &mut SeededPrng,
        catalog: &dyn CardCatalog,
        rarity: Rarity,
    ) -> EconomyResult<PackCard> {
        let holo_type = if prng.chance(self.holo_chance) {
            self.holo_selectors[usize::from(rarity.rank())].select_cloned(prng)
        } else {
            HoloVariant::None
        };
        let card = draw_card(prng, catalog, rarity)?;
        trace!(card = %card.id, %rarity, ?holo_type, "minted card");
        Ok(PackCard::new(card.clone(), holo_type))
    }
}

/// Builds a pack id from PRNG bytes so seeded runs replay identical ids.
pub fn pack_id(prng: &mut SeededPrng) -> Uuid {
    let mut bytes = [0u8; 16];
    prng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}

/// The pack generator. Holds only immutable, validated tables.
#[derive(Clone, Debug)]
pub struct PackGenerator {
    config: PackConfig,
    rarity_selector: WeightedSelector<Rarity>,
    design_selector: WeightedSelector<PackDesign>,
    minter: CardMinter,
}

impl PackGenerator {
    /// Validates the config and precomputes the selectors.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] for any invalid table.
    pub fn new(config: PackConfig) -> EconomyResult<Self> {
        config.validate()?;

        let rarity_selector = config.rarity_table.selector_from(Rarity::Common)?;
        let design_selector = config.design_table.selector()?;
        let minter = CardMinter::new(config.holo_chance, &config.holo_tables)?;

        Ok(Self {
            config,
            rarity_selector,
            design_selector,
            minter,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// The card minter, shared with crafting.
    #[must_use]
    pub fn minter(&self) -> &CardMinter {
        &self.minter
    }

    /// Checks that every rarity the generator can roll has catalog cards.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::EmptyRarityPool`] for the first empty tier.
    pub fn validate_catalog(&self, catalog: &dyn CardCatalog) -> EconomyResult<()> {
        let guarantee = self.config.pity.enabled.then_some(self.config.pity.floor);
        let reachable = self
            .rarity_selector
            .entries()
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(r, _)| *r)
            .chain(guarantee);

        for rarity in reachable {
            if catalog.cards_by_rarity(rarity).is_empty() {
                return Err(EconomyError::EmptyRarityPool(rarity));
            }
        }
        Ok(())
    }

    /// Generates one pack.
    ///
    /// `pity` is only updated when generation succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::EmptyRarityPool`] if a rolled rarity has no cards.
    pub fn generate_pack(
        &self,
        prng: &mut SeededPrng,
        catalog: &dyn CardCatalog,
        pity: &mut PityState,
        now: DateTime<Utc>,
    ) -> EconomyResult<Pack> {
        let id = pack_id(prng);
        let design = self.design_selector.select_cloned(prng);

        let mut cards = Vec::with_capacity(self.config.cards_per_pack);
        for _ in 0..self.config.cards_per_pack {
            let rarity = self.rarity_selector.select_cloned(prng);
            cards.push(self.minter.mint(prng, catalog, rarity)?);
        }

        let next_pity = self.apply_pity(prng, catalog, &mut cards, *pity)?;
        *pity = next_pity;

        let pack = Pack::new(id, cards, now, design, PackSource::Opened);
        debug!(
            pack = %pack.id,
            best = %pack.best_rarity,
            holos = pack.holo_count(),
            pity = pity.packs_since_floor,
            "generated pack"
        );
        Ok(pack)
    }

    /// Applies the guarantee and returns the next pity state.
    fn apply_pity(
        &self,
        prng: &mut SeededPrng,
        catalog: &dyn CardCatalog,
        cards: &mut [PackCard],
        pity: PityState,
    ) -> EconomyResult<PityState> {
        let rules = self.config.pity;
        if !rules.enabled {
            return Ok(pity);
        }

        if best_rarity(cards) >= rules.floor {
            return Ok(PityState::default());
        }

        if pity.packs_since_floor >= rules.threshold {
            if let Some(last) = cards.last_mut() {
                *last = self.minter.mint(prng, catalog, rules.floor)?;
            }
            debug!(floor = %rules.floor, misses = pity.packs_since_floor, "pity guarantee fired");
            return Ok(PityState::default());
        }

        Ok(PityState {
            packs_since_floor: pity.packs_since_floor + 1,
        })
    }

    /// Opens `packs` packs and tallies the outcomes.
    ///
    /// Returns histogram data for verifying the drop tables.
    ///
    /// # Errors
    ///
    /// Propagates generation errors.
    pub fn run_statistics(
        &self,
        prng: &mut SeededPrng,
        catalog: &dyn CardCatalog,
        packs: u32,
    ) -> EconomyResult<PackStatistics> {
        let mut stats = PackStatistics::default();
        let mut pity = PityState::default();
        let now = Utc::now();

        for _ in 0..packs {
            if self.config.pity.enabled && pity.packs_since_floor >= self.config.pity.threshold {
                stats.pity_armed += 1;
            }
            let pack = self.generate_pack(prng, catalog, &mut pity, now)?;
            stats.record(&pack);
        }

        Ok(stats)
    }
}

/// Statistics from pack simulation.
#[derive(Clone, Debug, Default)]
pub struct PackStatistics {
    /// Packs generated.
    pub total_packs: u64,
    /// Cards generated.
    pub total_cards: u64,
    /// Holo cards generated.
    pub holo_cards: u64,
    /// Cards per rarity.
    pub rarity_counts: BTreeMap<Rarity, u64>,
    /// Holo cards per foil.
    pub holo_counts: BTreeMap<HoloVariant, u64>,
    /// Packs per wrapper design.
    pub design_counts: BTreeMap<PackDesign, u64>,
    /// Packs whose best rarity was each tier.
    pub best_rarity_counts: BTreeMap<Rarity, u64>,
    /// Packs opened with the pity guarantee armed.
    pub pity_armed: u64,
}

impl PackStatistics {
    /// Adds a pack to the tallies.
    pub fn record(&mut self, pack: &Pack) {
        self.total_packs += 1;
        *self.design_counts.entry(pack.design).or_insert(0) += 1;
        *self.best_rarity_counts.entry(pack.best_rarity).or_insert(0) += 1;
        for card in &pack.cards {
            self.total_cards += 1;
            *self.rarity_counts.entry(card.rarity()).or_insert(0) += 1;
            if card.is_holo {
                self.holo_cards += 1;
                *self.holo_counts.entry(card.holo_type).or_insert(0) += 1;
            }
        }
    }

    /// Observed holo ratio over all cards.
    #[must_use]
    pub fn holo_ratio(&self) -> f64 {
        if self.total_cards == 0 {
            0.0
        } else {
            self.holo_cards as f64 / self.total_cards as f64
        }
    }

    /// Observed share of cards at a rarity.
    #[must_use]
    pub fn rarity_ratio(&self, rarity: Rarity) -> f64 {
        if self.total_cards == 0 {
            return 0.0;
        }
        self.rarity_counts.get(&rarity).copied().unwrap_or(0) as f64 / self.total_cards as f64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dadddeck_core::{CardStats, DadType, StaticCatalog};

    pub(crate) fn test_card(id: &str, rarity: Rarity) -> Card {
        Card {
            id: id.to_string(),
            name: id.to_string(),
            dad_type: DadType::ALL[id.len() % DadType::ALL.len()],
            rarity,
            stats: CardStats::default(),
            abilities: Vec::new(),
            series: 1,
            card_number: 1,
            total_in_series: 1,
            flavor_text: None,
            artist: None,
        }
    }

    /// Three cards of every rarity.
    pub(crate) fn full_catalog() -> StaticCatalog {
        let cards = Rarity::ALL
            .iter()
            .flat_map(|&r| (0..3).map(move |i| test_card(&format!("{r}_{i}"), r)))
            .collect();
        StaticCatalog::new(cards).unwrap()
    }

    #[test]
    fn test_default_tables_sum_to_one() {
        let config = PackConfig::default();
        assert!(config.rarity_table.is_normalized());
        for rarity in Rarity::ALL {
            let sum = config.holo_tables.for_rarity(rarity).sum();
            assert!((sum - 1.0).abs() < PROBABILITY_EPSILON, "{rarity} holo table sums to {sum}");
        }
        assert!(config.design_table.is_normalized());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unnormalized_rarity_table_rejected() {
        let mut config = PackConfig::default();
        config.rarity_table.common = 0.9;
        assert!(matches!(PackGenerator::new(config), Err(EconomyError::InvalidConfig(_))));
    }

    #[test]
    fn test_unnormalized_holo_table_rejected() {
        let mut config = PackConfig::default();
        let common = &mut config.holo_tables.common;
        common.standard /= 2.0;
        common.reverse /= 2.0;
        common.full_art /= 2.0;
        common.prismatic /= 2.0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(&err, EconomyError::InvalidConfig(msg) if msg.contains("holo table for common")),
            "{err}"
        );
        assert!(PackGenerator::new(config).is_err());
    }

    #[test]
    fn test_unnormalized_design_table_rejected() {
        let mut config = PackConfig::default();
        config.design_table.bbq += 3.0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(&err, EconomyError::InvalidConfig(msg) if msg.contains("design table")),
            "{err}"
        );
    }

    #[test]
    fn test_minter_rejects_empty_holo_table_without_holo() {
        let mut tables = HoloTables::default();
        tables.rare = HoloWeights::default();
        assert!(matches!(CardMinter::new(0.0, &tables), Err(EconomyError::InvalidConfig(_))));
        assert!(CardMinter::new(0.0, &HoloTables::default()).is_ok());
    }

    #[test]
    fn test_pack_has_configured_size_and_best_rarity() {
        let generator = PackGenerator::new(PackConfig::default()).unwrap();
        let catalog = full_catalog();
        let mut prng = SeededPrng::new(1);
        let mut pity = PityState::default();

        for _ in 0..200 {
            let pack = generator
                .generate_pack(&mut prng, &catalog, &mut pity, Utc::now())
                .unwrap();
            assert_eq!(pack.cards.len(), 6);
            let max = pack.cards.iter().map(PackCard::rarity).max().unwrap();
            assert_eq!(pack.best_rarity, max);
            for card in &pack.cards {
                assert_eq!(card.is_holo, card.holo_type != HoloVariant::None);
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let generator = PackGenerator::new(PackConfig::default()).unwrap();
        let catalog = full_catalog();
        let now = Utc::now();

        let run = |seed| {
            let mut prng = SeededPrng::new(seed);
            let mut pity = PityState::default();
            (0..20)
                .map(|_| generator.generate_pack(&mut prng, &catalog, &mut pity, now).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(77), run(77));
        assert_ne!(run(77), run(78));
    }

    #[test]
    fn test_empty_rarity_pool_fails_loudly() {
        let mut config = PackConfig::default();
        config.rarity_table = RarityWeights { common: 0.5, rare: 0.5, ..RarityWeights::default() };
        config.pity.enabled = false;
        let generator = PackGenerator::new(config).unwrap();
        let catalog = StaticCatalog::new(vec![test_card("only_common", Rarity::Common)]).unwrap();

        assert_eq!(
            generator.validate_catalog(&catalog),
            Err(EconomyError::EmptyRarityPool(Rarity::Rare))
        );

        let mut prng = SeededPrng::new(9);
        let mut pity = PityState::default();
        let mut saw_error = false;
        for _ in 0..50 {
            match generator.generate_pack(&mut prng, &catalog, &mut pity, Utc::now()) {
                Ok(pack) => assert!(pack.cards.iter().all(|c| c.rarity() == Rarity::Common)),
                Err(e) => {
                    assert_eq!(e, EconomyError::EmptyRarityPool(Rarity::Rare));
                    saw_error = true;
                }
            }
        }
        assert!(saw_error, "a rare roll should have hit the empty pool");
    }

    #[test]
    fn test_mythic_holo_is_always_prismatic() {
        let mut config = PackConfig::default();
        config.holo_chance = 1.0;
        config.rarity_table = RarityWeights { mythic: 1.0, ..RarityWeights::default() };
        let generator = PackGenerator::new(config).unwrap();
        let catalog = full_catalog();
        let mut prng = SeededPrng::new(4);
        let mut pity = PityState::default();

        let pack = generator
            .generate_pack(&mut prng, &catalog, &mut pity, Utc::now())
            .unwrap();
        assert!(pack.cards.iter().all(|c| c.holo_type == HoloVariant::Prismatic));
    }

    #[test]
    fn test_pity_fires_after_threshold() {
        let mut config = PackConfig::default();
        // Commons only, so every pack misses an epic floor.
        config.rarity_table = RarityWeights { common: 1.0, ..RarityWeights::default() };
        config.pity = PityConfig { enabled: true, threshold: 3, floor: Rarity::Epic };
        let generator = PackGenerator::new(config).unwrap();
        let catalog = full_catalog();
        let mut prng = SeededPrng::new(10);
        let mut pity = PityState::default();

        for expected in 1..=3 {
            let pack = generator
                .generate_pack(&mut prng, &catalog, &mut pity, Utc::now())
                .unwrap();
            assert_eq!(pack.best_rarity, Rarity::Common);
            assert_eq!(pity.packs_since_floor, expected);
        }

        let guaranteed = generator
            .generate_pack(&mut prng, &catalog, &mut pity, Utc::now())
            .unwrap();
        assert_eq!(guaranteed.best_rarity, Rarity::Epic);
        assert_eq!(guaranteed.cards.last().map(PackCard::rarity), Some(Rarity::Epic));
        assert_eq!(pity.packs_since_floor, 0);
    }

    #[test]
    fn test_pity_not_touched_on_error() {
        let mut config = PackConfig::default();
        config.rarity_table = RarityWeights { common: 1.0, ..RarityWeights::default() };
        config.pity = PityConfig { enabled: true, threshold: 1, floor: Rarity::Epic };
        let generator = PackGenerator::new(config).unwrap();
        let catalog = StaticCatalog::new(vec![test_card("c", Rarity::Common)]).unwrap();
        let mut prng = SeededPrng::new(2);
        let mut pity = PityState { packs_since_floor: 1 };

        let result = generator.generate_pack(&mut prng, &catalog, &mut pity, Utc::now());
        assert_eq!(result, Err(EconomyError::EmptyRarityPool(Rarity::Epic)));
        assert_eq!(pity.packs_since_floor, 1);
    }

    #[test]
    fn test_statistics_tally() {
        let generator = PackGenerator::new(PackConfig::default()).unwrap();
        let catalog = full_catalog();
        let mut prng = SeededPrng::new(31);
        let stats = generator.run_statistics(&mut prng, &catalog, 500).unwrap();
        assert_eq!(stats.total_packs, 500);
        assert_eq!(stats.total_cards, 3000);
        let per_rarity: u64 = stats.rarity_counts.values().sum();
        assert_eq!(per_rarity, 3000);
        let per_foil: u64 = stats.holo_counts.values().sum();
        assert_eq!(per_foil, stats.holo_cards);
    }
}
