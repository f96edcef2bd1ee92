//! # Collection Completion
//!
//! Pure aggregation over a collection and the catalog: overall and
//! per-group percentages, missing cards, milestones and their rewards.
//! Nothing here mutates player state.

use chrono::{DateTime, Utc};
use dadddeck_core::{Card, CardCatalog, CardId, Collection, DadType, Rarity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EconomyError, EconomyResult};

/// Reward attached to a milestone threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReward {
    /// Completion percentage that unlocks the reward.
    pub threshold: u32,
    /// Badge id granted.
    pub badge: String,
    /// Bonus packs granted.
    pub bonus_packs: u32,
}

impl MilestoneReward {
    fn new(threshold: u32, badge: &str, bonus_packs: u32) -> Self {
        Self {
            threshold,
            badge: badge.to_string(),
            bonus_packs,
        }
    }
}

/// Completion tracking settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Milestone thresholds, in percent.
    pub milestone_thresholds: Vec<u32>,
    /// Badge and bonus packs per threshold.
    pub rewards: Vec<MilestoneReward>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            milestone_thresholds: vec![25, 50, 75, 100],
            rewards: vec![
                MilestoneReward::new(25, "collector_bronze", 3),
                MilestoneReward::new(50, "collector_silver", 5),
                MilestoneReward::new(75, "collector_gold", 10),
                MilestoneReward::new(100, "collector_platinum", 20),
            ],
        }
    }
}

impl CompletionConfig {
    /// Checks that every threshold is a percentage in `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] for an out-of-range threshold.
    pub fn validate(&self) -> EconomyResult<()> {
        let thresholds = self
            .milestone_thresholds
            .iter()
            .chain(self.rewards.iter().map(|r| &r.threshold));
        for &t in thresholds {
            if !(1..=100).contains(&t) {
                return Err(EconomyError::InvalidConfig(format!(
                    "milestone threshold {t} outside 1..=100"
                )));
            }
        }
        Ok(())
    }

    fn reward_for(&self, threshold: u32) -> Option<&MilestoneReward> {
        self.rewards.iter().find(|r| r.threshold == threshold)
    }
}

/// Owned versus total for one group of cards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Distinct owned cards in the group.
    pub owned: usize,
    /// Catalog cards in the group.
    pub total: usize,
    /// `owned / total` in percent, two decimals.
    pub percentage: f64,
    /// Unowned card ids in catalog order.
    pub missing_card_ids: Vec<CardId>,
}

impl Breakdown {
    fn push(&mut self, card: &Card, owned: bool) {
        self.total += 1;
        if owned {
            self.owned += 1;
        } else {
            self.missing_card_ids.push(card.id.clone());
        }
    }

    fn finish(&mut self) {
        self.percentage = percentage(self.owned, self.total);
    }
}

/// A completion milestone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Threshold in percent.
    pub threshold: u32,
    /// Whether overall completion reached the threshold.
    pub achieved: bool,
    /// When it was first reached; `None` until stamped.
    pub achieved_at: Option<DateTime<Utc>>,
    /// Badge granted, if the threshold has a reward.
    pub badge: Option<String>,
    /// Bonus packs granted.
    pub bonus_packs: u32,
}

/// Completion state at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionSnapshot {
    /// Distinct owned catalog cards.
    pub owned_cards: usize,
    /// Catalog size.
    pub total_cards: usize,
    /// Overall completion in percent, two decimals.
    pub overall_percentage: f64,
    /// Per-rarity breakdown, every tier present.
    pub by_rarity: BTreeMap<Rarity, Breakdown>,
    /// Per-type breakdown, only types present in the catalog.
    pub by_type: BTreeMap<DadType, Breakdown>,
    /// Milestones in ascending threshold order.
    pub milestones: Vec<Milestone>,
}

impl CompletionSnapshot {
    /// Badges of achieved milestones.
    #[must_use]
    pub fn badges(&self) -> Vec<&str> {
        self.milestones
            .iter()
            .filter(|m| m.achieved)
            .filter_map(|m| m.badge.as_deref())
            .collect()
    }

    /// The milestone at a threshold.
    #[must_use]
    pub fn milestone(&self, threshold: u32) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.threshold == threshold)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(owned: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = owned as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Computes completion for a collection against the catalog.
///
/// Cards that are no longer in the catalog are ignored.
#[must_use]
pub fn calculate_collection_completion(
    collection: &Collection,
    catalog: &dyn CardCatalog,
    config: &CompletionConfig,
) -> CompletionSnapshot {
    let owned_ids = collection.owned_card_ids();

    let mut by_rarity: BTreeMap<Rarity, Breakdown> =
        Rarity::ALL.iter().map(|&r| (r, Breakdown::default())).collect();
    let mut by_type: BTreeMap<DadType, Breakdown> = BTreeMap::new();
    let mut owned_cards = 0;

    for card in catalog.all_cards() {
        let owned = owned_ids.contains(card.id.as_str());
        if owned {
            owned_cards += 1;
        }
        by_rarity.entry(card.rarity).or_default().push(card, owned);
        by_type.entry(card.dad_type).or_default().push(card, owned);
    }
    by_rarity.values_mut().for_each(Breakdown::finish);
    by_type.values_mut().for_each(Breakdown::finish);

    let total_cards = catalog.len();
    let overall_percentage = percentage(owned_cards, total_cards);

    let thresholds: BTreeSet<u32> = config.milestone_thresholds.iter().copied().collect();
    let milestones = thresholds
        .into_iter()
        .map(|threshold| {
            let reward = config.reward_for(threshold);
            Milestone {
                threshold,
                achieved: overall_percentage >= f64::from(threshold),
                achieved_at: None,
                badge: reward.map(|r| r.badge.clone()),
                bonus_packs: reward.map_or(0, |r| r.bonus_packs),
            }
        })
        .collect();

    CompletionSnapshot {
        owned_cards,
        total_cards,
        overall_percentage,
        by_rarity,
        by_type,
        milestones,
    }
}

/// Milestones achieved in `curr` but not in `prev`.
///
/// With no previous snapshot every achieved milestone is new.
#[must_use]
pub fn get_newly_achieved_milestones<'a>(
    prev: Option<&CompletionSnapshot>,
    curr: &'a CompletionSnapshot,
) -> Vec<&'a Milestone> {
    curr.milestones
        .iter()
        .filter(|m| m.achieved)
        .filter(|m| {
            !prev
                .and_then(|p| p.milestone(m.threshold))
                .is_some_and(|old| old.achieved)
        })
        .collect()
}

/// Fills `achieved_at` on `curr`: earlier timestamps carry forward from
/// `prev`, newly crossed milestones get `now`.
pub fn stamp_milestones(
    prev: Option<&CompletionSnapshot>,
    curr: &mut CompletionSnapshot,
    now: DateTime<Utc>,
) {
    for milestone in &mut curr.milestones {
        milestone.achieved_at = if milestone.achieved {
            let earlier = prev
                .and_then(|p| p.milestone(milestone.threshold))
                .filter(|old| old.achieved)
                .and_then(|old| old.achieved_at);
            Some(earlier.unwrap_or(now))
        } else {
            None
        };
    }
}

/// Total bonus packs over the achieved milestones.
#[must_use]
pub fn calculate_bonus_packs_from_milestones(milestones: &[Milestone]) -> u32 {
    milestones
        .iter()
        .filter(|m| m.achieved)
        .map(|m| m.bonus_packs)
        .sum()
}

/// Catalog cards the player does not own, in catalog order, optionally
/// restricted to one rarity.
#[must_use]
pub fn get_missing_cards<'c>(
    collection: &Collection,
    catalog: &'c dyn CardCatalog,
    rarity: Option<Rarity>,
) -> Vec<&'c Card> {
    let owned = collection.owned_card_ids();
    catalog
        .all_cards()
        .iter()
        .filter(|c| rarity.map_or(true, |r| c.rarity == r))
        .filter(|c| !owned.contains(c.id.as_str()))
        .collect()
}

/// The lowest milestone not yet achieved.
#[must_use]
pub fn get_next_milestone(snapshot: &CompletionSnapshot) -> Option<&Milestone> {
    snapshot.milestones.iter().find(|m| !m.achieved)
}
