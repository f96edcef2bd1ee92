//! # Crafting
//!
//! **Material upgrades with a probabilistic outcome**
//!
//! A recipe consumes `input_count` materials of one rarity and, on success,
//! mints `output_count` cards of the output rarity. On failure a share of the
//! inputs is refunded and the rest are destroyed.
//!
//! ## Cost
//!
//! ```text
//! base     = input_count * 5^rank(input_rarity)
//! discount = min((1 - success_rate) * 0.5, 0.5)
//! cost     = round(base * (1 - discount))
//! ```
//!
//! Riskier recipes are cheaper, capped at half price.
//!
//! ## Transactions
//!
//! Crafting either fully applies (materials debited, currency paid, cards
//! added) or leaves everything as it was. Rollback uses ledger snapshots.

use chrono::{DateTime, Utc};
use dadddeck_core::{
    CardCatalog, Collection, MaterialLedger, Pack, PackCard, PackDesign, PackSource, Rarity,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

use crate::error::{EconomyError, EconomyResult};
use crate::generator::{pack_id, CardMinter};
use crate::rng::SeededPrng;

/// Cost growth per rarity rank.
pub const RARITY_COST_BASE: u64 = 5;

/// Largest discount a risky recipe can earn.
pub const MAX_DIFFICULTY_DISCOUNT: f64 = 0.5;

/// A crafting recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftingRecipe {
    /// Unique recipe identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Rarity of the consumed materials.
    pub input_rarity: Rarity,
    /// Materials consumed.
    pub input_count: u32,
    /// Rarity of the minted cards.
    pub output_rarity: Rarity,
    /// Cards minted on success.
    #[serde(default = "default_output_count")]
    pub output_count: u32,
    /// Probability of success, in `(0, 1]`.
    pub success_rate: f64,
    /// Share of inputs refunded on failure, in `[0, 1]`.
    #[serde(default)]
    pub fail_return_rate: Option<f64>,
}

const fn default_output_count() -> u32 {
    1
}

impl CraftingRecipe {
    /// Creates a recipe that always succeeds.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        input_rarity: Rarity,
        input_count: u32,
        output_rarity: Rarity,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            input_rarity,
            input_count,
            output_rarity,
            output_count: 1,
            success_rate: 1.0,
            fail_return_rate: None,
        }
    }

    /// Sets the success rate.
    #[must_use]
    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate;
        self
    }

    /// Sets the failure refund share.
    #[must_use]
    pub fn with_fail_return(mut self, rate: f64) -> Self {
        self.fail_return_rate = Some(rate);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Checks rates and counts.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] naming the recipe.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.id.trim().is_empty() {
            return Err(EconomyError::InvalidConfig("recipe id is blank".to_string()));
        }
        if !(self.success_rate > 0.0 && self.success_rate <= 1.0) {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe {}: success_rate {} outside (0, 1]",
                self.id, self.success_rate
            )));
        }
        if let Some(rate) = self.fail_return_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EconomyError::InvalidConfig(format!(
                    "recipe {}: fail_return_rate {rate} outside [0, 1]",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Materials refunded when this recipe fails.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn refund_on_failure(&self) -> u32 {
        let rate = self.fail_return_rate.unwrap_or(0.0).clamp(0.0, 1.0);
        let refunded = (f64::from(self.input_count) * rate).round() as u32;
        refunded.min(self.input_count)
    }
}

/// `5^rank` for a rarity: 1, 5, 25, 125, 625, 3125.
#[must_use]
pub fn rarity_multiplier(rarity: Rarity) -> u64 {
    RARITY_COST_BASE.pow(u32::from(rarity.rank()))
}

/// Discount for a recipe's risk, in `[0, 0.5]`.
#[must_use]
pub fn get_difficulty_discount(recipe: &CraftingRecipe) -> f64 {
    ((1.0 - recipe.success_rate) * 0.5).clamp(0.0, MAX_DIFFICULTY_DISCOUNT)
}

/// Currency cost of one craft.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_crafting_cost(recipe: &CraftingRecipe) -> u64 {
    let base = f64::from(recipe.input_count) * rarity_multiplier(recipe.input_rarity) as f64;
    (base * (1.0 - get_difficulty_discount(recipe))).round() as u64
}

/// A recipe with no inputs costs nothing.
#[must_use]
pub fn is_zero_cost_recipe(recipe: &CraftingRecipe) -> bool {
    recipe.input_count == 0
}

/// Whether `currency` covers the recipe's cost.
#[must_use]
pub fn can_afford_craft(recipe: &CraftingRecipe, currency: u64) -> bool {
    currency >= calculate_crafting_cost(recipe)
}

/// The set of known recipes, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeBook {
    recipes: Vec<CraftingRecipe>,
}

impl RecipeBook {
    /// Builds a book, validating each recipe and the rarity graph.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] for an invalid recipe, a
    /// duplicate id, or a cycle between rarities.
    pub fn new(recipes: Vec<CraftingRecipe>) -> EconomyResult<Self> {
        let mut book = Self::default();
        for recipe in recipes {
            book.add_recipe(recipe)?;
        }
        if let Some(cycle) = book.find_cycle() {
            return Err(EconomyError::InvalidConfig(format!(
                "recipes form a rarity cycle: {cycle:?}"
            )));
        }
        Ok(book)
    }

    /// The standard upgrade ladder.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            recipes: vec![
                CraftingRecipe::new("common_to_uncommon", Rarity::Common, 5, Rarity::Uncommon)
                    .with_name("Garage Sale Upgrade"),
                CraftingRecipe::new("uncommon_to_rare", Rarity::Uncommon, 5, Rarity::Rare)
                    .with_name("Workbench Special")
                    .with_success_rate(0.9)
                    .with_fail_return(0.4),
                CraftingRecipe::new("rare_to_epic", Rarity::Rare, 5, Rarity::Epic)
                    .with_name("Weekend Project")
                    .with_success_rate(0.75)
                    .with_fail_return(0.4),
                CraftingRecipe::new("epic_to_legendary", Rarity::Epic, 4, Rarity::Legendary)
                    .with_name("Backyard Masterpiece")
                    .with_success_rate(0.5)
                    .with_fail_return(0.25),
                CraftingRecipe::new("legendary_to_mythic", Rarity::Legendary, 3, Rarity::Mythic)
                    .with_name("Ascended Dad")
                    .with_success_rate(0.25),
            ],
        }
    }

    /// Adds a recipe.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] if it is invalid or its id exists.
    pub fn add_recipe(&mut self, recipe: CraftingRecipe) -> EconomyResult<()> {
        recipe.validate()?;
        if self.get(&recipe.id).is_some() {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe id {} already exists",
                recipe.id
            )));
        }
        self.recipes.push(recipe);
        Ok(())
    }

    /// Looks up a recipe.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CraftingRecipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Looks up a recipe or fails with [`EconomyError::RecipeNotFound`].
    ///
    /// # Errors
    ///
    /// Unknown id.
    pub fn require(&self, id: &str) -> EconomyResult<&CraftingRecipe> {
        self.get(id)
            .ok_or_else(|| EconomyError::RecipeNotFound(id.to_string()))
    }

    /// All recipes.
    #[must_use]
    pub fn recipes(&self) -> &[CraftingRecipe] {
        &self.recipes
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Finds a chain of rarities that leads back to itself, if any.
    ///
    /// Kahn's algorithm over the rarity graph: an edge per recipe from input
    /// to output rarity. Same-rarity rerolls are not edges.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<Rarity>> {
        let mut in_degree: BTreeMap<Rarity, usize> = Rarity::ALL.iter().map(|&r| (r, 0)).collect();
        let mut adjacency: BTreeMap<Rarity, Vec<Rarity>> = BTreeMap::new();

        for recipe in &self.recipes {
            if recipe.input_rarity == recipe.output_rarity {
                continue;
            }
            adjacency
                .entry(recipe.input_rarity)
                .or_default()
                .push(recipe.output_rarity);
            *in_degree.entry(recipe.output_rarity).or_insert(0) += 1;
        }

        let mut queue: VecDeque<Rarity> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&r, _)| r)
            .collect();

        while let Some(rarity) = queue.pop_front() {
            in_degree.remove(&rarity);
            for next in adjacency.get(&rarity).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }

        // Whatever Kahn could not drain sits on or behind a cycle.
        if in_degree.is_empty() {
            None
        } else {
            Some(in_degree.into_keys().collect())
        }
    }
}

/// What happened to a craft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CraftOutcome {
    /// The craft succeeded and minted these cards.
    Success {
        /// Minted cards.
        cards: Vec<PackCard>,
    },
    /// The craft failed.
    Failure {
        /// Materials returned to the ledger.
        refunded: u32,
        /// Materials lost.
        destroyed: u32,
    },
}

/// Result of a completed craft (successful or not).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftResult {
    /// The recipe that was crafted.
    pub recipe_id: String,
    /// Materials debited before the roll.
    pub consumed: u32,
    /// Currency paid.
    pub cost: u64,
    /// Roll outcome.
    pub outcome: CraftOutcome,
}

impl CraftResult {
    /// Whether the roll succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CraftOutcome::Success { .. })
    }

    /// Minted cards; empty on failure.
    #[must_use]
    pub fn cards(&self) -> &[PackCard] {
        match &self.outcome {
            CraftOutcome::Success { cards } => cards,
            CraftOutcome::Failure { .. } => &[],
        }
    }
}

/// Runs recipes against a material ledger.
#[derive(Clone, Debug)]
pub struct CraftingExecutor {
    minter: CardMinter,
}

impl CraftingExecutor {
    /// Creates an executor that mints through `minter`.
    #[must_use]
    pub fn new(minter: CardMinter) -> Self {
        Self { minter }
    }

    /// Checks that a craft could run: valid recipe, enough materials, and
    /// catalog cards at the output rarity.
    ///
    /// # Errors
    ///
    /// The reason the craft would be refused.
    pub fn can_craft(
        &self,
        recipe: &CraftingRecipe,
        materials: &MaterialLedger,
        catalog: &dyn CardCatalog,
    ) -> EconomyResult<()> {
        recipe.validate()?;

        let available = materials.count(recipe.input_rarity);
        if available < recipe.input_count {
            return Err(EconomyError::InsufficientMaterials {
                rarity: recipe.input_rarity,
                required: recipe.input_count,
                available,
            });
        }

        if recipe.output_count > 0 && catalog.cards_by_rarity(recipe.output_rarity).is_empty() {
            return Err(EconomyError::EmptyRarityPool(recipe.output_rarity));
        }
        Ok(())
    }

    /// Debits inputs, rolls success and mints or refunds.
    ///
    /// **ATOMIC**: on any error the ledger is restored to its prior state.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for a bad recipe
    /// - `InsufficientMaterials` if the ledger is short
    /// - `EmptyRarityPool` if the output rarity has no cards
    pub fn execute_craft(
        &self,
        recipe: &CraftingRecipe,
        materials: &mut MaterialLedger,
        catalog: &dyn CardCatalog,
        prng: &mut SeededPrng,
    ) -> EconomyResult<CraftResult> {
        self.can_craft(recipe, materials, catalog)?;

        let snapshot = materials.snapshot();
        if let Err(e) = materials.debit(recipe.input_rarity, recipe.input_count) {
            materials.restore(&snapshot);
            return Err(e.into());
        }

        let outcome = if prng.chance(recipe.success_rate) {
            let mut cards = Vec::with_capacity(recipe.output_count as usize);
            for _ in 0..recipe.output_count {
                match self.minter.mint(prng, catalog, recipe.output_rarity) {
                    Ok(card) => cards.push(card),
                    Err(e) => {
                        materials.restore(&snapshot);
                        return Err(e);
                    }
                }
            }
            CraftOutcome::Success { cards }
        } else {
            let refunded = recipe.refund_on_failure();
            materials.credit(recipe.input_rarity, refunded);
            CraftOutcome::Failure {
                refunded,
                destroyed: recipe.input_count - refunded,
            }
        };

        debug!(recipe = %recipe.id, ?outcome, "craft rolled");
        Ok(CraftResult {
            recipe_id: recipe.id.clone(),
            consumed: recipe.input_count,
            cost: 0,
            outcome,
        })
    }

    /// Crafts against a player's collection: pays the currency cost, runs
    /// [`Self::execute_craft`] on the collection's materials and appends the
    /// minted cards as a crafted pack.
    ///
    /// **ATOMIC**: on any error the collection is unchanged.
    ///
    /// # Errors
    ///
    /// `InsufficientCurrency` plus everything [`Self::execute_craft`] returns.
    pub fn craft_into_collection(
        &self,
        recipe: &CraftingRecipe,
        collection: &mut Collection,
        catalog: &dyn CardCatalog,
        prng: &mut SeededPrng,
        now: DateTime<Utc>,
    ) -> EconomyResult<CraftResult> {
        let cost = calculate_crafting_cost(recipe);
        let currency = collection.metadata.currency;
        if !can_afford_craft(recipe, currency) {
            return Err(EconomyError::InsufficientCurrency {
                required: cost,
                available: currency,
            });
        }

        let mut result =
            self.execute_craft(recipe, &mut collection.metadata.materials, catalog, prng)?;
        collection.metadata.currency = currency - cost;
        result.cost = cost;

        if let CraftOutcome::Success { cards } = &result.outcome {
            let pack = Pack::new(
                pack_id(prng),
                cards.clone(),
                now,
                PackDesign::Default,
                PackSource::Crafted,
            );
            collection.add_pack(pack);
        }

        info!(
            recipe = %recipe.id,
            success = result.is_success(),
            cost,
            "craft completed"
        );
        Ok(result)
    }
}
