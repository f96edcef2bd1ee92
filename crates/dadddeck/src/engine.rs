//! # The Engine
//!
//! One player's collection behind the three player-facing operations:
//!
//! ```text
//! open_pack() ──> rate limit ──> generate (pity) ──> add_pack ──> save ──> record
//!                                                                  │
//!                                                                  ▼
//!                                                         completion milestones
//!
//! craft(id) ──> recipe ──> currency + materials ──> roll ──> save
//! ```
//!
//! Every mutation works on a copy of the collection and only replaces the
//! live one after the save succeeded, so a failed operation leaves both
//! memory and storage untouched.

use dadddeck_core::{Card, CardCatalog, Collection, Pack, Rarity};
use dadddeck_economy::{
    calculate_bonus_packs_from_milestones, calculate_collection_completion, can_afford_craft, get_missing_cards,
    get_newly_achieved_milestones, get_next_milestone, stamp_milestones, CompletionSnapshot,
    CraftResult, CraftingExecutor, CraftingRecipe, EconomyError, Milestone, PackGenerator,
    RecipeBook, SeededPrng,
};
use dadddeck_storage::{CollectionRepository, StorageBackend, StoredCollectionRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::rate_limit::{RateLimitExceeded, RateLimitStatus, RateLimiter};

// ============================================================================
// Results
// ============================================================================

/// A pack that was opened and saved.
#[derive(Clone, Debug)]
pub struct PackOpening {
    /// The pack.
    pub pack: Pack,
    /// Cards in the pack that were already owned.
    pub duplicates: u32,
    /// Milestones crossed by this pack.
    pub new_milestones: Vec<Milestone>,
    /// Bonus packs earned by `new_milestones`.
    pub bonus_packs: u32,
    /// Rate limit after recording this open.
    pub rate_limit: RateLimitStatus,
}

/// Outcome of a craft request.
#[derive(Clone, Debug)]
pub enum CraftReport {
    /// The recipe ran; the roll may still have failed.
    Completed {
        /// Roll result, cost and minted cards.
        result: CraftResult,
        /// Milestones crossed by the minted cards.
        new_milestones: Vec<Milestone>,
    },
    /// The player cannot pay for the recipe. Nothing changed.
    Denied {
        /// What was missing.
        reason: EconomyError,
    },
}

impl CraftReport {
    /// Whether the craft rolled and succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { result, .. } if result.is_success())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Pack opening, crafting and completion over one persisted collection.
///
/// ## Usage
///
/// ```rust,ignore
/// let backend = Arc::new(FileStorage::open("saves")?);
/// let mut engine = Engine::new(
///     EngineConfig::from_file("data/economy.toml")?,
///     Box::new(StaticCatalog::from_file("data/cards.toml")?),
///     backend,
///     Arc::new(SystemClock),
///     SeededPrng::from_wall_clock(),
/// )?;
///
/// let opening = engine.open_pack()?;
/// println!("best pull: {}", opening.pack.best_rarity);
/// ```
pub struct Engine {
    config: EngineConfig,
    catalog: Box<dyn CardCatalog>,
    generator: PackGenerator,
    crafter: CraftingExecutor,
    recipes: RecipeBook,
    repository: StoredCollectionRepository,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    prng: SeededPrng,
    collection: Collection,
    last_completion: CompletionSnapshot,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("catalog_cards", &self.catalog.len())
            .field("recipes", &self.recipes.len())
            .field("packs", &self.collection.packs.len())
            .field("seed", &self.prng.seed())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds the engine and loads the saved collection.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or a catalog missing a rarity the drop table
    /// can roll.
    pub fn new(
        config: EngineConfig,
        catalog: Box<dyn CardCatalog>,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        prng: SeededPrng,
    ) -> EngineResult<Self> {
        config.validate()?;

        let generator = PackGenerator::new(config.economy.pack.clone())?;
        generator.validate_catalog(catalog.as_ref())?;
        let crafter = CraftingExecutor::new(generator.minter().clone());
        let recipes = config.economy.recipe_book()?;

        let repository = StoredCollectionRepository::new(Arc::clone(&backend));
        let limiter = RateLimiter::new(config.rate_limit, backend, Arc::clone(&clock));
        let collection = repository.load();

        let mut last_completion = calculate_collection_completion(
            &collection,
            catalog.as_ref(),
            &config.economy.completion,
        );
        stamp_milestones(None, &mut last_completion, clock.now());

        info!(
            cards = catalog.len(),
            packs = collection.packs.len(),
            completion = last_completion.overall_percentage,
            seed = prng.seed(),
            "engine ready"
        );

        Ok(Self {
            config,
            catalog,
            generator,
            crafter,
            recipes,
            repository,
            limiter,
            clock,
            prng,
            collection,
            last_completion,
        })
    }

    // ========================================================================
    // Packs
    // ========================================================================

    /// Opens one pack, saves it and records it against the rate limit.
    ///
    /// # Errors
    ///
    /// - `RateLimited` when the window is full
    /// - `Economy` if a rolled rarity has no cards
    /// - `Storage` if the collection cannot be saved
    pub fn open_pack(&mut self) -> EngineResult<PackOpening> {
        self.limiter.check_rate_limit()?;

        let now = self.clock.now();
        let mut next = self.collection.clone();
        let pack = self.generator.generate_pack(
            &mut self.prng,
            self.catalog.as_ref(),
            &mut next.metadata.pity,
            now,
        )?;
        let duplicates = next.add_pack(pack.clone());

        self.commit(next)?;
        if let Err(error) = self.limiter.record_pack_open() {
            warn!(%error, "pack opened but not recorded against the rate limit");
        }

        let new_milestones = self.refresh_milestones();
        let bonus_packs = calculate_bonus_packs_from_milestones(&new_milestones);

        info!(
            pack = %pack.id,
            best = %pack.best_rarity,
            holos = pack.holo_count(),
            duplicates,
            total_packs = self.collection.metadata.total_packs_opened,
            "pack opened"
        );
        Ok(PackOpening {
            pack,
            duplicates,
            new_milestones,
            bonus_packs,
            rate_limit: self.limiter.get_rate_limit_status(),
        })
    }

    /// Current rate limit state.
    #[must_use]
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.get_rate_limit_status()
    }

    /// Whether a pack may be opened now.
    ///
    /// # Errors
    ///
    /// [`RateLimitExceeded`] when the window is full.
    pub fn check_rate_limit(&self) -> Result<RateLimitStatus, RateLimitExceeded> {
        self.limiter.check_rate_limit()
    }

    // ========================================================================
    // Crafting
    // ========================================================================

    /// All configured recipes.
    #[must_use]
    pub fn recipes(&self) -> &[CraftingRecipe] {
        self.recipes.recipes()
    }

    /// Whether the player can pay for a recipe right now.
    ///
    /// # Errors
    ///
    /// `RecipeNotFound`, or a recipe whose output rarity has no cards.
    pub fn can_craft(&self, recipe_id: &str) -> EngineResult<bool> {
        let recipe = self.recipes.require(recipe_id)?;
        match self
            .crafter
            .can_craft(recipe, &self.collection.metadata.materials, self.catalog.as_ref())
        {
            Ok(()) => Ok(can_afford_craft(recipe, self.collection.metadata.currency)),
            Err(EconomyError::InsufficientMaterials { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs a recipe against the collection and saves the result.
    ///
    /// Missing materials or currency yield [`CraftReport::Denied`].
    ///
    /// # Errors
    ///
    /// `RecipeNotFound`, configuration errors and storage failures.
    pub fn craft(&mut self, recipe_id: &str) -> EngineResult<CraftReport> {
        let recipe = self.recipes.require(recipe_id)?.clone();
        let now = self.clock.now();
        let mut next = self.collection.clone();

        let result = match self.crafter.craft_into_collection(
            &recipe,
            &mut next,
            self.catalog.as_ref(),
            &mut self.prng,
            now,
        ) {
            Ok(result) => result,
            Err(
                reason @ (EconomyError::InsufficientMaterials { .. }
                | EconomyError::InsufficientCurrency { .. }),
            ) => {
                debug!(recipe = %recipe.id, %reason, "craft denied");
                return Ok(CraftReport::Denied { reason });
            }
            Err(e) => return Err(e.into()),
        };

        self.commit(next)?;
        let new_milestones = self.refresh_milestones();
        Ok(CraftReport::Completed {
            result,
            new_milestones,
        })
    }

    /// Adds currency and saves. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Storage failure; the balance is unchanged.
    pub fn credit_currency(&mut self, amount: u64) -> EngineResult<u64> {
        let mut next = self.collection.clone();
        next.metadata.currency = next.metadata.currency.saturating_add(amount);
        let balance = next.metadata.currency;
        self.commit(next)?;
        info!(amount, balance, "currency credited");
        Ok(balance)
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Completion of the collection, with `achieved_at` carried over from
    /// earlier snapshots.
    pub fn completion(&mut self) -> &CompletionSnapshot {
        self.refresh_milestones();
        &self.last_completion
    }

    /// Catalog cards not yet owned, optionally of one rarity.
    #[must_use]
    pub fn missing_cards(&self, rarity: Option<Rarity>) -> Vec<&Card> {
        get_missing_cards(&self.collection, self.catalog.as_ref(), rarity)
    }

    /// The lowest milestone not yet reached.
    #[must_use]
    pub fn next_milestone(&self) -> Option<&Milestone> {
        get_next_milestone(&self.last_completion)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The live collection.
    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// The card catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn CardCatalog {
        self.catalog.as_ref()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The pack generator.
    #[must_use]
    pub fn generator(&self) -> &PackGenerator {
        &self.generator
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Saves `next` and makes it the live collection.
    fn commit(&mut self, next: Collection) -> EngineResult<()> {
        self.repository.save(&next)?;
        self.collection = next;
        Ok(())
    }

    /// Recomputes completion and returns the milestones crossed since the
    /// previous computation.
    fn refresh_milestones(&mut self) -> Vec<Milestone> {
        let mut current = calculate_collection_completion(
            &self.collection,
            self.catalog.as_ref(),
            &self.config.economy.completion,
        );
        stamp_milestones(Some(&self.last_completion), &mut current, self.clock.now());

        let crossed: Vec<Milestone> =
            get_newly_achieved_milestones(Some(&self.last_completion), &current)
                .into_iter()
                .cloned()
                .collect();
        for milestone in &crossed {
            info!(
                threshold = milestone.threshold,
                badge = milestone.badge.as_deref().unwrap_or("-"),
                bonus_packs = milestone.bonus_packs,
                "completion milestone reached"
            );
        }

        self.last_completion = current;
        crossed
    }
}
