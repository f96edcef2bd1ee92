//! # DadDeck Economy
//!
//! The drop engine behind DadDeck packs.
//!
//! ## Design Principles
//!
//! 1. **Reproducible** - every roll goes through an explicit [`SeededPrng`]
//! 2. **Fail loudly** - an empty rarity pool or a bad table is an error, never a substitution
//! 3. **Transactional crafting** - materials, currency and cards change together or not at all
//! 4. **External configuration** - all balance data in TOML ([`EconomyConfig`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use dadddeck_economy::{EconomyConfig, PackGenerator, SeededPrng};
//!
//! let config = EconomyConfig::from_file("data/economy.toml")?;
//! let generator = PackGenerator::new(config.pack)?;
//! generator.validate_catalog(&catalog)?;
//!
//! let mut prng = SeededPrng::from_str_seed("dad-joke");
//! let pack = generator.generate_pack(&mut prng, &catalog, &mut pity, Utc::now())?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod completion;
pub mod config;
pub mod crafting;
pub mod error;
pub mod generator;
pub mod rng;
pub mod weighted;

pub use completion::{
    calculate_bonus_packs_from_milestones, calculate_collection_completion, get_missing_cards,
    get_newly_achieved_milestones, get_next_milestone, stamp_milestones, Breakdown,
    CompletionConfig, CompletionSnapshot, Milestone, MilestoneReward,
};
pub use config::EconomyConfig;
pub use crafting::{
    calculate_crafting_cost, can_afford_craft, get_difficulty_discount, is_zero_cost_recipe,
    rarity_multiplier, CraftOutcome, CraftResult, CraftingExecutor, CraftingRecipe, RecipeBook,
};
pub use error::{EconomyError, EconomyResult};
pub use generator::{
    draw_card, CardMinter, DesignWeights, HoloTables, HoloWeights, PackConfig, PackGenerator,
    PackStatistics, PityConfig, RarityWeights,
};
pub use rng::{djb2, SeededPrng};
pub use weighted::WeightedSelector;
