//! The config and catalog shipped in `data/` load and drive the engine.

use dadddeck::{Engine, EngineConfig, ManualClock, RateLimitConfig};
use dadddeck_core::{CardCatalog, Rarity, StaticCatalog};
use dadddeck_economy::{PackGenerator, RecipeBook, SeededPrng};
use dadddeck_storage::MemoryStorage;
use std::path::PathBuf;
use std::sync::Arc;

fn data(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .join(file)
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = EngineConfig::from_file(data("economy.toml")).unwrap();
    let defaults = EngineConfig::default();

    assert_eq!(config.rate_limit, RateLimitConfig::default());
    assert_eq!(config.economy.completion, defaults.economy.completion);
    assert_eq!(config.economy.recipes, RecipeBook::standard().recipes());
    assert_eq!(config.economy.pack.rarity_table, defaults.economy.pack.rarity_table);
    assert_eq!(config.economy.pack.holo_tables, defaults.economy.pack.holo_tables);
    assert_eq!(config.economy.pack.pity, defaults.economy.pack.pity);
    assert!((config.economy.pack.holo_chance - 1.0 / 6.0).abs() < 1e-12);
}

#[test]
fn test_shipped_catalog_covers_every_rarity() {
    let catalog = StaticCatalog::from_file(data("cards.toml")).unwrap();
    for rarity in Rarity::ALL {
        assert!(!catalog.cards_by_rarity(rarity).is_empty(), "no {rarity} cards");
    }
    let gary = catalog.get("bbq_dad_001").unwrap();
    assert_eq!(gary.name, "Grillmaster Gary");
    assert_eq!(gary.rarity, Rarity::Common);

    let config = EngineConfig::from_file(data("economy.toml")).unwrap();
    PackGenerator::new(config.economy.pack)
        .unwrap()
        .validate_catalog(&catalog)
        .unwrap();
}

#[test]
fn test_engine_runs_on_shipped_data() {
    let mut engine = Engine::new(
        EngineConfig::from_file(data("economy.toml")).unwrap(),
        Box::new(StaticCatalog::from_file(data("cards.toml")).unwrap()),
        Arc::new(MemoryStorage::new()),
        Arc::new(ManualClock::at_millis(1_700_000_000_000)),
        SeededPrng::from_str_seed("grillmaster"),
    )
    .unwrap();

    let opening = engine.open_pack().unwrap();
    assert_eq!(opening.pack.cards.len(), 6);
    assert!(engine.completion().owned_cards > 0);
}
