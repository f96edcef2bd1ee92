//! Benchmark for crafting performance.
//!
//! Run with: cargo bench --package dadddeck_economy --bench crafting_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dadddeck_core::{Card, CardStats, DadType, MaterialLedger, Rarity, StaticCatalog};
use dadddeck_economy::{
    calculate_crafting_cost, CardMinter, CraftingExecutor, CraftingRecipe, HoloTables,
    RecipeBook, SeededPrng,
};

fn create_catalog() -> StaticCatalog {
    let cards = Rarity::ALL
        .iter()
        .flat_map(|&rarity| {
            (0..10u32).map(move |i| Card {
                id: format!("{rarity}_{i}"),
                name: format!("{rarity} {i}"),
                dad_type: DadType::ItemCard,
                rarity,
                stats: CardStats::default(),
                abilities: Vec::new(),
                series: 1,
                card_number: i + 1,
                total_in_series: 10,
                flavor_text: None,
                artist: None,
            })
        })
        .collect();
    StaticCatalog::new(cards).unwrap()
}

fn benchmark_cost(c: &mut Criterion) {
    let book = RecipeBook::standard();

    c.bench_function("crafting_cost_all_recipes", |b| {
        b.iter(|| {
            book.recipes()
                .iter()
                .map(|r| black_box(calculate_crafting_cost(r)))
                .sum::<u64>()
        });
    });
}

fn benchmark_cycle_detection(c: &mut Criterion) {
    let book = RecipeBook::standard();
    c.bench_function("recipe_cycle_detection", |b| {
        b.iter(|| black_box(book.find_cycle()));
    });
}

fn benchmark_craft_transaction(c: &mut Criterion) {
    let executor = CraftingExecutor::new(CardMinter::new(1.0 / 6.0, &HoloTables::default()).unwrap());
    let catalog = create_catalog();
    let recipe = CraftingRecipe::new("bench", Rarity::Rare, 5, Rarity::Epic)
        .with_success_rate(0.75)
        .with_fail_return(0.4);
    let mut prng = SeededPrng::new(11);

    c.bench_function("execute_craft", |b| {
        b.iter(|| {
            let mut materials = MaterialLedger::new();
            materials.credit(Rarity::Rare, 5);
            black_box(executor.execute_craft(&recipe, &mut materials, &catalog, &mut prng))
        });
    });
}

fn benchmark_ledger_snapshot_restore(c: &mut Criterion) {
    let mut ledger = MaterialLedger::new();
    for rarity in Rarity::ALL {
        ledger.credit(rarity, 64);
    }

    c.bench_function("ledger_snapshot_restore", |b| {
        b.iter(|| {
            let snapshot = ledger.snapshot();
            ledger.restore(black_box(&snapshot));
        });
    });
}

criterion_group!(
    benches,
    benchmark_cost,
    benchmark_cycle_detection,
    benchmark_craft_transaction,
    benchmark_ledger_snapshot_restore,
);
criterion_main!(benches);
