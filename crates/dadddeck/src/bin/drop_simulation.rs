//! # Drop Simulation
//!
//! Opens a large number of packs against the configured tables and compares
//! the observed distributions with their targets.
//!
//! ```text
//! drop_simulation [--packs N] [--seed N] [--config FILE] [--catalog FILE] [--no-pity] [--strict]
//! ```
//!
//! Pity raises the share of the floor rarity above its table weight, so the
//! rarity rows only line up with the table under `--no-pity`. `--strict`
//! exits with an error if any row drifts beyond tolerance.

use anyhow::{bail, Context, Result};
use dadddeck::EngineConfig;
use dadddeck_core::{CardCatalog, HoloVariant, Rarity, StaticCatalog};
use dadddeck_economy::{PackGenerator, SeededPrng};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Allowed gap between observed and target shares.
const RARITY_TOLERANCE: f64 = 0.01;
const HOLO_TOLERANCE: f64 = 0.02;

struct Args {
    packs: u32,
    seed: u32,
    config: PathBuf,
    catalog: PathBuf,
    pity: bool,
    strict: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        packs: 10_000,
        seed: 42,
        config: PathBuf::from("data/economy.toml"),
        catalog: PathBuf::from("data/cards.toml"),
        pity: true,
        strict: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--packs" => args.packs = it.next().context("--packs needs a value")?.parse()?,
            "--seed" => args.seed = it.next().context("--seed needs a value")?.parse()?,
            "--config" => args.config = it.next().context("--config needs a value")?.into(),
            "--catalog" => args.catalog = it.next().context("--catalog needs a value")?.into(),
            "--no-pity" => args.pity = false,
            "--strict" => args.strict = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn row(label: &str, observed: f64, target: f64, tolerance: f64) -> bool {
    let ok = (observed - target).abs() <= tolerance;
    println!(
        "  {label:<12} {:>8.3}% {:>8.3}%  {}",
        observed * 100.0,
        target * 100.0,
        if ok { "ok" } else { "DRIFT" }
    );
    ok
}

#[allow(clippy::cast_precision_loss)]
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    let mut config = if args.config.exists() {
        EngineConfig::from_file(&args.config)?.economy.pack
    } else {
        EngineConfig::default().economy.pack
    };
    config.pity.enabled = args.pity;

    let catalog = StaticCatalog::from_file(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    let generator = PackGenerator::new(config)?;
    generator.validate_catalog(&catalog)?;

    info!(packs = args.packs, seed = args.seed, pity = args.pity, cards = catalog.len(), "simulating");
    let mut prng = SeededPrng::new(args.seed);
    let started = Instant::now();
    let stats = generator.run_statistics(&mut prng, &catalog, args.packs)?;
    let elapsed = started.elapsed();

    println!("=============================================================");
    println!(
        "DROP SIMULATION: {} packs, {} cards, seed {} ({:.1?})",
        stats.total_packs, stats.total_cards, args.seed, elapsed
    );
    println!("=============================================================");

    let table = &generator.config().rarity_table;
    let mut all_ok = true;
    println!("\nRarity         observed   target");
    for rarity in Rarity::ALL {
        all_ok &= row(
            rarity.as_str(),
            stats.rarity_ratio(rarity),
            table.weight(rarity),
            RARITY_TOLERANCE,
        ) || args.pity;
    }

    println!("\nHolo");
    all_ok &= row(
        "any foil",
        stats.holo_ratio(),
        generator.config().holo_chance,
        HOLO_TOLERANCE,
    );
    for foil in HoloVariant::FOILS {
        let count = stats.holo_counts.get(&foil).copied().unwrap_or(0);
        println!("  {:<12} {count:>8}", format!("{foil:?}"));
    }

    println!("\nPack designs");
    for (design, count) in &stats.design_counts {
        let share = *count as f64 / stats.total_packs.max(1) as f64;
        println!("  {:<12} {:>8.3}%", format!("{design:?}"), share * 100.0);
    }

    println!("\nBest rarity per pack");
    for (rarity, count) in &stats.best_rarity_counts {
        println!("  {:<12} {count:>8}", rarity.as_str());
    }
    if args.pity {
        println!("\nPity armed on {} packs", stats.pity_armed);
    }

    if args.strict && !all_ok {
        bail!("observed drop rates drifted beyond tolerance");
    }
    Ok(())
}
