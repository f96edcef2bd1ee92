//! # DadDeck CLI
//!
//! Opens packs, crafts and reports on a collection saved in a directory.
//!
//! ```text
//! dadddeck [--data-dir DIR] [--config FILE] [--catalog FILE] [--seed N] <command>
//!
//! commands:
//!   open [N]          open N packs (default 1)
//!   craft RECIPE      run a crafting recipe
//!   recipes           list recipes with cost and affordability
//!   credit AMOUNT     add currency
//!   status            collection and rate limit summary
//!   completion        completion breakdown and milestones
//!   missing [RARITY]  cards not yet owned
//! ```
//!
//! Log level comes from `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use dadddeck::{CraftReport, Engine, EngineConfig, EngineError, SystemClock};
use dadddeck_core::{Rarity, StaticCatalog};
use dadddeck_economy::{calculate_crafting_cost, CraftOutcome, SeededPrng};
use dadddeck_storage::{FallbackStorage, FileStorage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    data_dir: PathBuf,
    config: PathBuf,
    catalog: PathBuf,
    seed: Option<u32>,
    command: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        data_dir: PathBuf::from("saves"),
        config: PathBuf::from("data/economy.toml"),
        catalog: PathBuf::from("data/cards.toml"),
        seed: None,
        command: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => args.data_dir = it.next().context("--data-dir needs a value")?.into(),
            "--config" => args.config = it.next().context("--config needs a value")?.into(),
            "--catalog" => args.catalog = it.next().context("--catalog needs a value")?.into(),
            "--seed" => {
                let raw = it.next().context("--seed needs a value")?;
                args.seed = Some(raw.parse().with_context(|| format!("bad seed: {raw}"))?);
            }
            _ => args.command.push(arg),
        }
    }
    Ok(args)
}

fn parse_rarity(raw: &str) -> Result<Rarity> {
    Rarity::ALL
        .into_iter()
        .find(|r| r.as_str().eq_ignore_ascii_case(raw))
        .with_context(|| format!("unknown rarity: {raw}"))
}

fn build_engine(args: &Args) -> Result<Engine> {
    let config = if args.config.exists() {
        EngineConfig::from_file(&args.config)?
    } else {
        info!(path = %args.config.display(), "config not found, using defaults");
        EngineConfig::default()
    };
    let catalog = StaticCatalog::from_file(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;

    let primary = FileStorage::open(&args.data_dir)
        .with_context(|| format!("opening save directory {}", args.data_dir.display()))?;
    let backend = Arc::new(FallbackStorage::new(Box::new(primary)));

    let prng = args.seed.map_or_else(SeededPrng::from_wall_clock, SeededPrng::new);
    Ok(Engine::new(
        config,
        Box::new(catalog),
        backend,
        Arc::new(SystemClock),
        prng,
    )?)
}

fn open(engine: &mut Engine, count: u32) -> Result<()> {
    for n in 1..=count {
        let opening = match engine.open_pack() {
            Ok(opening) => opening,
            Err(EngineError::RateLimited(limit)) => {
                println!("{limit}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let pack = &opening.pack;
        println!("Pack {n} [{:?}] best: {}", pack.design, pack.best_rarity);
        for pulled in &pack.cards {
            let foil = if pulled.is_holo {
                format!(" ({:?})", pulled.holo_type)
            } else {
                String::new()
            };
            println!(
                "  {:<10} {}{foil}",
                pulled.rarity().as_str(),
                pulled.card.name
            );
        }
        if opening.duplicates > 0 {
            println!("  {} duplicate(s) turned into materials", opening.duplicates);
        }
        for milestone in &opening.new_milestones {
            println!(
                "  Milestone {}% reached: {} (+{} bonus packs)",
                milestone.threshold,
                milestone.badge.as_deref().unwrap_or("no badge"),
                milestone.bonus_packs
            );
        }
        println!("  {} opens left this window", opening.rate_limit.remaining);
    }
    Ok(())
}

fn craft(engine: &mut Engine, recipe_id: &str) -> Result<()> {
    match engine.craft(recipe_id)? {
        CraftReport::Denied { reason } => println!("Cannot craft {recipe_id}: {reason}"),
        CraftReport::Completed { result, new_milestones } => {
            match &result.outcome {
                CraftOutcome::Success { cards } => {
                    println!("Crafted {recipe_id} for {} coins:", result.cost);
                    for pulled in cards {
                        println!("  {:<10} {}", pulled.rarity().as_str(), pulled.card.name);
                    }
                }
                CraftOutcome::Failure { refunded, destroyed } => println!(
                    "Craft failed ({} coins spent): {refunded} refunded, {destroyed} lost",
                    result.cost
                ),
            }
            for milestone in new_milestones {
                println!("  Milestone {}% reached", milestone.threshold);
            }
        }
    }
    Ok(())
}

fn recipes(engine: &Engine) -> Result<()> {
    println!("{:<22} {:>6} {:>8} {:>6}  ready", "recipe", "input", "success", "cost");
    for recipe in engine.recipes() {
        println!(
            "{:<22} {:>3} {:<2} {:>7.0}% {:>6}  {}",
            recipe.id,
            recipe.input_count,
            &recipe.input_rarity.as_str()[..1],
            recipe.success_rate * 100.0,
            calculate_crafting_cost(recipe),
            if engine.can_craft(&recipe.id)? { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn status(engine: &Engine) {
    let collection = engine.collection();
    let meta = &collection.metadata;
    println!("Packs opened:  {}", meta.total_packs_opened);
    println!("Unique cards:  {} / {}", meta.unique_cards.len(), engine.catalog().len());
    println!("Holo pulls:    {}", meta.holo_pulls);
    println!("Rare pulls:    {}", meta.rare_pulls);
    println!("Currency:      {}", meta.currency);
    println!(
        "Pity:          {} / {} packs",
        meta.pity.packs_since_floor,
        engine.generator().config().pity.threshold
    );
    let materials: Vec<String> = Rarity::ALL
        .into_iter()
        .filter(|&r| meta.materials.count(r) > 0)
        .map(|r| format!("{} {}", meta.materials.count(r), r.as_str()))
        .collect();
    println!(
        "Materials:     {}",
        if materials.is_empty() { "none".to_string() } else { materials.join(", ") }
    );
    let limit = engine.rate_limit_status();
    println!(
        "Rate limit:    {} used, {} left{}",
        limit.count,
        limit.remaining,
        if limit.is_blocked { " (blocked)" } else { "" }
    );
}

fn completion(engine: &mut Engine) {
    let snapshot = engine.completion().clone();
    println!(
        "Completion: {:.2}% ({} / {})",
        snapshot.overall_percentage, snapshot.owned_cards, snapshot.total_cards
    );
    for (rarity, breakdown) in &snapshot.by_rarity {
        if breakdown.total > 0 {
            println!(
                "  {:<10} {:>3} / {:<3} {:>6.2}%",
                rarity.as_str(),
                breakdown.owned,
                breakdown.total,
                breakdown.percentage
            );
        }
    }
    for milestone in &snapshot.milestones {
        let mark = if milestone.achieved { "x" } else { " " };
        println!(
            "  [{mark}] {:>3}% {}",
            milestone.threshold,
            milestone.badge.as_deref().unwrap_or("")
        );
    }
}

fn missing(engine: &Engine, rarity: Option<Rarity>) {
    let cards = engine.missing_cards(rarity);
    println!("{} missing", cards.len());
    for card in cards {
        println!("  {:<18} {:<10} {}", card.id, card.rarity.as_str(), card.name);
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    let mut engine = build_engine(&args)?;

    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["open"] => open(&mut engine, 1)?,
        ["open", n] => open(&mut engine, n.parse().with_context(|| format!("bad count: {n}"))?)?,
        ["craft", recipe] => craft(&mut engine, recipe)?,
        ["recipes"] => recipes(&engine)?,
        ["credit", amount] => {
            let amount = amount.parse().with_context(|| format!("bad amount: {amount}"))?;
            println!("Balance: {}", engine.credit_currency(amount)?);
        }
        [] | ["status"] => status(&engine),
        ["completion"] => completion(&mut engine),
        ["missing"] => missing(&engine, None),
        ["missing", rarity] => missing(&engine, Some(parse_rarity(rarity)?)),
        other => bail!("unknown command: {}", other.join(" ")),
    }
    Ok(())
}
