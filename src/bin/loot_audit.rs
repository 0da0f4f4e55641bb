//! Loot determinism audit
//!
//! Resolves every drop table (or one) across a seed range in parallel,
//! generating each corpse twice and checking both runs agree. Prints item
//! frequencies and any mismatches as JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use delve::catalog::Catalogs;
use delve::core::config::LootConfig;
use delve::core::error::Result;
use delve::core::types::CorpseId;
use delve::loot::{generate_corpse_loot, CorpseLootProfile, LootSeedContext};

#[derive(Parser, Debug)]
#[command(name = "loot_audit")]
#[command(about = "Check corpse loot is reproducible across a seed range")]
struct Args {
    /// Catalog file (TOML); the built-in catalog is used when absent
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Only audit this drop table
    #[arg(long)]
    table: Option<String>,

    /// First seed
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Number of seeds per table
    #[arg(long, default_value_t = 10_000)]
    seeds: u32,

    /// Rolls per corpse
    #[arg(long, default_value_t = 2)]
    rolls: u32,
}

#[derive(Serialize, Default)]
struct TableReport {
    table: String,
    corpses: u32,
    empty_corpses: u32,
    instances: u64,
    /// Item id -> instances produced
    items: BTreeMap<String, u64>,
    mismatched_seeds: Vec<u32>,
}

#[derive(Serialize)]
struct AuditReport {
    start: u32,
    seeds: u32,
    rolls: u32,
    deterministic: bool,
    tables: Vec<TableReport>,
}

fn audit_table(catalogs: &Catalogs, config: &LootConfig, table: &str, args: &Args) -> Result<TableReport> {
    let profile = CorpseLootProfile {
        authored_table: Some(table.to_string()),
        legacy_pool: Vec::new(),
        roll_count: args.rolls,
    };

    let runs: Vec<_> = (args.start..args.start.saturating_add(args.seeds))
        .into_par_iter()
        .map(|seed| -> Result<_> {
            let mut context = LootSeedContext::new();
            context.assign_seed(seed)?;
            context.seal();
            let corpse = CorpseId(seed);
            let first = generate_corpse_loot(corpse, &context, &profile, catalogs, config);
            let second = generate_corpse_loot(corpse, &context, &profile, catalogs, config);
            Ok((seed, first == second, first.entries))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = TableReport {
        table: table.to_string(),
        ..TableReport::default()
    };
    for (seed, matched, entries) in runs {
        report.corpses += 1;
        if entries.is_empty() {
            report.empty_corpses += 1;
        }
        report.instances += entries.len() as u64;
        for entry in entries {
            *report.items.entry(entry.item_def_id).or_default() += 1;
        }
        if !matched {
            report.mismatched_seeds.push(seed);
        }
    }
    Ok(report)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("delve=warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let catalogs = match &args.catalog {
        Some(path) => Catalogs::load(path)?,
        None => Catalogs::with_defaults(),
    };
    let config = LootConfig::default();

    let tables: Vec<String> = match &args.table {
        Some(table) => vec![table.clone()],
        None => catalogs.drop_tables.ids().into_iter().map(String::from).collect(),
    };

    let mut reports = Vec::new();
    for table in &tables {
        if !catalogs.drop_tables.contains(table) {
            tracing::warn!("Drop table '{}' not in catalog; skipped", table);
            continue;
        }
        tracing::info!("Auditing '{}' over {} seeds", table, args.seeds);
        reports.push(audit_table(&catalogs, &config, table, &args)?);
    }

    let report = AuditReport {
        start: args.start,
        seeds: args.seeds,
        rolls: args.rolls,
        deterministic: reports.iter().all(|r| r.mismatched_seeds.is_empty()),
        tables: reports,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.deterministic {
        std::process::exit(1);
    }
    Ok(())
}
