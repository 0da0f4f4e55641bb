//! Delve - headless arena runner
//!
//! Drops a party of players into a dungeon room with monster spawners,
//! runs the simulation for a fixed number of ticks, lets players fight back
//! and loot whatever dies, and prints a summary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use delve::catalog::Catalogs;
use delve::combat::{CombatActor, EngagementEvent};
use delve::core::error::Result;
use delve::core::types::{ActorId, Vec2};
use delve::core::SimulationConfig;
use delve::loot::{LootRequest, LootResponse, TakeResult};
use delve::simulation::{run_simulation_tick, SimulationEvent, World};
use delve::spawn::{SceneFlags, SpawnerDef};

/// Headless arena run for tuning and smoke testing
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Run a headless dungeon arena and print a JSON summary")]
struct Args {
    /// Simulation config (TOML); defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog file (TOML); the built-in catalog is used when absent
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of players in the party
    #[arg(long, default_value_t = 3)]
    players: u32,

    /// Ticks to simulate
    #[arg(long, default_value_t = 6000)]
    ticks: u64,

    /// Monster templates to spawn, comma separated
    #[arg(long, default_value = "goblin,giant_rat,skeleton")]
    monsters: String,

    /// Population cap per spawner
    #[arg(long, default_value_t = 3)]
    population: u32,

    /// Seed for spawn point selection; unseeded when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct PlayerSummary {
    id: ActorId,
    name: String,
    alive: bool,
    items: usize,
    strength: u32,
    dexterity: u32,
    intelligence: u32,
    skill_total: f32,
    melee_skill: f32,
}

#[derive(Serialize, Default)]
struct ArenaSummary {
    ticks: u64,
    spawned: u32,
    deaths: u32,
    corpses: u32,
    empty_corpses: u32,
    items_taken: u32,
    take_failures: u32,
    progression_events: u32,
    open_corpses: usize,
    players: Vec<PlayerSummary>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("delve=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    let catalogs = match &args.catalog {
        Some(path) => Catalogs::load(path)?,
        None => Catalogs::with_defaults(),
    };

    let mut world = World::new(config, Arc::new(catalogs))?;
    world.resolve_scene(SceneFlags::dungeon());

    let party: Vec<ActorId> = (0..args.players)
        .map(|i| world.add_player(&format!("Adventurer {}", i + 1), Vec2::new(i as f32 * 1.5, 0.0)))
        .collect();

    for (i, template) in args.monsters.split(',').map(str::trim).filter(|t| !t.is_empty()).enumerate() {
        let offset = 6.0 + i as f32 * 3.0;
        let points = vec![Vec2::new(offset, 4.0), Vec2::new(offset, -4.0), Vec2::new(-offset, 4.0)];
        let def = SpawnerDef::new(&[template], points, args.population).with_replacement_delay(10.0);
        match args.seed {
            Some(seed) => world.add_seeded_spawner(def, seed.wrapping_add(i as u64)),
            None => world.add_spawner(def),
        };
    }

    tracing::info!("Arena ready: {} players, {} spawners", party.len(), world.spawners().len());

    let mut summary = ArenaSummary::default();
    for _ in 0..args.ticks {
        let events = run_simulation_tick(&mut world);
        for event in &events {
            tally(&mut summary, event);
            fight_back(&mut world, event);
        }
        loot_nearby(&mut world, &party, &mut summary);
    }

    summary.ticks = world.tick();
    summary.open_corpses = world.loot().len();
    summary.players = party.iter().filter_map(|id| player_summary(&world, *id)).collect();

    if args.format == "text" {
        print_text(&summary);
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn tally(summary: &mut ArenaSummary, event: &SimulationEvent) {
    match event {
        SimulationEvent::Spawn(delve::spawn::SpawnEvent::Spawned { .. }) => summary.spawned += 1,
        SimulationEvent::ActorDied(_) => summary.deaths += 1,
        SimulationEvent::CorpseCreated { opened, .. } => {
            summary.corpses += 1;
            if !opened {
                summary.empty_corpses += 1;
            }
        }
        SimulationEvent::Progression { .. } => summary.progression_events += 1,
        _ => {}
    }
}

/// Players hit back at whatever engages them
fn fight_back(world: &mut World, event: &SimulationEvent) {
    let SimulationEvent::Engagement(EngagementEvent::Started { attacker, target, .. }) = event else {
        return;
    };
    let Some(defender) = world.actor(*target) else {
        return;
    };
    if !defender.is_player() || !defender.is_alive() || world.engagements().is_engaged(*target) {
        return;
    }
    if let Err(err) = world.engage(*target, *attacker) {
        tracing::warn!("{} could not fight back: {}", target, err);
    }
}

/// Every living player empties any corpse within reach
fn loot_nearby(world: &mut World, party: &[ActorId], summary: &mut ArenaSummary) {
    for corpse in world.loot().corpses() {
        for &player in party {
            if !world.actor(player).map_or(false, |a| a.is_alive()) {
                continue;
            }
            let response = world.handle_loot_request(LootRequest::Snapshot { requester: player, corpse });
            let LootResponse::Snapshot { entries, .. } = response else {
                continue;
            };
            for entry in entries {
                let response = world.handle_loot_request(LootRequest::Take {
                    requester: player,
                    corpse,
                    instance_id: entry.instance_id,
                });
                if let LootResponse::TakeResult { result, .. } = response {
                    match result {
                        TakeResult::Success => summary.items_taken += 1,
                        // Distance is the normal reason; not worth counting
                        TakeResult::OutOfRange => break,
                        _ => summary.take_failures += 1,
                    }
                }
            }
        }
    }
}

fn player_summary(world: &World, id: ActorId) -> Option<PlayerSummary> {
    let actor = world.actor(id)?;
    let player = actor.as_player()?;
    Some(PlayerSummary {
        id,
        name: player.name.clone(),
        alive: actor.is_alive(),
        items: player.backpack.len(),
        strength: player.stats.strength,
        dexterity: player.stats.dexterity,
        intelligence: player.stats.intelligence,
        skill_total: player.skills.total(),
        melee_skill: player.skills.value(&world.config().combat.melee_skill_id),
    })
}

fn print_text(summary: &ArenaSummary) {
    println!("=== Arena after {} ticks ===", summary.ticks);
    println!(
        "spawned {}  deaths {}  corpses {} ({} empty)  open {}",
        summary.spawned, summary.deaths, summary.corpses, summary.empty_corpses, summary.open_corpses
    );
    println!(
        "items taken {}  take failures {}  progression events {}",
        summary.items_taken, summary.take_failures, summary.progression_events
    );
    for p in &summary.players {
        println!(
            "  {} [{}] alive={} items={} STR {} DEX {} INT {} skills {:.1} (melee {:.1})",
            p.name, p.id, p.alive, p.items, p.strength, p.dexterity, p.intelligence, p.skill_total, p.melee_skill
        );
    }
}
