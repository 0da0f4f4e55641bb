//! Tick system - orchestrates one authoritative simulation step
//!
//! Order within a tick:
//! spawners -> target acquisition -> approach movement -> due engagements
//! -> melee skill reports -> death resolution -> tick advance
//!
//! Every phase visits actors in id order, so two servers fed the same
//! inputs produce the same events. Target acquisition is a pure search and
//! runs on rayon; its results are applied sequentially.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{CombatActor, DeathEvent, EngagementEvent};
use crate::core::rng::{combine_seeds, tick_lane};
use crate::core::types::{ActorId, CorpseId, Tick, Vec2};
use crate::loot::{generate_corpse_loot, CorpseLootProfile, CorpseLootSession, LootSeedContext, SeedSource, TableSource};
use crate::progression::{ProgressionReport, SkillUseOutcome};
use crate::simulation::actors::Actor;
use crate::simulation::world::World;
use crate::spawn::SpawnEvent;

/// Fraction of engage range a monster closes to, so it ends inside reach
const APPROACH_STOP_FACTOR: f32 = 0.9;

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    Spawn(SpawnEvent),
    Engagement(EngagementEvent),
    ActorDied(DeathEvent),
    /// Loot was generated for a dead monster
    CorpseCreated {
        corpse: CorpseId,
        victim: ActorId,
        seed: u32,
        seed_source: SeedSource,
        table_source: TableSource,
        entries: usize,
        /// False when nothing dropped; the corpse is never interactable
        opened: bool,
    },
    /// A skill use raised a skill or stat
    Progression {
        player: ActorId,
        report: ProgressionReport,
    },
}

/// Advance the world by one tick
pub fn run_simulation_tick(world: &mut World) -> Vec<SimulationEvent> {
    let now = world.tick;
    let mut events = Vec::new();

    run_spawners(world, now, &mut events);
    acquire_targets(world, now, &mut events);
    approach_targets(world);

    let swing_events = world
        .engagements
        .step_due(now, &mut world.actors, &world.resolver);

    let mut deaths = Vec::new();
    let mut skill_uses = Vec::new();
    for event in swing_events {
        if let EngagementEvent::SwingResolved(outcome) = &event {
            if let Some(death) = &outcome.defeated {
                deaths.push(death.clone());
            }
            if world.actors.get(&outcome.attacker).map_or(false, Actor::is_player) {
                let result = if outcome.hit {
                    SkillUseOutcome::Success
                } else {
                    SkillUseOutcome::Fail
                };
                skill_uses.push((outcome.attacker, result));
            }
        }
        events.push(SimulationEvent::Engagement(event));
    }

    let melee_skill = world.config.combat.melee_skill_id.clone();
    for (player, outcome) in skill_uses {
        match world.report_skill_use(player, &melee_skill, outcome) {
            Ok(report) if report.any_gain() => events.push(SimulationEvent::Progression { player, report }),
            Ok(_) => {}
            Err(err) => tracing::warn!("Skill report for {} failed: {}", player, err),
        }
    }

    for death in deaths {
        resolve_death(world, death, &mut events);
    }

    world.tick += 1;
    events
}

fn run_spawners(world: &mut World, now: Tick, events: &mut Vec<SimulationEvent>) {
    let mut spawners = std::mem::take(&mut world.spawners);
    let scene = world.scene;

    for spawner in spawners.iter_mut() {
        for event in spawner.step(now, &scene, world) {
            if let SpawnEvent::Spawned { spawner, actor, .. } = &event {
                if let Some(spawned) = world.actors.get_mut(actor) {
                    spawned.spawner = Some(*spawner);
                }
            }
            events.push(SimulationEvent::Spawn(event));
        }
    }

    spawners.append(&mut world.spawners);
    world.spawners = spawners;
}

/// Nearest candidate within `range`; ties go to the lowest id
fn nearest(from: Vec2, candidates: &[(ActorId, Vec2)], range: f32) -> Option<ActorId> {
    let mut best: Option<(ActorId, f32)> = None;
    for &(id, position) in candidates {
        let distance = from.distance(&position);
        if distance > range {
            continue;
        }
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

fn acquire_targets(world: &mut World, now: Tick, events: &mut Vec<SimulationEvent>) {
    let range = world.config.combat.monster_aggro_range;

    let mut players: Vec<(ActorId, Vec2)> = world
        .actors
        .values()
        .filter(|a| a.is_player() && a.is_alive())
        .map(|a| (a.id, a.position()))
        .collect();
    if players.is_empty() {
        return;
    }
    players.sort_unstable_by_key(|(id, _)| *id);

    let idle: Vec<&Actor> = world
        .actors
        .values()
        .filter(|a| a.is_monster() && a.is_alive() && !world.engagements.is_engaged(a.id))
        .collect();

    let mut picks: Vec<(ActorId, ActorId)> = idle
        .par_iter()
        .filter_map(|monster| nearest(monster.position(), &players, range).map(|target| (monster.id, target)))
        .collect();
    picks.sort_unstable_by_key(|(monster, _)| *monster);

    for (monster, target) in picks {
        if let Some(event) = world.engagements.start(monster, target, now) {
            events.push(SimulationEvent::Engagement(event));
        }
    }
}

/// Engaged monsters that can move walk toward targets out of reach
fn approach_targets(world: &mut World) {
    let dt = world.config.tick_ms as f32 / 1000.0;

    let mut moves: Vec<(ActorId, Vec2)> = Vec::new();
    for attacker in world.engagements.attackers() {
        let Some(actor) = world.actors.get(&attacker) else {
            continue;
        };
        let Some(monster) = actor.as_monster() else {
            continue;
        };
        if !actor.is_alive() || !actor.gates().can_move || monster.move_speed <= 0.0 {
            continue;
        }
        let Some(target) = world
            .engagements
            .target_of(attacker)
            .and_then(|id| world.actors.get(&id))
            .filter(|t| t.is_alive())
        else {
            continue;
        };

        let distance = actor.position().distance(&target.position());
        if distance <= actor.engage_range() {
            continue;
        }
        let remaining = distance - actor.engage_range() * APPROACH_STOP_FACTOR;
        let step = (monster.move_speed * dt).min(remaining);
        moves.push((attacker, actor.position().step_toward(target.position(), step)));
    }

    for (id, position) in moves {
        if let Some(actor) = world.actors.get_mut(&id) {
            actor.combat.position = position;
        }
    }
}

/// Death handoff: seed the corpse, generate its loot and open the session
fn resolve_death(world: &mut World, death: DeathEvent, events: &mut Vec<SimulationEvent>) {
    events.push(SimulationEvent::ActorDied(death.clone()));

    let Some(monster) = world.actors.get(&death.victim).and_then(Actor::as_monster) else {
        tracing::info!("{} was killed by {}", death.victim, death.killer);
        return;
    };
    let template_id = monster.template_id.clone();
    let loot_override = monster.loot_override.clone();

    let corpse_id = world.allocate_corpse_id();
    let [lo, hi] = tick_lane(death.tick);
    let mut context = LootSeedContext::new();
    if let Err(err) = context.assign_seed(combine_seeds(&[death.victim.0, lo, hi])) {
        tracing::warn!("{}: {}", corpse_id, err);
    }
    if let Err(err) = context.assign_loot_table_id(loot_override.as_deref()) {
        tracing::warn!("{}: {}", corpse_id, err);
    }
    context.seal();

    let default_rolls = world.config.loot.default_roll_count;
    let profile = match world.catalogs.monsters.get(&template_id) {
        Some(template) => CorpseLootProfile::from_template(template, default_rolls),
        None => {
            tracing::warn!("{} has unknown template '{}'; no authored loot", death.victim, template_id);
            CorpseLootProfile {
                roll_count: default_rolls,
                ..CorpseLootProfile::default()
            }
        }
    };

    let loot = generate_corpse_loot(corpse_id, &context, &profile, &world.catalogs, &world.config.loot);
    let seed = loot.seed;
    let seed_source = loot.seed_source;
    let table_source = loot.table_source.clone();
    let entries = loot.entries.len();

    let session = CorpseLootSession::new(
        corpse_id,
        death.victim,
        death.position,
        world.config.loot.interact_range,
        loot,
    );
    let opened = world.loot.open_corpse(session).is_some();
    tracing::info!(
        "{} ('{}') dropped {} with {} entries",
        death.victim,
        template_id,
        corpse_id,
        entries
    );

    events.push(SimulationEvent::CorpseCreated {
        corpse: corpse_id,
        victim: death.victim,
        seed,
        seed_source,
        table_source,
        entries,
        opened,
    });

    for event in world.despawn(death.victim) {
        events.push(SimulationEvent::Engagement(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::Catalogs;
    use crate::core::config::SimulationConfig;
    use crate::spawn::SceneFlags;

    fn world() -> World {
        let mut world = World::new(SimulationConfig::default(), Arc::new(Catalogs::with_defaults())).unwrap();
        world.resolve_scene(SceneFlags::dungeon());
        world
    }

    #[test]
    fn test_nearest_prefers_lower_id_on_tie() {
        let candidates = [(ActorId(2), Vec2::new(1.0, 0.0)), (ActorId(5), Vec2::new(-1.0, 0.0))];
        assert_eq!(nearest(Vec2::default(), &candidates, 5.0), Some(ActorId(2)));
        assert_eq!(nearest(Vec2::default(), &candidates, 0.5), None);
    }

    #[test]
    fn test_idle_monster_acquires_player() {
        let mut world = world();
        let player = world.add_player("A", Vec2::default());
        let monster = world.add_monster("goblin", Vec2::new(5.0, 0.0)).unwrap();

        run_simulation_tick(&mut world);
        assert_eq!(world.engagements().target_of(monster), Some(player));
    }

    #[test]
    fn test_monster_closes_distance() {
        let mut world = world();
        world.add_player("A", Vec2::default());
        let monster = world.add_monster("goblin", Vec2::new(6.0, 0.0)).unwrap();

        for _ in 0..60 {
            run_simulation_tick(&mut world);
        }
        let actor = world.actor(monster).unwrap();
        assert!(actor.position().x <= actor.engage_range());
    }

    #[test]
    fn test_tick_advances() {
        let mut world = world();
        run_simulation_tick(&mut world);
        run_simulation_tick(&mut world);
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn test_killed_monster_leaves_corpse() {
        let mut world = world();
        let player = world.add_player("A", Vec2::default());
        let rat = world.add_monster("giant_rat", Vec2::new(1.0, 0.0)).unwrap();
        {
            let actor = world.actor_mut(player).unwrap();
            actor.combat.damage_min = 100.0;
            actor.combat.damage_max = 100.0;
        }
        world.engage(player, rat).unwrap();

        let mut died = false;
        let mut corpse = None;
        for _ in 0..400 {
            for event in run_simulation_tick(&mut world) {
                match event {
                    SimulationEvent::ActorDied(death) if death.victim == rat => died = true,
                    SimulationEvent::CorpseCreated { corpse: id, seed_source, .. } => {
                        assert_eq!(seed_source, SeedSource::Handoff);
                        corpse = Some(id);
                    }
                    _ => {}
                }
            }
            if died {
                break;
            }
        }

        assert!(died);
        assert!(corpse.is_some());
        assert!(world.actor(rat).is_none());
        assert!(world.engagements().is_empty());
    }
}
