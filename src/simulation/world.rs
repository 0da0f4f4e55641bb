//! The authoritative world
//!
//! Owns every actor, engagement, spawner and corpse session plus the
//! catalogs and config they read. Nothing in here is global: a server runs
//! one `World` per dungeon instance and drives it with
//! [`run_simulation_tick`](super::run_simulation_tick).

use std::sync::Arc;

use ahash::AHashMap;

use crate::catalog::Catalogs;
use crate::combat::{CombatActor, EngagementEvent, EngagementRegistry, EngagementTiming, StandardSwingResolver};
use crate::core::config::SimulationConfig;
use crate::core::error::{DelveError, Result};
use crate::core::rng::{combine_seeds, tick_lane, DeterministicRng};
use crate::core::types::{ActorId, CorpseId, SpawnerId, Tick, Vec2};
use crate::loot::{LootRequest, LootResponse, LootService};
use crate::progression::{ProgressionReport, ProgressionResolver, SkillUseOutcome};
use crate::simulation::actors::Actor;
use crate::spawn::{SceneFlags, SpawnEvent, SpawnHost, Spawner, SpawnerDef, StaticScene};

pub struct World {
    pub(crate) tick: Tick,
    pub(crate) config: SimulationConfig,
    pub(crate) catalogs: Arc<Catalogs>,
    pub(crate) scene: StaticScene,
    pub(crate) actors: AHashMap<ActorId, Actor>,
    pub(crate) engagements: EngagementRegistry,
    pub(crate) spawners: Vec<Spawner>,
    pub(crate) loot: LootService,
    pub(crate) resolver: StandardSwingResolver,
    pub(crate) progression: ProgressionResolver,
    next_actor_id: u32,
    next_corpse_id: u32,
    next_spawner_id: u32,
    /// Counts progression events so each gets its own stream
    progression_events: u32,
}

impl World {
    pub fn new(config: SimulationConfig, catalogs: Arc<Catalogs>) -> Result<Self> {
        config.validate()?;
        let engagements = EngagementRegistry::new(EngagementTiming::from_config(&config));
        let resolver = StandardSwingResolver::new(config.combat.hit_chance);
        let progression = ProgressionResolver::from_config(&config.progression);

        Ok(Self {
            tick: 0,
            config,
            catalogs,
            scene: StaticScene::unresolved(),
            actors: AHashMap::new(),
            engagements,
            spawners: Vec::new(),
            loot: LootService::new(),
            resolver,
            progression,
            next_actor_id: 1,
            next_corpse_id: 1,
            next_spawner_id: 1,
            progression_events: 0,
        })
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn catalogs(&self) -> &Arc<Catalogs> {
        &self.catalogs
    }

    pub fn scene(&self) -> &StaticScene {
        &self.scene
    }

    pub fn resolve_scene(&mut self, flags: SceneFlags) {
        self.scene.resolve(flags);
    }

    pub fn engagements(&self) -> &EngagementRegistry {
        &self.engagements
    }

    pub fn loot(&self) -> &LootService {
        &self.loot
    }

    pub fn spawners(&self) -> &[Spawner] {
        &self.spawners
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// All actor ids, ascending
    pub fn actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.actors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn living_monsters(&self) -> usize {
        self.actors.values().filter(|a| a.is_monster() && a.is_alive()).count()
    }

    fn allocate_actor_id(&mut self) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        id
    }

    pub(crate) fn allocate_corpse_id(&mut self) -> CorpseId {
        let id = CorpseId(self.next_corpse_id);
        self.next_corpse_id += 1;
        id
    }

    pub fn add_player(&mut self, name: &str, position: Vec2) -> ActorId {
        let id = self.allocate_actor_id();
        let actor = Actor::player(id, name, position, &self.catalogs.skills);
        self.actors.insert(id, actor);
        tracing::info!("Player '{}' joined as {}", name, id);
        id
    }

    pub fn add_monster(&mut self, template_id: &str, position: Vec2) -> Result<ActorId> {
        let catalogs = Arc::clone(&self.catalogs);
        let template = catalogs
            .monsters
            .get(template_id)
            .ok_or_else(|| DelveError::Catalog(format!("unknown monster template '{}'", template_id)))?;
        let id = self.allocate_actor_id();
        self.actors.insert(id, Actor::monster(id, template, position));
        tracing::debug!("{} '{}' placed at ({:.1}, {:.1})", id, template_id, position.x, position.y);
        Ok(id)
    }

    /// Register and initialize a spawner; a defective one is kept, disabled
    pub fn add_spawner(&mut self, def: SpawnerDef) -> (SpawnerId, Vec<SpawnEvent>) {
        let id = SpawnerId(self.next_spawner_id);
        self.next_spawner_id += 1;
        let mut spawner = Spawner::new(id, def, &self.config);
        let events = spawner.initialize(self.tick, self);
        self.spawners.push(spawner);
        (id, events)
    }

    /// Like [`add_spawner`](Self::add_spawner) with fixed spawn point choice
    pub fn add_seeded_spawner(&mut self, def: SpawnerDef, seed: u64) -> (SpawnerId, Vec<SpawnEvent>) {
        let id = SpawnerId(self.next_spawner_id);
        self.next_spawner_id += 1;
        let mut spawner = Spawner::with_seed(id, def, &self.config, seed);
        let events = spawner.initialize(self.tick, self);
        self.spawners.push(spawner);
        (id, events)
    }

    pub fn remove_spawner(&mut self, id: SpawnerId) -> Option<SpawnEvent> {
        let index = self.spawners.iter().position(|s| s.id() == id)?;
        let mut spawner = self.spawners.remove(index);
        spawner.teardown()
    }

    pub fn move_actor(&mut self, id: ActorId, position: Vec2) -> Result<()> {
        let actor = self.actors.get_mut(&id).ok_or(DelveError::UnknownActor(id))?;
        actor.combat.position = position;
        Ok(())
    }

    /// Name the table a monster's corpse should use instead of its template's
    pub fn set_loot_override(&mut self, id: ActorId, table_id: &str) -> Result<()> {
        let monster = self
            .actors
            .get_mut(&id)
            .and_then(Actor::as_monster_mut)
            .ok_or(DelveError::UnknownActor(id))?;
        monster.loot_override = Some(table_id.to_string());
        Ok(())
    }

    /// Begin or retarget an engagement
    pub fn engage(&mut self, attacker: ActorId, target: ActorId) -> Result<Option<EngagementEvent>> {
        for id in [attacker, target] {
            if !self.actors.contains_key(&id) {
                return Err(DelveError::UnknownActor(id));
            }
        }
        Ok(self.engagements.start(attacker, target, self.tick))
    }

    pub fn disengage(&mut self, attacker: ActorId) -> Option<EngagementEvent> {
        self.engagements.stop(attacker, self.tick)
    }

    /// Remove an actor outright, ending every engagement it took part in
    pub fn despawn(&mut self, id: ActorId) -> Vec<EngagementEvent> {
        let events = self.engagements.stop_involving(id, self.tick);
        if self.actors.remove(&id).is_some() {
            tracing::debug!("{} despawned", id);
        }
        events
    }

    /// Feed one reported skill use through progression
    pub fn report_skill_use(
        &mut self,
        player: ActorId,
        skill_id: &str,
        outcome: SkillUseOutcome,
    ) -> Result<ProgressionReport> {
        let [lo, hi] = tick_lane(self.tick);
        let seed = combine_seeds(&[player.0, lo, hi, self.progression_events]);
        self.progression_events = self.progression_events.wrapping_add(1);

        let actor = self.actors.get_mut(&player).ok_or(DelveError::UnknownActor(player))?;
        let state = actor.as_player_mut().ok_or(DelveError::UnknownActor(player))?;

        let mut rng = DeterministicRng::new(seed);
        let report = self
            .progression
            .resolve(&mut state.skills, &mut state.stats, skill_id, outcome, &mut rng);

        if let Some(vitals) = report.vitals {
            actor.apply_vitals(vitals);
        }
        Ok(report)
    }

    /// Route a client loot request to the corpse it names
    pub fn handle_loot_request(&mut self, request: LootRequest) -> LootResponse {
        self.loot.handle(request, &mut self.actors, &self.scene)
    }
}

impl SpawnHost for World {
    fn is_alive(&self, id: ActorId) -> bool {
        self.actors.get(&id).map_or(false, |a| a.is_alive())
    }

    fn spawn(&mut self, template_id: &str, position: Vec2) -> Option<ActorId> {
        match self.add_monster(template_id, position) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!("Spawn failed: {}", err);
                None
            }
        }
    }

    fn knows_template(&self, template_id: &str) -> bool {
        self.catalogs.monsters.contains(template_id)
    }
}
