//! Spawner lifecycle
//!
//! ```text
//! initialize ─┬─> Disabled            (no points, no templates, unknown refs)
//!             └─> AwaitingScene ─┬─> Dormant   (hostiles not allowed)
//!                                └─> Active    (initial fill, then replace)
//! teardown ─────> Stopped             (from any state)
//! ```
//!
//! Spawn point choice uses an unseeded generator by default. Nothing
//! downstream needs to reproduce where a monster appeared.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{ActorId, SpawnerId, Tick, Vec2};
use crate::spawn::scene::SceneRules;

/// Authored spawner placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerDef {
    pub templates: Vec<String>,
    pub spawn_points: Vec<Vec2>,
    pub population_cap: u32,
    /// Delay between noticing a missing member and replacing it
    #[serde(default = "default_replacement_delay")]
    pub replacement_delay_secs: f32,
}

fn default_replacement_delay() -> f32 {
    5.0
}

impl SpawnerDef {
    pub fn new(templates: &[&str], spawn_points: Vec<Vec2>, population_cap: u32) -> Self {
        Self {
            templates: templates.iter().map(|t| t.to_string()).collect(),
            spawn_points,
            population_cap,
            replacement_delay_secs: default_replacement_delay(),
        }
    }

    pub fn with_replacement_delay(mut self, secs: f32) -> Self {
        self.replacement_delay_secs = secs;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnerState {
    /// Built but `initialize` not yet called
    Idle,
    AwaitingScene,
    /// Scene forbids hostiles; stays idle for good
    Dormant,
    Active,
    /// Configuration defect; stays idle for good
    Disabled,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnEvent {
    Spawned {
        spawner: SpawnerId,
        actor: ActorId,
        template: String,
        position: Vec2,
    },
    Pruned {
        spawner: SpawnerId,
        actor: ActorId,
    },
    WentDormant {
        spawner: SpawnerId,
    },
    Disabled {
        spawner: SpawnerId,
        reason: String,
    },
    Stopped {
        spawner: SpawnerId,
    },
}

/// The world as a spawner sees it
pub trait SpawnHost {
    fn is_alive(&self, id: ActorId) -> bool;

    /// `None` when the template cannot be instantiated
    fn spawn(&mut self, template_id: &str, position: Vec2) -> Option<ActorId>;

    fn knows_template(&self, _template_id: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    id: SpawnerId,
    def: SpawnerDef,
    state: SpawnerState,
    tracked: Vec<ActorId>,
    next_wake: Tick,
    replacement_at: Option<Tick>,
    poll_ticks: Tick,
    delay_ticks: Tick,
    rng: StdRng,
}

impl Spawner {
    pub fn new(id: SpawnerId, def: SpawnerDef, config: &SimulationConfig) -> Self {
        Self::build(id, def, config, StdRng::from_entropy())
    }

    /// Fixed spawn point selection, for tests and replays
    pub fn with_seed(id: SpawnerId, def: SpawnerDef, config: &SimulationConfig, seed: u64) -> Self {
        Self::build(id, def, config, StdRng::seed_from_u64(seed))
    }

    fn build(id: SpawnerId, def: SpawnerDef, config: &SimulationConfig, rng: StdRng) -> Self {
        let delay_ticks = config.seconds_to_ticks(def.replacement_delay_secs);
        Self {
            id,
            def,
            state: SpawnerState::Idle,
            tracked: Vec::new(),
            next_wake: 0,
            replacement_at: None,
            poll_ticks: config.spawn_poll_ticks(),
            delay_ticks,
            rng,
        }
    }

    pub fn id(&self) -> SpawnerId {
        self.id
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn def(&self) -> &SpawnerDef {
        &self.def
    }

    pub fn tracked(&self) -> &[ActorId] {
        &self.tracked
    }

    pub fn next_wake(&self) -> Tick {
        self.next_wake
    }

    fn configuration_defect<H: SpawnHost + ?Sized>(&self, host: &H) -> Option<String> {
        if self.def.spawn_points.is_empty() {
            return Some("no spawn points".into());
        }
        if self.def.templates.is_empty() {
            return Some("no monster templates".into());
        }
        if self.def.population_cap == 0 {
            return Some("population cap is zero".into());
        }
        self.def
            .templates
            .iter()
            .find(|t| !host.knows_template(t))
            .map(|t| format!("unknown monster template '{}'", t))
    }

    /// Validate and arm the spawner. Defects disable it instead of failing.
    pub fn initialize<H: SpawnHost + ?Sized>(&mut self, now: Tick, host: &H) -> Vec<SpawnEvent> {
        if self.state != SpawnerState::Idle {
            return Vec::new();
        }

        if let Some(reason) = self.configuration_defect(host) {
            tracing::error!("{} disabled: {}", self.id, reason);
            self.state = SpawnerState::Disabled;
            return vec![SpawnEvent::Disabled {
                spawner: self.id,
                reason,
            }];
        }

        self.state = SpawnerState::AwaitingScene;
        self.next_wake = now;
        tracing::debug!("{} awaiting scene rules", self.id);
        Vec::new()
    }

    /// Stop for good; later steps do nothing
    pub fn teardown(&mut self) -> Option<SpawnEvent> {
        if self.state == SpawnerState::Stopped {
            return None;
        }
        self.state = SpawnerState::Stopped;
        self.replacement_at = None;
        tracing::info!("{} stopped ({} tracked)", self.id, self.tracked.len());
        Some(SpawnEvent::Stopped { spawner: self.id })
    }

    pub fn step<S, H>(&mut self, now: Tick, scene: &S, host: &mut H) -> Vec<SpawnEvent>
    where
        S: SceneRules + ?Sized,
        H: SpawnHost + ?Sized,
    {
        let mut events = Vec::new();
        if now < self.next_wake {
            return events;
        }

        match self.state {
            SpawnerState::AwaitingScene => match scene.flags() {
                None => self.next_wake = now + self.poll_ticks,
                Some(flags) if !flags.hostiles_allowed => {
                    self.state = SpawnerState::Dormant;
                    tracing::info!("{} dormant: scene forbids hostiles", self.id);
                    events.push(SpawnEvent::WentDormant { spawner: self.id });
                }
                Some(_) => {
                    self.state = SpawnerState::Active;
                    while (self.tracked.len() as u32) < self.def.population_cap {
                        if !self.spawn_one(host, &mut events) {
                            break;
                        }
                    }
                    tracing::info!("{} active with {} spawned", self.id, self.tracked.len());
                    self.next_wake = now + self.poll_ticks;
                }
            },
            SpawnerState::Active => self.maintain(now, host, &mut events),
            SpawnerState::Idle | SpawnerState::Dormant | SpawnerState::Disabled | SpawnerState::Stopped => {}
        }

        events
    }

    fn maintain<H: SpawnHost + ?Sized>(&mut self, now: Tick, host: &mut H, events: &mut Vec<SpawnEvent>) {
        let id = self.id;
        self.tracked.retain(|actor| {
            let alive = host.is_alive(*actor);
            if !alive {
                events.push(SpawnEvent::Pruned { spawner: id, actor: *actor });
            }
            alive
        });

        let below_cap = (self.tracked.len() as u32) < self.def.population_cap;
        if !below_cap {
            self.replacement_at = None;
        } else {
            match self.replacement_at {
                None => self.replacement_at = Some(now + self.delay_ticks),
                Some(at) if at <= now => {
                    self.spawn_one(host, events);
                    let still_below = (self.tracked.len() as u32) < self.def.population_cap;
                    self.replacement_at = still_below.then(|| now + self.delay_ticks);
                }
                Some(_) => {}
            }
        }

        let poll = now + self.poll_ticks;
        self.next_wake = match self.replacement_at {
            Some(at) => poll.min(at),
            None => poll,
        };
    }

    fn spawn_one<H: SpawnHost + ?Sized>(&mut self, host: &mut H, events: &mut Vec<SpawnEvent>) -> bool {
        let Some(point) = pick(&mut self.rng, self.def.spawn_points.len()) else {
            return false;
        };
        let Some(template_index) = pick(&mut self.rng, self.def.templates.len()) else {
            return false;
        };
        let position = self.def.spawn_points[point];
        let template = self.def.templates[template_index].clone();

        match host.spawn(&template, position) {
            Some(actor) => {
                tracing::debug!("{} spawned {} '{}' at ({:.1}, {:.1})", self.id, actor, template, position.x, position.y);
                self.tracked.push(actor);
                events.push(SpawnEvent::Spawned {
                    spawner: self.id,
                    actor,
                    template,
                    position,
                });
                true
            }
            None => {
                tracing::warn!("{} could not spawn '{}'", self.id, template);
                false
            }
        }
    }
}

fn pick(rng: &mut StdRng, len: usize) -> Option<usize> {
    (len > 0).then(|| rng.gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::scene::{SceneFlags, StaticScene};
    use ahash::AHashSet;

    #[derive(Default)]
    struct Host {
        next: u32,
        alive: AHashSet<ActorId>,
        refuse: bool,
    }

    impl SpawnHost for Host {
        fn is_alive(&self, id: ActorId) -> bool {
            self.alive.contains(&id)
        }
        fn spawn(&mut self, _template_id: &str, _position: Vec2) -> Option<ActorId> {
            if self.refuse {
                return None;
            }
            self.next += 1;
            let id = ActorId(self.next);
            self.alive.insert(id);
            Some(id)
        }
        fn knows_template(&self, template_id: &str) -> bool {
            template_id != "dragon"
        }
    }

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.tick_ms = 1000;
        config.spawn.poll_interval_secs = 1.0;
        config
    }

    fn spawner(cap: u32) -> Spawner {
        let def = SpawnerDef::new(&["goblin"], vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)], cap)
            .with_replacement_delay(3.0);
        Spawner::with_seed(SpawnerId(1), def, &config(), 7)
    }

    #[test]
    fn test_waits_for_scene_then_fills() {
        let mut host = Host::default();
        let mut spawner = spawner(3);
        spawner.initialize(0, &host);

        let mut scene = StaticScene::unresolved();
        assert!(spawner.step(0, &scene, &mut host).is_empty());
        assert_eq!(spawner.state(), SpawnerState::AwaitingScene);

        scene.resolve(SceneFlags::dungeon());
        let events = spawner.step(1, &scene, &mut host);
        assert_eq!(events.len(), 3);
        assert_eq!(spawner.state(), SpawnerState::Active);
        assert_eq!(spawner.tracked().len(), 3);
    }

    #[test]
    fn test_no_hostiles_goes_dormant_forever() {
        let mut host = Host::default();
        let mut spawner = spawner(3);
        spawner.initialize(0, &host);

        let scene = StaticScene::resolved(SceneFlags::sanctuary());
        let events = spawner.step(0, &scene, &mut host);
        assert_eq!(events, vec![SpawnEvent::WentDormant { spawner: SpawnerId(1) }]);

        for tick in 1..20 {
            assert!(spawner.step(tick, &scene, &mut host).is_empty());
        }
        assert!(host.alive.is_empty());
    }

    #[test]
    fn test_configuration_defects_disable() {
        let host = Host::default();
        let cfg = config();

        let mut no_points = Spawner::new(SpawnerId(2), SpawnerDef::new(&["goblin"], vec![], 2), &cfg);
        no_points.initialize(0, &host);
        assert_eq!(no_points.state(), SpawnerState::Disabled);

        let mut no_templates = Spawner::new(SpawnerId(3), SpawnerDef::new(&[], vec![Vec2::default()], 2), &cfg);
        no_templates.initialize(0, &host);
        assert_eq!(no_templates.state(), SpawnerState::Disabled);

        let mut unknown = Spawner::new(SpawnerId(4), SpawnerDef::new(&["dragon"], vec![Vec2::default()], 2), &cfg);
        let events = unknown.initialize(0, &host);
        assert!(matches!(events[0], SpawnEvent::Disabled { .. }));
    }

    #[test]
    fn test_replacement_after_delay() {
        let mut host = Host::default();
        let mut spawner = spawner(2);
        let scene = StaticScene::resolved(SceneFlags::dungeon());
        spawner.initialize(0, &host);
        spawner.step(0, &scene, &mut host);

        let victim = spawner.tracked()[0];
        host.alive.remove(&victim);

        // Pruned at t=1, replacement due at t=4
        let events = spawner.step(1, &scene, &mut host);
        assert_eq!(events, vec![SpawnEvent::Pruned { spawner: SpawnerId(1), actor: victim }]);
        assert_eq!(spawner.tracked().len(), 1);

        for tick in 2..4 {
            assert!(spawner.step(tick, &scene, &mut host).is_empty());
        }
        let events = spawner.step(4, &scene, &mut host);
        assert!(matches!(events[0], SpawnEvent::Spawned { .. }));
        assert_eq!(spawner.tracked().len(), 2);
    }

    #[test]
    fn test_teardown_stops_before_next_step() {
        let mut host = Host::default();
        let mut spawner = spawner(2);
        spawner.initialize(0, &host);
        assert!(spawner.teardown().is_some());
        assert!(spawner.teardown().is_none());

        let scene = StaticScene::resolved(SceneFlags::dungeon());
        assert!(spawner.step(0, &scene, &mut host).is_empty());
        assert!(host.alive.is_empty());
    }

    #[test]
    fn test_failed_spawn_does_not_track() {
        let mut host = Host {
            refuse: true,
            ..Host::default()
        };
        let mut spawner = spawner(2);
        spawner.initialize(0, &host);
        let events = spawner.step(0, &StaticScene::resolved(SceneFlags::dungeon()), &mut host);
        assert!(events.is_empty());
        assert!(spawner.tracked().is_empty());
    }
}
