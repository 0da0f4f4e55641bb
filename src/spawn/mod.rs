//! Scene gating and monster spawners

pub mod scene;
pub mod spawner;

pub use scene::{SceneFlags, SceneRules, StaticScene};
pub use spawner::{SpawnEvent, SpawnHost, Spawner, SpawnerDef, SpawnerState};
