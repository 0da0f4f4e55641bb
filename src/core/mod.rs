pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::SimulationConfig;
pub use error::{DelveError, Result};
pub use rng::{combine_seeds, DeterministicRng};
pub use types::{ActorId, CorpseId, SpawnerId, Tick, Vec2};
