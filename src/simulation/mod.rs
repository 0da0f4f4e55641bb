//! World orchestration: actors, the authoritative world and the tick loop

pub mod actors;
pub mod tick;
pub mod world;

pub use actors::{Actor, ActorKind, MonsterState, PlayerState};
pub use tick::{run_simulation_tick, SimulationEvent};
pub use world::World;
