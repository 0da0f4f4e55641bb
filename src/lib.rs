//! Delve - server-authoritative dungeon simulation core
//!
//! Combat engagements, seeded corpse loot with a race-free take protocol,
//! skill and stat progression, and monster spawners, all driven by one
//! deterministic tick.

pub mod catalog;
pub mod combat;
pub mod core;
pub mod loot;
pub mod progression;
pub mod simulation;
pub mod spawn;
