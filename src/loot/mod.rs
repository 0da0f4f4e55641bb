//! Corpse loot: seed handoff, drop resolution, generation and the take
//! protocol.

pub mod drops;
pub mod generation;
pub mod inventory;
pub mod seed;
pub mod service;
pub mod session;

pub use drops::{resolve_drop_table, sample_legacy_pool, DropOutput, UNGATED};
pub use generation::{generate_corpse_loot, CorpseLootProfile, GeneratedLoot, SeedSource, TableSource};
pub use inventory::{AddResult, Backpack, Inventory};
pub use seed::LootSeedContext;
pub use service::{LootRequest, LootResponse, LootService, LooterDirectory};
pub use session::{CorpseLootSession, LootEntry, Looter, TakeOutcome, TakeResult};
