//! Corpse loot session and take protocol
//!
//! A session is the only place a corpse's entries live. Takes serialize on
//! the session's write lock: validation, the inventory add and the removal
//! all happen under it, so two players racing for one entry cannot both get
//! it. Snapshots take the read lock and always see a whole list.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, CorpseId, Vec2};
use crate::loot::generation::{GeneratedLoot, SeedSource, TableSource};
use crate::loot::inventory::{AddResult, Inventory};
use crate::spawn::scene::SceneRules;

/// One lootable item instance, as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub instance_id: String,
    pub item_def_id: String,
    pub display_name: String,
    pub icon_ref: String,
    pub stack_count: u32,
    pub durability_current: u32,
    pub durability_max: u32,
    pub affix_summary: String,
}

/// Result code for a take request, delivered only to the requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TakeResult {
    Success,
    InvalidPlayer,
    OutOfRange,
    ItemNotFound,
    InventoryFull,
    SceneRulesBlocked,
}

/// What a take request needs from the requesting player
pub trait Looter {
    fn looter_id(&self) -> ActorId;
    fn looter_position(&self) -> Vec2;
    /// `None` when the player has no live inventory (dead, loading, gone)
    fn inventory_mut(&mut self) -> Option<&mut dyn Inventory>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeOutcome {
    pub result: TakeResult,
    /// Fresh list pushed to the requester after a successful take
    pub snapshot: Option<Vec<LootEntry>>,
    /// The take emptied the session; the corpse must be destroyed
    pub emptied: bool,
}

impl TakeOutcome {
    fn failed(result: TakeResult) -> Self {
        Self {
            result,
            snapshot: None,
            emptied: false,
        }
    }
}

#[derive(Debug)]
struct SessionEntries {
    entries: Vec<LootEntry>,
    destroyed: bool,
}

#[derive(Debug)]
pub struct CorpseLootSession {
    corpse_id: CorpseId,
    owner_id: ActorId,
    position: Vec2,
    interact_range: f32,
    seed: u32,
    seed_source: SeedSource,
    table_source: TableSource,
    state: RwLock<SessionEntries>,
}

impl CorpseLootSession {
    pub fn new(
        corpse_id: CorpseId,
        owner_id: ActorId,
        position: Vec2,
        interact_range: f32,
        loot: GeneratedLoot,
    ) -> Self {
        // A corpse that generated nothing is born destroyed
        let destroyed = loot.entries.is_empty();
        Self {
            corpse_id,
            owner_id,
            position,
            interact_range,
            seed: loot.seed,
            seed_source: loot.seed_source,
            table_source: loot.table_source,
            state: RwLock::new(SessionEntries {
                entries: loot.entries,
                destroyed,
            }),
        }
    }

    pub fn corpse_id(&self) -> CorpseId {
        self.corpse_id
    }

    /// The defeated actor this corpse belongs to
    pub fn owner_id(&self) -> ActorId {
        self.owner_id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn interact_range(&self) -> f32 {
        self.interact_range
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn seed_source(&self) -> SeedSource {
        self.seed_source
    }

    pub fn table_source(&self) -> &TableSource {
        &self.table_source
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionEntries> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("{} loot lock poisoned (read)", self.corpse_id);
                poisoned.into_inner()
            }
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionEntries> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("{} loot lock poisoned (write)", self.corpse_id);
                poisoned.into_inner()
            }
        }
    }

    /// Current entries in order; side-effect free
    pub fn snapshot(&self) -> Vec<LootEntry> {
        self.read_state().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.read_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().entries.is_empty()
    }

    /// True once the last entry has been taken; no longer interactable
    pub fn is_destroyed(&self) -> bool {
        self.read_state().destroyed
    }

    /// Validate and execute a take.
    ///
    /// Checks run in order: live inventory, range, scene rules, entry
    /// exists. Any failure returns its code and mutates nothing.
    pub fn take<L, S>(&self, looter: &mut L, scene: &S, instance_id: &str) -> TakeOutcome
    where
        L: Looter + ?Sized,
        S: SceneRules + ?Sized,
    {
        let requester = looter.looter_id();
        let distance = looter.looter_position().distance(&self.position);

        let Some(inventory) = looter.inventory_mut() else {
            return TakeOutcome::failed(TakeResult::InvalidPlayer);
        };

        if distance > self.interact_range {
            return TakeOutcome::failed(TakeResult::OutOfRange);
        }

        if !scene.looting_allowed() {
            return TakeOutcome::failed(TakeResult::SceneRulesBlocked);
        }

        let mut state = self.write_state();
        if state.destroyed {
            return TakeOutcome::failed(TakeResult::ItemNotFound);
        }

        let Some(index) = state.entries.iter().position(|e| e.instance_id == instance_id) else {
            return TakeOutcome::failed(TakeResult::ItemNotFound);
        };

        match inventory.try_add(&state.entries[index]) {
            AddResult::Added => {}
            AddResult::Full | AddResult::Rejected => {
                return TakeOutcome::failed(TakeResult::InventoryFull);
            }
        }

        let taken = state.entries.remove(index);
        let emptied = state.entries.is_empty();
        if emptied {
            state.destroyed = true;
        }
        let snapshot = state.entries.clone();
        drop(state);

        inventory.persist_now();
        tracing::debug!(
            "{} took {} ({}) from {}; {} left",
            requester,
            taken.instance_id,
            taken.item_def_id,
            self.corpse_id,
            snapshot.len()
        );

        TakeOutcome {
            result: TakeResult::Success,
            snapshot: Some(snapshot),
            emptied,
        }
    }
}
