//! Inventory boundary
//!
//! Stacking, slot layout and persistence storage belong to the inventory
//! owner. The loot core only needs a capacity-checked add and a way to ask
//! for an immediate save after a successful take.

use serde::{Deserialize, Serialize};

use crate::loot::session::LootEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddResult {
    Added,
    Full,
    /// The inventory refused the item for a reason other than space
    Rejected,
}

pub trait Inventory {
    fn try_add(&mut self, item: &LootEntry) -> AddResult;
    fn persist_now(&mut self);
}

/// Slot-limited bag, one loot entry per slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Backpack {
    capacity: usize,
    items: Vec<LootEntry>,
    #[serde(skip)]
    persist_count: u32,
}

impl Backpack {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
            persist_count: 0,
        }
    }

    pub fn items(&self) -> &[LootEntry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.items.iter().any(|i| i.instance_id == instance_id)
    }

    /// Times a save has been requested
    pub fn persist_count(&self) -> u32 {
        self.persist_count
    }
}

impl Inventory for Backpack {
    fn try_add(&mut self, item: &LootEntry) -> AddResult {
        if self.contains(&item.instance_id) {
            return AddResult::Rejected;
        }
        if self.items.len() >= self.capacity {
            return AddResult::Full;
        }
        self.items.push(item.clone());
        AddResult::Added
    }

    fn persist_now(&mut self) {
        self.persist_count += 1;
        tracing::debug!("Backpack save requested ({} items)", self.items.len());
    }
}
