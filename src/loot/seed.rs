//! Loot seed handoff
//!
//! The death-resolution step fills a [`LootSeedContext`] and seals it before
//! the corpse becomes visible. Each field is write-once, and "never assigned"
//! stays distinguishable from an assigned zero.

use serde::Serialize;

use crate::core::error::{DelveError, Result};

/// Only built through [`LootSeedContext::new`] and the write-once setters;
/// serialisable for logging but never read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LootSeedContext {
    seed: Option<u32>,
    loot_table_id: Option<String>,
    table_assigned: bool,
    sealed: bool,
}

impl LootSeedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_seed(&mut self, seed: u32) -> Result<()> {
        if self.sealed {
            return Err(DelveError::SeedContextSealed);
        }
        if self.seed.is_some() {
            return Err(DelveError::SeedAlreadyAssigned);
        }
        self.seed = Some(seed);
        Ok(())
    }

    /// Record the table named by the death context.
    ///
    /// Blank or missing ids are accepted and mean "no override"; they still
    /// consume the single write. Surrounding whitespace is trimmed.
    pub fn assign_loot_table_id(&mut self, id: Option<&str>) -> Result<()> {
        if self.sealed {
            return Err(DelveError::SeedContextSealed);
        }
        if self.table_assigned {
            return Err(DelveError::LootTableAlreadyAssigned);
        }
        self.table_assigned = true;
        self.loot_table_id = id
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
            .map(str::to_string);
        Ok(())
    }

    /// Freeze the context; called when the corpse becomes visible
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// `None` means the handoff never assigned a seed
    pub fn seed(&self) -> Option<u32> {
        self.seed
    }

    pub fn has_seed(&self) -> bool {
        self.seed.is_some()
    }

    pub fn loot_table_id(&self) -> Option<&str> {
        self.loot_table_id.as_deref()
    }

    pub fn has_table_assignment(&self) -> bool {
        self.table_assigned
    }
}
