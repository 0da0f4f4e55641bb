//! Weighted drop table definitions

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

/// One weighted outcome of a drop table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_id: String,
    pub weight: u32,
    #[serde(default = "one")]
    pub min_quantity: u32,
    #[serde(default = "one")]
    pub max_quantity: u32,
    /// Gathering skill required for this entry to be eligible.
    /// Ignored when resolving with an unbounded quality factor.
    #[serde(default)]
    pub min_quality: f32,
}

fn one() -> u32 {
    1
}

impl DropEntry {
    pub fn new(item_id: &str, weight: u32) -> Self {
        Self {
            item_id: item_id.into(),
            weight,
            min_quantity: 1,
            max_quantity: 1,
            min_quality: 0.0,
        }
    }

    pub fn with_quantity(mut self, min: u32, max: u32) -> Self {
        self.min_quantity = min;
        self.max_quantity = max.max(min);
        self
    }

    pub fn with_min_quality(mut self, quality: f32) -> Self {
        self.min_quality = quality;
        self
    }
}

/// Externally authored weighted table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropTableDef {
    pub id: String,
    #[serde(default)]
    pub entries: Vec<DropEntry>,
    /// Weight of drawing nothing on a roll
    #[serde(default)]
    pub nothing_weight: u32,
}

impl DropTableDef {
    pub fn new(id: &str, entries: Vec<DropEntry>) -> Self {
        Self {
            id: id.into(),
            entries,
            nothing_weight: 0,
        }
    }

    pub fn with_nothing_weight(mut self, weight: u32) -> Self {
        self.nothing_weight = weight;
        self
    }
}

impl CatalogEntry for DropTableDef {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
