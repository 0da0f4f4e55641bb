//! Item definitions

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

/// Authored description of an item type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
    /// Items without durability (coins, reagents) leave this unset
    #[serde(default)]
    pub max_durability: Option<u32>,
    /// Affix names an instance may roll
    #[serde(default)]
    pub affix_pool: Vec<String>,
    #[serde(default)]
    pub max_affixes: u32,
}

impl ItemDef {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon: format!("icons/{}", id),
            max_durability: None,
            affix_pool: Vec::new(),
            max_affixes: 0,
        }
    }

    pub fn with_durability(mut self, max: u32) -> Self {
        self.max_durability = Some(max);
        self
    }

    pub fn with_affixes(mut self, pool: &[&str], max_affixes: u32) -> Self {
        self.affix_pool = pool.iter().map(|a| a.to_string()).collect();
        self.max_affixes = max_affixes;
        self
    }
}

impl CatalogEntry for ItemDef {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
