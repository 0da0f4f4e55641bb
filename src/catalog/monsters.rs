//! Monster templates - what a spawner instantiates

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: String,
    pub name: String,
    pub max_health: f32,
    #[serde(default)]
    pub max_stamina: f32,
    /// Seconds between swings
    pub swing_time: f32,
    pub engage_range: f32,
    pub damage_min: f32,
    pub damage_max: f32,
    #[serde(default)]
    pub armor: f32,
    /// World units per second; zero for stationary monsters
    #[serde(default)]
    pub move_speed: f32,
    /// Table fixed at authoring time, used when the death handoff names none
    #[serde(default)]
    pub loot_table: Option<String>,
    /// Flat item pool for templates that predate drop tables
    #[serde(default)]
    pub legacy_loot: Vec<String>,
    #[serde(default)]
    pub roll_count: Option<u32>,
}

impl MonsterTemplate {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_health: 30.0,
            max_stamina: 0.0,
            swing_time: 2.0,
            engage_range: 1.5,
            damage_min: 2.0,
            damage_max: 5.0,
            armor: 0.0,
            move_speed: 2.0,
            loot_table: None,
            legacy_loot: Vec::new(),
            roll_count: None,
        }
    }

    pub fn with_loot_table(mut self, table_id: &str) -> Self {
        self.loot_table = Some(table_id.into());
        self
    }

    pub fn with_legacy_loot(mut self, items: &[&str]) -> Self {
        self.legacy_loot = items.iter().map(|i| i.to_string()).collect();
        self
    }
}

impl CatalogEntry for MonsterTemplate {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
