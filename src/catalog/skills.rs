//! Skill definitions - the template every skill book is built from

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub initial_value: f32,
    /// Ceiling for this skill alone (the book-wide cap is separate)
    #[serde(default = "default_skill_cap")]
    pub cap: f32,
}

fn default_skill_cap() -> f32 {
    100.0
}

impl SkillDef {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            initial_value: 0.0,
            cap: default_skill_cap(),
        }
    }

    pub fn with_initial_value(mut self, value: f32) -> Self {
        self.initial_value = value;
        self
    }
}

impl CatalogEntry for SkillDef {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
