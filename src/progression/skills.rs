//! Per-player skill book
//!
//! A book always holds every skill in the catalog. Values are fractional
//! and only ever changed through a [`SkillGainPolicy`](super::SkillGainPolicy).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::SkillCatalog;

/// What the player has asked a skill to do over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkillLock {
    #[default]
    Increase,
    /// Willing to give up points when the total cap is reached
    Decrease,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub skill_id: String,
    pub value: f32,
    pub cap: f32,
    pub lock: SkillLock,
}

impl SkillState {
    pub fn new(skill_id: &str, value: f32, cap: f32) -> Self {
        Self {
            skill_id: skill_id.into(),
            value: value.clamp(0.0, cap.max(0.0)),
            cap,
            lock: SkillLock::Increase,
        }
    }

    pub fn headroom(&self) -> f32 {
        (self.cap - self.value).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSkillBook {
    skills: BTreeMap<String, SkillState>,
}

impl PlayerSkillBook {
    /// One state per catalog skill, at its initial value
    pub fn from_catalog(catalog: &SkillCatalog) -> Self {
        let skills = catalog
            .ids()
            .into_iter()
            .filter_map(|id| catalog.get(id))
            .map(|def| (def.id.clone(), SkillState::new(&def.id, def.initial_value, def.cap)))
            .collect();
        Self { skills }
    }

    pub fn get(&self, skill_id: &str) -> Option<&SkillState> {
        self.skills.get(skill_id)
    }

    pub fn get_mut(&mut self, skill_id: &str) -> Option<&mut SkillState> {
        self.skills.get_mut(skill_id)
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.skills.contains_key(skill_id)
    }

    /// 0 for unknown skills
    pub fn value(&self, skill_id: &str) -> f32 {
        self.skills.get(skill_id).map_or(0.0, |s| s.value)
    }

    pub fn total(&self) -> f32 {
        self.skills.values().map(|s| s.value).sum()
    }

    /// Returns false when the skill is unknown
    pub fn set_lock(&mut self, skill_id: &str, lock: SkillLock) -> bool {
        match self.skills.get_mut(skill_id) {
            Some(state) => {
                state.lock = lock;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillState> {
        self.skills.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SkillState> {
        self.skills.values_mut()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
