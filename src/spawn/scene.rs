//! Scene rule gate
//!
//! Scene loading is asynchronous from the core's point of view: until the
//! scene's rules are known, [`SceneRules::flags`] returns `None` and anything
//! gated on it (spawning, looting) waits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneFlags {
    pub hostiles_allowed: bool,
    pub looting_allowed: bool,
}

impl SceneFlags {
    /// A normal dungeon floor
    pub fn dungeon() -> Self {
        Self {
            hostiles_allowed: true,
            looting_allowed: true,
        }
    }

    /// Towns and other safe zones
    pub fn sanctuary() -> Self {
        Self {
            hostiles_allowed: false,
            looting_allowed: false,
        }
    }
}

pub trait SceneRules {
    /// `None` while the gate has not resolved yet
    fn flags(&self) -> Option<SceneFlags>;

    fn hostiles_allowed(&self) -> bool {
        self.flags().map_or(false, |f| f.hostiles_allowed)
    }

    fn looting_allowed(&self) -> bool {
        self.flags().map_or(false, |f| f.looting_allowed)
    }
}

/// Scene state owned by the world; starts unresolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticScene {
    flags: Option<SceneFlags>,
}

impl StaticScene {
    pub fn unresolved() -> Self {
        Self { flags: None }
    }

    pub fn resolved(flags: SceneFlags) -> Self {
        Self { flags: Some(flags) }
    }

    pub fn resolve(&mut self, flags: SceneFlags) {
        tracing::info!(
            "Scene rules resolved: hostiles={} looting={}",
            flags.hostiles_allowed,
            flags.looting_allowed
        );
        self.flags = Some(flags);
    }
}

impl SceneRules for StaticScene {
    fn flags(&self) -> Option<SceneFlags> {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_scene_allows_nothing() {
        let scene = StaticScene::unresolved();
        assert!(!scene.hostiles_allowed());
        assert!(!scene.looting_allowed());
    }

    #[test]
    fn test_resolve_updates_flags() {
        let mut scene = StaticScene::unresolved();
        scene.resolve(SceneFlags::dungeon());
        assert!(scene.hostiles_allowed());
        assert!(scene.looting_allowed());
        assert_eq!(StaticScene::resolved(SceneFlags::sanctuary()).flags(), Some(SceneFlags::sanctuary()));
    }
}
