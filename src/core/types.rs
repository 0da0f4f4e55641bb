//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifier for anything that can fight: players and monsters alike.
///
/// Allocated sequentially by the owning world, so ids are stable across a
/// restart that replays the same spawn sequence.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "actor#{}", _0)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier for a lootable corpse
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "corpse#{}", _0)]
pub struct CorpseId(pub u32);

impl CorpseId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier for a monster spawner
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "spawner#{}", _0)]
pub struct SpawnerId(pub u32);

impl SpawnerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Step toward `target` by at most `max_step`, never overshooting
    pub fn step_toward(&self, target: Vec2, max_step: f32) -> Self {
        let offset = target - *self;
        let len = offset.length();
        if len <= max_step || len <= 0.0001 {
            target
        } else {
            *self + offset.normalize() * max_step
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
