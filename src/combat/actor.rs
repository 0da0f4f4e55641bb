//! Combat actor capability
//!
//! The minimal surface the engagement loop and swing resolution need from
//! anything that fights. Players and monsters both implement [`CombatActor`]
//! by exposing a [`CombatActorState`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, Vec2};

/// Per-actor action gates (stuns, casting locks, bandaging...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGates {
    pub can_attack: bool,
    pub can_cast: bool,
    pub can_move: bool,
    pub can_bandage: bool,
}

impl Default for ActionGates {
    fn default() -> Self {
        Self {
            can_attack: true,
            can_cast: true,
            can_move: true,
            can_bandage: true,
        }
    }
}

impl ActionGates {
    /// Everything blocked (stunned, paralysed)
    pub fn locked() -> Self {
        Self {
            can_attack: false,
            can_cast: false,
            can_move: false,
            can_bandage: false,
        }
    }
}

/// Authoritative combat state owned by one actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatActorState {
    pub alive: bool,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    /// Seconds between swings before any modifiers
    pub base_swing_time: f32,
    /// Farthest distance at which a swing can land
    pub engage_range: f32,
    pub damage_min: f32,
    pub damage_max: f32,
    pub armor: f32,
    pub gates: ActionGates,
}

impl Default for CombatActorState {
    fn default() -> Self {
        Self {
            alive: true,
            position: Vec2::default(),
            health: 50.0,
            max_health: 50.0,
            stamina: 50.0,
            max_stamina: 50.0,
            base_swing_time: 2.0,
            engage_range: 1.5,
            damage_min: 3.0,
            damage_max: 6.0,
            armor: 0.0,
            gates: ActionGates::default(),
        }
    }
}

impl CombatActorState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Pay `cost` stamina if available; returns false and changes nothing otherwise
    pub fn spend_stamina(&mut self, cost: f32) -> bool {
        if cost <= 0.0 {
            return true;
        }
        if self.stamina < cost {
            return false;
        }
        self.stamina -= cost;
        true
    }

    /// Subtract health; returns true only for the blow that kills
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// What an attacker brings to one swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub attacker: ActorId,
    pub damage_min: f32,
    pub damage_max: f32,
}

/// What a defender brings to one swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseProfile {
    pub defender: ActorId,
    pub armor: f32,
}

/// Read/mutate surface used by the engagement loop and swing resolution
pub trait CombatActor {
    fn actor_id(&self) -> ActorId;
    fn combat_state(&self) -> &CombatActorState;
    fn combat_state_mut(&mut self) -> &mut CombatActorState;

    fn is_alive(&self) -> bool {
        self.combat_state().alive
    }

    fn position(&self) -> Vec2 {
        self.combat_state().position
    }

    /// Current swing duration in seconds
    fn swing_time(&self) -> f32 {
        self.combat_state().base_swing_time
    }

    fn engage_range(&self) -> f32 {
        self.combat_state().engage_range
    }

    fn gates(&self) -> ActionGates {
        self.combat_state().gates
    }

    fn try_spend_stamina(&mut self, cost: f32) -> bool {
        self.combat_state_mut().spend_stamina(cost)
    }

    fn attack_profile(&self) -> AttackProfile {
        let state = self.combat_state();
        AttackProfile {
            attacker: self.actor_id(),
            damage_min: state.damage_min,
            damage_max: state.damage_max,
        }
    }

    fn defense_profile(&self) -> DefenseProfile {
        DefenseProfile {
            defender: self.actor_id(),
            armor: self.combat_state().armor,
        }
    }

    fn apply_damage(&mut self, amount: f32) -> bool {
        self.combat_state_mut().apply_damage(amount)
    }
}

/// Lookup of combat actors by id
pub trait CombatArena {
    type Actor: CombatActor;

    fn actor(&self, id: ActorId) -> Option<&Self::Actor>;
    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Self::Actor>;
}

impl<A: CombatActor> CombatArena for AHashMap<ActorId, A> {
    type Actor = A;

    fn actor(&self, id: ActorId) -> Option<&A> {
        self.get(&id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut A> {
        self.get_mut(&id)
    }
}
