//! Swing resolution
//!
//! A [`SwingResolver`] turns an attack and a defense into a roll. It is pure
//! given its random stream, so the hit/damage curve can be swapped without
//! touching the engagement loop. [`execute_swing`] applies the roll to the
//! target and reports a [`DeathEvent`] for the killing blow.

use serde::{Deserialize, Serialize};

use crate::combat::actor::{AttackProfile, CombatActor, DefenseProfile};
use crate::core::rng::{combine_seeds, tick_lane, DeterministicRng};
use crate::core::types::{ActorId, Tick, Vec2};

/// Raw result of one swing before it is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingRoll {
    pub hit: bool,
    pub damage: f32,
}

impl SwingRoll {
    pub fn miss() -> Self {
        Self {
            hit: false,
            damage: 0.0,
        }
    }
}

/// Pluggable hit/damage curve
pub trait SwingResolver {
    fn resolve(
        &self,
        attack: &AttackProfile,
        defense: &DefenseProfile,
        rng: &mut DeterministicRng,
    ) -> SwingRoll;
}

/// Flat hit chance, uniform damage in the attacker's range, armor subtracted
#[derive(Debug, Clone, Copy)]
pub struct StandardSwingResolver {
    pub hit_chance: f32,
}

impl StandardSwingResolver {
    pub fn new(hit_chance: f32) -> Self {
        Self {
            hit_chance: hit_chance.clamp(0.0, 1.0),
        }
    }
}

impl SwingResolver for StandardSwingResolver {
    fn resolve(
        &self,
        attack: &AttackProfile,
        defense: &DefenseProfile,
        rng: &mut DeterministicRng,
    ) -> SwingRoll {
        // Both draws happen every swing so the stream position never depends
        // on whether the first one hit.
        let hit_roll = rng.next_f32();
        let damage_roll = rng.next_f32();

        if hit_roll >= self.hit_chance {
            return SwingRoll::miss();
        }

        let span = (attack.damage_max - attack.damage_min).max(0.0);
        let raw = attack.damage_min + span * damage_roll;
        SwingRoll {
            hit: true,
            damage: (raw - defense.armor).max(0.0),
        }
    }
}

/// Emitted exactly once, for the blow that drops an actor to zero health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub victim: ActorId,
    pub killer: ActorId,
    pub position: Vec2,
    pub tick: Tick,
}

/// Applied result of one swing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingOutcome {
    pub attacker: ActorId,
    pub target: ActorId,
    pub hit: bool,
    pub damage: f32,
    pub tick: Tick,
    pub defeated: Option<DeathEvent>,
}

/// Seed for one swing: attacker, target, tick and the attacker's swing counter
pub fn swing_seed(attacker: ActorId, target: ActorId, tick: Tick, swing_index: u32) -> u32 {
    let [lo, hi] = tick_lane(tick);
    combine_seeds(&[attacker.0, target.0, lo, hi, swing_index])
}

/// Resolve one swing against `target` and apply the damage
pub fn execute_swing<R, A>(
    resolver: &R,
    attack: &AttackProfile,
    target: &mut A,
    seed: u32,
    tick: Tick,
) -> SwingOutcome
where
    R: SwingResolver + ?Sized,
    A: CombatActor,
{
    let mut rng = DeterministicRng::new(seed);
    let defense = target.defense_profile();
    let roll = resolver.resolve(attack, &defense, &mut rng);

    let killed = roll.hit && target.apply_damage(roll.damage);
    let defeated = killed.then(|| DeathEvent {
        victim: target.actor_id(),
        killer: attack.attacker,
        position: target.position(),
        tick,
    });

    SwingOutcome {
        attacker: attack.attacker,
        target: target.actor_id(),
        hit: roll.hit,
        damage: if roll.hit { roll.damage } else { 0.0 },
        tick,
        defeated,
    }
}
