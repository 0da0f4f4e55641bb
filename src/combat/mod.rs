//! Combat: the actor capability, swing resolution and the engagement loop

pub mod actor;
pub mod engagement;
pub mod resolution;

pub use actor::{ActionGates, AttackProfile, CombatActor, CombatActorState, CombatArena, DefenseProfile};
pub use engagement::{
    DenyReason, Engagement, EngagementEvent, EngagementRegistry, EngagementTiming, StopReason, SwingPhase,
};
pub use resolution::{
    execute_swing, swing_seed, DeathEvent, StandardSwingResolver, SwingOutcome, SwingResolver, SwingRoll,
};
