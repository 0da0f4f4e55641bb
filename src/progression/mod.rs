//! Skill and stat progression
//!
//! Gameplay reports a skill use and how it went; the resolver turns that
//! into skill value and base stat changes under the configured caps.

pub mod gain;
pub mod resolver;
pub mod skills;
pub mod stats;

pub use gain::{CappedSkillGainPolicy, GainAttempt, GainRefusal, Reclaim, SkillGain, SkillGainPolicy, SkillUseOutcome};
pub use resolver::{ProgressionReport, ProgressionResolver, StatGain};
pub use skills::{PlayerSkillBook, SkillLock, SkillState};
pub use stats::{governing_stat, try_apply_stat_gain, BaseStats, DerivedVitals, StatGainRule, StatId};
