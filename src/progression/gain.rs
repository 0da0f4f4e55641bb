//! Skill gain policy
//!
//! A gain attempt always consumes exactly one roll, whatever the outcome, so
//! a replayed event stream reaches identical books.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;
use crate::core::rng::DeterministicRng;
use crate::progression::skills::{PlayerSkillBook, SkillLock};

/// Below this, a remaining amount is treated as zero
const GAIN_EPSILON: f32 = 1e-4;

/// How a skill use went, as reported by the action that used it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillUseOutcome {
    Fail,
    Partial,
    Success,
}

/// Points taken from another skill to stay under the total cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reclaim {
    pub skill_id: String,
    pub amount: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGain {
    pub skill_id: String,
    pub amount: f32,
    pub new_value: f32,
    pub reclaimed: Option<Reclaim>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainRefusal {
    UnknownSkill,
    /// Lock state is `Decrease` or `Locked`
    NotIncreasing,
    SkillCapped,
    RollFailed,
    /// Total cap reached and no `Decrease` skill has points to give
    TotalCapped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GainAttempt {
    Gained(SkillGain),
    Refused(GainRefusal),
}

impl GainAttempt {
    pub fn gain(&self) -> Option<&SkillGain> {
        match self {
            GainAttempt::Gained(gain) => Some(gain),
            GainAttempt::Refused(_) => None,
        }
    }

    pub fn gained(&self) -> bool {
        matches!(self, GainAttempt::Gained(_))
    }
}

pub trait SkillGainPolicy {
    /// Chance in [0, 1] that a use with this outcome raises the skill
    fn gain_chance(&self, outcome: SkillUseOutcome) -> f32;

    fn try_gain(
        &self,
        book: &mut PlayerSkillBook,
        skill_id: &str,
        outcome: SkillUseOutcome,
        rng: &mut DeterministicRng,
    ) -> GainAttempt;
}

/// Fixed-step gains honouring locks, per-skill caps and the book-wide cap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CappedSkillGainPolicy {
    pub step: f32,
    pub total_cap: f32,
    pub chance_fail: f32,
    pub chance_partial: f32,
    pub chance_success: f32,
}

impl CappedSkillGainPolicy {
    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self {
            step: config.skill_gain_step,
            total_cap: config.total_skill_cap,
            chance_fail: config.gain_chance_fail,
            chance_partial: config.gain_chance_partial,
            chance_success: config.gain_chance_success,
        }
    }

    /// Highest-valued `Decrease` skill other than `exclude` with points left
    fn pick_donor(book: &PlayerSkillBook, exclude: &str) -> Option<String> {
        book.iter()
            .filter(|s| s.lock == SkillLock::Decrease && s.skill_id != exclude && s.value > GAIN_EPSILON)
            .max_by_key(|s| OrderedFloat(s.value))
            .map(|s| s.skill_id.clone())
    }

    /// Step `skill_id` down one ulp at a time, never below `floor`, while
    /// float rounding leaves the book total above the cap
    fn settle_under_cap(&self, book: &mut PlayerSkillBook, skill_id: &str, floor: f32) {
        for _ in 0..64 {
            if book.total() <= self.total_cap {
                return;
            }
            let Some(state) = book.get_mut(skill_id) else {
                return;
            };
            if state.value <= floor || state.value <= 0.0 {
                return;
            }
            state.value = f32::from_bits(state.value.to_bits() - 1).max(floor);
        }
    }
}

impl Default for CappedSkillGainPolicy {
    fn default() -> Self {
        Self::from_config(&ProgressionConfig::default())
    }
}

impl SkillGainPolicy for CappedSkillGainPolicy {
    fn gain_chance(&self, outcome: SkillUseOutcome) -> f32 {
        let chance = match outcome {
            SkillUseOutcome::Fail => self.chance_fail,
            SkillUseOutcome::Partial => self.chance_partial,
            SkillUseOutcome::Success => self.chance_success,
        };
        chance.clamp(0.0, 1.0)
    }

    fn try_gain(
        &self,
        book: &mut PlayerSkillBook,
        skill_id: &str,
        outcome: SkillUseOutcome,
        rng: &mut DeterministicRng,
    ) -> GainAttempt {
        let roll = rng.next_f32();

        let Some(state) = book.get(skill_id) else {
            return GainAttempt::Refused(GainRefusal::UnknownSkill);
        };
        if state.lock != SkillLock::Increase {
            return GainAttempt::Refused(GainRefusal::NotIncreasing);
        }
        if state.headroom() <= GAIN_EPSILON {
            return GainAttempt::Refused(GainRefusal::SkillCapped);
        }
        if roll >= self.gain_chance(outcome) {
            return GainAttempt::Refused(GainRefusal::RollFailed);
        }

        let mut amount = self.step.min(state.headroom());
        let free = (self.total_cap - book.total()).max(0.0);

        let mut reclaimed = None;
        if amount > free + GAIN_EPSILON {
            let needed = amount - free;
            let taken = match Self::pick_donor(book, skill_id) {
                Some(donor_id) => {
                    let taken = match book.get_mut(&donor_id) {
                        Some(donor) => {
                            let taken = donor.value.min(needed);
                            donor.value = (donor.value - taken).max(0.0);
                            taken
                        }
                        None => 0.0,
                    };
                    reclaimed = Some(Reclaim {
                        skill_id: donor_id,
                        amount: taken,
                    });
                    taken
                }
                None => 0.0,
            };
            amount = free + taken;
        } else {
            amount = amount.min(free);
        }

        if amount <= GAIN_EPSILON {
            return GainAttempt::Refused(GainRefusal::TotalCapped);
        }

        let Some(state) = book.get_mut(skill_id) else {
            return GainAttempt::Refused(GainRefusal::UnknownSkill);
        };
        let old_value = state.value;
        state.value = (state.value + amount).min(state.cap);
        self.settle_under_cap(book, skill_id, old_value);

        let new_value = book.value(skill_id);
        let amount = new_value - old_value;

        tracing::debug!("Skill '{}' +{:.2} -> {:.2}", skill_id, amount, new_value);

        GainAttempt::Gained(SkillGain {
            skill_id: skill_id.to_string(),
            amount,
            new_value,
            reclaimed,
        })
    }
}
