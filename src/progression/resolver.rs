//! Skill use -> progression
//!
//! One reported skill use yields at most one skill gain and one stat gain.
//! Vitals are recomputed once at the end if anything changed.

use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;
use crate::core::rng::DeterministicRng;
use crate::progression::gain::{CappedSkillGainPolicy, GainAttempt, SkillGainPolicy, SkillUseOutcome};
use crate::progression::skills::PlayerSkillBook;
use crate::progression::stats::{governing_stat, try_apply_stat_gain, BaseStats, DerivedVitals, StatGainRule, StatId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGain {
    pub stat: StatId,
    pub new_value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionReport {
    pub skill_id: String,
    pub outcome: SkillUseOutcome,
    pub skill: GainAttempt,
    pub stat: Option<StatGain>,
    /// Present only when something changed
    pub vitals: Option<DerivedVitals>,
}

impl ProgressionReport {
    pub fn any_gain(&self) -> bool {
        self.skill.gained() || self.stat.is_some()
    }
}

pub struct ProgressionResolver<P = CappedSkillGainPolicy> {
    policy: P,
    stat_rule: StatGainRule,
    stat_chance_scale: f32,
}

impl ProgressionResolver<CappedSkillGainPolicy> {
    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self::new(
            CappedSkillGainPolicy::from_config(config),
            StatGainRule::from_config(config),
            config.stat_chance_scale,
        )
    }
}

impl<P: SkillGainPolicy> ProgressionResolver<P> {
    pub fn new(policy: P, stat_rule: StatGainRule, stat_chance_scale: f32) -> Self {
        Self {
            policy,
            stat_rule,
            stat_chance_scale,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Apply one skill use. Draws exactly two values: skill roll, stat roll.
    pub fn resolve(
        &self,
        book: &mut PlayerSkillBook,
        stats: &mut BaseStats,
        skill_id: &str,
        outcome: SkillUseOutcome,
        rng: &mut DeterministicRng,
    ) -> ProgressionReport {
        let skill = self.policy.try_gain(book, skill_id, outcome, rng);

        let stat_chance = self.policy.gain_chance(outcome) * self.stat_chance_scale;
        let stat = match governing_stat(skill_id) {
            Some(stat_id) => {
                if try_apply_stat_gain(stats, &self.stat_rule, stat_id, stat_chance, rng) {
                    Some(StatGain {
                        stat: stat_id,
                        new_value: stats.get(stat_id),
                    })
                } else {
                    None
                }
            }
            None => {
                // Keep the draw count fixed
                rng.next_f32();
                None
            }
        };

        let vitals = if skill.gained() || stat.is_some() {
            Some(DerivedVitals::from_stats(stats))
        } else {
            None
        };

        if let Some(gain) = &stat {
            tracing::debug!("Stat {:?} -> {} via '{}'", gain.stat, gain.new_value, skill_id);
        }

        ProgressionReport {
            skill_id: skill_id.to_string(),
            outcome,
            skill,
            stat,
            vitals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;
    use crate::progression::gain::GainRefusal;
    use crate::progression::skills::SkillLock;

    fn certain() -> ProgressionResolver {
        let config = ProgressionConfig {
            gain_chance_fail: 1.0,
            gain_chance_partial: 1.0,
            gain_chance_success: 1.0,
            stat_chance_scale: 1.0,
            ..ProgressionConfig::default()
        };
        ProgressionResolver::from_config(&config)
    }

    #[test]
    fn test_success_gains_skill_and_stat() {
        let mut book = PlayerSkillBook::from_catalog(&Catalogs::with_defaults().skills);
        let mut stats = BaseStats::default();
        let mut rng = DeterministicRng::new(4);

        let report = certain().resolve(&mut book, &mut stats, "swordsmanship", SkillUseOutcome::Success, &mut rng);

        assert!(report.skill.gained());
        assert_eq!(report.stat.map(|s| s.stat), Some(StatId::Str));
        assert_eq!(stats.strength, 11);
        assert_eq!(report.vitals, Some(DerivedVitals::from_stats(&stats)));
    }

    #[test]
    fn test_no_gain_means_no_vitals() {
        let config = ProgressionConfig {
            gain_chance_fail: 0.0,
            ..ProgressionConfig::default()
        };
        let resolver = ProgressionResolver::from_config(&config);
        let mut book = PlayerSkillBook::from_catalog(&Catalogs::with_defaults().skills);
        let mut stats = BaseStats::default();
        let mut rng = DeterministicRng::new(4);

        let report = resolver.resolve(&mut book, &mut stats, "mining", SkillUseOutcome::Fail, &mut rng);
        assert!(!report.any_gain());
        assert!(report.vitals.is_none());
    }

    #[test]
    fn test_stat_can_gain_while_skill_locked() {
        let mut book = PlayerSkillBook::from_catalog(&Catalogs::with_defaults().skills);
        book.set_lock("magery", SkillLock::Locked);
        let mut stats = BaseStats::default();
        let mut rng = DeterministicRng::new(9);

        let report = certain().resolve(&mut book, &mut stats, "magery", SkillUseOutcome::Partial, &mut rng);
        assert_eq!(report.skill, GainAttempt::Refused(GainRefusal::NotIncreasing));
        assert_eq!(report.stat.map(|s| s.stat), Some(StatId::Int));
        assert!(report.vitals.is_some());
    }

    #[test]
    fn test_same_seed_same_report() {
        let catalogs = Catalogs::with_defaults();
        let run = || {
            let mut book = PlayerSkillBook::from_catalog(&catalogs.skills);
            let mut stats = BaseStats::default();
            let resolver = ProgressionResolver::from_config(&ProgressionConfig::default());
            (0..50u32)
                .map(|i| {
                    let mut rng = DeterministicRng::new(i);
                    resolver.resolve(&mut book, &mut stats, "archery", SkillUseOutcome::Success, &mut rng)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
