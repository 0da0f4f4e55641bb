//! Base stats, stat gain rolls and derived vitals

use serde::{Deserialize, Serialize};

use crate::core::config::ProgressionConfig;
use crate::core::rng::DeterministicRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatId {
    Str,
    Dex,
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            intelligence: 10,
        }
    }
}

impl BaseStats {
    pub fn new(strength: u32, dexterity: u32, intelligence: u32) -> Self {
        Self {
            strength,
            dexterity,
            intelligence,
        }
    }

    pub fn get(&self, stat: StatId) -> u32 {
        match stat {
            StatId::Str => self.strength,
            StatId::Dex => self.dexterity,
            StatId::Int => self.intelligence,
        }
    }

    fn get_mut(&mut self, stat: StatId) -> &mut u32 {
        match stat {
            StatId::Str => &mut self.strength,
            StatId::Dex => &mut self.dexterity,
            StatId::Int => &mut self.intelligence,
        }
    }

    pub fn total(&self) -> u32 {
        self.strength + self.dexterity + self.intelligence
    }
}

/// How much a successful stat roll adds, and where it stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGainRule {
    pub step: u32,
    pub cap: u32,
}

impl StatGainRule {
    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self {
            step: config.stat_gain_step,
            cap: config.stat_cap,
        }
    }
}

impl Default for StatGainRule {
    fn default() -> Self {
        Self::from_config(&ProgressionConfig::default())
    }
}

/// Roll once against `chance` and raise `stat` by the rule's step.
///
/// Always consumes one draw. Returns true only if the stat changed, so a
/// stat already at its cap never reports a gain. Vitals are left alone.
pub fn try_apply_stat_gain(
    stats: &mut BaseStats,
    rule: &StatGainRule,
    stat: StatId,
    chance: f32,
    rng: &mut DeterministicRng,
) -> bool {
    let chance = if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) };
    let roll = rng.next_f32();
    if roll >= chance {
        return false;
    }

    let value = stats.get_mut(stat);
    let raised = value.saturating_add(rule.step).min(rule.cap);
    if raised <= *value {
        return false;
    }
    *value = raised;
    true
}

/// Skill id -> the stat it trains
static GOVERNING_STATS: &[(&str, StatId)] = &[
    ("swordsmanship", StatId::Str),
    ("mining", StatId::Str),
    ("lumberjacking", StatId::Str),
    ("tactics", StatId::Str),
    ("archery", StatId::Dex),
    ("parrying", StatId::Dex),
    ("stealth", StatId::Dex),
    ("healing", StatId::Int),
    ("magery", StatId::Int),
    ("meditation", StatId::Int),
];

pub fn governing_stat(skill_id: &str) -> Option<StatId> {
    GOVERNING_STATS
        .iter()
        .find(|(id, _)| *id == skill_id)
        .map(|(_, stat)| *stat)
}

/// Pools computed from base stats. Linear placeholders until tuned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedVitals {
    pub max_health: f32,
    pub max_stamina: f32,
    pub max_mana: f32,
}

impl DerivedVitals {
    pub fn from_stats(stats: &BaseStats) -> Self {
        Self {
            max_health: 25.0 + stats.strength as f32 * 2.5,
            max_stamina: 20.0 + stats.dexterity as f32 * 3.0,
            max_mana: 10.0 + stats.intelligence as f32 * 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_chance_never_succeeds() {
        let mut stats = BaseStats::default();
        let mut rng = DeterministicRng::new(11);
        for _ in 0..10_000 {
            assert!(!try_apply_stat_gain(
                &mut stats,
                &StatGainRule { step: 1, cap: u32::MAX },
                StatId::Str,
                0.0,
                &mut rng
            ));
        }
        assert_eq!(stats, BaseStats::default());
    }

    #[test]
    fn test_full_chance_always_succeeds() {
        let mut stats = BaseStats::new(0, 0, 0);
        let rule = StatGainRule { step: 1, cap: u32::MAX };
        let mut rng = DeterministicRng::new(12);
        for _ in 0..10_000 {
            assert!(try_apply_stat_gain(&mut stats, &rule, StatId::Dex, 1.0, &mut rng));
        }
        assert_eq!(stats.dexterity, 10_000);
    }

    #[test]
    fn test_chance_is_clamped() {
        let mut stats = BaseStats::new(0, 0, 0);
        let rule = StatGainRule { step: 1, cap: 1000 };
        let mut rng = DeterministicRng::new(5);
        assert!(try_apply_stat_gain(&mut stats, &rule, StatId::Int, 7.5, &mut rng));
        assert!(!try_apply_stat_gain(&mut stats, &rule, StatId::Int, -2.0, &mut rng));
        assert!(!try_apply_stat_gain(&mut stats, &rule, StatId::Int, f32::NAN, &mut rng));
    }

    #[test]
    fn test_cap_stops_gain() {
        let mut stats = BaseStats::new(99, 0, 0);
        let rule = StatGainRule { step: 5, cap: 100 };
        let mut rng = DeterministicRng::new(1);
        assert!(try_apply_stat_gain(&mut stats, &rule, StatId::Str, 1.0, &mut rng));
        assert_eq!(stats.strength, 100);
        assert!(!try_apply_stat_gain(&mut stats, &rule, StatId::Str, 1.0, &mut rng));
    }

    #[test]
    fn test_governing_table() {
        assert_eq!(governing_stat("swordsmanship"), Some(StatId::Str));
        assert_eq!(governing_stat("archery"), Some(StatId::Dex));
        assert_eq!(governing_stat("magery"), Some(StatId::Int));
        assert_eq!(governing_stat("basket_weaving"), None);
    }

    #[test]
    fn test_vitals_follow_stats() {
        let low = DerivedVitals::from_stats(&BaseStats::new(10, 10, 10));
        let high = DerivedVitals::from_stats(&BaseStats::new(20, 10, 10));
        assert!(high.max_health > low.max_health);
        assert_eq!(high.max_stamina, low.max_stamina);
    }
}
