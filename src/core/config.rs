//! Simulation configuration with documented constants
//!
//! Every tunable the combat, loot, progression and spawn systems read lives
//! here. The curves themselves are not final; treat the defaults as
//! placeholders that produce sensible pacing, and load overrides from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{DelveError, Result};
use crate::core::types::Tick;

/// Top-level configuration handed to the world at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Real milliseconds represented by one simulation tick
    ///
    /// All second-based durations (swing times, delays) are converted to
    /// ticks through this value, rounding up.
    pub tick_ms: u32,

    pub combat: CombatConfig,
    pub loot: LootConfig,
    pub progression: ProgressionConfig,
    pub spawn: SpawnConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// How long a blocked or out-of-range attacker waits before re-checking
    pub repoll_interval_secs: f32,

    /// Stamina paid per swing. `None` disables the stamina gate entirely.
    pub stamina_cost_per_swing: Option<f32>,

    /// Base chance for a swing to connect
    pub hit_chance: f32,

    /// Skill id credited when a player lands or whiffs a melee swing
    pub melee_skill_id: String,

    /// Distance at which an idle monster notices a player
    pub monster_aggro_range: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Distance within which a player may take from a corpse
    pub interact_range: f32,

    /// Added to the base seed once per expanded item instance
    ///
    /// Duplicate stacks each get `base + stride * index` so two copies of
    /// the same item still roll independent durability and affixes.
    pub instance_seed_stride: u32,

    /// Roll count used when a monster template does not specify one
    pub default_roll_count: u32,

    /// Most item instances a single drop output may expand into
    pub max_instances_per_output: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Global ceiling on the sum of all skill values for one player
    pub total_skill_cap: f32,

    /// Amount added to a skill on a successful gain roll
    pub skill_gain_step: f32,

    /// Gain chance by reported outcome
    pub gain_chance_fail: f32,
    pub gain_chance_partial: f32,
    pub gain_chance_success: f32,

    /// Amount added to a base stat on a successful stat roll
    pub stat_gain_step: u32,

    /// Per-stat ceiling
    pub stat_cap: u32,

    /// Chance of a stat roll, as a fraction of the skill gain chance
    ///
    /// At 0.25, a success (gain chance 0.5) rolls its governing stat with
    /// chance 0.125.
    pub stat_chance_scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// How often an active spawner re-checks its population
    pub poll_interval_secs: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            combat: CombatConfig::default(),
            loot: LootConfig::default(),
            progression: ProgressionConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            repoll_interval_secs: 0.25,
            stamina_cost_per_swing: None,
            hit_chance: 0.75,
            melee_skill_id: "swordsmanship".into(),
            monster_aggro_range: 8.0,
        }
    }
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            interact_range: 3.0,
            instance_seed_stride: 7919,
            default_roll_count: 2,
            max_instances_per_output: 64,
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            total_skill_cap: 700.0,
            skill_gain_step: 0.1,
            gain_chance_fail: 0.05,
            gain_chance_partial: 0.2,
            gain_chance_success: 0.5,
            stat_gain_step: 1,
            stat_cap: 100,
            stat_chance_scale: 0.25,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(DelveError::Config("tick_ms must be positive".into()));
        }

        if self.combat.repoll_interval_secs <= 0.0 || self.spawn.poll_interval_secs <= 0.0 {
            return Err(DelveError::Config("poll intervals must be positive".into()));
        }

        if let Some(cost) = self.combat.stamina_cost_per_swing {
            if cost < 0.0 {
                return Err(DelveError::Config(format!(
                    "stamina_cost_per_swing ({}) must not be negative",
                    cost
                )));
            }
        }

        let chances = [
            ("combat.hit_chance", self.combat.hit_chance),
            ("progression.gain_chance_fail", self.progression.gain_chance_fail),
            ("progression.gain_chance_partial", self.progression.gain_chance_partial),
            ("progression.gain_chance_success", self.progression.gain_chance_success),
            ("progression.stat_chance_scale", self.progression.stat_chance_scale),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(DelveError::Config(format!("{} ({}) must be within [0, 1]", name, value)));
            }
        }

        if self.loot.interact_range < 0.0 || self.combat.monster_aggro_range < 0.0 {
            return Err(DelveError::Config("ranges must not be negative".into()));
        }

        if self.progression.total_skill_cap <= 0.0 || self.progression.skill_gain_step <= 0.0 {
            return Err(DelveError::Config(
                "total_skill_cap and skill_gain_step must be positive".into(),
            ));
        }

        if self.loot.max_instances_per_output == 0 {
            return Err(DelveError::Config("loot.max_instances_per_output must be positive".into()));
        }

        if self.progression.stat_cap == 0 {
            return Err(DelveError::Config("progression.stat_cap must be positive".into()));
        }

        Ok(())
    }

    /// Convert a duration in seconds to ticks, rounding up (minimum 1)
    pub fn seconds_to_ticks(&self, secs: f32) -> Tick {
        let ticks = (secs.max(0.0) * 1000.0 / self.tick_ms as f32).ceil() as Tick;
        ticks.max(1)
    }

    pub fn repoll_ticks(&self) -> Tick {
        self.seconds_to_ticks(self.combat.repoll_interval_secs)
    }

    pub fn spawn_poll_ticks(&self) -> Tick {
        self.seconds_to_ticks(self.spawn.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_seconds_to_ticks_rounds_up() {
        let config = SimulationConfig::default(); // 50ms ticks
        assert_eq!(config.seconds_to_ticks(1.0), 20);
        assert_eq!(config.seconds_to_ticks(0.26), 6);
        assert_eq!(config.seconds_to_ticks(0.0), 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            tick_ms = 100

            [combat]
            stamina_cost_per_swing = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.combat.stamina_cost_per_swing, Some(4.0));
        assert_eq!(config.loot.default_roll_count, 2);
        assert_eq!(config.combat.melee_skill_id, "swordsmanship");
    }

    #[test]
    fn test_rejects_out_of_range_chance() {
        let err = SimulationConfig::from_toml_str(
            r#"
            [combat]
            hit_chance = 1.5
            "#,
        );
        assert!(matches!(err, Err(DelveError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_instance_limit() {
        let err = SimulationConfig::from_toml_str(
            r#"
            [loot]
            max_instances_per_output = 0
            "#,
        );
        assert!(matches!(err, Err(DelveError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let mut config = SimulationConfig::default();
        config.tick_ms = 0;
        assert!(config.validate().is_err());
    }
}
