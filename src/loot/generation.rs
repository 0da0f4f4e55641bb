//! Corpse loot generation
//!
//! Turns a sealed [`LootSeedContext`] plus the monster's authored loot
//! profile into the concrete entries of a corpse session:
//!
//! ```text
//! seed:   handoff seed | identity fallback (warned)
//! source: handoff table id -> authored table -> legacy flat pool
//! expand: quantity N -> N instances, sub-seed = seed + stride * index
//! roll:   durability + affixes per instance from its sub-seed
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalogs, DropTableCatalog, ItemCatalog, ItemDef, MonsterTemplate};
use crate::core::config::LootConfig;
use crate::core::rng::{combine_seeds, DeterministicRng};
use crate::core::types::CorpseId;
use crate::loot::drops::{resolve_drop_table, sample_legacy_pool, DropOutput, UNGATED};
use crate::loot::seed::LootSeedContext;
use crate::loot::session::LootEntry;

/// Salt mixed into identity-derived fallback seeds
const FALLBACK_SEED_SALT: u32 = 0x5EED_C0DE;

/// What a corpse may source loot from, fixed when the monster was authored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpseLootProfile {
    pub authored_table: Option<String>,
    pub legacy_pool: Vec<String>,
    pub roll_count: u32,
}

impl CorpseLootProfile {
    pub fn from_template(template: &MonsterTemplate, default_roll_count: u32) -> Self {
        Self {
            authored_table: template.loot_table.clone(),
            legacy_pool: template.legacy_loot.clone(),
            roll_count: template.roll_count.unwrap_or(default_roll_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedSource {
    /// Seed came from the death event
    Handoff,
    /// No seed was handed off; derived from the corpse id instead.
    /// Reproducible only as long as corpse ids are.
    IdentityFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableSource {
    Handoff(String),
    Authored(String),
    LegacyPool,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLoot {
    pub seed: u32,
    pub seed_source: SeedSource,
    pub table_source: TableSource,
    pub entries: Vec<LootEntry>,
}

/// The handoff seed, or a corpse-identity fallback
pub fn resolve_seed(context: &LootSeedContext, corpse: CorpseId) -> (u32, SeedSource) {
    match context.seed() {
        Some(seed) => (seed, SeedSource::Handoff),
        None => {
            let seed = combine_seeds(&[corpse.0, FALLBACK_SEED_SALT]);
            tracing::warn!(
                "{} has no handed-off loot seed; falling back to identity seed {:#010x}",
                corpse,
                seed
            );
            (seed, SeedSource::IdentityFallback)
        }
    }
}

/// Apply source precedence and resolve the raw drop outputs
pub fn resolve_outputs(
    context: &LootSeedContext,
    profile: &CorpseLootProfile,
    seed: u32,
    tables: &DropTableCatalog,
) -> (Vec<DropOutput>, TableSource) {
    if let Some(id) = context.loot_table_id() {
        match tables.get(id) {
            Some(table) => {
                let outputs = resolve_drop_table(table, seed, profile.roll_count, UNGATED);
                return (outputs, TableSource::Handoff(id.to_string()));
            }
            None => tracing::warn!("Handed-off loot table '{}' not in catalog; falling back", id),
        }
    }

    if let Some(id) = profile.authored_table.as_deref() {
        match tables.get(id) {
            Some(table) => {
                let outputs = resolve_drop_table(table, seed, profile.roll_count, UNGATED);
                return (outputs, TableSource::Authored(id.to_string()));
            }
            None => tracing::warn!("Authored loot table '{}' not in catalog; falling back", id),
        }
    }

    if !profile.legacy_pool.is_empty() {
        let outputs = sample_legacy_pool(&profile.legacy_pool, seed, profile.roll_count);
        return (outputs, TableSource::LegacyPool);
    }

    (Vec::new(), TableSource::Nothing)
}

/// Seed for the `index`-th expanded instance
pub fn instance_seed(base: u32, stride: u32, index: u32) -> u32 {
    base.wrapping_add(stride.wrapping_mul(index))
}

/// Expand outputs to one entry per unit, each rolled from its own sub-seed.
/// An output never yields more than `config.max_instances_per_output` entries.
pub fn expand_outputs(
    corpse: CorpseId,
    outputs: &[DropOutput],
    seed: u32,
    config: &LootConfig,
    items: &ItemCatalog,
) -> Vec<LootEntry> {
    let mut entries = Vec::new();
    let mut index: u32 = 0;

    for output in outputs {
        let Some(def) = items.get(&output.item_id) else {
            tracing::warn!("Drop references unknown item '{}'; skipped", output.item_id);
            continue;
        };
        let count = output.quantity.min(config.max_instances_per_output);
        if count < output.quantity {
            tracing::warn!(
                "Drop of {} x '{}' on {} truncated to {} instances",
                output.quantity,
                output.item_id,
                corpse,
                count
            );
        }
        for _ in 0..count {
            let sub_seed = instance_seed(seed, config.instance_seed_stride, index);
            let instance_id = format!("c{}-{:03}-{:08x}", corpse.0, index, sub_seed);
            entries.push(roll_instance(def, instance_id, sub_seed));
            index = index.wrapping_add(1);
        }
    }

    entries
}

/// Roll durability and affixes for one item instance
pub fn roll_instance(def: &ItemDef, instance_id: String, sub_seed: u32) -> LootEntry {
    let mut rng = DeterministicRng::new(sub_seed);

    let (durability_current, durability_max) = match def.max_durability {
        Some(max) if max > 0 => (rng.range_u32_inclusive((max / 2).max(1), max), max),
        _ => (0, 0),
    };

    let mut affixes: Vec<&str> = Vec::new();
    let affix_limit = (def.max_affixes as usize).min(def.affix_pool.len());
    if affix_limit > 0 {
        let count = rng.range_u32_inclusive(0, affix_limit as u32) as usize;
        let mut pool: Vec<&str> = def.affix_pool.iter().map(String::as_str).collect();
        for i in 0..count {
            let offset = rng.pick_index(pool.len() - i).unwrap_or(0);
            pool.swap(i, i + offset);
        }
        affixes.extend_from_slice(&pool[..count]);
    }

    LootEntry {
        instance_id,
        item_def_id: def.id.clone(),
        display_name: def.display_name.clone(),
        icon_ref: def.icon.clone(),
        stack_count: 1,
        durability_current,
        durability_max,
        affix_summary: affixes.join(", "),
    }
}

/// Full pipeline for one corpse
pub fn generate_corpse_loot(
    corpse: CorpseId,
    context: &LootSeedContext,
    profile: &CorpseLootProfile,
    catalogs: &Catalogs,
    config: &LootConfig,
) -> GeneratedLoot {
    let (seed, seed_source) = resolve_seed(context, corpse);
    let (outputs, table_source) = resolve_outputs(context, profile, seed, &catalogs.drop_tables);
    let entries = expand_outputs(corpse, &outputs, seed, config, &catalogs.items);

    tracing::debug!(
        "{} generated {} entries from {:?} (seed {:#010x})",
        corpse,
        entries.len(),
        table_source,
        seed
    );

    GeneratedLoot {
        seed,
        seed_source,
        table_source,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DropEntry, DropTableDef};

    fn handoff(seed: Option<u32>, table: Option<&str>) -> LootSeedContext {
        let mut ctx = LootSeedContext::new();
        if let Some(seed) = seed {
            ctx.assign_seed(seed).unwrap();
        }
        ctx.assign_loot_table_id(table).unwrap();
        ctx.seal();
        ctx
    }

    fn goblin_profile() -> CorpseLootProfile {
        CorpseLootProfile {
            authored_table: Some("goblin_common".into()),
            legacy_pool: vec!["bone".into()],
            roll_count: 3,
        }
    }

    #[test]
    fn test_same_seed_same_entries() {
        let catalogs = Catalogs::with_defaults();
        let config = LootConfig::default();
        let ctx = handoff(Some(42), None);

        let a = generate_corpse_loot(CorpseId(1), &ctx, &goblin_profile(), &catalogs, &config);
        let b = generate_corpse_loot(CorpseId(1), &ctx, &goblin_profile(), &catalogs, &config);
        assert_eq!(a, b);
        assert_eq!(a.seed_source, SeedSource::Handoff);
        assert_eq!(a.table_source, TableSource::Authored("goblin_common".into()));
    }

    #[test]
    fn test_handoff_table_wins() {
        let catalogs = Catalogs::with_defaults();
        let ctx = handoff(Some(7), Some("rat_common"));
        let loot = generate_corpse_loot(
            CorpseId(1),
            &ctx,
            &goblin_profile(),
            &catalogs,
            &LootConfig::default(),
        );
        assert_eq!(loot.table_source, TableSource::Handoff("rat_common".into()));
        for entry in &loot.entries {
            assert!(entry.item_def_id == "rat_tail" || entry.item_def_id == "bone");
        }
    }

    #[test]
    fn test_missing_handoff_table_falls_back_to_authored() {
        let catalogs = Catalogs::with_defaults();
        let ctx = handoff(Some(7), Some("no_such_table"));
        let (_, source) = resolve_outputs(&ctx, &goblin_profile(), 7, &catalogs.drop_tables);
        assert_eq!(source, TableSource::Authored("goblin_common".into()));
    }

    #[test]
    fn test_legacy_pool_is_last_resort() {
        let catalogs = Catalogs::with_defaults();
        let ctx = handoff(Some(7), None);
        let profile = CorpseLootProfile {
            authored_table: Some("missing".into()),
            legacy_pool: vec!["bone".into(), "gold_coin".into()],
            roll_count: 2,
        };
        let (outputs, source) = resolve_outputs(&ctx, &profile, 7, &catalogs.drop_tables);
        assert_eq!(source, TableSource::LegacyPool);
        assert_eq!(outputs.len(), 2);

        let empty = CorpseLootProfile::default();
        let (outputs, source) = resolve_outputs(&ctx, &empty, 7, &catalogs.drop_tables);
        assert_eq!(source, TableSource::Nothing);
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_missing_seed_uses_identity_fallback() {
        let ctx = handoff(None, None);
        let (seed_a, source) = resolve_seed(&ctx, CorpseId(12));
        let (seed_b, _) = resolve_seed(&ctx, CorpseId(12));
        let (seed_c, _) = resolve_seed(&ctx, CorpseId(13));

        assert_eq!(source, SeedSource::IdentityFallback);
        assert_eq!(seed_a, seed_b);
        assert_ne!(seed_a, seed_c);
    }

    #[test]
    fn test_quantity_expands_to_unique_instances() {
        let mut catalogs = Catalogs::with_defaults();
        catalogs.drop_tables = Catalog::from_entries(vec![DropTableDef::new(
            "swords",
            vec![DropEntry::new("iron_sword", 1).with_quantity(4, 4)],
        )])
        .unwrap();

        let ctx = handoff(Some(99), Some("swords"));
        let loot = generate_corpse_loot(
            CorpseId(3),
            &ctx,
            &CorpseLootProfile {
                roll_count: 1,
                ..Default::default()
            },
            &catalogs,
            &LootConfig::default(),
        );

        assert_eq!(loot.entries.len(), 4);
        let mut ids: Vec<_> = loot.entries.iter().map(|e| e.instance_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        for entry in &loot.entries {
            assert_eq!(entry.stack_count, 1);
            assert_eq!(entry.durability_max, 60);
            assert!(entry.durability_current >= 30 && entry.durability_current <= 60);
        }
    }

    #[test]
    fn test_instance_seed_stride() {
        assert_eq!(instance_seed(100, 10, 0), 100);
        assert_eq!(instance_seed(100, 10, 3), 130);
        assert_eq!(instance_seed(u32::MAX, 2, 1), 1);
    }

    #[test]
    fn test_affixes_are_distinct_and_bounded() {
        let def = ItemDef::new("blade", "Blade").with_affixes(&["a", "b", "c"], 2);
        for seed in 0..200 {
            let entry = roll_instance(&def, format!("i{}", seed), seed);
            let affixes: Vec<&str> = entry
                .affix_summary
                .split(", ")
                .filter(|s| !s.is_empty())
                .collect();
            assert!(affixes.len() <= 2);
            let mut unique = affixes.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), affixes.len());
        }
    }

    #[test]
    fn test_unknown_items_are_skipped() {
        let catalogs = Catalogs::with_defaults();
        let outputs = vec![DropOutput::new("ghost_item", 2), DropOutput::new("bone", 1)];
        let config = LootConfig {
            instance_seed_stride: 11,
            ..LootConfig::default()
        };
        let entries = expand_outputs(CorpseId(1), &outputs, 5, &config, &catalogs.items);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_def_id, "bone");
    }

    #[test]
    fn test_huge_quantity_is_truncated() {
        let mut catalogs = Catalogs::with_defaults();
        catalogs.drop_tables = Catalog::from_entries(vec![DropTableDef::new(
            "hoard",
            vec![DropEntry::new("gold_coin", 1).with_quantity(u32::MAX, u32::MAX)],
        )])
        .unwrap();
        let config = LootConfig {
            max_instances_per_output: 5,
            ..LootConfig::default()
        };

        let ctx = handoff(Some(1), Some("hoard"));
        let loot = generate_corpse_loot(
            CorpseId(4),
            &ctx,
            &CorpseLootProfile {
                roll_count: 2,
                ..Default::default()
            },
            &catalogs,
            &config,
        );

        assert_eq!(loot.entries.len(), 10);
        assert!(loot.entries.iter().all(|e| e.item_def_id == "gold_coin"));
    }
}
