//! Property tests for loot determinism

use proptest::prelude::*;

use delve::catalog::{Catalogs, DropEntry, DropTableDef};
use delve::core::config::LootConfig;
use delve::core::types::CorpseId;
use delve::loot::{generate_corpse_loot, resolve_drop_table, CorpseLootProfile, LootSeedContext, UNGATED};

fn table_strategy() -> impl Strategy<Value = DropTableDef> {
    let entry = (0u32..20, 1u32..4, 0u32..3, 0.0f32..100.0).prop_map(|(weight, min, extra, quality)| {
        DropEntry::new("gold_coin", weight)
            .with_quantity(min, min + extra)
            .with_min_quality(quality)
    });
    (prop::collection::vec(entry, 0..6), 0u32..10)
        .prop_map(|(entries, nothing)| DropTableDef::new("generated", entries).with_nothing_weight(nothing))
}

fn sealed(seed: Option<u32>, table: Option<&str>) -> LootSeedContext {
    let mut context = LootSeedContext::new();
    if let Some(seed) = seed {
        context.assign_seed(seed).unwrap();
    }
    context.assign_loot_table_id(table).unwrap();
    context.seal();
    context
}

proptest! {
    #[test]
    fn test_drop_resolution_is_pure(
        table in table_strategy(),
        seed in any::<u32>(),
        rolls in 0u32..8,
        quality in prop_oneof![Just(UNGATED), 0.0f32..100.0],
    ) {
        let first = resolve_drop_table(&table, seed, rolls, quality);
        let second = resolve_drop_table(&table, seed, rolls, quality);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() as u32 <= rolls);
        for output in &first {
            prop_assert!(output.quantity >= 1);
        }
    }

    #[test]
    fn test_zero_rolls_or_weight_gives_nothing(table in table_strategy(), seed in any::<u32>()) {
        prop_assert!(resolve_drop_table(&table, seed, 0, UNGATED).is_empty());

        let mut silent = table.clone();
        for entry in &mut silent.entries {
            entry.weight = 0;
        }
        prop_assert!(resolve_drop_table(&silent, seed, 5, UNGATED).is_empty());
    }

    #[test]
    fn test_corpse_generation_is_reproducible(
        seed in prop::option::of(any::<u32>()),
        corpse in 1u32..10_000,
        table in prop_oneof![Just(None), Just(Some("goblin_common")), Just(Some("missing_table"))],
        rolls in 0u32..6,
    ) {
        let catalogs = Catalogs::with_defaults();
        let config = LootConfig::default();
        let profile = CorpseLootProfile {
            authored_table: Some("rat_common".into()),
            legacy_pool: vec!["bone".into(), "gold_coin".into()],
            roll_count: rolls,
        };

        let context = sealed(seed, table);
        let first = generate_corpse_loot(CorpseId(corpse), &context, &profile, &catalogs, &config);
        let second = generate_corpse_loot(CorpseId(corpse), &context, &profile, &catalogs, &config);
        prop_assert_eq!(&first, &second);

        let mut ids: Vec<&str> = first.entries.iter().map(|e| e.instance_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), first.entries.len());

        for entry in &first.entries {
            prop_assert!(entry.durability_current <= entry.durability_max);
            prop_assert!(catalogs.items.contains(&entry.item_def_id));
        }
    }
}
