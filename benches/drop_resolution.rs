//! Drop table resolution and corpse generation throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use delve::catalog::Catalogs;
use delve::core::config::LootConfig;
use delve::core::types::CorpseId;
use delve::loot::{generate_corpse_loot, resolve_drop_table, CorpseLootProfile, LootSeedContext, UNGATED};

fn bench_resolve(c: &mut Criterion) {
    let catalogs = Catalogs::with_defaults();
    let Some(table) = catalogs.drop_tables.get("goblin_common") else {
        return;
    };

    c.bench_function("resolve_drop_table goblin_common x2", |b| {
        let mut seed = 0u32;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(resolve_drop_table(table, black_box(seed), 2, UNGATED))
        })
    });
}

fn bench_generate(c: &mut Criterion) {
    let catalogs = Catalogs::with_defaults();
    let config = LootConfig::default();
    let profile = CorpseLootProfile {
        authored_table: Some("goblin_common".into()),
        legacy_pool: Vec::new(),
        roll_count: 4,
    };

    c.bench_function("generate_corpse_loot goblin x4", |b| {
        let mut seed = 0u32;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let mut context = LootSeedContext::new();
            let _ = context.assign_seed(seed);
            context.seal();
            black_box(generate_corpse_loot(CorpseId(seed), &context, &profile, &catalogs, &config))
        })
    });
}

criterion_group!(benches, bench_resolve, bench_generate);
criterion_main!(benches);
