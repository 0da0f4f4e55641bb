//! Drop table resolution
//!
//! `(table, seed, roll_count, quality_factor) -> Vec<DropOutput>`, fully
//! deterministic: the same inputs always give the same outputs in the same
//! order. Each roll is one cumulative-weight draw; a draw that lands in the
//! table's `nothing_weight` produces no output for that roll.

use serde::{Deserialize, Serialize};

use crate::catalog::{DropEntry, DropTableDef};
use crate::core::rng::DeterministicRng;

/// One resolved drop before expansion into item instances
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropOutput {
    pub item_id: String,
    pub quantity: u32,
}

impl DropOutput {
    pub fn new(item_id: &str, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Quality factor meaning "no gathering gate applies" (combat loot)
pub const UNGATED: f32 = f32::INFINITY;

fn eligible(entry: &DropEntry, quality_factor: f32) -> bool {
    if entry.weight == 0 {
        return false;
    }
    quality_factor == f32::INFINITY || entry.min_quality <= quality_factor
}

/// Resolve up to `roll_count` weighted draws against `table`
pub fn resolve_drop_table(
    table: &DropTableDef,
    seed: u32,
    roll_count: u32,
    quality_factor: f32,
) -> Vec<DropOutput> {
    let entries: Vec<&DropEntry> = table
        .entries
        .iter()
        .filter(|e| eligible(e, quality_factor))
        .collect();

    let entry_weight: u64 = entries.iter().map(|e| u64::from(e.weight)).sum();
    let total_weight = entry_weight + u64::from(table.nothing_weight);
    if entry_weight == 0 {
        return Vec::new();
    }

    let mut rng = DeterministicRng::new(seed);
    let mut outputs = Vec::new();

    for _ in 0..roll_count {
        // Two draws per roll regardless of outcome keeps later rolls stable
        let pick = rng.range_u64(0, total_weight);
        let quantity_roll = rng.next_u32();

        let Some(entry) = select(&entries, pick) else {
            continue;
        };

        let quantity = scale_quantity(quantity_roll, entry.min_quantity, entry.max_quantity);
        if quantity == 0 {
            continue;
        }

        outputs.push(DropOutput {
            item_id: entry.item_id.clone(),
            quantity,
        });
    }

    outputs
}

/// Map a full-width draw onto [min, max] by multiply-shift; `min` when `max < min`
fn scale_quantity(draw: u32, min: u32, max: u32) -> u32 {
    let span = u64::from(max.saturating_sub(min)) + 1;
    let offset = (u64::from(draw) * span) >> 32;
    min + offset as u32
}

/// Walk cumulative weights; `None` when `pick` falls in the nothing band
fn select<'a>(entries: &[&'a DropEntry], pick: u64) -> Option<&'a DropEntry> {
    let mut cumulative = 0u64;
    for entry in entries {
        cumulative += u64::from(entry.weight);
        if pick < cumulative {
            return Some(entry);
        }
    }
    None
}

/// Uniform sampling from a flat item pool.
///
/// Without replacement when the pool can satisfy `count`, with replacement
/// otherwise. Every pick yields quantity 1.
pub fn sample_legacy_pool(pool: &[String], seed: u32, count: u32) -> Vec<DropOutput> {
    if pool.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut rng = DeterministicRng::new(seed);
    let count = count as usize;

    if pool.len() >= count {
        // Partial Fisher-Yates over indices
        let mut indices: Vec<usize> = (0..pool.len()).collect();
        for i in 0..count {
            let offset = rng.pick_index(indices.len() - i).unwrap_or(0);
            indices.swap(i, i + offset);
        }
        indices[..count]
            .iter()
            .map(|&i| DropOutput::new(&pool[i], 1))
            .collect()
    } else {
        (0..count)
            .filter_map(|_| rng.pick_index(pool.len()))
            .map(|i| DropOutput::new(&pool[i], 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entry_table() -> DropTableDef {
        DropTableDef::new("ab", vec![DropEntry::new("A", 1), DropEntry::new("B", 1)])
    }

    #[test]
    fn test_seed_42_is_reproducible() {
        let table = two_entry_table();
        let first = resolve_drop_table(&table, 42, 2, UNGATED);
        let second = resolve_drop_table(&table, 42, 2, UNGATED);

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        for output in &first {
            assert!(output.item_id == "A" || output.item_id == "B");
            assert_eq!(output.quantity, 1);
        }
    }

    #[test]
    fn test_seeds_produce_variety() {
        let table = two_entry_table();
        let mut seen_a = false;
        let mut seen_b = false;
        for seed in 0..64 {
            for output in resolve_drop_table(&table, seed, 1, UNGATED) {
                seen_a |= output.item_id == "A";
                seen_b |= output.item_id == "B";
            }
        }
        assert!(seen_a && seen_b);
    }

    #[test]
    fn test_quantity_stays_in_range() {
        let table = DropTableDef::new("coins", vec![DropEntry::new("coin", 1).with_quantity(2, 5)]);
        for seed in 0..200 {
            for output in resolve_drop_table(&table, seed, 3, UNGATED) {
                assert!((2..=5).contains(&output.quantity));
            }
        }
    }

    #[test]
    fn test_full_width_quantity_range() {
        let table = DropTableDef::new(
            "hoard",
            vec![DropEntry::new("coin", 1).with_quantity(0, u32::MAX)],
        );
        let quantities: Vec<u32> = (0..64)
            .flat_map(|seed| resolve_drop_table(&table, seed, 1, UNGATED))
            .map(|o| o.quantity)
            .collect();
        assert!(!quantities.is_empty());
        assert!(quantities.iter().any(|&q| q > u32::MAX / 2));

        assert_eq!(scale_quantity(u32::MAX, 0, u32::MAX), u32::MAX);
        assert_eq!(scale_quantity(u32::MAX, 2, 5), 5);
        assert_eq!(scale_quantity(0, 2, 5), 2);
        assert_eq!(scale_quantity(u32::MAX, 7, 3), 7);
    }

    #[test]
    fn test_nothing_weight_can_empty_rolls() {
        let table = DropTableDef::new("rare", vec![DropEntry::new("gem", 1)]).with_nothing_weight(1_000_000);
        let total: usize = (0..50)
            .map(|seed| resolve_drop_table(&table, seed, 1, UNGATED).len())
            .sum();
        assert!(total < 5);
    }

    #[test]
    fn test_quality_gate_filters_entries() {
        let table = DropTableDef::new(
            "vein",
            vec![
                DropEntry::new("copper", 1),
                DropEntry::new("mithril", 1).with_min_quality(80.0),
            ],
        );

        for seed in 0..100 {
            for output in resolve_drop_table(&table, seed, 2, 10.0) {
                assert_eq!(output.item_id, "copper");
            }
        }

        // Unbounded quality ignores the gate
        let ungated: Vec<_> = (0..100)
            .flat_map(|seed| resolve_drop_table(&table, seed, 2, UNGATED))
            .collect();
        assert!(ungated.iter().any(|o| o.item_id == "mithril"));
    }

    #[test]
    fn test_empty_or_zero_weight_table_yields_nothing() {
        let empty = DropTableDef::new("empty", vec![]);
        assert!(resolve_drop_table(&empty, 1, 5, UNGATED).is_empty());

        let zero = DropTableDef::new("zero", vec![DropEntry::new("x", 0)]);
        assert!(resolve_drop_table(&zero, 1, 5, UNGATED).is_empty());
    }

    #[test]
    fn test_legacy_pool_without_replacement() {
        let pool: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        for seed in 0..100 {
            let picks = sample_legacy_pool(&pool, seed, 4);
            let mut ids: Vec<_> = picks.iter().map(|p| p.item_id.clone()).collect();
            ids.sort();
            assert_eq!(ids, vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn test_legacy_pool_with_replacement_when_small() {
        let pool = vec!["only".to_string()];
        let picks = sample_legacy_pool(&pool, 5, 3);
        assert_eq!(picks.len(), 3);
        assert!(picks.iter().all(|p| p.item_id == "only"));
    }

    #[test]
    fn test_legacy_pool_is_reproducible() {
        let pool: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sample_legacy_pool(&pool, 9, 2), sample_legacy_pool(&pool, 9, 2));
    }
}
