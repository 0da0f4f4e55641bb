//! Deterministic random streams
//!
//! Every generation event (one swing, one corpse, one stat roll) owns its own
//! stream built from an explicit seed. Nothing here is global: two systems
//! that need randomness derive their own seeds with [`combine_seeds`] instead
//! of sharing a generator, so event ordering never changes results.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed-scoped pseudo-random source
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u32,
    inner: ChaCha8Rng,
}

impl DeterministicRng {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(u64::from(seed)),
        }
    }

    /// The seed this stream was built from
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Full-width uniform integer
    pub fn next_u32(&mut self) -> u32 {
        self.inner.gen::<u32>()
    }

    /// Uniform integer in [min, max_exclusive); returns `min` for an empty range
    pub fn range_u64(&mut self, min: u64, max_exclusive: u64) -> u64 {
        if max_exclusive <= min {
            return min;
        }
        self.inner.gen_range(min..max_exclusive)
    }

    /// Uniform integer in [min, max_exclusive); returns `min` for an empty range
    pub fn range_i32(&mut self, min: i32, max_exclusive: i32) -> i32 {
        if max_exclusive <= min {
            return min;
        }
        self.inner.gen_range(min..max_exclusive)
    }

    /// Uniform integer in [min, max]; returns `min` when `max < min`
    pub fn range_u32_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Uniform index into a collection of `len` items
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }
}

/// Fold several integers into one seed.
///
/// Multiply-add mixing followed by an avalanche step. Order matters:
/// `[a, b]` and `[b, a]` give different seeds.
pub fn combine_seeds(parts: &[u32]) -> u32 {
    let mut hash: u32 = 17;
    for &part in parts {
        hash = hash.wrapping_mul(31).wrapping_add(part);
    }

    // fmix32
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash
}

/// Truncate a tick to the 32-bit lane used by seed mixing
pub fn tick_lane(tick: u64) -> [u32; 2] {
    [tick as u32, (tick >> 32) as u32]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
            assert_eq!(a.range_i32(-5, 50), b.range_i32(-5, 50));
        }
    }

    #[test]
    fn test_different_seed_diverges() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(43);
        let seq_a: Vec<u32> = (0..16).map(|_| a.next_f32().to_bits()).collect();
        let seq_b: Vec<u32> = (0..16).map(|_| b.next_f32().to_bits()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_float_range() {
        let mut rng = DeterministicRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_int_range_bounds() {
        let mut rng = DeterministicRng::new(7);
        for _ in 0..1_000 {
            let v = rng.range_i32(3, 6);
            assert!((3..6).contains(&v));
        }
        assert_eq!(rng.range_i32(5, 5), 5);
        assert_eq!(rng.range_i32(9, 2), 9);
        assert_eq!(rng.range_u32_inclusive(4, 4), 4);
        assert_eq!(rng.pick_index(0), None);
    }

    #[test]
    fn test_wide_ranges_use_every_bit() {
        let mut rng = DeterministicRng::new(11);
        let draws: Vec<u64> = (0..256).map(|_| rng.range_u64(0, 1 << 40)).collect();
        assert!(draws.iter().all(|&v| v < 1 << 40));
        // A float-scaled draw would leave the low 16 bits clear
        assert!(draws.iter().any(|&v| v & 0xFFFF != 0));
        assert_eq!(rng.range_u64(8, 8), 8);

        let full: Vec<u32> = (0..64).map(|_| rng.range_u32_inclusive(0, u32::MAX)).collect();
        assert!(full.iter().any(|&v| v > u32::MAX / 2));
    }

    #[test]
    fn test_combine_seeds_is_stable_and_order_sensitive() {
        assert_eq!(combine_seeds(&[1, 2, 3]), combine_seeds(&[1, 2, 3]));
        assert_ne!(combine_seeds(&[1, 2]), combine_seeds(&[2, 1]));
        assert_ne!(combine_seeds(&[0]), combine_seeds(&[]));
    }

    #[test]
    fn test_tick_lane_splits_high_bits() {
        assert_eq!(tick_lane(5), [5, 0]);
        assert_eq!(tick_lane(1 << 32), [0, 1]);
    }
}
