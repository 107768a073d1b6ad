//! Seeded deterministic RNG for the simulation.
//!
//! SplitMix64. Not cryptographic. Every random draw in a match (spawn
//! jitter, `Plain` strength, bot coin flips) goes through one instance owned
//! by the match state, so a seed plus a command stream reproduces a match.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Deterministic pseudo-random generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Raw state, for state hashing.
    #[must_use]
    pub const fn state(&self) -> u64 {
        self.state
    }

    /// Next 64 random bits.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> Fixed {
        // 32 random fractional bits
        Fixed::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Uniform integer in `[0, bound)`. Returns 0 for a zero bound.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(bound)) as u32
    }

    /// Uniform integer in `[min, max]`.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_below(max - min + 1)
    }

    /// `true` with probability `percent`/100.
    pub fn chance(&mut self, percent: u8) -> bool {
        self.next_below(100) < u32::from(percent)
    }

    /// Uniform offset in `[-span/2, span/2)`.
    pub fn jitter(&mut self, span: Fixed) -> Fixed {
        (self.next_unit() - Fixed::from_num(0.5)) * span
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0x5EED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.range_inclusive(1, 99);
            assert!((1..=99).contains(&v));
        }
        assert_eq!(rng.range_inclusive(5, 5), 5);
    }

    #[test]
    fn test_jitter_bounds() {
        let mut rng = SimRng::new(99);
        let span = Fixed::from_num(50);
        for _ in 0..1000 {
            let j = rng.jitter(span);
            assert!(j >= Fixed::from_num(-25) && j < Fixed::from_num(25));
        }
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = SimRng::new(3);
        assert!((0..100).all(|_| !rng.chance(0)));
        assert!((0..100).all(|_| rng.chance(100)));
    }
}
