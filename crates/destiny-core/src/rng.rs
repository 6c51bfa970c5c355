//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests, a seeded or scripted
//! implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Generate a random `f64` in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;
}

/// Production RNG seeded from the operating system.
#[derive(Debug)]
pub struct OsSeededRng(StdRng);

impl OsSeededRng {
    /// Creates a new RNG seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for OsSeededRng {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicRng for OsSeededRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.0.random_range(min..=max)
    }

    fn next_f64(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Picks an index in `0..len` uniformly. Returns `None` for an empty range.
pub fn pick_index(rng: &mut dyn DeterministicRng, len: usize) -> Option<usize> {
    let last = u32::try_from(len.checked_sub(1)?).unwrap_or(u32::MAX);
    let index = rng.next_u32_range(0, last) as usize;
    Some(index.min(len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_seeded_rng_stays_within_inclusive_range() {
        let mut rng = OsSeededRng::new();
        for _ in 0..1_000 {
            let value = rng.next_u32_range(100_000, 999_999);
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_os_seeded_rng_degenerate_range_returns_min() {
        let mut rng = OsSeededRng::new();
        assert_eq!(rng.next_u32_range(7, 7), 7);
    }

    #[test]
    fn test_pick_index_empty_range_is_none() {
        let mut rng = OsSeededRng::new();
        assert_eq!(pick_index(&mut rng, 0), None);
    }

    #[test]
    fn test_pick_index_single_element_is_zero() {
        let mut rng = OsSeededRng::new();
        assert_eq!(pick_index(&mut rng, 1), Some(0));
    }
}
