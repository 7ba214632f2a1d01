//! Internal implementation of the identifier generator.

use crate::{IdError, IdResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Lowest identifier handed out.
pub const ID_RANGE_START: u32 = 100_000;

/// Highest identifier handed out.
pub const ID_RANGE_END: u32 = 999_999;

/// Number of random draws tried before falling back to a scan of the range.
pub const MAX_RANDOM_ATTEMPTS: usize = 1_000;

/// Allocates identifiers that are not already in use.
///
/// The generator is generic over its random source so tests can pass a seeded
/// [`StdRng`]. Production code uses [`IdGenerator::new`], which seeds from the OS.
///
/// # Example
///
/// ```
/// use clinic_ids::IdGenerator;
/// use std::collections::HashSet;
///
/// let existing: HashSet<String> = ["100001".to_string()].into_iter().collect();
/// let mut ids = IdGenerator::new();
/// let id = ids.generate(&existing).unwrap();
/// assert!(!existing.contains(&id));
/// assert_eq!(id.len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct IdGenerator<R = StdRng> {
    rng: R,
    low: u32,
    high: u32,
}

impl Default for IdGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator<StdRng> {
    /// Creates a generator over the six-digit range seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> IdGenerator<R> {
    /// Creates a generator over the six-digit range using `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            low: ID_RANGE_START,
            high: ID_RANGE_END,
        }
    }

    /// Creates a generator over a custom inclusive range.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidRange`] if `low > high`.
    pub fn with_range(rng: R, low: u32, high: u32) -> IdResult<Self> {
        if low > high {
            return Err(IdError::InvalidRange { low, high });
        }
        Ok(Self { rng, low, high })
    }

    /// Produces an identifier that is not a member of `existing`.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::IdSpaceExhausted`] when every identifier in the range is taken.
    pub fn generate(&mut self, existing: &HashSet<String>) -> IdResult<String> {
        for _attempt in 0..MAX_RANDOM_ATTEMPTS {
            let candidate = self.rng.gen_range(self.low..=self.high).to_string();
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }

        tracing::warn!(
            "no free identifier after {} random draws, scanning {}..={}",
            MAX_RANDOM_ATTEMPTS,
            self.low,
            self.high
        );

        let span = u64::from(self.high - self.low) + 1;
        let start = u64::from(self.rng.gen_range(self.low..=self.high) - self.low);
        for offset in 0..span {
            let value = u64::from(self.low) + (start + offset) % span;
            let candidate = value.to_string();
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(IdError::IdSpaceExhausted {
            low: self.low,
            high: self.high,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn ids(values: impl IntoIterator<Item = u32>) -> HashSet<String> {
        values.into_iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_generate_returns_six_digit_id() {
        let mut generator = IdGenerator::with_rng(seeded(7));
        let id = generator.generate(&HashSet::new()).unwrap();

        assert_eq!(id.len(), 6);
        let value: u32 = id.parse().unwrap();
        assert!((ID_RANGE_START..=ID_RANGE_END).contains(&value));
    }

    #[test]
    fn test_generate_never_returns_existing_id() {
        let mut generator = IdGenerator::with_range(seeded(42), 1, 20).unwrap();
        let existing = ids(1..=15);

        for _ in 0..200 {
            let id = generator.generate(&existing).unwrap();
            assert!(!existing.contains(&id));
            let value: u32 = id.parse().unwrap();
            assert!((16..=20).contains(&value));
        }
    }

    #[test]
    fn test_generate_finds_last_free_id_in_near_full_range() {
        let mut generator = IdGenerator::with_range(seeded(3), 1, 5_000).unwrap();
        let existing = ids((1..=5_000).filter(|v| *v != 4_321));

        let id = generator.generate(&existing).unwrap();
        assert_eq!(id, "4321");
    }

    #[test]
    fn test_generate_fails_when_range_is_full() {
        let mut generator = IdGenerator::with_range(seeded(1), 10, 19).unwrap();
        let existing = ids(10..=19);

        let err = generator.generate(&existing).unwrap_err();
        assert!(matches!(
            err,
            IdError::IdSpaceExhausted { low: 10, high: 19 }
        ));
    }

    #[test]
    fn test_with_range_rejects_inverted_bounds() {
        let result = IdGenerator::with_range(seeded(1), 10, 9);
        assert!(matches!(result, Err(IdError::InvalidRange { .. })));
    }

    #[test]
    fn test_ids_outside_range_do_not_block_allocation() {
        let mut generator = IdGenerator::with_range(seeded(9), 1, 1).unwrap();
        let existing = ids([2, 3, 100_000]);

        assert_eq!(generator.generate(&existing).unwrap(), "1");
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let existing = HashSet::new();
        let mut a = IdGenerator::with_rng(seeded(99));
        let mut b = IdGenerator::with_rng(seeded(99));

        assert_eq!(
            a.generate(&existing).unwrap(),
            b.generate(&existing).unwrap()
        );
    }
}
