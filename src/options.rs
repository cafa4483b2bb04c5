//! Filter configuration and up-front validation.

use thiserror::Error;

use crate::filter::CuckooFilter;
use crate::hash::HashStrategy;

/// Why a filter could not be constructed. Construction is the only fallible
/// operation in the crate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// Capacity was zero.
    #[error("capacity must be greater than zero")]
    InvalidCapacity,
    /// Bucket size outside {2, 4, 8, 16, 32, 64}.
    #[error("bucket size must be 2, 4, 8, 16, 32 or 64")]
    InvalidBucketSize,
    /// Fingerprint width outside 1..=16 bits.
    #[error("fingerprint size must be between 1 and 16 bits")]
    InvalidFingerprintSize,
    /// A hash strategy name that does not parse.
    #[error("unknown hash strategy")]
    InvalidHashStrategy,
}

/// Builder for [`CuckooFilter`]. Every knob has a default; `build` validates
/// the whole record before any allocation happens.
///
/// ```
/// use cuckoo_filters::{CuckooFilter, HashStrategy};
///
/// let filter = CuckooFilter::builder()
///     .bucket_size(8)
///     .fingerprint_bits(12)
///     .hash_strategy(HashStrategy::XxHash64)
///     .seed(42)
///     .build(10_000)
///     .unwrap();
/// assert!(filter.capacity() >= 10_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FilterBuilder {
    pub(crate) bucket_size: usize,
    pub(crate) fingerprint_bits: u32,
    pub(crate) max_kicks: u32,
    pub(crate) hash_strategy: HashStrategy,
    pub(crate) batch_hint: usize,
    pub(crate) seed: Option<u64>,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        FilterBuilder {
            bucket_size: 4,
            fingerprint_bits: 8,
            max_kicks: 500,
            hash_strategy: HashStrategy::Fnv1a,
            batch_hint: 32,
            seed: None,
        }
    }
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint slots per bucket; one of 2, 4, 8, 16, 32 or 64.
    pub fn bucket_size(mut self, slots: usize) -> Self {
        self.bucket_size = slots;
        self
    }

    /// Fingerprint width in bits, 1..=16. Wider fingerprints lower the
    /// false-positive rate.
    pub fn fingerprint_bits(mut self, bits: u32) -> Self {
        self.fingerprint_bits = bits;
        self
    }

    /// Upper bound on eviction iterations per insert; clamped to at least 1.
    pub fn max_kicks(mut self, kicks: u32) -> Self {
        self.max_kicks = kicks.max(1);
        self
    }

    pub fn hash_strategy(mut self, strategy: HashStrategy) -> Self {
        self.hash_strategy = strategy;
        self
    }

    /// Preferred batch size reported by `optimal_batch_size`; informational
    /// only. Clamped to at least 1.
    pub fn batch_hint(mut self, hint: usize) -> Self {
        self.batch_hint = hint.max(1);
        self
    }

    /// Seed for the eviction PRNG. Fixing the seed makes the whole filter
    /// deterministic; without it the PRNG is seeded from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self, capacity: usize) -> Result<CuckooFilter, BuildError> {
        self.validate(capacity)?;
        Ok(CuckooFilter::from_builder(capacity, self))
    }

    fn validate(&self, capacity: usize) -> Result<(), BuildError> {
        if capacity == 0 {
            return Err(BuildError::InvalidCapacity);
        }
        if !matches!(self.bucket_size, 2 | 4 | 8 | 16 | 32 | 64) {
            return Err(BuildError::InvalidBucketSize);
        }
        if !(1..=16).contains(&self.fingerprint_bits) {
            return Err(BuildError::InvalidFingerprintSize);
        }
        Ok(())
    }
}
