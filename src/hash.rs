//! Index derivation for the filter: every strategy maps an item to two
//! candidate bucket indices plus a non-zero fingerprint, and can recover
//! either index from the other given the fingerprint.

use std::fmt;
use std::str::FromStr;

use crate::crc32c::Crc32c;
use crate::fnv::Fnv1a;
use crate::options::BuildError;
use crate::xxhash::XxHash64;

/// The hash families a filter can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashStrategy {
    /// FNV-1a, 64-bit. Portable default with good distribution.
    #[default]
    Fnv1a,
    /// CRC32C (Castagnoli), 32-bit digest.
    Crc32c,
    /// XXH64 with seed 0. Best general throughput.
    XxHash64,
}

impl fmt::Display for HashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashStrategy::Fnv1a => "FNV-1a",
            HashStrategy::Crc32c => "CRC32C",
            HashStrategy::XxHash64 => "XXHash64",
        })
    }
}

impl FromStr for HashStrategy {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, BuildError> {
        match s {
            "FNV-1a" | "fnv-1a" | "fnv" => Ok(HashStrategy::Fnv1a),
            "CRC32C" | "crc32c" => Ok(HashStrategy::Crc32c),
            "XXHash64" | "xxhash64" | "xxhash" => Ok(HashStrategy::XxHash64),
            _ => Err(BuildError::InvalidHashStrategy),
        }
    }
}

/// Candidate bucket indices and fingerprint for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashResult {
    /// Primary bucket index, `hash mod numBuckets`.
    pub i1: usize,
    /// Alternate bucket index, `alt_index(i1, fp)`.
    pub i2: usize,
    /// Fingerprint stored in the bucket; never zero.
    pub fp: u16,
}

/// Capability set shared by all hash strategies.
///
/// `num_buckets` must be a power of two; `alt_index` is an involution under
/// that precondition: `alt_index(alt_index(i, fp), fp) == i`.
pub trait IndexHasher {
    /// Both candidate indices and the fingerprint for `item`.
    fn indices(&self, item: &[u8], num_buckets: usize) -> HashResult;

    /// The sibling bucket index for a fingerprint already placed at `index`.
    fn alt_index(&self, index: usize, fp: u16, num_buckets: usize) -> usize;

    /// Element-wise equivalent of [`indices`](Self::indices) over a slice,
    /// in input order. Strategies may override this with a fused kernel.
    fn indices_batch(&self, items: &[&[u8]], num_buckets: usize) -> Vec<HashResult> {
        items
            .iter()
            .map(|item| self.indices(item, num_buckets))
            .collect()
    }
}

/// Extracts the low `bits` of a digest, mapping 0 to 1 (0 marks an empty
/// slot).
#[inline]
pub(crate) fn fingerprint(hash: u64, bits: u32) -> u16 {
    debug_assert!((1..=16).contains(&bits));
    let fp = (hash & ((1u64 << bits) - 1)) as u16;
    if fp == 0 {
        1
    } else {
        fp
    }
}

#[inline]
pub(crate) fn bucket_index(hash: u64, num_buckets: usize) -> usize {
    debug_assert!(num_buckets.is_power_of_two());
    (hash & (num_buckets as u64 - 1)) as usize
}

#[inline]
pub(crate) fn fold_alt(index: usize, fp_hash: u64, num_buckets: usize) -> usize {
    debug_assert!(num_buckets.is_power_of_two());
    ((index as u64 ^ fp_hash) & (num_buckets as u64 - 1)) as usize
}

/// The fingerprint as the byte sequence fed back into the digest for
/// alternate-index mixing: one byte for widths up to 8 bits, two
/// little-endian bytes above that.
#[inline]
pub(crate) fn fp_bytes(fp: u16, bits: u32) -> ([u8; 2], usize) {
    (fp.to_le_bytes(), if bits > 8 { 2 } else { 1 })
}

/// Strategy dispatch without heap indirection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Hasher {
    Fnv1a(Fnv1a),
    Crc32c(Crc32c),
    XxHash64(XxHash64),
}

impl Hasher {
    pub(crate) fn new(strategy: HashStrategy, fingerprint_bits: u32) -> Self {
        match strategy {
            HashStrategy::Fnv1a => Hasher::Fnv1a(Fnv1a::new(fingerprint_bits)),
            HashStrategy::Crc32c => Hasher::Crc32c(Crc32c::new(fingerprint_bits)),
            HashStrategy::XxHash64 => Hasher::XxHash64(XxHash64::new(fingerprint_bits)),
        }
    }
}

impl IndexHasher for Hasher {
    fn indices(&self, item: &[u8], num_buckets: usize) -> HashResult {
        match self {
            Hasher::Fnv1a(h) => h.indices(item, num_buckets),
            Hasher::Crc32c(h) => h.indices(item, num_buckets),
            Hasher::XxHash64(h) => h.indices(item, num_buckets),
        }
    }

    fn alt_index(&self, index: usize, fp: u16, num_buckets: usize) -> usize {
        match self {
            Hasher::Fnv1a(h) => h.alt_index(index, fp, num_buckets),
            Hasher::Crc32c(h) => h.alt_index(index, fp, num_buckets),
            Hasher::XxHash64(h) => h.alt_index(index, fp, num_buckets),
        }
    }

    fn indices_batch(&self, items: &[&[u8]], num_buckets: usize) -> Vec<HashResult> {
        match self {
            Hasher::Fnv1a(h) => h.indices_batch(items, num_buckets),
            Hasher::Crc32c(h) => h.indices_batch(items, num_buckets),
            Hasher::XxHash64(h) => h.indices_batch(items, num_buckets),
        }
    }
}
