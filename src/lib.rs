//! Cuckoo filter: a probabilistic set-membership structure that, unlike a
//! Bloom filter, also supports deletion. Items hash to two candidate buckets
//! and a short fingerprint; inserting into a pair of full buckets relocates
//! existing fingerprints to their sibling buckets ("kicking") until a slot
//! opens or the kick budget runs out.
//!
//! The false-positive rate is governed by the fingerprint width and bucket
//! size (roughly `2 * bucket_size / 2^fingerprint_bits` at full load); there
//! are no false negatives for items still present. Three hash strategies are
//! available, and every operation has a batch variant returning element-wise
//! results.
//!
//! ```
//! use cuckoo_filters::{CuckooFilter, HashStrategy};
//!
//! let mut filter = CuckooFilter::builder()
//!     .bucket_size(8)
//!     .hash_strategy(HashStrategy::XxHash64)
//!     .build(10_000)
//!     .unwrap();
//!
//! let results = filter.insert_batch(&["apple", "banana"]);
//! assert_eq!(results, vec![true, true]);
//! assert!(filter.lookup(b"apple"));
//! assert!(filter.delete(b"banana"));
//! assert_eq!(filter.count(), 1);
//! ```

mod buckets;
mod crc32c;
mod filter;
mod fnv;
mod hash;
mod options;
mod xxhash;

pub use crate::crc32c::Crc32c;
pub use crate::filter::CuckooFilter;
pub use crate::fnv::Fnv1a;
pub use crate::hash::{HashResult, HashStrategy, IndexHasher};
pub use crate::options::{BuildError, FilterBuilder};
pub use crate::xxhash::XxHash64;
