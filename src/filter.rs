//! The cuckoo filter engine: a power-of-two array of fingerprint buckets,
//! two candidate buckets per item, and random-walk eviction when both are
//! full.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buckets::{Buckets, Slot};
use crate::hash::{HashResult, Hasher, IndexHasher};
use crate::options::{BuildError, FilterBuilder};

/// A cuckoo filter over byte-sequence items.
///
/// Supports insertion, membership lookup and deletion with a small,
/// configurable false-positive rate and no false negatives for items still
/// present. Reads take `&self` and writes `&mut self`, so the
/// one-writer-or-many-readers discipline is enforced by the borrow checker;
/// wrap the filter in a `std::sync::RwLock` to share it across threads.
///
/// ```
/// use cuckoo_filters::CuckooFilter;
///
/// let mut filter = CuckooFilter::new(1024).unwrap();
/// assert!(filter.insert(b"the cat says meow"));
/// assert!(filter.lookup(b"the cat says meow"));
/// assert!(filter.delete(b"the cat says meow"));
/// assert!(!filter.lookup(b"the cat says meow"));
/// ```
pub struct CuckooFilter {
    core: Core,
}

// Fingerprints are stored in the smallest unsigned type that fits the
// configured width; both variants are monomorphized.
enum Core {
    Narrow(Engine<u8>),
    Wide(Engine<u16>),
}

macro_rules! dispatch {
    ($filter:expr, $engine:ident => $body:expr) => {
        match &$filter.core {
            Core::Narrow($engine) => $body,
            Core::Wide($engine) => $body,
        }
    };
}

macro_rules! dispatch_mut {
    ($filter:expr, $engine:ident => $body:expr) => {
        match &mut $filter.core {
            Core::Narrow($engine) => $body,
            Core::Wide($engine) => $body,
        }
    };
}

impl CuckooFilter {
    /// Builds a filter for at least `capacity` items with default options
    /// (bucket size 4, 8-bit fingerprints, FNV-1a, 500 max kicks).
    ///
    /// Errors with [`BuildError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, BuildError> {
        FilterBuilder::new().build(capacity)
    }

    /// A builder for custom configurations.
    pub fn builder() -> FilterBuilder {
        FilterBuilder::new()
    }

    pub(crate) fn from_builder(capacity: usize, options: FilterBuilder) -> Self {
        let core = if options.fingerprint_bits <= 8 {
            Core::Narrow(Engine::new(capacity, &options))
        } else {
            Core::Wide(Engine::new(capacity, &options))
        };
        CuckooFilter { core }
    }

    /// Adds an item. Returns false when the filter could not place the
    /// fingerprint within the eviction budget; the filter stays consistent,
    /// but the caller should treat it as full and grow or rebuild.
    pub fn insert(&mut self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        dispatch_mut!(self, engine => engine.insert(item))
    }

    /// True when the item may be present (subject to the false-positive
    /// rate), false when it is definitely absent.
    pub fn lookup(&self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        dispatch!(self, engine => engine.lookup(item))
    }

    /// Removes an item previously inserted. Deleting an item that was never
    /// inserted can evict a colliding fingerprint belonging to another item;
    /// callers own that contract.
    pub fn delete(&mut self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        dispatch_mut!(self, engine => engine.delete(item))
    }

    /// Number of fingerprints currently stored.
    pub fn count(&self) -> usize {
        dispatch!(self, engine => engine.count())
    }

    /// Total slot capacity, `num_buckets * bucket_size`; at least the
    /// requested capacity.
    pub fn capacity(&self) -> usize {
        dispatch!(self, engine => engine.capacity())
    }

    /// Fraction of slots occupied, in [0.0, 1.0].
    pub fn load_factor(&self) -> f64 {
        dispatch!(self, engine => engine.load_factor())
    }

    /// Empties the filter.
    pub fn reset(&mut self) {
        dispatch_mut!(self, engine => engine.reset())
    }

    /// Element-wise [`insert`](Self::insert) over a slice, in input order.
    pub fn insert_batch<T: AsRef<[u8]>>(&mut self, items: &[T]) -> Vec<bool> {
        dispatch_mut!(self, engine => {
            items.iter().map(|item| engine.insert(item.as_ref())).collect()
        })
    }

    /// Element-wise [`lookup`](Self::lookup) over a slice, hashing the whole
    /// batch up front.
    pub fn lookup_batch<T: AsRef<[u8]>>(&self, items: &[T]) -> Vec<bool> {
        let refs: Vec<&[u8]> = items.iter().map(AsRef::as_ref).collect();
        dispatch!(self, engine => engine.lookup_batch(&refs))
    }

    /// Element-wise [`delete`](Self::delete) over a slice, in input order.
    pub fn delete_batch<T: AsRef<[u8]>>(&mut self, items: &[T]) -> Vec<bool> {
        dispatch_mut!(self, engine => {
            items.iter().map(|item| engine.delete(item.as_ref())).collect()
        })
    }

    /// Preferred batch size for the batch operations; informational.
    pub fn optimal_batch_size(&self) -> usize {
        dispatch!(self, engine => engine.batch_hint)
    }
}

struct Engine<S: Slot> {
    buckets: Buckets<S>,
    num_buckets: usize,
    bucket_size: usize,
    num_items: usize,
    max_kicks: u32,
    batch_hint: usize,
    hasher: Hasher,
    rng: StdRng,
}

impl<S: Slot> Engine<S> {
    fn new(capacity: usize, options: &FilterBuilder) -> Self {
        let num_buckets = num_buckets_for(capacity, options.bucket_size);
        Engine {
            buckets: Buckets::new(num_buckets, options.bucket_size),
            num_buckets,
            bucket_size: options.bucket_size,
            num_items: 0,
            max_kicks: options.max_kicks,
            batch_hint: options.batch_hint,
            hasher: Hasher::new(options.hash_strategy, options.fingerprint_bits),
            rng: match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }

    fn insert(&mut self, item: &[u8]) -> bool {
        let HashResult { i1, i2, fp } = self.hasher.indices(item, self.num_buckets);

        if self.buckets.insert(i1, fp) {
            self.num_items += 1;
            return true;
        }
        if self.buckets.insert(i2, fp) {
            self.num_items += 1;
            return true;
        }
        self.relocate(i1, i2, fp)
    }

    // Random-walk eviction. Each round swaps the carried fingerprint into a
    // random slot of the current bucket and follows the displaced one to its
    // sibling bucket. On failure the last displaced fingerprint is dropped;
    // every slot stays occupied, so the occupied-slot count and `num_items`
    // remain in agreement.
    fn relocate(&mut self, i1: usize, i2: usize, fp: u16) -> bool {
        debug_assert!(self.buckets.is_full(i1) && self.buckets.is_full(i2));

        let mut index = if self.rng.gen_range(0..2) == 1 { i2 } else { i1 };
        let mut current = fp;

        for _ in 0..self.max_kicks {
            let pos = self.rng.gen_range(0..self.bucket_size);
            let displaced = self.buckets.swap_at(index, pos, current);
            if displaced == 0 {
                self.num_items += 1;
                return true;
            }

            current = displaced;
            index = self.hasher.alt_index(index, current, self.num_buckets);
            if self.buckets.insert(index, current) {
                self.num_items += 1;
                return true;
            }
        }
        false
    }

    fn lookup(&self, item: &[u8]) -> bool {
        let HashResult { i1, i2, fp } = self.hasher.indices(item, self.num_buckets);
        self.buckets.contains(i1, fp) || self.buckets.contains(i2, fp)
    }

    fn lookup_batch(&self, items: &[&[u8]]) -> Vec<bool> {
        self.hasher
            .indices_batch(items, self.num_buckets)
            .into_iter()
            .map(|r| self.buckets.contains(r.i1, r.fp) || self.buckets.contains(r.i2, r.fp))
            .collect()
    }

    fn delete(&mut self, item: &[u8]) -> bool {
        let HashResult { i1, i2, fp } = self.hasher.indices(item, self.num_buckets);
        if self.buckets.remove(i1, fp) || self.buckets.remove(i2, fp) {
            self.num_items -= 1;
            return true;
        }
        false
    }

    fn count(&self) -> usize {
        debug_assert_eq!(self.num_items, self.buckets.occupied_slots());
        self.num_items
    }

    fn capacity(&self) -> usize {
        self.num_buckets.saturating_mul(self.bucket_size)
    }

    fn load_factor(&self) -> f64 {
        self.num_items as f64 / self.capacity() as f64
    }

    fn reset(&mut self) {
        self.buckets.reset();
        self.num_items = 0;
    }
}

/// Bucket count for a requested capacity: the next power of two of
/// `ceil(capacity / bucket_size)`, at least 1, saturating at the largest
/// representable power of two.
fn num_buckets_for(capacity: usize, bucket_size: usize) -> usize {
    let raw = capacity / bucket_size + usize::from(capacity % bucket_size != 0);
    raw.checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
        .max(1)
}

#[cfg(test)]
impl<S: Slot> Engine<S> {
    fn assert_invariants(&self, fingerprint_bits: u32) {
        assert!(self.num_buckets.is_power_of_two());
        assert_eq!(self.num_items, self.buckets.occupied_slots());
        let limit = 1u32 << fingerprint_bits;
        for fp in self.buckets.slot_values() {
            assert!(
                u32::from(fp) < limit,
                "slot value {fp:#x} exceeds {fingerprint_bits}-bit fingerprints"
            );
        }
    }
}
