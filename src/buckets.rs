//! The bucket array: a packed table of fingerprint slots with the scan
//! primitives the filter engine composes.
//!
//! All buckets live in one contiguous allocation; a bucket is a
//! `bucket_size`-slot window into it. Scans run eight `u8` lanes or four
//! `u16` lanes per 64-bit word, with the scalar loop covering tails (and
//! whole buckets smaller than a word). The zero-lane mask is exact, so lane
//! counts and first-lane positions need no correction step.

/// Storage for one fingerprint slot. Zero means empty.
pub(crate) trait Slot: Copy + Eq + Default + std::fmt::Debug {
    fn from_fp(fp: u16) -> Self;
    fn to_fp(self) -> u16;

    /// Lowest index whose slot equals `fp`, lane-parallel.
    fn find(slots: &[Self], fp: Self) -> Option<usize>;

    /// Lowest empty slot, lane-parallel.
    fn find_zero(slots: &[Self]) -> Option<usize>;

    /// Number of non-empty slots, lane-parallel.
    fn occupied(slots: &[Self]) -> usize;
}

/// Scalar twin of [`Slot::find`]; also serves the sub-word tail of the lane
/// scans.
pub(crate) fn find_scalar<S: Slot>(slots: &[S], fp: S) -> Option<usize> {
    slots.iter().position(|&slot| slot == fp)
}

/// Scalar twin of [`Slot::occupied`].
pub(crate) fn occupied_scalar<S: Slot>(slots: &[S]) -> usize {
    slots.iter().filter(|&&slot| slot != S::default()).count()
}

// Exact zero-lane detection: for each lane the high bit of the result is set
// iff the lane is zero. The 7-bit (resp. 15-bit) partial sums cannot carry
// across lane boundaries, so no false positives anywhere in the word.
const LANE_LO7: u64 = 0x7f7f_7f7f_7f7f_7f7f;
const LANE_LO15: u64 = 0x7fff_7fff_7fff_7fff;

#[inline]
fn zero_lanes8(word: u64) -> u64 {
    !(((word & LANE_LO7).wrapping_add(LANE_LO7)) | word | LANE_LO7)
}

#[inline]
fn zero_lanes16(word: u64) -> u64 {
    !(((word & LANE_LO15).wrapping_add(LANE_LO15)) | word | LANE_LO15)
}

impl Slot for u8 {
    #[inline]
    fn from_fp(fp: u16) -> Self {
        debug_assert!(fp <= u16::from(u8::MAX));
        fp as u8
    }

    #[inline]
    fn to_fp(self) -> u16 {
        u16::from(self)
    }

    fn find(slots: &[Self], fp: Self) -> Option<usize> {
        let spread = u64::from_le_bytes([fp; 8]);
        let mut chunks = slots.chunks_exact(8);
        let mut base = 0;
        for chunk in &mut chunks {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            let hits = zero_lanes8(u64::from_le_bytes(buf) ^ spread);
            if hits != 0 {
                return Some(base + (hits.trailing_zeros() / 8) as usize);
            }
            base += 8;
        }
        find_scalar(chunks.remainder(), fp).map(|i| base + i)
    }

    #[inline]
    fn find_zero(slots: &[Self]) -> Option<usize> {
        Self::find(slots, 0)
    }

    fn occupied(slots: &[Self]) -> usize {
        let mut empty = 0;
        let mut chunks = slots.chunks_exact(8);
        for chunk in &mut chunks {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            empty += zero_lanes8(u64::from_le_bytes(buf)).count_ones() as usize;
        }
        let tail = chunks.remainder();
        slots.len() - empty - (tail.len() - occupied_scalar(tail))
    }
}

impl Slot for u16 {
    #[inline]
    fn from_fp(fp: u16) -> Self {
        fp
    }

    #[inline]
    fn to_fp(self) -> u16 {
        self
    }

    fn find(slots: &[Self], fp: Self) -> Option<usize> {
        let spread = u64::from(fp) * 0x0001_0001_0001_0001;
        let mut chunks = slots.chunks_exact(4);
        let mut base = 0;
        for chunk in &mut chunks {
            let word = u64::from(chunk[0])
                | u64::from(chunk[1]) << 16
                | u64::from(chunk[2]) << 32
                | u64::from(chunk[3]) << 48;
            let hits = zero_lanes16(word ^ spread);
            if hits != 0 {
                return Some(base + (hits.trailing_zeros() / 16) as usize);
            }
            base += 4;
        }
        find_scalar(chunks.remainder(), fp).map(|i| base + i)
    }

    #[inline]
    fn find_zero(slots: &[Self]) -> Option<usize> {
        Self::find(slots, 0)
    }

    fn occupied(slots: &[Self]) -> usize {
        let mut empty = 0;
        let mut chunks = slots.chunks_exact(4);
        for chunk in &mut chunks {
            let word = u64::from(chunk[0])
                | u64::from(chunk[1]) << 16
                | u64::from(chunk[2]) << 32
                | u64::from(chunk[3]) << 48;
            empty += zero_lanes16(word).count_ones() as usize;
        }
        let tail = chunks.remainder();
        slots.len() - empty - (tail.len() - occupied_scalar(tail))
    }
}

pub(crate) struct Buckets<S> {
    data: Vec<S>, // num_buckets * bucket_size slots, row-major
    bucket_size: usize,
}

impl<S: Slot> Buckets<S> {
    pub(crate) fn new(num_buckets: usize, bucket_size: usize) -> Self {
        Buckets {
            data: vec![S::default(); num_buckets.saturating_mul(bucket_size)],
            bucket_size,
        }
    }

    #[inline]
    fn slots(&self, bucket: usize) -> &[S] {
        let start = bucket * self.bucket_size;
        &self.data[start..start + self.bucket_size]
    }

    #[inline]
    fn slots_mut(&mut self, bucket: usize) -> &mut [S] {
        let start = bucket * self.bucket_size;
        &mut self.data[start..start + self.bucket_size]
    }

    /// Writes `fp` into the lowest empty slot. False if the bucket is full.
    pub(crate) fn insert(&mut self, bucket: usize, fp: u16) -> bool {
        debug_assert_ne!(fp, 0);
        let pos = self.first_empty(bucket);
        if pos < self.bucket_size {
            self.slots_mut(bucket)[pos] = S::from_fp(fp);
            true
        } else {
            false
        }
    }

    /// True iff any slot holds `fp`. Querying `fp == 0` answers "is any slot
    /// empty".
    pub(crate) fn contains(&self, bucket: usize, fp: u16) -> bool {
        S::find(self.slots(bucket), S::from_fp(fp)).is_some()
    }

    /// Clears the lowest slot holding `fp`. False if absent.
    pub(crate) fn remove(&mut self, bucket: usize, fp: u16) -> bool {
        let slots = self.slots_mut(bucket);
        match S::find(slots, S::from_fp(fp)) {
            Some(pos) => {
                slots[pos] = S::default();
                true
            }
            None => false,
        }
    }

    pub(crate) fn count(&self, bucket: usize) -> usize {
        S::occupied(self.slots(bucket))
    }

    /// Lowest empty slot index, or `bucket_size` when full.
    pub(crate) fn first_empty(&self, bucket: usize) -> usize {
        S::find_zero(self.slots(bucket)).unwrap_or(self.bucket_size)
    }

    pub(crate) fn is_full(&self, bucket: usize) -> bool {
        S::find_zero(self.slots(bucket)).is_none()
    }

    /// Replaces slot `pos` with `fp`, returning the previous value. The
    /// eviction step of cuckoo insertion.
    pub(crate) fn swap_at(&mut self, bucket: usize, pos: usize, fp: u16) -> u16 {
        debug_assert!(pos < self.bucket_size);
        let slots = self.slots_mut(bucket);
        let previous = slots[pos];
        slots[pos] = S::from_fp(fp);
        previous.to_fp()
    }

    pub(crate) fn reset(&mut self) {
        self.data.fill(S::default());
    }

    /// Non-empty slots across the whole array.
    pub(crate) fn occupied_slots(&self) -> usize {
        (0..self.data.len() / self.bucket_size)
            .map(|bucket| self.count(bucket))
            .sum()
    }

    /// All slot values, for invariant checks.
    #[cfg(test)]
    pub(crate) fn slot_values(&self) -> impl Iterator<Item = u16> + '_ {
        self.data.iter().map(|slot| slot.to_fp())
    }
}
