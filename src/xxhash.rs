//! XXH64 hash, following the reference algorithm with seed 0.

use crate::hash::{bucket_index, fingerprint, fold_alt, fp_bytes, HashResult, IndexHasher};

const PRIME64_1: u64 = 0x9e37_79b1_85eb_ca87;
const PRIME64_2: u64 = 0xc2b2_ae3d_27d4_eb4f;
const PRIME64_3: u64 = 0x1656_67b1_9e37_79f9;
const PRIME64_4: u64 = 0x85eb_ca77_c2b2_ae63;
const PRIME64_5: u64 = 0x27d4_eb2f_1656_67c5;

#[inline]
fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

#[inline]
fn round(acc: u64, lane: u64) -> u64 {
    acc.wrapping_add(lane.wrapping_mul(PRIME64_2))
        .rotate_left(31)
        .wrapping_mul(PRIME64_1)
}

#[inline]
fn merge_round(hash: u64, acc: u64) -> u64 {
    (hash ^ round(0, acc))
        .wrapping_mul(PRIME64_1)
        .wrapping_add(PRIME64_4)
}

pub(crate) fn xxh64(data: &[u8], seed: u64) -> u64 {
    let mut rest = data;
    let mut hash = if rest.len() >= 32 {
        let mut v1 = seed.wrapping_add(PRIME64_1).wrapping_add(PRIME64_2);
        let mut v2 = seed.wrapping_add(PRIME64_2);
        let mut v3 = seed;
        let mut v4 = seed.wrapping_sub(PRIME64_1);
        while rest.len() >= 32 {
            v1 = round(v1, read_u64(rest, 0));
            v2 = round(v2, read_u64(rest, 8));
            v3 = round(v3, read_u64(rest, 16));
            v4 = round(v4, read_u64(rest, 24));
            rest = &rest[32..];
        }
        let mut hash = v1
            .rotate_left(1)
            .wrapping_add(v2.rotate_left(7))
            .wrapping_add(v3.rotate_left(12))
            .wrapping_add(v4.rotate_left(18));
        hash = merge_round(hash, v1);
        hash = merge_round(hash, v2);
        hash = merge_round(hash, v3);
        merge_round(hash, v4)
    } else {
        seed.wrapping_add(PRIME64_5)
    };

    hash = hash.wrapping_add(data.len() as u64);

    while rest.len() >= 8 {
        hash ^= round(0, read_u64(rest, 0));
        hash = hash.rotate_left(27).wrapping_mul(PRIME64_1).wrapping_add(PRIME64_4);
        rest = &rest[8..];
    }
    if rest.len() >= 4 {
        hash ^= u64::from(read_u32(rest, 0)).wrapping_mul(PRIME64_1);
        hash = hash.rotate_left(23).wrapping_mul(PRIME64_2).wrapping_add(PRIME64_3);
        rest = &rest[4..];
    }
    for &byte in rest {
        hash ^= u64::from(byte).wrapping_mul(PRIME64_5);
        hash = hash.rotate_left(11).wrapping_mul(PRIME64_1);
    }

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(PRIME64_2);
    hash ^= hash >> 29;
    hash = hash.wrapping_mul(PRIME64_3);
    hash ^ (hash >> 32)
}

/// Index hasher backed by XXH64 with seed 0.
#[derive(Debug, Clone, Copy)]
pub struct XxHash64 {
    fingerprint_bits: u32,
}

impl XxHash64 {
    /// A hasher producing fingerprints of the given width (1..=16 bits).
    pub fn new(fingerprint_bits: u32) -> Self {
        debug_assert!((1..=16).contains(&fingerprint_bits));
        XxHash64 { fingerprint_bits }
    }
}

impl IndexHasher for XxHash64 {
    fn indices(&self, item: &[u8], num_buckets: usize) -> HashResult {
        let hash = xxh64(item, 0);
        let fp = fingerprint(hash, self.fingerprint_bits);
        let i1 = bucket_index(hash, num_buckets);
        HashResult {
            i1,
            i2: self.alt_index(i1, fp, num_buckets),
            fp,
        }
    }

    fn alt_index(&self, index: usize, fp: u16, num_buckets: usize) -> usize {
        let (buf, len) = fp_bytes(fp, self.fingerprint_bits);
        fold_alt(index, xxh64(&buf[..len], 0), num_buckets)
    }
}
