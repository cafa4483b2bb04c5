//! CRC32C (Castagnoli polynomial) hash.
//!
//! Table-driven software implementation; the table is built at compile time
//! from the reversed polynomial 0x82F63B78.

use crate::hash::{bucket_index, fingerprint, fold_alt, fp_bytes, HashResult, IndexHasher};

const POLY: u32 = 0x82f6_3b78;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[inline]
fn step(crc: u32, byte: u8) -> u32 {
    TABLE[((crc ^ u32::from(byte)) & 0xff) as usize] ^ (crc >> 8)
}

pub(crate) fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc = step(crc, byte);
    }
    !crc
}

/// Four independent CRC32C streams advanced in lockstep, overlapping the
/// table-lookup latency. Digest-identical to four [`crc32c`] calls.
pub(crate) fn crc32c_x4(items: [&[u8]; 4]) -> [u32; 4] {
    let mut crc = [!0u32; 4];
    let common = items[0]
        .len()
        .min(items[1].len())
        .min(items[2].len())
        .min(items[3].len());
    for i in 0..common {
        for lane in 0..4 {
            crc[lane] = step(crc[lane], items[lane][i]);
        }
    }
    for lane in 0..4 {
        for &byte in &items[lane][common..] {
            crc[lane] = step(crc[lane], byte);
        }
    }
    [!crc[0], !crc[1], !crc[2], !crc[3]]
}

/// Index hasher backed by CRC32C.
#[derive(Debug, Clone, Copy)]
pub struct Crc32c {
    fingerprint_bits: u32,
}

impl Crc32c {
    /// A hasher producing fingerprints of the given width (1..=16 bits).
    pub fn new(fingerprint_bits: u32) -> Self {
        debug_assert!((1..=16).contains(&fingerprint_bits));
        Crc32c { fingerprint_bits }
    }
}

impl IndexHasher for Crc32c {
    fn indices(&self, item: &[u8], num_buckets: usize) -> HashResult {
        let hash = u64::from(crc32c(item));
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
        fold_alt(index, u64::from(crc32c(&buf[..len])), num_buckets)
    }

    fn indices_batch(&self, items: &[&[u8]], num_buckets: usize) -> Vec<HashResult> {
        let mut results = Vec::with_capacity(items.len());
        let mut quads = items.chunks_exact(4);
        for quad in &mut quads {
            for hash in crc32c_x4([quad[0], quad[1], quad[2], quad[3]]) {
                let hash = u64::from(hash);
                let fp = fingerprint(hash, self.fingerprint_bits);
                let i1 = bucket_index(hash, num_buckets);
                results.push(HashResult {
                    i1,
                    i2: self.alt_index(i1, fp, num_buckets),
                    fp,
                });
            }
        }
        for item in quads.remainder() {
            results.push(self.indices(item, num_buckets));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{collection::size_range, prelude::*};

    #[test]
    fn known_vectors() {
        assert_eq!(crc32c(b""), 0x0000_0000);
        assert_eq!(crc32c(b"a"), 0xc1d0_4330);
        // Standard check value for CRC-32C.
        assert_eq!(crc32c(b"123456789"), 0xe306_9283);
        assert_eq!(
            crc32c(b"The quick brown fox jumps over the lazy dog"),
            0x2262_0404
        );
        assert_eq!(crc32c(b"cuckoo filter"), 0x84d7_eb25);
    }

    #[test]
    fn one_kib_pattern() {
        let data: Vec<u8> = (0..1024usize).map(|i| (i * 31 + 7) as u8).collect();
        assert_eq!(crc32c(&data), 0xa5e5_b4b5);
    }

    #[test]
    fn lockstep_mixed_lengths() {
        let items: [&[u8]; 4] = [b"", b"123456789", b"a", b"cuckoo filter"];
        let digests = crc32c_x4(items);
        for (lane, item) in items.iter().enumerate() {
            assert_eq!(digests[lane], crc32c(item));
        }
    }

    proptest! {
        #[test]
        fn lockstep_matches_serial(
            ref a in any_with::<Vec<u8>>(size_range(0..64).lift()),
            ref b in any_with::<Vec<u8>>(size_range(0..64).lift()),
            ref c in any_with::<Vec<u8>>(size_range(0..64).lift()),
            ref d in any_with::<Vec<u8>>(size_range(0..64).lift()),
        ) {
            let items: [&[u8]; 4] = [a, b, c, d];
            let digests = crc32c_x4(items);
            for (lane, item) in items.iter().enumerate() {
                prop_assert_eq!(digests[lane], crc32c(item));
            }
        }
    }
}
