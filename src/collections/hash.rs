//! XXH64 hashing
//!
//! The hash containers key their probe sequences off XXH64. The algorithm
//! is exposed both as a one-shot function and as a streaming
//! [`std::hash::Hasher`] so any `Hash` type can be used as a key.

use std::hash::{BuildHasher, Hasher};

const PRIME_1: u64 = 0x9E37_79B1_85EB_CA87;
const PRIME_2: u64 = 0xC2B2_AE3D_27D4_EB4F;
const PRIME_3: u64 = 0x1656_67B1_9E37_79F9;
const PRIME_4: u64 = 0x85EB_CA77_C2B2_AE63;
const PRIME_5: u64 = 0x27D4_EB2F_1656_67C5;

#[inline]
fn round(acc: u64, input: u64) -> u64 {
    acc.wrapping_add(input.wrapping_mul(PRIME_2))
        .rotate_left(31)
        .wrapping_mul(PRIME_1)
}

#[inline]
fn merge_round(acc: u64, val: u64) -> u64 {
    (acc ^ round(0, val)).wrapping_mul(PRIME_1).wrapping_add(PRIME_4)
}

#[inline]
fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn finalize(mut hash: u64, mut tail: &[u8]) -> u64 {
    while tail.len() >= 8 {
        hash ^= round(0, read_u64(tail));
        hash = hash.rotate_left(27).wrapping_mul(PRIME_1).wrapping_add(PRIME_4);
        tail = &tail[8..];
    }

    if tail.len() >= 4 {
        hash ^= u64::from(read_u32(tail)).wrapping_mul(PRIME_1);
        hash = hash.rotate_left(23).wrapping_mul(PRIME_2).wrapping_add(PRIME_3);
        tail = &tail[4..];
    }

    for &byte in tail {
        hash ^= u64::from(byte).wrapping_mul(PRIME_5);
        hash = hash.rotate_left(11).wrapping_mul(PRIME_1);
    }

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(PRIME_2);
    hash ^= hash >> 29;
    hash = hash.wrapping_mul(PRIME_3);
    hash ^= hash >> 32;

    hash
}

/// One-shot XXH64 of a byte slice.
pub fn xxh64(input: &[u8], seed: u64) -> u64 {
    let mut data = input;
    let mut hash;

    if input.len() >= 32 {
        let mut v1 = seed.wrapping_add(PRIME_1).wrapping_add(PRIME_2);
        let mut v2 = seed.wrapping_add(PRIME_2);
        let mut v3 = seed;
        let mut v4 = seed.wrapping_sub(PRIME_1);

        while data.len() >= 32 {
            v1 = round(v1, read_u64(&data[0..]));
            v2 = round(v2, read_u64(&data[8..]));
            v3 = round(v3, read_u64(&data[16..]));
            v4 = round(v4, read_u64(&data[24..]));
            data = &data[32..];
        }

        hash = v1
            .rotate_left(1)
            .wrapping_add(v2.rotate_left(7))
            .wrapping_add(v3.rotate_left(12))
            .wrapping_add(v4.rotate_left(18));

        hash = merge_round(hash, v1);
        hash = merge_round(hash, v2);
        hash = merge_round(hash, v3);
        hash = merge_round(hash, v4);
    } else {
        hash = seed.wrapping_add(PRIME_5);
    }

    hash = hash.wrapping_add(input.len() as u64);

    finalize(hash, data)
}

/// Streaming XXH64 state.
pub struct XxHash64 {
    seed: u64,
    total_len: u64,
    v1: u64,
    v2: u64,
    v3: u64,
    v4: u64,
    buffer: [u8; 32],
    buffered: usize,
}

impl XxHash64 {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            total_len: 0,
            v1: seed.wrapping_add(PRIME_1).wrapping_add(PRIME_2),
            v2: seed.wrapping_add(PRIME_2),
            v3: seed,
            v4: seed.wrapping_sub(PRIME_1),
            buffer: [0; 32],
            buffered: 0,
        }
    }

    fn consume_stripe(&mut self, stripe: &[u8]) {
        self.v1 = round(self.v1, read_u64(&stripe[0..]));
        self.v2 = round(self.v2, read_u64(&stripe[8..]));
        self.v3 = round(self.v3, read_u64(&stripe[16..]));
        self.v4 = round(self.v4, read_u64(&stripe[24..]));
    }
}

impl Default for XxHash64 {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Hasher for XxHash64 {
    fn write(&mut self, mut bytes: &[u8]) {
        self.total_len += bytes.len() as u64;

        if self.buffered > 0 {
            let take = bytes.len().min(32 - self.buffered);
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&bytes[..take]);
            self.buffered += take;
            bytes = &bytes[take..];

            if self.buffered == 32 {
                let stripe = self.buffer;
                self.consume_stripe(&stripe);
                self.buffered = 0;
            }
        }

        while bytes.len() >= 32 {
            self.consume_stripe(&bytes[..32]);
            bytes = &bytes[32..];
        }

        if !bytes.is_empty() {
            self.buffer[..bytes.len()].copy_from_slice(bytes);
            self.buffered = bytes.len();
        }
    }

    fn finish(&self) -> u64 {
        let mut hash = if self.total_len >= 32 {
            let mut h = self
                .v1
                .rotate_left(1)
                .wrapping_add(self.v2.rotate_left(7))
                .wrapping_add(self.v3.rotate_left(12))
                .wrapping_add(self.v4.rotate_left(18));

            h = merge_round(h, self.v1);
            h = merge_round(h, self.v2);
            h = merge_round(h, self.v3);
            merge_round(h, self.v4)
        } else {
            self.seed.wrapping_add(PRIME_5)
        };

        hash = hash.wrapping_add(self.total_len);

        finalize(hash, &self.buffer[..self.buffered])
    }
}

/// [`BuildHasher`] producing seeded [`XxHash64`] states. The default seed
/// is zero, which keeps hashes stable across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildXxHash64 {
    pub seed: u64,
}

impl BuildXxHash64 {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl BuildHasher for BuildXxHash64 {
    type Hasher = XxHash64;

    fn build_hasher(&self) -> XxHash64 {
        XxHash64::with_seed(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hash;

    // Reference digests from the canonical xxHash implementation.
    #[test]
    fn test_known_vectors() {
        assert_eq!(xxh64(b"", 0), 0xEF46_DB37_51D8_E999);
        assert_eq!(xxh64(b"a", 0), 0xD24E_C4F1_A98C_6E5B);
        assert_eq!(xxh64(b"abc", 0), 0x44BC_2CF5_AD77_0999);
    }

    #[test]
    fn test_seed_changes_digest() {
        assert_ne!(xxh64(b"plinth", 0), xxh64(b"plinth", 1));
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data: Vec<u8> = (0..=255).collect();

        for split in [0usize, 1, 7, 31, 32, 33, 100, 256] {
            let mut hasher = XxHash64::with_seed(42);
            hasher.write(&data[..split]);
            hasher.write(&data[split..]);

            assert_eq!(hasher.finish(), xxh64(&data, 42), "split at {}", split);
        }
    }

    #[test]
    fn test_streaming_small_writes() {
        let data = b"open addressed chunk probing";
        let mut hasher = XxHash64::default();

        for byte in data.iter() {
            hasher.write(std::slice::from_ref(byte));
        }

        assert_eq!(hasher.finish(), xxh64(data, 0));
    }

    #[test]
    fn test_build_hasher_is_deterministic() {
        let build = BuildXxHash64::default();

        let mut a = build.build_hasher();
        let mut b = build.build_hasher();

        12345u64.hash(&mut a);
        12345u64.hash(&mut b);

        assert_eq!(a.finish(), b.finish());
    }
}
