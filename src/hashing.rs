//! The hash family used to address the filter's bit array.
//!
//! Every function hashes the UTF-16 code units of the key (the "character
//! codes" a browser reports), so characters outside the basic multilingual
//! plane contribute two code units. All arithmetic wraps at 32 bits, which
//! keeps the outputs bit-for-bit identical to other implementations of the
//! same visualizer.

use serde::{Deserialize, Serialize};

/// Number of hash functions in the family (k).
pub const HASH_COUNT: usize = 3;

/// Bit positions of a key, one per hash function, in family order.
pub type HashIndices = [usize; HASH_COUNT];

const DJB2_SEED: u32 = 5381;
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// DJB2: `h = h * 33 + c`, starting from 5381.
#[inline]
pub fn djb2(key: &str) -> u32 {
    key.encode_utf16().fold(DJB2_SEED, |hash, c| {
        // (hash << 5) + hash == hash * 33
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(c))
    })
}

/// 32-bit FNV-1a: xor the code unit in, then multiply by the FNV prime.
#[inline]
pub fn fnv1a(key: &str) -> u32 {
    key.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, c| {
        (hash ^ u32::from(c)).wrapping_mul(FNV_PRIME)
    })
}

/// SDBM: `h = c + (h << 6) + (h << 16) - h`, starting from 0.
#[inline]
pub fn sdbm(key: &str) -> u32 {
    key.encode_utf16().fold(0, |hash: u32, c| {
        u32::from(c)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash)
    })
}

/// One member of the hash family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum HashFunction {
    Djb2,
    Fnv1a,
    Sdbm,
}

impl HashFunction {
    /// The family in the order indices are reported.
    pub const ALL: [HashFunction; HASH_COUNT] =
        [HashFunction::Djb2, HashFunction::Fnv1a, HashFunction::Sdbm];

    pub fn name(self) -> &'static str {
        match self {
            HashFunction::Djb2 => "djb2",
            HashFunction::Fnv1a => "fnv1a",
            HashFunction::Sdbm => "sdbm",
        }
    }

    #[inline]
    pub fn hash(self, key: &str) -> u32 {
        match self {
            HashFunction::Djb2 => djb2(key),
            HashFunction::Fnv1a => fnv1a(key),
            HashFunction::Sdbm => sdbm(key),
        }
    }

    /// The hash reduced into `[0, n_bits)`.
    #[inline]
    pub fn index(self, key: &str, n_bits: usize) -> usize {
        debug_assert!(n_bits > 0, "can't index into an empty bit array");
        (u64::from(self.hash(key)) % n_bits as u64) as usize
    }
}

/// All bit positions for `key` in an array of `n_bits` bits.
#[inline]
pub fn hash_indices(key: &str, n_bits: usize) -> HashIndices {
    HashFunction::ALL.map(|f| f.index(key, n_bits))
}
