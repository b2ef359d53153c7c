use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{InvalidInputError, Parameter};
use crate::hashing::{hash_indices, HashIndices, HASH_COUNT};

/// Size of the bit array when none is given.
pub const DEFAULT_BIT_COUNT: usize = 32;

/// Outcome of a membership query, along with the positions that were checked
/// so they can be highlighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryResult {
    /// `true` means "possibly inserted"; `false` means "definitely not".
    pub present: bool,
    pub indices: HashIndices,
}

/// A Bloom filter over string keys with a fixed-size bit array and the three
/// functions of the [hash family](crate::hashing).
///
/// Bits only ever go from 0 to 1; the only way back is [`reset`](Self::reset)
/// or [`clear`](Self::clear), which zero the whole array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bitvec: BitVec,
}

impl Default for BloomFilter {
    fn default() -> Self {
        BloomFilter::new(DEFAULT_BIT_COUNT)
    }
}

impl BloomFilter {
    /// Creates an empty filter of `n_bits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `n_bits` is 0.
    pub fn new(n_bits: usize) -> Self {
        assert!(n_bits > 0, "a bloom filter needs at least one bit");
        debug!(n_bits, "created bloom filter");
        BloomFilter {
            bitvec: BitVec::repeat(false, n_bits),
        }
    }

    /// Creates an empty filter big enough that `n_items` insertions give a
    /// false positive rate of roughly `fpp`.
    ///
    /// The number of hash functions is fixed, so only the bit count is tuned:
    /// `m = ceil(-k * n / ln(1 - fpp^(1/k)))`.
    pub fn with_capacity(n_items: u64, fpp: f64) -> Result<Self, InvalidInputError> {
        if n_items == 0 {
            return Err(InvalidInputError::OutOfDomain {
                parameter: Parameter::ElementCount,
                value: 0.0,
            });
        }
        if !(fpp > 0.0 && fpp < 1.0) {
            return Err(InvalidInputError::FalsePositiveRate(fpp));
        }

        let k = HASH_COUNT as f64;
        let n_bits = (-k * n_items as f64 / (1.0 - fpp.powf(1.0 / k)).ln()).ceil();
        debug!(n_items, fpp, n_bits, "sized bloom filter for capacity");
        Ok(BloomFilter::new(f64::max(n_bits, 1.0) as usize))
    }

    /// Throws away every inserted key and starts over with `n_bits` bits.
    ///
    /// # Panics
    ///
    /// Panics if `n_bits` is 0.
    pub fn reset(&mut self, n_bits: usize) {
        assert!(n_bits > 0, "a bloom filter needs at least one bit");
        debug!(from = self.bitvec.len(), to = n_bits, "reset bloom filter");
        self.bitvec = BitVec::repeat(false, n_bits);
    }

    /// Zeroes every bit, keeping the current size.
    pub fn clear(&mut self) {
        self.bitvec.fill(false);
    }

    /// Sets the bit for each hash of `key` and returns their positions in
    /// hash family order. Inserting the same key again changes nothing.
    pub fn insert(&mut self, key: &str) -> HashIndices {
        let indices = hash_indices(key, self.bitvec.len());
        for &ix in &indices {
            self.bitvec.set(ix, true);
        }
        trace!(key_len = key.len(), ?indices, "inserted key");
        indices
    }

    /// Checks whether `key` may have been inserted. This never reports a false
    /// negative, but unrelated keys sharing all three bits give false positives.
    pub fn query(&self, key: &str) -> QueryResult {
        let indices = hash_indices(key, self.bitvec.len());
        let present = indices.iter().all(|&ix| self.bitvec[ix]);
        trace!(key_len = key.len(), ?indices, present, "queried key");
        QueryResult { present, indices }
    }

    /// Shorthand for `query(key).present`.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.query(key).present
    }

    /// Size of the bit array (m).
    pub fn len(&self) -> usize {
        self.bitvec.len()
    }

    /// Whether no bit is set, i.e. nothing has been inserted since the last
    /// reset.
    pub fn is_empty(&self) -> bool {
        self.bitvec.not_any()
    }

    /// State of the bit at `ix`, or `None` past the end of the array.
    pub fn bit(&self, ix: usize) -> Option<bool> {
        self.bitvec.get(ix).map(|b| *b)
    }

    /// Every bit in order, for drawing the array.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bitvec.iter().by_vals()
    }

    pub fn count_ones(&self) -> usize {
        self.bitvec.count_ones()
    }

    /// Share of bits that are set.
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.len() as f64
    }

    /// Chance that a key never inserted is reported present, given the bits
    /// currently set.
    pub fn estimated_fpp(&self) -> f64 {
        self.fill_ratio().powi(HASH_COUNT as i32)
    }
}
