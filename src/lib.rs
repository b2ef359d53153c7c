mod error;
pub mod estimator;
mod filter;
pub mod hashing;

pub use error::{InvalidInputError, Parameter};
pub use estimator::{estimate, Estimate, EstimatorInputs};
pub use filter::{BloomFilter, QueryResult, DEFAULT_BIT_COUNT};
pub use hashing::{djb2, fnv1a, hash_indices, sdbm, HashFunction, HashIndices, HASH_COUNT};

// Causes cargo test to run doc tests on all `rust` code blocks
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
struct ReadmeDoctests;
