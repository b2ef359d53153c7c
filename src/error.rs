use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the three quantities tying a Bloom filter together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Parameter {
    /// k
    HashCount,
    /// m
    BitCount,
    /// n
    ElementCount,
}

impl Parameter {
    pub const fn symbol(self) -> &'static str {
        match self {
            Parameter::HashCount => "k",
            Parameter::BitCount => "m",
            Parameter::ElementCount => "n",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Inputs the estimator (or capacity-based sizing) can't work with.
///
/// The `Display` text is meant to be shown to the user as-is.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum InvalidInputError {
    /// k, m and n were all given, so there is nothing to derive.
    #[error("k, m and n are all filled in; leave exactly one of them blank")]
    NothingToDerive,

    /// Two or three of k, m and n were left blank.
    #[error("{missing} of k, m and n are blank; fill in exactly two of them")]
    Underdetermined { missing: usize },

    #[error("{parameter} is not a number: {value:?}")]
    NotANumber { parameter: Parameter, value: String },

    #[error("{parameter} must be a positive finite number, got {value}")]
    OutOfDomain { parameter: Parameter, value: f64 },

    #[error("false positive rate must lie strictly between 0 and 1, got {0}")]
    FalsePositiveRate(f64),
}
