//! Closed-form relations between the number of hash functions (k), the number
//! of bits (m) and the number of elements (n) of a Bloom filter.
//!
//! The calculator takes any two of the three and derives the third from
//! `k = (m / n) * ln 2`, the hash count that minimises the false positive rate.
//! See <https://en.wikipedia.org/wiki/Bloom_filter#Optimal_number_of_hash_functions>.

use std::f64::consts::LN_2;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvalidInputError, Parameter};

/// Decimal places derived values are rounded to for display.
pub const DISPLAY_DECIMALS: i32 = 2;

/// A calculator request: exactly one field should be left out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EstimatorInputs {
    pub k: Option<f64>,
    pub m: Option<f64>,
    pub n: Option<f64>,
}

/// A derived value, rounded for display with the full-precision value kept.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Estimate {
    pub parameter: Parameter,
    pub value: f64,
    pub exact: f64,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", DISPLAY_DECIMALS as usize, self.exact)
    }
}

impl EstimatorInputs {
    pub fn new(k: Option<f64>, m: Option<f64>, n: Option<f64>) -> Self {
        EstimatorInputs { k, m, n }
    }

    /// Builds a request from raw form text. Blank fields are missing; anything
    /// else has to parse as a number.
    pub fn from_fields(k: &str, m: &str, n: &str) -> Result<Self, InvalidInputError> {
        Ok(EstimatorInputs {
            k: parse_field(Parameter::HashCount, k)?,
            m: parse_field(Parameter::BitCount, m)?,
            n: parse_field(Parameter::ElementCount, n)?,
        })
    }

    fn fields(&self) -> [(Parameter, Option<f64>); 3] {
        [
            (Parameter::HashCount, self.k),
            (Parameter::BitCount, self.m),
            (Parameter::ElementCount, self.n),
        ]
    }

    /// Derives the missing field. The blank-field count is checked before
    /// any of the values are.
    pub fn estimate(&self) -> Result<Estimate, InvalidInputError> {
        let missing = self.fields().iter().filter(|(_, v)| v.is_none()).count();
        match missing {
            0 => return Err(InvalidInputError::NothingToDerive),
            1 => {}
            _ => return Err(InvalidInputError::Underdetermined { missing }),
        }
        for (parameter, value) in self.fields() {
            if let Some(value) = value {
                validate(parameter, value)?;
            }
        }

        let (parameter, exact) = match (self.k, self.m, self.n) {
            (None, Some(m), Some(n)) => (Parameter::HashCount, (m / n) * LN_2),
            (Some(k), None, Some(n)) => (Parameter::BitCount, (k / LN_2) * n),
            (Some(k), Some(m), None) => (Parameter::ElementCount, (m / k) * LN_2),
            _ => unreachable!("exactly one field is missing"),
        };
        let value = round_for_display(exact);
        debug!(%parameter, exact, value, "derived filter parameter");
        Ok(Estimate {
            parameter,
            value,
            exact,
        })
    }
}

/// Derives whichever of k, m and n is missing from `inputs`.
pub fn estimate(inputs: &EstimatorInputs) -> Result<Estimate, InvalidInputError> {
    inputs.estimate()
}

fn parse_field(parameter: Parameter, raw: &str) -> Result<Option<f64>, InvalidInputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| InvalidInputError::NotANumber {
            parameter,
            value: raw.to_string(),
        })
}

fn validate(parameter: Parameter, value: f64) -> Result<(), InvalidInputError> {
    if value.is_nan() {
        return Err(InvalidInputError::NotANumber {
            parameter,
            value: value.to_string(),
        });
    }
    if !value.is_finite() || value <= 0.0 {
        return Err(InvalidInputError::OutOfDomain { parameter, value });
    }
    Ok(())
}

fn round_for_display(value: f64) -> f64 {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    (value * scale).round() / scale
}

/// Bits needed to hold `n_items` at false positive rate `fpp` when the hash
/// count is also chosen optimally: `m = ceil(-n * ln(p) / ln(2)^2)`.
pub fn optimal_bit_count(n_items: u64, fpp: f64) -> Result<u64, InvalidInputError> {
    if n_items == 0 {
        return Err(InvalidInputError::OutOfDomain {
            parameter: Parameter::ElementCount,
            value: 0.0,
        });
    }
    if !(fpp > 0.0 && fpp < 1.0) {
        return Err(InvalidInputError::FalsePositiveRate(fpp));
    }
    let n_bits = (-(n_items as f64) * fpp.ln() / (LN_2 * LN_2)).ceil();
    Ok(f64::max(n_bits, 1.0) as u64)
}

/// Hash count minimising false positives: `k = round((m / n) * ln 2)`, never
/// below 1.
pub fn optimal_hash_count(n_bits: u64, n_items: u64) -> Result<u32, InvalidInputError> {
    if n_bits == 0 {
        return Err(InvalidInputError::OutOfDomain {
            parameter: Parameter::BitCount,
            value: 0.0,
        });
    }
    if n_items == 0 {
        return Err(InvalidInputError::OutOfDomain {
            parameter: Parameter::ElementCount,
            value: 0.0,
        });
    }
    let k = (n_bits as f64 / n_items as f64 * LN_2).round();
    Ok(f64::max(k, 1.0) as u32)
}

/// Expected false positive rate after `n_items` insertions into `n_bits` bits
/// with `n_hashes` hash functions: `(1 - e^(-k * n / m))^k`.
pub fn false_positive_rate(n_hashes: u32, n_bits: u64, n_items: u64) -> f64 {
    if n_bits == 0 {
        return 1.0;
    }
    let k = f64::from(n_hashes);
    (1.0 - (-k * n_items as f64 / n_bits as f64).exp()).powf(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_derive_hash_count() {
        let estimate = EstimatorInputs::new(None, Some(100.0), Some(10.0))
            .estimate()
            .unwrap();
        assert_eq!(estimate.parameter, Parameter::HashCount);
        assert_eq!(estimate.value, 6.93);
        assert!(approx_eq(estimate.exact, 10.0 * LN_2));
        assert_eq!(estimate.to_string(), "6.93");
    }

    #[test]
    fn test_derive_bit_count() {
        let estimate = estimate(&EstimatorInputs::new(Some(7.0), None, Some(10.0))).unwrap();
        assert_eq!(estimate.parameter, Parameter::BitCount);
        assert_eq!(estimate.value, 100.99);
        assert!(approx_eq(estimate.exact, 70.0 / LN_2));
    }

    #[test]
    fn test_derive_element_count() {
        let estimate = estimate(&EstimatorInputs::new(Some(7.0), Some(100.0), None)).unwrap();
        assert_eq!(estimate.parameter, Parameter::ElementCount);
        assert_eq!(estimate.value, 9.9);
        assert_eq!(estimate.to_string(), "9.90");
    }

    #[test]
    fn test_relations_are_consistent() {
        // deriving m from k, then k back from m, is lossless at full precision
        let m = estimate(&EstimatorInputs::new(Some(3.0), None, Some(50.0)))
            .unwrap()
            .exact;
        let k = estimate(&EstimatorInputs::new(None, Some(m), Some(50.0)))
            .unwrap()
            .exact;
        assert!(approx_eq(k, 3.0));
    }

    #[test]
    fn test_nothing_missing() {
        assert_eq!(
            estimate(&EstimatorInputs::new(Some(7.0), Some(100.0), Some(10.0))),
            Err(InvalidInputError::NothingToDerive)
        );
    }

    #[test]
    fn test_too_much_missing() {
        assert_eq!(
            estimate(&EstimatorInputs::new(Some(7.0), None, None)),
            Err(InvalidInputError::Underdetermined { missing: 2 })
        );
        assert_eq!(
            estimate(&EstimatorInputs::default()),
            Err(InvalidInputError::Underdetermined { missing: 3 })
        );
        // the blank count wins over bad values
        assert_eq!(
            estimate(&EstimatorInputs::new(Some(-1.0), None, None)),
            Err(InvalidInputError::Underdetermined { missing: 2 })
        );
    }

    #[test]
    fn test_out_of_domain() {
        assert_eq!(
            estimate(&EstimatorInputs::new(None, Some(100.0), Some(0.0))),
            Err(InvalidInputError::OutOfDomain {
                parameter: Parameter::ElementCount,
                value: 0.0
            })
        );
        assert_eq!(
            estimate(&EstimatorInputs::new(Some(-2.0), None, Some(10.0))),
            Err(InvalidInputError::OutOfDomain {
                parameter: Parameter::HashCount,
                value: -2.0
            })
        );
        assert!(matches!(
            estimate(&EstimatorInputs::new(Some(f64::INFINITY), Some(1.0), None)),
            Err(InvalidInputError::OutOfDomain {
                parameter: Parameter::HashCount,
                ..
            })
        ));
        assert!(matches!(
            estimate(&EstimatorInputs::new(None, Some(f64::NAN), Some(1.0))),
            Err(InvalidInputError::NotANumber {
                parameter: Parameter::BitCount,
                ..
            })
        ));
    }

    #[test]
    fn test_from_fields() {
        let inputs = EstimatorInputs::from_fields("", " 100 ", "10").unwrap();
        assert_eq!(inputs, EstimatorInputs::new(None, Some(100.0), Some(10.0)));
        assert_eq!(inputs.estimate().unwrap().value, 6.93);

        assert_eq!(
            EstimatorInputs::from_fields("seven", "100", ""),
            Err(InvalidInputError::NotANumber {
                parameter: Parameter::HashCount,
                value: "seven".to_string()
            })
        );
        assert_eq!(
            EstimatorInputs::from_fields("   ", "", "").unwrap(),
            EstimatorInputs::default()
        );
    }

    #[test]
    fn test_estimate_json() {
        let estimate = EstimatorInputs::new(None, Some(100.0), Some(10.0))
            .estimate()
            .unwrap();
        let json = serde_json::to_value(estimate).unwrap();
        assert_eq!(json["parameter"], "HashCount");
        assert_eq!(json["value"], 6.93);

        let inputs: EstimatorInputs =
            serde_json::from_str(r#"{"k": null, "m": 100.0, "n": 10.0}"#).unwrap();
        assert_eq!(inputs, EstimatorInputs::new(None, Some(100.0), Some(10.0)));
    }

    #[test]
    fn test_optimal_bit_count() {
        assert_eq!(optimal_bit_count(1000, 0.01), Ok(9586));
        assert_eq!(optimal_bit_count(1, 0.99), Ok(1));
        assert_eq!(
            optimal_bit_count(1000, 1.5),
            Err(InvalidInputError::FalsePositiveRate(1.5))
        );
        assert!(optimal_bit_count(0, 0.01).is_err());
    }

    #[test]
    fn test_optimal_hash_count() {
        assert_eq!(optimal_hash_count(9586, 1000), Ok(7));
        assert_eq!(optimal_hash_count(100, 10), Ok(7));
        // too few bits still needs one hash
        assert_eq!(optimal_hash_count(1, 1000), Ok(1));
        assert!(optimal_hash_count(0, 10).is_err());
        assert!(optimal_hash_count(10, 0).is_err());
    }

    #[test]
    fn test_false_positive_rate() {
        assert_eq!(false_positive_rate(3, 32, 0), 0.0);
        let rate = false_positive_rate(3, 124, 10);
        assert!(rate > 0.0099 && rate < 0.01);
        // more items, more false positives
        assert!(false_positive_rate(3, 124, 20) > rate);
    }
}
