//! # Error — Typed Failures for the Analysis Core
//!
//! Analytic functions (`gcd`, `check_full_period`, `nth_value` for a valid
//! modulus) are total and never return these. Errors are reserved for inputs
//! outside a function's domain, bounded searches that ran out of budget, and
//! structural misconfiguration that would silently break id uniqueness.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LcgError {
    /// Invalid mathematical input: zero modulus, negative exponent, a value
    /// outside the encoder's range.
    #[error("domain error: {0}")]
    Domain(String),

    /// A bounded search or retry loop found nothing within its budget.
    /// Callers are expected to retry with different parameters.
    #[error("range exhausted: {0}")]
    RangeExhausted(String),

    #[error("target modulus {target} is below the search minimum {minimum}")]
    BelowMinimum { target: u64, minimum: u64 },

    /// Alphabet/width mismatch or a derived constant that no longer agrees
    /// with the generator's modulus.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown sequence: {0}")]
    UnknownSequence(String),
}

pub type Result<T> = std::result::Result<T, LcgError>;
