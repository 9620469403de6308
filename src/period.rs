//! # Period — Analytic Full-Period Test (Hull–Dobell / Primitive Root)
//!
//! Decides, without walking the sequence, whether `x' = a·x + c (mod m)`
//! cycles through its whole residue space.
//!
//! ## Composite modulus: Hull–Dobell
//!
//! The period is exactly m iff
//! 1. `gcd(c, m) = 1`,
//! 2. `a − 1` is divisible by every prime factor of m,
//! 3. `a − 1` is divisible by 4 when m is.
//!
//! ## Prime modulus: primitive root
//!
//! For prime m and `a ≢ 1`, the map has the fixed point
//! `x* = c·(1 − a)⁻¹`, and every other residue lies on cycles of length
//! `ord_m(a)`. The longest achievable cycle is therefore m − 1, reached iff a
//! generates the multiplicative group, i.e. `a^((m−1)/f) ≢ 1` for every prime
//! `f | m − 1`. With `gcd(c, m) = 1` the seed 0 is never the fixed point, so
//! the cycle through 0 covers every residue except x*.
//!
//! The two residues outside the multiplicative criterion are decided
//! explicitly: `a ≡ 1` is the additive generator (full period m by
//! Hull–Dobell, since m is its own only prime factor) and `a ≡ 0` collapses
//! to a constant. For m = 2 that constant walk `0 → c` still visits both
//! residues, so it counts as full; for every larger prime it is short.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arith::{gcd, is_prime, mul_mod, pow_mod_unchecked, prime_factors};

/// Why a triple was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// `gcd(c, m) != 1`.
    IncrementNotCoprime,
    /// Prime m > 2, a ≡ 0: the sequence is constant after one step.
    MultiplierNotUnit,
    /// m = 2, a ≡ 0: `0 → c` covers both residues before settling.
    ConstantCoversModulus,
    /// Prime m: `a^((m-1)/factor) ≡ 1`, so a lies in a proper subgroup.
    NotPrimitiveRoot { factor: u64 },
    PrimitiveRoot,
    /// Composite m: `factor | m` but not `factor | a - 1`.
    FactorDoesNotDivide { factor: u64 },
    /// Composite m with `4 | m` but not `4 | a - 1`.
    FourDoesNotDivide,
    HullDobell,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::IncrementNotCoprime => write!(f, "c and m not coprime"),
            Reason::MultiplierNotUnit => write!(f, "a is 0 mod m"),
            Reason::ConstantCoversModulus => {
                write!(f, "a is 0 mod 2, 0 -> c covers both residues")
            }
            Reason::NotPrimitiveRoot { factor } => {
                write!(f, "not a primitive root (a^((m-1)/{}) = 1 mod m)", factor)
            }
            Reason::PrimitiveRoot => write!(f, "primitive root for prime modulus"),
            Reason::FactorDoesNotDivide { factor } => write!(f, "(a-1) % {} != 0", factor),
            Reason::FourDoesNotDivide => write!(f, "(a-1) % 4 != 0"),
            Reason::HullDobell => write!(f, "Hull-Dobell theorem"),
        }
    }
}

/// Analytic prediction for one `(m, a, c)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodVerdict {
    pub full_period: bool,
    pub reason: Reason,
}

impl PeriodVerdict {
    fn full(reason: Reason) -> Self {
        PeriodVerdict {
            full_period: true,
            reason,
        }
    }

    fn short(reason: Reason) -> Self {
        PeriodVerdict {
            full_period: false,
            reason,
        }
    }

    /// Distinct residues the walk from seed 0 visits under a full verdict:
    /// m − 1 for a primitive root (everything but the fixed point), m
    /// otherwise. `None` for short verdicts.
    pub fn cycle_length(&self, m: u64) -> Option<u64> {
        match (self.full_period, self.reason) {
            (true, Reason::PrimitiveRoot) => Some(m - 1),
            (true, _) => Some(m),
            (false, _) => None,
        }
    }
}

impl fmt::Display for PeriodVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.full_period { "full period" } else { "short period" };
        write!(f, "{}: {}", tag, self.reason)
    }
}

/// Full-period test for `x' = a·x + c (mod m)`. Total for `m >= 1`.
///
/// # Panics
///
/// Panics if `m == 0`. [`RecurrenceParams::new`](crate::RecurrenceParams::new)
/// rules that out.
pub fn check_full_period(m: u64, a: u64, c: u64) -> PeriodVerdict {
    if gcd(c % m, m) != 1 {
        return PeriodVerdict::short(Reason::IncrementNotCoprime);
    }

    if is_prime(m) {
        return check_prime_modulus(m, a % m);
    }

    // a ≡ 0 wraps to m - 1, which is congruent to a - 1
    let a_minus_one = match a % m {
        0 => m - 1,
        r => r - 1,
    };
    for factor in prime_factors(m) {
        if !a_minus_one.is_multiple_of(factor) {
            return PeriodVerdict::short(Reason::FactorDoesNotDivide { factor });
        }
    }
    if m.is_multiple_of(4) && !a_minus_one.is_multiple_of(4) {
        return PeriodVerdict::short(Reason::FourDoesNotDivide);
    }
    PeriodVerdict::full(Reason::HullDobell)
}

fn check_prime_modulus(m: u64, a: u64) -> PeriodVerdict {
    if a == 1 {
        return PeriodVerdict::full(Reason::HullDobell);
    }
    if a == 0 {
        return if m == 2 {
            PeriodVerdict::full(Reason::ConstantCoversModulus)
        } else {
            PeriodVerdict::short(Reason::MultiplierNotUnit)
        };
    }
    let group_order = m - 1;
    for factor in prime_factors(group_order) {
        if pow_mod_unchecked(a, group_order / factor, m) == 1 {
            return PeriodVerdict::short(Reason::NotPrimitiveRoot { factor });
        }
    }
    PeriodVerdict::full(Reason::PrimitiveRoot)
}

/// The residue `x*` with `a·x* + c ≡ x*`, for prime m and `a ≢ 1`:
/// `x* = c·(1 − a)⁻¹ mod m`. This is the one residue a primitive-root
/// generator never visits from any other seed.
pub fn fixed_point(m: u64, a: u64, c: u64) -> Option<u64> {
    if !is_prime(m) || a % m == 1 {
        return None;
    }
    let one_minus_a = (m - a % m + 1) % m;
    // Fermat inverse; m is prime and one_minus_a is nonzero
    let inverse = pow_mod_unchecked(one_minus_a, m - 2, m);
    Some(mul_mod(c % m, inverse, m))
}
