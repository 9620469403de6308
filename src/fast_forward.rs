//! # FastForward — N-th Term of an LCG in O(log n)
//!
//! The affine step `x' = a·x + c (mod m)` is linear in the augmented state
//! `[x, 1]`:
//!
//! ```text
//! [x']   [a c] [x]
//! [1 ] = [0 1] [1]
//! ```
//!
//! so n steps are the n-th power of that matrix applied to `[x0, 1]`. Powers
//! are computed by square-and-multiply with every entry reduced mod m, giving
//! O(log n) 2×2 multiplications instead of n steps.
//!
//! Below `DIRECT_STEP_THRESHOLD` steps the recurrence is iterated directly;
//! both paths produce identical values for every n.
//!
//! The same powers give jump-ahead coefficients `(A, C)` such that n steps
//! collapse into the single step `x' = A·x + C`, which is what
//! [`Lcg::advance`] uses to skip a sequence forward.
//!
//! ## References
//!
//! - F. B. Brown, "Random Number Generation with Arbitrary Stride",
//!   Transactions of the American Nuclear Society, 1994.

use crate::arith::mul_mod;
use crate::error::{LcgError, Result};
use crate::RecurrenceParams;

/// Step counts below this are iterated directly.
pub const DIRECT_STEP_THRESHOLD: u64 = 20;

/// A power of `[[a, c], [0, 1]]` with entries reduced mod m.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Matrix2x2 {
    m00: u64,
    m01: u64,
    m10: u64,
    m11: u64,
}

impl Matrix2x2 {
    fn identity(m: u64) -> Self {
        let one = 1 % m;
        Matrix2x2 {
            m00: one,
            m01: 0,
            m10: 0,
            m11: one,
        }
    }

    fn affine(a: u64, c: u64, m: u64) -> Self {
        Matrix2x2 {
            m00: a % m,
            m01: c % m,
            m10: 0,
            m11: 1 % m,
        }
    }

    fn mul(&self, rhs: &Matrix2x2, m: u64) -> Self {
        let dot = |x0: u64, y0: u64, x1: u64, y1: u64| -> u64 {
            ((mul_mod(x0, y0, m) as u128 + mul_mod(x1, y1, m) as u128) % m as u128) as u64
        };
        Matrix2x2 {
            m00: dot(self.m00, rhs.m00, self.m01, rhs.m10),
            m01: dot(self.m00, rhs.m01, self.m01, rhs.m11),
            m10: dot(self.m10, rhs.m00, self.m11, rhs.m10),
            m11: dot(self.m10, rhs.m01, self.m11, rhs.m11),
        }
    }

    fn pow(self, mut n: u64, m: u64) -> Self {
        let mut result = Matrix2x2::identity(m);
        let mut unit = self;
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&unit, m);
            }
            n >>= 1;
            if n > 0 {
                unit = unit.mul(&unit, m);
            }
        }
        result
    }
}

/// One step: `(a·x + c) mod m`.
///
/// # Panics
///
/// Panics if `m == 0`. [`RecurrenceParams`] rules that out at construction.
#[inline]
pub fn step(a: u64, c: u64, m: u64, x: u64) -> u64 {
    ((a as u128 * x as u128 + c as u128) % m as u128) as u64
}

/// Value reached after `n` steps from `x0`. `n = 0` returns `x0` unchanged.
pub fn nth_value(a: u64, c: u64, m: u64, x0: u64, n: u64) -> Result<u64> {
    if m == 0 {
        return Err(LcgError::Domain("nth_value: modulus must be >= 1".into()));
    }
    Ok(nth_value_unchecked(a, c, m, x0, n))
}

pub(crate) fn nth_value_unchecked(a: u64, c: u64, m: u64, x0: u64, n: u64) -> u64 {
    if n == 0 {
        return x0;
    }
    if n < DIRECT_STEP_THRESHOLD {
        return (0..n).fold(x0, |x, _| step(a, c, m, x));
    }
    let (jump_a, jump_c) = jump_unchecked(a, c, m, n);
    step(jump_a, jump_c, m, x0)
}

/// Coefficients `(A, C)` such that `n` steps from any `x` equal
/// `(A·x + C) mod m`.
pub fn jump(a: u64, c: u64, m: u64, n: u64) -> Result<(u64, u64)> {
    if m == 0 {
        return Err(LcgError::Domain("jump: modulus must be >= 1".into()));
    }
    Ok(jump_unchecked(a, c, m, n))
}

fn jump_unchecked(a: u64, c: u64, m: u64, n: u64) -> (u64, u64) {
    let power = Matrix2x2::affine(a, c, m).pow(n, m);
    (power.m00, power.m01)
}

/// The recurrence as a lazy, infinite sequence.
///
/// Yields successive values after the seed; the consumer decides how many to
/// pull (`take`, `nth`, ...). Restart by constructing a new one.
#[derive(Debug, Clone)]
pub struct Lcg {
    params: RecurrenceParams,
    x: u64,
}

impl Lcg {
    pub fn new(params: RecurrenceParams, x0: u64) -> Self {
        Lcg { params, x: x0 }
    }

    /// The production generator from the given seed.
    pub fn production(x0: u64) -> Self {
        Lcg::new(RecurrenceParams::PRODUCTION, x0)
    }

    /// The most recently produced value (the seed before the first pull).
    pub fn state(&self) -> u64 {
        self.x
    }

    pub fn params(&self) -> RecurrenceParams {
        self.params
    }

    /// Skip `n` values in O(log n) and return the new state.
    pub fn advance(&mut self, n: u64) -> u64 {
        let RecurrenceParams { a, c, m } = self.params;
        self.x = nth_value_unchecked(a, c, m, self.x, n);
        self.x
    }
}

impl Iterator for Lcg {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.x = self.params.step(self.x);
        Some(self.x)
    }
}
