pub mod arith;
pub mod config;
pub mod counter;
pub mod encoder;
pub mod error;
pub mod fast_forward;
pub mod period;
pub mod search;
pub mod verify;

pub use error::{LcgError, Result};

use serde::{Deserialize, Serialize};

/// Parameters of the recurrence `x' = (a·x + c) mod m`.
///
/// `a` and `c` may exceed `m`; every consumer reduces them. The only hard
/// invariant is `m >= 1`, enforced by [`RecurrenceParams::new`]. A struct
/// literal skips that check, and [`step`](Self::step), [`nth`](Self::nth)
/// and [`verdict`](Self::verdict) panic on a zero modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurrenceParams {
    pub a: u64,
    pub c: u64,
    pub m: u64,
}

impl RecurrenceParams {
    /// The production id generator: prime modulus 380204023, which fits in
    /// five symbols of a 52-letter alphabet (52^5 = 380204032), with the
    /// Super-Duper multiplier 69069 as a primitive root.
    pub const PRODUCTION: RecurrenceParams = RecurrenceParams {
        a: 69069,
        c: 1,
        m: 380_204_023,
    };

    pub fn new(a: u64, c: u64, m: u64) -> Result<Self> {
        if m == 0 {
            return Err(LcgError::Domain("modulus must be >= 1".into()));
        }
        Ok(RecurrenceParams { a, c, m })
    }

    /// Single step from `x`.
    ///
    /// # Panics
    ///
    /// Panics if `m == 0`.
    pub fn step(&self, x: u64) -> u64 {
        fast_forward::step(self.a, self.c, self.m, x)
    }

    /// Value after `n` steps from `x0`.
    ///
    /// # Panics
    ///
    /// Panics if `m == 0`.
    pub fn nth(&self, x0: u64, n: u64) -> u64 {
        fast_forward::nth_value_unchecked(self.a, self.c, self.m, x0, n)
    }

    /// # Panics
    ///
    /// Panics if `m == 0`.
    pub fn verdict(&self) -> period::PeriodVerdict {
        period::check_full_period(self.m, self.a, self.c)
    }
}

impl std::fmt::Display for RecurrenceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x' = ({} * x + {}) mod {}", self.a, self.c, self.m)
    }
}

/// The `n`-th production value from seed 0.
pub fn production_nth(n: u64) -> u64 {
    RecurrenceParams::PRODUCTION.nth(0, n)
}
