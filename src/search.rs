//! # Search — Randomized Hunt for Full-Period Parameters
//!
//! Proposes `(m, a, c)` triples near a target modulus that pass
//! [`check_full_period`]. This is a heuristic generator, not an exhaustive
//! search: each call draws from an explicit random source, so repeated
//! searches diversify and seeded searches are reproducible.
//!
//! ## Attempt loop
//!
//! Each attempt picks
//! - **m**: the k-th prime below the target, k uniform in `1..=max_prime_offset`,
//! - **a**: a multiplier from a curated list of literature constants,
//! - **c**: from one of four [`CStrategy`] magnitudes, rounded down to a prime,
//!   retried until coprime to m (falling back to `c = 1`),
//!
//! and returns the first triple whose verdict is full period. The number of
//! attempts shrinks with the target's magnitude tier, since each check on a
//! large modulus costs more trial division.
//!
//! Multipliers congruent to 0 or 1 mod m are skipped: the first is constant,
//! the second is the plainly predictable `x + c` walk.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arith::{find_nth_prime_below, gcd};
use crate::config::SearchConfig;
use crate::error::{LcgError, Result};
use crate::period::check_full_period;
use crate::RecurrenceParams;

/// 1.618, the golden ratio as used for increment scaling.
const GOLDEN_RATIO: f64 = 1.618;

/// How a candidate increment's magnitude is derived from m. Each magnitude is
/// also multiplied by a uniform scale in `[0.7, 1.2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CStrategy {
    /// Around m / 2.
    HalfModulus,
    /// Around m / φ.
    GoldenRatio,
    /// Around √m / 10.
    Low,
    /// Anywhere in `[0.7m, 1.2m)`, reduced mod m.
    Uniform,
}

impl CStrategy {
    pub const ALL: [CStrategy; 4] = [
        CStrategy::HalfModulus,
        CStrategy::GoldenRatio,
        CStrategy::Low,
        CStrategy::Uniform,
    ];

    /// Raw increment magnitude for modulus `m` at the given scale.
    pub fn magnitude(self, m: u64, scale: f64) -> u64 {
        let m = m as f64;
        match self {
            CStrategy::HalfModulus => (scale * m / 2.0).floor() as u64,
            CStrategy::GoldenRatio => (scale * m / GOLDEN_RATIO).floor() as u64,
            CStrategy::Low => (scale * m.sqrt() / 10.0).ceil() as u64,
            CStrategy::Uniform => (scale * m).floor() as u64,
        }
    }
}

/// Draw an increment coprime to `m`.
///
/// Magnitudes `<= 3` become 1; larger ones round down to the nearest prime
/// below. After `retries` failed draws the result is 1, which is coprime to
/// every modulus.
pub fn derive_increment<R: Rng>(
    m: u64,
    strategies: &[CStrategy],
    retries: u32,
    rng: &mut R,
) -> u64 {
    if m <= 1 || strategies.is_empty() {
        return 1 % m.max(1);
    }
    for _ in 0..retries {
        let strategy = strategies[rng.random_range(0..strategies.len())];
        let scale: f64 = rng.random_range(0.7..1.2);
        let raw = strategy.magnitude(m, scale);
        let c = if raw <= 3 {
            1
        } else {
            find_nth_prime_below(raw, 1).unwrap_or(1)
        } % m;
        if gcd(c, m) == 1 {
            return c;
        }
        debug!(m, c, ?strategy, "increment shares a factor with m, redrawing");
    }
    1
}

/// Search for a full-period triple with `m` below `target`.
///
/// Fails with `BelowMinimum` for targets under `config.minimum_target`, and
/// with `RangeExhausted` when every attempt in the tier's budget is rejected;
/// the caller should retry, possibly with a different target.
pub fn search_full_period_params<R: Rng>(
    target: u64,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<RecurrenceParams> {
    if target < config.minimum_target {
        return Err(LcgError::BelowMinimum {
            target,
            minimum: config.minimum_target,
        });
    }
    config.validate()?;

    let attempts = config.attempts_for(target);
    for attempt in 1..=attempts {
        let k = rng.random_range(1..=config.max_prime_offset);
        let m = match find_nth_prime_below(target, k) {
            Ok(m) => m,
            Err(_) => continue,
        };
        let a = config.multipliers[rng.random_range(0..config.multipliers.len())] % m;
        if a <= 1 {
            debug!(attempt, m, a, "degenerate multiplier for this modulus, skipping");
            continue;
        }
        let c = derive_increment(m, &config.strategies, config.c_retries, rng);

        let verdict = check_full_period(m, a, c);
        debug!(
            attempt,
            m,
            a,
            c,
            full_period = verdict.full_period,
            reason = %verdict.reason,
            "search candidate"
        );
        if verdict.full_period {
            info!(target, attempt, m, a, c, "found full-period parameters");
            return Ok(RecurrenceParams { a, c, m });
        }
    }

    warn!(target, attempts, "parameter search exhausted its attempt budget");
    Err(LcgError::RangeExhausted(format!(
        "no full-period parameters found below {} in {} attempts; try again with a different target",
        target, attempts
    )))
}
