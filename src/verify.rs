//! # Verify — Brute-Force Oracle for the Full-Period Test
//!
//! Walks a recurrence until it repeats and compares the observed cycle with
//! what [`check_full_period`] predicted. This is the ground truth the analytic
//! test is validated against, so it is deliberately naive: a `HashSet` of
//! visited residues, O(m) time and memory. Only use it on small moduli; it is
//! never on the id-generation path.
//!
//! ## Agreement
//!
//! A triple *agrees* when
//! - the verdict is full and the walk from 0 visits exactly
//!   [`PeriodVerdict::cycle_length`] residues, or
//! - the verdict is short, the walk visits fewer than m residues, and the
//!   cycle it lands on is shorter than the longest cycle the modulus admits
//!   for that multiplier (m, or m − 1 for a prime modulus with `a ≢ 1`).
//!   The cycle is measured without the lead-in from 0, which matters for
//!   `a ≡ 0`: every walk there settles on c after one step, so only the
//!   residue count separates full from short.
//!
//! [`sweep`] runs cross-checks over a parameter grid on the rayon pool and
//! tallies the four prediction/observation outcomes.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::arith::is_prime;
use crate::error::{LcgError, Result};
use crate::fast_forward::step;
use crate::period::{check_full_period, PeriodVerdict};
use crate::RecurrenceParams;

/// Shape of a walk from one seed until the first repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    /// Distinct residues visited, the seed included.
    pub distinct: u64,
    /// Length of the cycle the walk closes into.
    pub cycle: u64,
}

/// Walk from `x0` (reduced first) until a residue repeats.
pub fn walk(m: u64, a: u64, c: u64, x0: u64) -> Result<Walk> {
    if m == 0 {
        return Err(LcgError::Domain("walk: modulus must be >= 1".into()));
    }
    let mut first_seen: HashMap<u64, u64> = HashMap::new();
    let mut x = x0 % m;
    let mut index = 0u64;
    while let Entry::Vacant(slot) = first_seen.entry(x) {
        slot.insert(index);
        index += 1;
        x = step(a, c, m, x);
    }
    let cycle_start = first_seen.get(&x).copied().unwrap_or(0);
    Ok(Walk {
        distinct: index,
        cycle: index - cycle_start,
    })
}

/// Number of distinct residues visited from `x0` before the first repeat,
/// counting `x0` itself. A seed `>= m` is reduced first.
pub fn run_to_completion(m: u64, a: u64, c: u64, x0: u64) -> Result<u64> {
    if m == 0 {
        return Err(LcgError::Domain("run_to_completion: modulus must be >= 1".into()));
    }
    Ok(walk(m, a, c, x0)?.distinct)
}

/// Longest cycle reachable for this modulus and multiplier: m − 1 when m is
/// prime and the map has a fixed point, m otherwise.
pub fn longest_possible_cycle(m: u64, a: u64) -> u64 {
    if is_prime(m) && a % m != 1 {
        m - 1
    } else {
        m
    }
}

/// Prediction versus observation for one triple, walking from seed 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCheck {
    pub params: RecurrenceParams,
    pub verdict: PeriodVerdict,
    /// Distinct residues visited from 0.
    pub observed: u64,
    /// Length of the cycle the walk from 0 closes into.
    pub cycle: u64,
    /// Cycle length a full verdict promises; `None` for short verdicts.
    pub expected: Option<u64>,
    pub agrees: bool,
}

pub fn cross_check(m: u64, a: u64, c: u64) -> Result<CrossCheck> {
    let params = RecurrenceParams::new(a, c, m)?;
    let verdict = check_full_period(m, a, c);
    let Walk {
        distinct: observed,
        cycle,
    } = walk(m, a, c, 0)?;
    let expected = verdict.cycle_length(m);
    let agrees = match expected {
        Some(length) => observed == length,
        // Constant maps always close into a 1-cycle
        None => observed < m && (a % m == 0 || cycle < longest_possible_cycle(m, a)),
    };
    Ok(CrossCheck {
        params,
        verdict,
        observed,
        cycle,
        expected,
        agrees,
    })
}

/// Tally of a sweep, split by predicted outcome and agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub checked: u64,
    pub predicted_full_agree: u64,
    pub predicted_short_agree: u64,
    pub predicted_full_disagree: u64,
    pub predicted_short_disagree: u64,
    pub disagreements: Vec<CrossCheck>,
}

impl SweepSummary {
    fn record(mut self, check: CrossCheck) -> Self {
        self.checked += 1;
        match (check.verdict.full_period, check.agrees) {
            (true, true) => self.predicted_full_agree += 1,
            (false, true) => self.predicted_short_agree += 1,
            (true, false) => self.predicted_full_disagree += 1,
            (false, false) => self.predicted_short_disagree += 1,
        }
        if !check.agrees {
            self.disagreements.push(check);
        }
        self
    }

    fn merge(mut self, other: SweepSummary) -> Self {
        self.checked += other.checked;
        self.predicted_full_agree += other.predicted_full_agree;
        self.predicted_short_agree += other.predicted_short_agree;
        self.predicted_full_disagree += other.predicted_full_disagree;
        self.predicted_short_disagree += other.predicted_short_disagree;
        self.disagreements.extend(other.disagreements);
        self
    }

    /// Disagreements ordered by `(m, a, c)`; parallel reduction order is arbitrary.
    fn sorted(mut self) -> Self {
        self.disagreements
            .sort_by_key(|d| (d.params.m, d.params.a, d.params.c));
        self
    }

    pub fn all_agree(&self) -> bool {
        self.disagreements.is_empty()
    }
}

/// Cross-check every `(m, a, c)` in `moduli × multipliers × increments`.
pub fn sweep(moduli: &[u64], multipliers: &[u64], increments: &[u64]) -> Result<SweepSummary> {
    let triples: Vec<RecurrenceParams> = moduli
        .iter()
        .flat_map(|&m| {
            multipliers.iter().flat_map(move |&a| {
                increments
                    .iter()
                    .map(move |&c| RecurrenceParams { a, c, m })
            })
        })
        .collect();
    sweep_triples(&triples)
}

/// Every multiplier `0..m` for each modulus, against each increment.
pub fn dense_triples(moduli: &[u64], increments: &[u64]) -> Vec<RecurrenceParams> {
    moduli
        .iter()
        .flat_map(|&m| {
            (0..m).flat_map(move |a| {
                increments
                    .iter()
                    .map(move |&c| RecurrenceParams { a, c, m })
            })
        })
        .collect()
}

/// Cross-check an explicit list of triples in parallel.
pub fn sweep_triples(triples: &[RecurrenceParams]) -> Result<SweepSummary> {
    if let Some(bad) = triples.iter().find(|p| p.m == 0) {
        return Err(LcgError::Domain(format!(
            "sweep: modulus must be >= 1 (a={}, c={})",
            bad.a, bad.c
        )));
    }

    let summary = triples
        .par_iter()
        .map(|p| cross_check(p.m, p.a, p.c))
        .try_fold(SweepSummary::default, |acc, check| {
            check.map(|check| acc.record(check))
        })
        .try_reduce(SweepSummary::default, |a, b| Ok(a.merge(b)))?
        .sorted();

    for d in &summary.disagreements {
        warn!(
            m = d.params.m,
            a = d.params.a,
            c = d.params.c,
            observed = d.observed,
            cycle = d.cycle,
            verdict = %d.verdict,
            "analytic verdict disagrees with brute force"
        );
    }
    info!(
        checked = summary.checked,
        full_agree = summary.predicted_full_agree,
        short_agree = summary.predicted_short_agree,
        full_disagree = summary.predicted_full_disagree,
        short_disagree = summary.predicted_short_disagree,
        "sweep complete"
    );
    Ok(summary)
}
