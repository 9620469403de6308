//! # Counter — Named Sequences and the Id Generation Flow
//!
//! A named sequence stores its recurrence parameters, its seed, and the last
//! value it issued together with that value's index. Issuing the next id is a
//! read, one [`step`], an encode, and a compare-and-set on the index:
//!
//! ```text
//! read(name) -> {params, last_value, last_index}
//! value = step(last_value)
//! atomic_advance(name, expected = last_index, value, last_index + 1)
//!     Ok       -> return encode(value)
//!     Conflict -> another writer won, start over
//! ```
//!
//! Persistence is out of scope: [`CounterStore`] is the contract a datastore
//! adapter implements, and [`MemoryCounterStore`] is the in-process reference
//! implementation used by the CLI and tests.
//!
//! Because index n always holds `nth_value(seed, n)`, any issued id can be
//! recomputed from the stored seed in O(log n) with [`IdGenerator::nth_id`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::encoder::Encoder;
use crate::error::{LcgError, Result};
use crate::fast_forward::{nth_value, step};
use crate::RecurrenceParams;

/// Default number of optimistic retries before `next_id` gives up.
pub const DEFAULT_MAX_RETRIES: u32 = 64;

/// Stored form of one named sequence. Index 0 is the seed itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub params: RecurrenceParams,
    pub seed: u64,
    pub last_value: u64,
    pub last_index: u64,
}

/// Outcome of a compare-and-set advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Ok,
    /// The stored index no longer matched the expected one.
    Conflict,
}

/// Persistence contract for named sequences.
///
/// `atomic_advance` must succeed only if the stored `last_index` still equals
/// `expected_index` at the moment of the write; that check is what keeps ids
/// unique under concurrent writers.
pub trait CounterStore: Send + Sync {
    fn read(&self, name: &str) -> Result<CounterState>;

    fn atomic_advance(
        &self,
        name: &str,
        expected_index: u64,
        new_value: u64,
        new_index: u64,
    ) -> Result<Advance>;

    /// Create `name` at index 0 with seed `x0` unless it already exists.
    /// Returns the stored state either way.
    fn init(&self, name: &str, params: RecurrenceParams, x0: u64) -> Result<CounterState>;
}

/// Lock a mutex, recovering from poisoning.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`CounterStore`] behind a single mutex.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    sequences: Mutex<HashMap<String, CounterState>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.sequences).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CounterStore for MemoryCounterStore {
    fn read(&self, name: &str) -> Result<CounterState> {
        lock_or_recover(&self.sequences)
            .get(name)
            .copied()
            .ok_or_else(|| LcgError::UnknownSequence(name.to_string()))
    }

    fn atomic_advance(
        &self,
        name: &str,
        expected_index: u64,
        new_value: u64,
        new_index: u64,
    ) -> Result<Advance> {
        let mut sequences = lock_or_recover(&self.sequences);
        let state = sequences
            .get_mut(name)
            .ok_or_else(|| LcgError::UnknownSequence(name.to_string()))?;
        if state.last_index != expected_index {
            return Ok(Advance::Conflict);
        }
        state.last_value = new_value;
        state.last_index = new_index;
        Ok(Advance::Ok)
    }

    fn init(&self, name: &str, params: RecurrenceParams, x0: u64) -> Result<CounterState> {
        let mut sequences = lock_or_recover(&self.sequences);
        let state = sequences.entry(name.to_string()).or_insert(CounterState {
            params,
            seed: x0,
            last_value: x0,
            last_index: 0,
        });
        Ok(*state)
    }
}

/// One issued id with the index and raw value behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedId {
    pub index: u64,
    pub value: u64,
    pub id: String,
}

impl std::fmt::Display for IssuedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Issues encoded ids from named sequences in a [`CounterStore`].
pub struct IdGenerator<S: CounterStore> {
    store: S,
    encoder: Encoder,
    max_retries: u32,
}

impl<S: CounterStore> IdGenerator<S> {
    pub fn new(store: S, encoder: Encoder) -> Self {
        IdGenerator {
            store,
            encoder,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Register `name` with an explicit seed. The modulus must fit the
    /// encoder, otherwise two residues could share an id.
    pub fn init(&self, name: &str, params: RecurrenceParams, x0: u64) -> Result<CounterState> {
        let params = RecurrenceParams::new(params.a, params.c, params.m)?;
        self.encoder.ensure_capacity(params.m)?;
        let state = self.store.init(name, params, x0 % params.m)?;
        if state.params != params {
            warn!(
                sequence = name,
                stored = %state.params,
                requested = %params,
                "sequence already exists with different parameters"
            );
        }
        Ok(state)
    }

    /// Register `name` with a seed drawn uniformly from `[0, m)`.
    pub fn init_random<R: Rng>(
        &self,
        name: &str,
        params: RecurrenceParams,
        rng: &mut R,
    ) -> Result<CounterState> {
        if params.m == 0 {
            return Err(LcgError::Domain("modulus must be >= 1".into()));
        }
        let seed = rng.random_range(0..params.m);
        self.init(name, params, seed)
    }

    /// Register `name` on the production generator with a random seed.
    pub fn init_production<R: Rng>(&self, name: &str, rng: &mut R) -> Result<CounterState> {
        self.init_random(name, RecurrenceParams::PRODUCTION, rng)
    }

    /// Issue the next id of `name`, retrying on concurrent advances.
    pub fn next_id(&self, name: &str) -> Result<IssuedId> {
        for attempt in 0..=self.max_retries {
            let state = self.store.read(name)?;
            self.encoder.ensure_capacity(state.params.m)?;

            let RecurrenceParams { a, c, m } = state.params;
            if m == 0 {
                return Err(LcgError::Domain(format!("sequence {}: modulus is 0", name)));
            }
            let value = step(a, c, m, state.last_value);
            let index = state.last_index + 1;
            let id = self.encoder.encode(value)?;

            match self
                .store
                .atomic_advance(name, state.last_index, value, index)?
            {
                Advance::Ok => {
                    debug!(sequence = name, index, value, %id, "issued id");
                    return Ok(IssuedId { index, value, id });
                }
                Advance::Conflict => {
                    debug!(
                        sequence = name,
                        attempt,
                        expected = state.last_index,
                        "advance conflict, retrying"
                    );
                }
            }
        }
        warn!(sequence = name, retries = self.max_retries, "id advance kept conflicting");
        Err(LcgError::RangeExhausted(format!(
            "sequence {}: {} concurrent-advance retries exhausted",
            name, self.max_retries
        )))
    }

    /// The id at index `n` (0 is the seed), computed from the stored seed
    /// without touching the counter.
    pub fn nth_id(&self, name: &str, n: u64) -> Result<IssuedId> {
        let state = self.store.read(name)?;
        self.encoder.ensure_capacity(state.params.m)?;
        let RecurrenceParams { a, c, m } = state.params;
        let value = nth_value(a, c, m, state.seed, n)?;
        let id = self.encoder.encode(value)?;
        Ok(IssuedId { index: n, value, id })
    }

    /// Issue `count` consecutive ids of `name`.
    pub fn take_ids(&self, name: &str, count: usize) -> Result<Vec<IssuedId>> {
        let ids = (0..count)
            .map(|_| self.next_id(name))
            .collect::<Result<Vec<_>>>()?;
        if let Some(last) = ids.last() {
            info!(sequence = name, count, last_index = last.index, "issued ids");
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn production_generator() -> IdGenerator<MemoryCounterStore> {
        IdGenerator::new(MemoryCounterStore::new(), Encoder::standard().unwrap())
    }

    /// Reports `Conflict` for the first `conflicts` advances, then delegates.
    struct ContendedStore {
        inner: MemoryCounterStore,
        conflicts: AtomicU32,
    }

    impl CounterStore for ContendedStore {
        fn read(&self, name: &str) -> Result<CounterState> {
            self.inner.read(name)
        }

        fn atomic_advance(
            &self,
            name: &str,
            expected_index: u64,
            new_value: u64,
            new_index: u64,
        ) -> Result<Advance> {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Ok(Advance::Conflict);
            }
            self.inner
                .atomic_advance(name, expected_index, new_value, new_index)
        }

        fn init(&self, name: &str, params: RecurrenceParams, x0: u64) -> Result<CounterState> {
            self.inner.init(name, params, x0)
        }
    }

    fn contended(conflicts: u32) -> IdGenerator<ContendedStore> {
        IdGenerator::new(
            ContendedStore {
                inner: MemoryCounterStore::new(),
                conflicts: AtomicU32::new(conflicts),
            },
            Encoder::standard().unwrap(),
        )
    }

    // ── Store contract ─────────────────────────────────────────────────

    #[test]
    fn unknown_sequence_is_reported() {
        let store = MemoryCounterStore::new();
        assert_eq!(
            store.read("orders"),
            Err(LcgError::UnknownSequence("orders".into()))
        );
        assert!(matches!(
            store.atomic_advance("orders", 0, 1, 1),
            Err(LcgError::UnknownSequence(_))
        ));
    }

    #[test]
    fn advance_requires_expected_index() {
        let store = MemoryCounterStore::new();
        store.init("s", RecurrenceParams::PRODUCTION, 5).unwrap();
        assert_eq!(store.atomic_advance("s", 3, 99, 4).unwrap(), Advance::Conflict);
        assert_eq!(store.read("s").unwrap().last_index, 0);
        assert_eq!(store.atomic_advance("s", 0, 99, 1).unwrap(), Advance::Ok);
        let state = store.read("s").unwrap();
        assert_eq!((state.last_value, state.last_index, state.seed), (99, 1, 5));
    }

    #[test]
    fn init_keeps_existing_sequence() {
        let store = MemoryCounterStore::new();
        store.init("s", RecurrenceParams::PRODUCTION, 5).unwrap();
        store.atomic_advance("s", 0, 345_346, 1).unwrap();
        let again = store.init("s", RecurrenceParams::PRODUCTION, 77).unwrap();
        assert_eq!(again.seed, 5);
        assert_eq!(again.last_index, 1);
        assert_eq!(store.len(), 1);
    }

    // ── Id generation ──────────────────────────────────────────────────

    #[test]
    fn next_id_follows_the_recurrence() {
        let generator = production_generator();
        generator
            .init("s", RecurrenceParams::PRODUCTION, 0)
            .unwrap();
        let ids = generator.take_ids("s", 3).unwrap();
        let values: Vec<u64> = ids.iter().map(|i| i.value).collect();
        assert_eq!(values, vec![1, 69070, 208_147_555]);
        assert_eq!(ids[0].id, "UUUUK");
        assert_eq!(ids[2].index, 3);
        for issued in &ids {
            assert_eq!(generator.encoder().decode(&issued.id).unwrap(), issued.value);
        }
    }

    #[test]
    fn nth_id_matches_issued_ids() {
        let generator = production_generator();
        let mut rng = StdRng::seed_from_u64(7);
        let state = generator.init_production("orders", &mut rng).unwrap();
        assert!(state.seed < RecurrenceParams::PRODUCTION.m);

        let issued = generator.take_ids("orders", 50).unwrap();
        for (k, id) in issued.iter().enumerate() {
            assert_eq!(&generator.nth_id("orders", k as u64 + 1).unwrap(), id);
        }
        assert_eq!(generator.nth_id("orders", 0).unwrap().value, state.seed);
        // nth_id does not advance the counter
        assert_eq!(generator.store().read("orders").unwrap().last_index, 50);
    }

    #[test]
    fn next_id_unknown_sequence() {
        let generator = production_generator();
        assert!(matches!(
            generator.next_id("missing"),
            Err(LcgError::UnknownSequence(_))
        ));
    }

    #[test]
    fn modulus_beyond_encoder_capacity_is_rejected() {
        let generator = production_generator();
        let too_big = RecurrenceParams::new(69069, 1, 380_204_033).unwrap();
        assert!(matches!(
            generator.init("s", too_big, 0),
            Err(LcgError::Configuration(_))
        ));
        // also caught when the store was populated behind the generator's back
        generator.store().init("raw", too_big, 0).unwrap();
        assert!(matches!(
            generator.next_id("raw"),
            Err(LcgError::Configuration(_))
        ));
    }

    #[test]
    fn seed_is_reduced_into_range() {
        let generator = production_generator();
        let params = RecurrenceParams::new(5, 3, 16).unwrap();
        let state = generator.init("small", params, 16 * 3 + 2).unwrap();
        assert_eq!(state.seed, 2);
    }

    /// A full-period modulus never repeats an id within one cycle.
    #[test]
    fn ids_unique_over_full_cycle() {
        let generator = production_generator();
        let params = RecurrenceParams::new(5, 3, 1 << 12).unwrap();
        generator.init("small", params, 0).unwrap();
        let ids = generator.take_ids("small", 1 << 12).unwrap();
        let distinct: HashSet<&str> = ids.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(distinct.len(), 1 << 12);
        // and wraps back to the seed
        assert_eq!(ids.last().unwrap().value, 0);
    }

    #[test]
    fn conflicts_are_retried() {
        let generator = contended(3);
        generator
            .init("s", RecurrenceParams::PRODUCTION, 0)
            .unwrap();
        let issued = generator.next_id("s").unwrap();
        assert_eq!(issued.index, 1);
        assert_eq!(issued.value, 1);
    }

    #[test]
    fn exhausted_retries_are_range_exhausted() {
        let generator = contended(10).with_max_retries(4);
        generator
            .init("s", RecurrenceParams::PRODUCTION, 0)
            .unwrap();
        assert!(matches!(
            generator.next_id("s"),
            Err(LcgError::RangeExhausted(_))
        ));
        assert_eq!(generator.store().read("s").unwrap().last_index, 0);
    }

    /// Many writers on one sequence: every id issued exactly once, and the
    /// final index equals the number of ids handed out.
    #[test]
    fn concurrent_writers_never_duplicate() {
        let generator = Arc::new(production_generator().with_max_retries(100_000));
        generator
            .init("shared", RecurrenceParams::PRODUCTION, 12345)
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| generator.next_id("shared").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut indices = HashSet::new();
        let mut ids = HashSet::new();
        for handle in handles {
            for issued in handle.join().unwrap() {
                assert!(indices.insert(issued.index), "index {} issued twice", issued.index);
                assert!(ids.insert(issued.id), "duplicate id");
            }
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(indices, (1..=2000).collect::<HashSet<u64>>());
        assert_eq!(generator.store().read("shared").unwrap().last_index, 2000);
    }
}
