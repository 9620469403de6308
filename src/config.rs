//! # Config — TOML Tuning for Search and Encoding
//!
//! Every knob here is a heuristic default from empirical use, not a derived
//! constant, so it lives in configuration rather than code. A config file
//! only needs the sections it overrides:
//!
//! ```toml
//! [search]
//! c_retries = 50
//! multipliers = [69069, 48271]
//!
//! [[search.tiers]]
//! below = 1_000_000
//! attempts = 500
//!
//! [encoder]
//! width = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoder::Encoder;
use crate::error::{LcgError, Result};
use crate::search::CStrategy;

/// Multipliers from the standard PRNG literature.
pub const DEFAULT_MULTIPLIERS: [u64; 11] = [
    16807,      // 7^5, Park–Miller minimal standard
    48271,      // Park–Miller revised minimal standard
    1664525,    // Numerical Recipes
    1103515245, // glibc rand()
    69069,      // Marsaglia, Super-Duper
    214013,     // Microsoft Visual C/C++
    22695477,   // Borland C/C++
    630360016,  // L'Ecuyer tables
    1366,
    30345,
    741103597,
];

/// Default 52-symbol alphabet: ASCII letters and digits with the visually
/// ambiguous `0 O 1 l I o 8 B r S` removed, in a fixed shuffled order.
pub const DEFAULT_ALPHABET: &str = "UK6yLActuMXQDeszV5aYkEiw4pfZJmgPbWN2Gh9qj3nR7vTdFCxH";

pub const DEFAULT_WIDTH: u32 = 5;

/// Attempt budget for targets strictly below `below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptTier {
    pub below: u64,
    pub attempts: u32,
}

/// The `[search]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Targets below this are rejected outright.
    pub minimum_target: u64,
    /// The tier with the smallest `below` above the target wins, in any order.
    pub tiers: Vec<AttemptTier>,
    /// Budget for targets above every tier.
    pub default_attempts: u32,
    /// m is the k-th prime below the target with k drawn from `1..=max_prime_offset`.
    pub max_prime_offset: u32,
    /// Draws per attempt before c falls back to 1.
    pub c_retries: u32,
    pub multipliers: Vec<u64>,
    /// Increment strategies drawn from uniformly.
    pub strategies: Vec<CStrategy>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            minimum_target: 1000,
            // Small moduli are cheap to check, so they get more tries
            tiers: vec![
                AttemptTier {
                    below: 1_000_000,
                    attempts: 250,
                },
                AttemptTier {
                    below: 1_000_000_000,
                    attempts: 20,
                },
            ],
            default_attempts: 10,
            max_prime_offset: 10,
            c_retries: 100,
            multipliers: DEFAULT_MULTIPLIERS.to_vec(),
            strategies: CStrategy::ALL.to_vec(),
        }
    }
}

impl SearchConfig {
    /// Attempt budget for a target modulus.
    pub fn attempts_for(&self, target: u64) -> u32 {
        self.tiers
            .iter()
            .filter(|t| target < t.below)
            .min_by_key(|t| t.below)
            .map_or(self.default_attempts, |t| t.attempts)
    }

    pub fn validate(&self) -> Result<()> {
        if self.multipliers.is_empty() {
            return Err(LcgError::Configuration(
                "search.multipliers must not be empty".into(),
            ));
        }
        if self.strategies.is_empty() {
            return Err(LcgError::Configuration(
                "search.strategies must not be empty".into(),
            ));
        }
        if self.max_prime_offset == 0 {
            return Err(LcgError::Configuration(
                "search.max_prime_offset must be >= 1".into(),
            ));
        }
        if self.minimum_target < 3 {
            return Err(LcgError::Configuration(
                "search.minimum_target must be >= 3 so a prime lies below it".into(),
            ));
        }
        Ok(())
    }
}

/// The `[encoder]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub alphabet: String,
    /// Expected number of symbols; a mismatch with `alphabet` is an error.
    pub alphabet_size: u32,
    pub width: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            alphabet: DEFAULT_ALPHABET.to_string(),
            alphabet_size: 52,
            width: DEFAULT_WIDTH,
        }
    }
}

impl EncoderConfig {
    pub fn build(&self) -> Result<Encoder> {
        Encoder::with_size(&self.alphabet, self.alphabet_size, self.width)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub search: SearchConfig,
    pub encoder: EncoderConfig,
}

/// Parse and validate a configuration from a TOML string.
pub fn parse_toml(content: &str) -> Result<ForgeConfig> {
    let config: ForgeConfig =
        toml::from_str(content).map_err(|e| LcgError::Configuration(e.to_string()))?;
    config.search.validate()?;
    config.encoder.build()?;
    Ok(config)
}

/// Parse and validate a configuration from a TOML file path.
pub fn parse_toml_file(path: &Path) -> Result<ForgeConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LcgError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_toml(&content)
}
