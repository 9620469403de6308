//! # Encoder — Fixed-Width Ids over a Fixed Alphabet
//!
//! Renders a generated value as `width` base-N digits (N = alphabet size),
//! most significant first, zero-padded with the alphabet's first symbol.
//! With the default 52-symbol alphabet and width 5 the id space holds
//! 52^5 = 380,204,032 values, just above the production modulus 380,204,023,
//! so every value the production generator emits has exactly one id.
//!
//! The bijection depends on the alphabet having exactly the configured number
//! of distinct symbols; construction fails fast otherwise.

use std::collections::HashMap;

use crate::config::{DEFAULT_ALPHABET, DEFAULT_WIDTH};
use crate::error::{LcgError, Result};

#[derive(Debug, Clone)]
pub struct Encoder {
    symbols: Vec<char>,
    index: HashMap<char, u64>,
    width: u32,
    capacity: u64,
}

impl Encoder {
    /// Encoder with the default alphabet (52 symbols) and width 5.
    pub fn standard() -> Result<Self> {
        Encoder::with_size(DEFAULT_ALPHABET, 52, DEFAULT_WIDTH)
    }

    /// Validate `alphabet` against the expected `size` and build the encoder.
    pub fn with_size(alphabet: &str, size: u32, width: u32) -> Result<Self> {
        let symbols: Vec<char> = alphabet.chars().collect();
        if symbols.len() != size as usize {
            return Err(LcgError::Configuration(format!(
                "alphabet has {} symbols, expected {}",
                symbols.len(),
                size
            )));
        }
        if size < 2 {
            return Err(LcgError::Configuration(
                "alphabet needs at least 2 symbols".into(),
            ));
        }
        if width == 0 {
            return Err(LcgError::Configuration("width must be >= 1".into()));
        }
        let mut index = HashMap::with_capacity(symbols.len());
        for (digit, &symbol) in symbols.iter().enumerate() {
            if index.insert(symbol, digit as u64).is_some() {
                return Err(LcgError::Configuration(format!(
                    "alphabet repeats symbol {:?}",
                    symbol
                )));
            }
        }
        let capacity = (size as u64).checked_pow(width).ok_or_else(|| {
            LcgError::Configuration(format!("{}^{} overflows u64", size, width))
        })?;
        Ok(Encoder {
            symbols,
            index,
            width,
            capacity,
        })
    }

    /// Number of distinct ids: `size^width`.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Fail unless every residue mod `modulus` has an id.
    pub fn ensure_capacity(&self, modulus: u64) -> Result<()> {
        if modulus > self.capacity {
            return Err(LcgError::Configuration(format!(
                "modulus {} exceeds encoder capacity {} ({}^{})",
                modulus,
                self.capacity,
                self.symbols.len(),
                self.width
            )));
        }
        Ok(())
    }

    pub fn encode(&self, value: u64) -> Result<String> {
        if value >= self.capacity {
            return Err(LcgError::Domain(format!(
                "value {} outside encoder range [0, {})",
                value, self.capacity
            )));
        }
        let base = self.symbols.len() as u64;
        let mut rest = value;
        let mut digits = Vec::with_capacity(self.width as usize);
        for _ in 0..self.width {
            digits.push(self.symbols[(rest % base) as usize]);
            rest /= base;
        }
        Ok(digits.into_iter().rev().collect())
    }

    pub fn decode(&self, id: &str) -> Result<u64> {
        let base = self.symbols.len() as u64;
        let mut value = 0u64;
        let mut len = 0u32;
        for symbol in id.chars() {
            let digit = self
                .index
                .get(&symbol)
                .ok_or_else(|| LcgError::Domain(format!("symbol {:?} not in alphabet", symbol)))?;
            len += 1;
            if len > self.width {
                break;
            }
            value = value * base + digit;
        }
        if len != self.width {
            return Err(LcgError::Domain(format!(
                "id {:?} is not {} symbols wide",
                id, self.width
            )));
        }
        Ok(value)
    }
}
