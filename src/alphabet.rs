//! Ordered symbol sets used for positional notation.
//!
//! The index of a symbol is its digit value; the alphabet length is the radix.
//!
//! Master order (95 printable ASCII symbols):
//!   `0-9 a-z A-Z + / space ! " # $ % & ' ( ) * , - . : ; < = > ? @ [ \ ] ^ _ ` { | } ~`
//!
//! The order is fixed: prefixes of it define the generic radix alphabets, and
//! previously produced output only decodes against the same order.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::CipherError;

// ---------------------------------------------------------------------------
// Canonical symbol sets
// ---------------------------------------------------------------------------

/// All 95 printable ASCII characters in canonical order.
pub const MASTER_SYMBOLS: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/ !\"#$%&'()*,-.:;<=>?@[\\]^_`{|}~";

/// First 64 master symbols; covers every character standard base64 emits.
pub const BASE64_SYMBOLS: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

/// 52 symbols: no vowels and no `+` / `/`, so output cannot spell words.
pub const USER_SAFE_SYMBOLS: &str = "0123456789bcdfghjklmnpqrstvwxyzBCDFGHJKLMNPQRSTVWXYZ";

/// 21 visually unambiguous symbols (no 0/O or 1/l look-alikes).
pub const PRINTABLE_SYMBOLS: &str = "3467bcdfhjkmnpqrtvwxy";

/// Lowercase hexadecimal digits.
pub const HEX_SYMBOLS: &str = "0123456789abcdef";

/// Smallest and largest radix the generic conversion paths accept.
pub const MIN_RADIX: u32 = 2;
pub const MAX_RADIX: u32 = 95;

static MASTER: Lazy<Alphabet> = Lazy::new(|| Alphabet::from_canonical(MASTER_SYMBOLS));
static BASE64: Lazy<Alphabet> = Lazy::new(|| Alphabet::from_canonical(BASE64_SYMBOLS));
static USER_SAFE: Lazy<Alphabet> = Lazy::new(|| Alphabet::from_canonical(USER_SAFE_SYMBOLS));
static PRINTABLE: Lazy<Alphabet> = Lazy::new(|| Alphabet::from_canonical(PRINTABLE_SYMBOLS));
static HEX: Lazy<Alphabet> = Lazy::new(|| Alphabet::from_canonical(HEX_SYMBOLS));

// ---------------------------------------------------------------------------
// Alphabet
// ---------------------------------------------------------------------------

/// An ordered sequence of distinct symbols.
///
/// Invariants: at least two symbols, no duplicates.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
    index: HashMap<char, u32>,
}

impl Alphabet {
    /// Build an alphabet from its symbols, in digit order.
    pub fn new(symbols: &str) -> Result<Self, CipherError> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.len() < MIN_RADIX as usize {
            return Err(CipherError::InvalidAlphabet(format!(
                "needs at least {} symbols, got {}",
                MIN_RADIX,
                symbols.len()
            )));
        }
        if symbols.len() > u32::MAX as usize {
            return Err(CipherError::InvalidAlphabet("too many symbols".into()));
        }

        let mut index = HashMap::with_capacity(symbols.len());
        for (value, &symbol) in symbols.iter().enumerate() {
            if index.insert(symbol, value as u32).is_some() {
                return Err(CipherError::InvalidAlphabet(format!(
                    "duplicate symbol {:?}",
                    symbol
                )));
            }
        }

        Ok(Self { symbols, index })
    }

    // Only for the compile-time constants above, which are known to be valid.
    fn from_canonical(symbols: &str) -> Self {
        let symbols: Vec<char> = symbols.chars().collect();
        let index = symbols
            .iter()
            .enumerate()
            .map(|(value, &symbol)| (symbol, value as u32))
            .collect();
        Self { symbols, index }
    }

    pub fn master() -> &'static Alphabet {
        &MASTER
    }

    pub fn base64() -> &'static Alphabet {
        &BASE64
    }

    pub fn user_safe() -> &'static Alphabet {
        &USER_SAFE
    }

    pub fn printable() -> &'static Alphabet {
        &PRINTABLE
    }

    pub fn hex() -> &'static Alphabet {
        &HEX
    }

    /// Number of symbols, i.e. the radix this alphabet represents.
    pub fn radix(&self) -> u32 {
        self.symbols.len() as u32
    }

    /// The symbol with digit value zero (used for padding).
    pub fn zero(&self) -> char {
        self.symbols[0]
    }

    /// Digit value of `symbol`, if it belongs to this alphabet.
    pub fn digit(&self, symbol: char) -> Option<u32> {
        self.index.get(&symbol).copied()
    }

    /// Symbol for digit value `digit`, if it is below the radix.
    pub fn symbol(&self, digit: u32) -> Option<char> {
        self.symbols.get(digit as usize).copied()
    }

    /// The first `radix` symbols as a new alphabet.
    pub fn prefix(&self, radix: u32) -> Result<Alphabet, CipherError> {
        if radix < MIN_RADIX || radix > self.radix() {
            return Err(CipherError::InvalidRadix(radix));
        }
        if radix == self.radix() {
            return Ok(self.clone());
        }
        let symbols: String = self.symbols[..radix as usize].iter().collect();
        Alphabet::new(&symbols)
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: String = self.symbols.iter().collect();
        f.debug_struct("Alphabet")
            .field("radix", &self.radix())
            .field("symbols", &symbols)
            .finish()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Alphabet {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Alphabet::new(s)
    }
}
