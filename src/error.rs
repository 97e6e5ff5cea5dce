//! Error types for Citadel Cipher.

use std::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Radix outside the supported range.
    InvalidRadix(u32),
    /// Symbol absent from the source alphabet.
    InvalidDigit { symbol: char, position: usize },
    /// Alphabet too short or containing duplicate symbols.
    InvalidAlphabet(String),
    /// Hash / KDF algorithm name not supported.
    UnknownAlgorithm(String),
    /// Named base selector with no registered codec (strict policy only).
    CodecNotFound(String),
    /// Configuration rejected at build time.
    InvalidConfig(String),
    /// Password salt of the wrong shape.
    InvalidSalt,
    /// Text could not be decoded back into bytes.
    Decoding(String),
    /// Cipher primitive refused to encrypt.
    Encryption,
    /// Cipher primitive refused to decrypt.
    Decryption,
    /// The secure random source failed.
    Random,
    PresetNotFound(String),
    Storage(String),
}

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRadix(radix) => {
                write!(f, "invalid radix {}: bases must be between 2 and 95", radix)
            }
            Self::InvalidDigit { symbol, position } => {
                write!(f, "invalid digit {:?} at position {}", symbol, position)
            }
            Self::InvalidAlphabet(msg) => write!(f, "invalid alphabet: {}", msg),
            Self::UnknownAlgorithm(name) => write!(f, "unknown algorithm: {}", name),
            Self::CodecNotFound(key) => write!(f, "no codec registered for base `{}`", key),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::InvalidSalt => write!(f, "invalid salt"),
            Self::Decoding(msg) => write!(f, "decoding failed: {}", msg),
            Self::Encryption => write!(f, "encryption failed"),
            Self::Decryption => write!(f, "decryption failed"),
            Self::Random => write!(f, "secure random source unavailable"),
            Self::PresetNotFound(name) => write!(f, "preset not found: {}", name),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for CipherError {}

impl From<base64::DecodeError> for CipherError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decoding(format!("base64: {}", e))
    }
}

impl From<hex::FromHexError> for CipherError {
    fn from(e: hex::FromHexError) -> Self {
        Self::Decoding(format!("hex: {}", e))
    }
}

impl From<std::str::Utf8Error> for CipherError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Decoding(format!("utf-8: {}", e))
    }
}
