//! Secure random bytes for IVs and salts.

use crate::alphabet::Alphabet;
use crate::error::CipherError;
use crate::mapper;

pub trait SecureRandom: Send + Sync {
    /// Return `n` bytes from a cryptographically secure source.
    fn bytes(&self, n: usize) -> Result<Vec<u8>, CipherError>;
}

/// The operating system's CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn bytes(&self, n: usize) -> Result<Vec<u8>, CipherError> {
        let mut out = vec![0u8; n];
        getrandom::getrandom(&mut out).map_err(|_| CipherError::Random)?;
        Ok(out)
    }
}

/// `bytes` random bytes, hex-encoded (so `2 * bytes` characters).
pub fn random_hex(bytes: usize) -> Result<String, CipherError> {
    Ok(hex::encode(OsRandom.bytes(bytes)?))
}

/// A random token of `bytes` bytes rendered in the 52-symbol user-safe
/// alphabet (no vowels, no symbols).
pub fn slug(bytes: usize) -> Result<String, CipherError> {
    mapper::convert(&random_hex(bytes)?, Alphabet::hex(), Alphabet::user_safe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::USER_SAFE_SYMBOLS;

    #[test]
    fn os_random_has_requested_length() {
        assert_eq!(OsRandom.bytes(0).unwrap().len(), 0);
        assert_eq!(OsRandom.bytes(33).unwrap().len(), 33);
    }

    #[test]
    fn os_random_is_not_constant() {
        assert_ne!(OsRandom.bytes(32).unwrap(), OsRandom.bytes(32).unwrap());
    }

    #[test]
    fn random_hex_length() {
        let h = random_hex(16).unwrap();
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn slug_is_user_safe() {
        let s = slug(16).unwrap();
        assert!(!s.is_empty());
        assert!(s.chars().all(|c| USER_SAFE_SYMBOLS.contains(c)));
    }
}
