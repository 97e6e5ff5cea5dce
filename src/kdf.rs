//! Hash algorithms, HMAC and PBKDF2.
//!
//! derive = PBKDF2-HMAC-<algorithm>(password, salt, iterations, output_bytes)
//! (RFC 2898; test vectors in RFC 6070).

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

use crate::error::CipherError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "sha1")]
    Sha1,
    #[default]
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha384")]
    Sha384,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha3-512")]
    Sha3_512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_512,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_256 => "sha3-256",
            HashAlgorithm::Sha3_512 => "sha3-512",
        }
    }

    /// Digest length in bytes.
    pub fn output_bytes(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = HashAlgorithm::ALL.iter().map(|a| a.name()).collect();
                CipherError::UnknownAlgorithm(format!(
                    "`{}` (supported: {})",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// HMAC
// ---------------------------------------------------------------------------

fn mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut m = <M as Mac>::new_from_slice(key)
        .map_err(|_| CipherError::InvalidConfig("hmac key rejected".into()))?;
    m.update(message);
    Ok(m.finalize().into_bytes().to_vec())
}

/// HMAC of `message` under `key`.
pub fn hmac_digest(
    algorithm: HashAlgorithm,
    message: &[u8],
    key: &[u8],
) -> Result<Vec<u8>, CipherError> {
    match algorithm {
        HashAlgorithm::Sha1 => mac::<Hmac<Sha1>>(key, message),
        HashAlgorithm::Sha256 => mac::<Hmac<Sha256>>(key, message),
        HashAlgorithm::Sha384 => mac::<Hmac<Sha384>>(key, message),
        HashAlgorithm::Sha512 => mac::<Hmac<Sha512>>(key, message),
        HashAlgorithm::Sha3_256 => mac::<Hmac<Sha3_256>>(key, message),
        HashAlgorithm::Sha3_512 => mac::<Hmac<Sha3_512>>(key, message),
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

pub trait Kdf: Send + Sync {
    fn derive(
        &self,
        algorithm: HashAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_bytes: usize,
    ) -> Result<Vec<u8>, CipherError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Pbkdf2;

impl Kdf for Pbkdf2 {
    fn derive(
        &self,
        algorithm: HashAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_bytes: usize,
    ) -> Result<Vec<u8>, CipherError> {
        if iterations == 0 || output_bytes == 0 {
            return Err(CipherError::InvalidConfig(
                "pbkdf2 needs at least one iteration and one output byte".into(),
            ));
        }

        let mut out = vec![0u8; output_bytes];
        match algorithm {
            HashAlgorithm::Sha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut out),
            HashAlgorithm::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out),
            HashAlgorithm::Sha384 => pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut out),
            HashAlgorithm::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out),
            HashAlgorithm::Sha3_256 => pbkdf2_hmac::<Sha3_256>(password, salt, iterations, &mut out),
            HashAlgorithm::Sha3_512 => pbkdf2_hmac::<Sha3_512>(password, salt, iterations, &mut out),
        }
        Ok(out)
    }
}
