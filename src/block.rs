//! Block cipher primitive: AES-128/192/256 in ECB, CBC, CFB, OFB or GCM.
//!
//! The engine talks to the primitive only through [`BlockCipher`], so the
//! cipher can be swapped (or stubbed in tests) without touching the
//! padding / IV / base-encoding pipeline.
//!
//! Sizes:
//!   key = 16 / 24 / 32 bytes (AES-128 / 192 / 256)
//!   iv  = 0 (ECB), 16 (CBC, CFB, OFB), 12 (GCM)
//!
//! ECB and CBC zero-pad the plaintext up to the 16-byte block size; the
//! other modes leave its length alone.

use std::fmt;
use std::str::FromStr;

use aes::cipher::{
    block_padding::NoPadding, AsyncStreamCipher, BlockDecryptMut, BlockEncryptMut, KeyInit,
    KeyIvInit, StreamCipher,
};
use aes_gcm::aead::{consts::U12, Aead};
use aes_gcm::{AesGcm, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CipherError;

pub const BLOCK_BYTES: usize = 16;
pub const GCM_NONCE_BYTES: usize = 12;

// ---------------------------------------------------------------------------
// Cipher / mode identifiers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl CipherAlgorithm {
    pub fn key_bytes(&self) -> usize {
        match self {
            CipherAlgorithm::Aes128 => 16,
            CipherAlgorithm::Aes192 => 24,
            CipherAlgorithm::Aes256 => 32,
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherAlgorithm::Aes128 => write!(f, "aes-128"),
            CipherAlgorithm::Aes192 => write!(f, "aes-192"),
            CipherAlgorithm::Aes256 => write!(f, "aes-256"),
        }
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128" | "aes128" => Ok(CipherAlgorithm::Aes128),
            "aes-192" | "aes192" => Ok(CipherAlgorithm::Aes192),
            "aes-256" | "aes256" => Ok(CipherAlgorithm::Aes256),
            _ => Err(CipherError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    Ecb,
    #[default]
    Cbc,
    Cfb,
    Ofb,
    /// Authenticated; tampering fails decryption instead of garbling output.
    Gcm,
}

impl BlockMode {
    pub fn iv_bytes(&self) -> usize {
        match self {
            BlockMode::Ecb => 0,
            BlockMode::Cbc | BlockMode::Cfb | BlockMode::Ofb => BLOCK_BYTES,
            BlockMode::Gcm => GCM_NONCE_BYTES,
        }
    }

    /// Whether the primitive zero-pads plaintext to whole blocks.
    pub fn pads(&self) -> bool {
        matches!(self, BlockMode::Ecb | BlockMode::Cbc)
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockMode::Ecb => write!(f, "ecb"),
            BlockMode::Cbc => write!(f, "cbc"),
            BlockMode::Cfb => write!(f, "cfb"),
            BlockMode::Ofb => write!(f, "ofb"),
            BlockMode::Gcm => write!(f, "gcm"),
        }
    }
}

impl FromStr for BlockMode {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecb" => Ok(BlockMode::Ecb),
            "cbc" => Ok(BlockMode::Cbc),
            "cfb" => Ok(BlockMode::Cfb),
            "ofb" => Ok(BlockMode::Ofb),
            "gcm" => Ok(BlockMode::Gcm),
            _ => Err(CipherError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Primitive trait + AES implementation
// ---------------------------------------------------------------------------

pub trait BlockCipher: Send + Sync {
    fn key_size(&self, algorithm: CipherAlgorithm, mode: BlockMode) -> usize;
    fn iv_size(&self, algorithm: CipherAlgorithm, mode: BlockMode) -> usize;
    fn encrypt(
        &self,
        algorithm: CipherAlgorithm,
        key: &[u8],
        plaintext: &[u8],
        mode: BlockMode,
        iv: &[u8],
    ) -> Result<Vec<u8>, CipherError>;
    fn decrypt(
        &self,
        algorithm: CipherAlgorithm,
        key: &[u8],
        ciphertext: &[u8],
        mode: BlockMode,
        iv: &[u8],
    ) -> Result<Vec<u8>, CipherError>;
}

/// RustCrypto AES in the five supported modes.
///
/// Keys shorter than the algorithm's key size are zero-extended; longer keys
/// are rejected (the engine truncates before calling in).
#[derive(Clone, Copy, Debug, Default)]
pub struct AesBlockCipher;

/// Run `$body` with `$c` bound to the concrete AES type for `$algorithm`.
macro_rules! with_aes {
    ($algorithm:expr, $c:ident => $body:expr) => {
        match $algorithm {
            CipherAlgorithm::Aes128 => {
                type $c = aes::Aes128;
                $body
            }
            CipherAlgorithm::Aes192 => {
                type $c = aes::Aes192;
                $body
            }
            CipherAlgorithm::Aes256 => {
                type $c = aes::Aes256;
                $body
            }
        }
    };
}

impl AesBlockCipher {
    fn full_key(algorithm: CipherAlgorithm, key: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        let size = algorithm.key_bytes();
        if key.len() > size {
            return Err(CipherError::InvalidConfig(format!(
                "{} key is {} bytes, at most {} allowed",
                algorithm,
                key.len(),
                size
            )));
        }
        let mut full = Zeroizing::new(vec![0u8; size]);
        full[..key.len()].copy_from_slice(key);
        Ok(full)
    }

    fn check_iv(mode: BlockMode, iv: &[u8]) -> Result<(), CipherError> {
        if iv.len() != mode.iv_bytes() {
            return Err(CipherError::InvalidConfig(format!(
                "{} needs a {}-byte iv, got {}",
                mode,
                mode.iv_bytes(),
                iv.len()
            )));
        }
        Ok(())
    }
}

fn zero_pad(plaintext: &[u8]) -> Vec<u8> {
    let padded_len = plaintext.len().div_ceil(BLOCK_BYTES) * BLOCK_BYTES;
    let mut out = Vec::with_capacity(padded_len);
    out.extend_from_slice(plaintext);
    out.resize(padded_len, 0);
    out
}

impl BlockCipher for AesBlockCipher {
    fn key_size(&self, algorithm: CipherAlgorithm, _mode: BlockMode) -> usize {
        algorithm.key_bytes()
    }

    fn iv_size(&self, _algorithm: CipherAlgorithm, mode: BlockMode) -> usize {
        mode.iv_bytes()
    }

    fn encrypt(
        &self,
        algorithm: CipherAlgorithm,
        key: &[u8],
        plaintext: &[u8],
        mode: BlockMode,
        iv: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let key = Self::full_key(algorithm, key)?;
        Self::check_iv(mode, iv)?;

        with_aes!(algorithm, C => match mode {
            BlockMode::Ecb => Ok(ecb::Encryptor::<C>::new_from_slice(&key)
                .map_err(|_| CipherError::Encryption)?
                .encrypt_padded_vec_mut::<NoPadding>(&zero_pad(plaintext))),
            BlockMode::Cbc => Ok(cbc::Encryptor::<C>::new_from_slices(&key, iv)
                .map_err(|_| CipherError::Encryption)?
                .encrypt_padded_vec_mut::<NoPadding>(&zero_pad(plaintext))),
            BlockMode::Cfb => {
                let mut buf = plaintext.to_vec();
                cfb_mode::Encryptor::<C>::new_from_slices(&key, iv)
                    .map_err(|_| CipherError::Encryption)?
                    .encrypt(&mut buf);
                Ok(buf)
            }
            BlockMode::Ofb => {
                let mut buf = plaintext.to_vec();
                ofb::Ofb::<C>::new_from_slices(&key, iv)
                    .map_err(|_| CipherError::Encryption)?
                    .apply_keystream(&mut buf);
                Ok(buf)
            }
            BlockMode::Gcm => AesGcm::<C, U12>::new_from_slice(&key)
                .map_err(|_| CipherError::Encryption)?
                .encrypt(Nonce::from_slice(iv), plaintext)
                .map_err(|_| CipherError::Encryption),
        })
    }

    fn decrypt(
        &self,
        algorithm: CipherAlgorithm,
        key: &[u8],
        ciphertext: &[u8],
        mode: BlockMode,
        iv: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let key = Self::full_key(algorithm, key).map_err(|_| CipherError::Decryption)?;
        Self::check_iv(mode, iv).map_err(|_| CipherError::Decryption)?;

        with_aes!(algorithm, C => match mode {
            BlockMode::Ecb => ecb::Decryptor::<C>::new_from_slice(&key)
                .map_err(|_| CipherError::Decryption)?
                .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                .map_err(|_| CipherError::Decryption),
            BlockMode::Cbc => cbc::Decryptor::<C>::new_from_slices(&key, iv)
                .map_err(|_| CipherError::Decryption)?
                .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                .map_err(|_| CipherError::Decryption),
            BlockMode::Cfb => {
                let mut buf = ciphertext.to_vec();
                cfb_mode::Decryptor::<C>::new_from_slices(&key, iv)
                    .map_err(|_| CipherError::Decryption)?
                    .decrypt(&mut buf);
                Ok(buf)
            }
            BlockMode::Ofb => {
                let mut buf = ciphertext.to_vec();
                ofb::Ofb::<C>::new_from_slices(&key, iv)
                    .map_err(|_| CipherError::Decryption)?
                    .apply_keystream(&mut buf);
                Ok(buf)
            }
            BlockMode::Gcm => AesGcm::<C, U12>::new_from_slice(&key)
                .map_err(|_| CipherError::Decryption)?
                .decrypt(Nonce::from_slice(iv), ciphertext)
                .map_err(|_| CipherError::Decryption),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGORITHMS: [CipherAlgorithm; 3] =
        [CipherAlgorithm::Aes128, CipherAlgorithm::Aes192, CipherAlgorithm::Aes256];
    const MODES: [BlockMode; 5] =
        [BlockMode::Ecb, BlockMode::Cbc, BlockMode::Cfb, BlockMode::Ofb, BlockMode::Gcm];

    #[test]
    fn every_algorithm_and_mode_round_trips() {
        let cipher = AesBlockCipher;
        let plaintext = b"seventeen bytes!!";
        for algorithm in ALGORITHMS {
            for mode in MODES {
                let key = vec![0x42u8; cipher.key_size(algorithm, mode)];
                let iv = vec![0x24u8; cipher.iv_size(algorithm, mode)];
                let ct = cipher.encrypt(algorithm, &key, plaintext, mode, &iv).unwrap();
                let pt = cipher.decrypt(algorithm, &key, &ct, mode, &iv).unwrap();
                if mode.pads() {
                    assert_eq!(ct.len(), 32);
                    assert_eq!(&pt[..plaintext.len()], plaintext);
                    assert!(pt[plaintext.len()..].iter().all(|&b| b == 0));
                } else {
                    assert_eq!(pt, plaintext, "{} {}", algorithm, mode);
                }
            }
        }
    }

    #[test]
    fn short_key_is_zero_extended() {
        let cipher = AesBlockCipher;
        let iv = [7u8; 16];
        let short = cipher
            .encrypt(CipherAlgorithm::Aes128, b"abc", b"data", BlockMode::Cbc, &iv)
            .unwrap();
        let mut full = [0u8; 16];
        full[..3].copy_from_slice(b"abc");
        let padded = cipher
            .encrypt(CipherAlgorithm::Aes128, &full, b"data", BlockMode::Cbc, &iv)
            .unwrap();
        assert_eq!(short, padded);
    }

    #[test]
    fn long_key_is_rejected() {
        let cipher = AesBlockCipher;
        let result = cipher.encrypt(CipherAlgorithm::Aes128, &[1u8; 17], b"x", BlockMode::Ecb, &[]);
        assert!(matches!(result, Err(CipherError::InvalidConfig(_))));
    }

    #[test]
    fn wrong_iv_length_is_rejected() {
        let cipher = AesBlockCipher;
        let result = cipher.encrypt(CipherAlgorithm::Aes256, b"k", b"x", BlockMode::Cbc, &[0u8; 8]);
        assert!(matches!(result, Err(CipherError::InvalidConfig(_))));
    }

    #[test]
    fn unaligned_cbc_ciphertext_fails() {
        let cipher = AesBlockCipher;
        let result = cipher.decrypt(CipherAlgorithm::Aes256, b"k", &[0u8; 15], BlockMode::Cbc, &[0u8; 16]);
        assert_eq!(result, Err(CipherError::Decryption));
    }

    #[test]
    fn gcm_detects_tampering() {
        let cipher = AesBlockCipher;
        let iv = [1u8; 12];
        let mut ct = cipher
            .encrypt(CipherAlgorithm::Aes256, b"key", b"payload", BlockMode::Gcm, &iv)
            .unwrap();
        ct[0] ^= 0x01;
        let result = cipher.decrypt(CipherAlgorithm::Aes256, b"key", &ct, BlockMode::Gcm, &iv);
        assert_eq!(result, Err(CipherError::Decryption));
    }

    #[test]
    fn empty_plaintext_in_block_mode() {
        let cipher = AesBlockCipher;
        let ct = cipher
            .encrypt(CipherAlgorithm::Aes256, b"k", b"", BlockMode::Cbc, &[0u8; 16])
            .unwrap();
        assert!(ct.is_empty());
    }

    #[test]
    fn parses_names() {
        assert_eq!("AES-128".parse::<CipherAlgorithm>().unwrap(), CipherAlgorithm::Aes128);
        assert_eq!("gcm".parse::<BlockMode>().unwrap(), BlockMode::Gcm);
        assert!(matches!(
            "rijndael-192".parse::<CipherAlgorithm>(),
            Err(CipherError::UnknownAlgorithm(_))
        ));
    }
}
