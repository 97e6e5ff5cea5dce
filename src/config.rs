//! Engine configuration.
//!
//! A [`CipherConfig`] is plain data: build it with [`CipherBuilder`], store
//! it as JSON, hand it to [`crate::Cipher::new`]. Once inside an engine it is
//! never mutated; derive a changed copy with [`CipherConfig::to_builder`].

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alphabet::{Alphabet, MAX_RADIX, MASTER_SYMBOLS, MIN_RADIX};
use crate::base::{Base, BasePolicy};
use crate::block::{BlockMode, CipherAlgorithm};
use crate::error::CipherError;
use crate::kdf::HashAlgorithm;

pub const DEFAULT_KEY: &[u8] = b"obfuscate me";
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
pub const DEFAULT_KDF_BYTES: usize = 32;
pub const MAX_KDF_BYTES: usize = 1024;
/// Numeric bases run `2..=94` unless raised; base 95 output needs an
/// explicit `radix_limit` of 95 or the `ascii` codec.
pub const DEFAULT_RADIX_LIMIT: u32 = 94;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    pub algorithm: CipherAlgorithm,
    pub mode: BlockMode,
    pub base: Base,
    /// Truncated to the algorithm's key size on use, never extended here.
    pub key: SecretBytes,
    /// Fixed IV, repeated cyclically to the mode's IV size. `None` draws a
    /// random IV per message and prepends it to the ciphertext.
    #[serde(with = "hex_opt")]
    pub iv: Option<Vec<u8>>,
    /// Symbols for generic numeric bases; radix `n` uses the first `n`.
    pub char_list: String,
    /// Highest radix served by the generic numeric path, inclusive.
    pub radix_limit: u32,
    pub null_safe: bool,
    pub base_policy: BasePolicy,
    pub kdf_algorithm: HashAlgorithm,
    pub kdf_iterations: u32,
    pub kdf_bytes: usize,
}

impl CipherConfig {
    pub fn builder() -> CipherBuilder {
        CipherBuilder::new()
    }

    /// A builder pre-loaded with this configuration.
    pub fn to_builder(&self) -> CipherBuilder {
        CipherBuilder {
            config: self.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), CipherError> {
        let char_list = Alphabet::new(&self.char_list)?;

        let ceiling = MAX_RADIX.min(char_list.radix());
        if !(MIN_RADIX..=ceiling).contains(&self.radix_limit) {
            return Err(CipherError::InvalidConfig(format!(
                "radix_limit {} outside {}..={}",
                self.radix_limit, MIN_RADIX, ceiling
            )));
        }

        if let Base::Radix(radix) = self.base {
            if radix < MIN_RADIX {
                return Err(CipherError::InvalidRadix(radix));
            }
        }
        if let Base::Named(name) = &self.base {
            if name.trim().is_empty() {
                return Err(CipherError::InvalidConfig("empty base name".into()));
            }
        }

        if self.key.is_empty() {
            return Err(CipherError::InvalidConfig("key must not be empty".into()));
        }
        if matches!(&self.iv, Some(iv) if iv.is_empty()) {
            return Err(CipherError::InvalidConfig("fixed iv must not be empty".into()));
        }

        if self.kdf_iterations == 0 {
            return Err(CipherError::InvalidConfig("kdf_iterations must be non-zero".into()));
        }
        if !(1..=MAX_KDF_BYTES).contains(&self.kdf_bytes) {
            return Err(CipherError::InvalidConfig(format!(
                "kdf_bytes {} outside 1..={}",
                self.kdf_bytes, MAX_KDF_BYTES
            )));
        }
        Ok(())
    }

    /// The validated character list.
    pub fn char_alphabet(&self) -> Result<Alphabet, CipherError> {
        Alphabet::new(&self.char_list)
    }
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            algorithm: CipherAlgorithm::default(),
            mode: BlockMode::default(),
            base: Base::default(),
            key: SecretBytes::new(DEFAULT_KEY),
            iv: None,
            char_list: MASTER_SYMBOLS.to_owned(),
            radix_limit: DEFAULT_RADIX_LIMIT,
            null_safe: true,
            base_policy: BasePolicy::default(),
            kdf_algorithm: HashAlgorithm::default(),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            kdf_bytes: DEFAULT_KDF_BYTES,
        }
    }
}

impl fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherConfig")
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .field("base", &self.base)
            .field("key", &self.key)
            .field("iv", &self.iv.as_ref().map(|_| "<fixed>"))
            .field("radix_limit", &self.radix_limit)
            .field("null_safe", &self.null_safe)
            .field("base_policy", &self.base_policy)
            .field("kdf_algorithm", &self.kdf_algorithm)
            .field("kdf_iterations", &self.kdf_iterations)
            .field("kdf_bytes", &self.kdf_bytes)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Key material
// ---------------------------------------------------------------------------

/// Key bytes: wiped on drop, hex in JSON, never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(#[serde(with = "hex::serde")] Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted {} bytes>", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct CipherBuilder {
    config: CipherConfig,
}

impl CipherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: CipherAlgorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn with_mode(mut self, mode: BlockMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Accepts a [`Base`], a radix (`16`) or a selector string (`"user_safe"`).
    pub fn with_base(mut self, base: impl Into<Base>) -> Self {
        self.config.base = base.into();
        self
    }

    pub fn with_key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.config.key = SecretBytes::new(key);
        self
    }

    pub fn with_iv(mut self, iv: impl AsRef<[u8]>) -> Self {
        self.config.iv = Some(iv.as_ref().to_vec());
        self
    }

    /// Draw a fresh IV per message (the default).
    pub fn with_random_iv(mut self) -> Self {
        self.config.iv = None;
        self
    }

    pub fn with_char_list(mut self, char_list: impl Into<String>) -> Self {
        self.config.char_list = char_list.into();
        self
    }

    pub fn with_radix_limit(mut self, radix_limit: u32) -> Self {
        self.config.radix_limit = radix_limit;
        self
    }

    pub fn with_null_safe(mut self, null_safe: bool) -> Self {
        self.config.null_safe = null_safe;
        self
    }

    pub fn with_base_policy(mut self, policy: BasePolicy) -> Self {
        self.config.base_policy = policy;
        self
    }

    pub fn with_kdf_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.config.kdf_algorithm = algorithm;
        self
    }

    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.config.kdf_iterations = iterations;
        self
    }

    pub fn with_kdf_bytes(mut self, bytes: usize) -> Self {
        self.config.kdf_bytes = bytes;
        self
    }

    pub fn build(self) -> Result<CipherConfig, CipherError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod hex_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct HexRef<'a>(#[serde(serialize_with = "hex::serde::serialize")] &'a [u8]);

    #[derive(Deserialize)]
    struct HexOwned(#[serde(deserialize_with = "hex::serde::deserialize")] Vec<u8>);

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        value.as_deref().map(HexRef).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<HexOwned>::deserialize(d)?.map(|HexOwned(bytes)| bytes))
    }
}
