//! Output base selection.
//!
//! Resolution order for a configured [`Base`]:
//!   1. a codec registered under the selector's key (`"user_safe"`, `"16"`, ...)
//!   2. a numeric radix `2..=radix_limit`: unpadded base64, then the digit
//!      mapper from the 64-symbol master prefix to `char_list[..radix]`
//!   3. otherwise no transformation, or `CodecNotFound` under
//!      [`BasePolicy::Strict`]

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::codec::CodecRegistry;
use crate::error::CipherError;
use crate::mapper;

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// The character base ciphertext and hashes are rendered in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    /// Leave bytes untouched.
    #[default]
    Raw,
    /// Generic radix over a prefix of the configured character list.
    Radix(u32),
    /// A codec looked up by name in the registry.
    Named(String),
}

impl Base {
    /// Registry key this selector is looked up under.
    pub fn key(&self) -> Option<String> {
        match self {
            Base::Raw => None,
            Base::Radix(radix) => Some(radix.to_string()),
            Base::Named(name) => Some(name.clone()),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Base::Raw)
    }
}

impl From<u32> for Base {
    fn from(radix: u32) -> Self {
        Base::Radix(radix)
    }
}

impl From<&str> for Base {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(base) => base,
            Err(never) => match never {},
        }
    }
}

impl FromStr for Base {
    type Err = std::convert::Infallible;

    /// `""`, `"raw"` and `"false"` select [`Base::Raw`]; digits select a
    /// radix; anything else is a codec name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("raw") || s.eq_ignore_ascii_case("false") {
            return Ok(Base::Raw);
        }
        match s.parse::<u32>() {
            Ok(radix) => Ok(Base::Radix(radix)),
            Err(_) => Ok(Base::Named(s.to_owned())),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::Raw => write!(f, "raw"),
            Base::Radix(radix) => write!(f, "{}", radix),
            Base::Named(name) => write!(f, "{}", name),
        }
    }
}

/// What to do with a selector that resolves to nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasePolicy {
    /// Warn and pass bytes through unchanged.
    #[default]
    Lenient,
    /// Fail with [`CipherError::CodecNotFound`].
    Strict,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Borrowed view of everything needed to apply a base in either direction.
pub(crate) struct BaseEncoder<'a> {
    pub base: &'a Base,
    pub registry: &'a CodecRegistry,
    pub char_list: &'a Alphabet,
    pub radix_limit: u32,
    pub policy: BasePolicy,
}

impl BaseEncoder<'_> {
    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CipherError> {
        let Some(key) = self.base.key() else {
            return Ok(bytes.to_vec());
        };

        if let Some(codec) = self.registry.get(&key) {
            return codec.encode(bytes).map(String::into_bytes);
        }

        if let Some(target) = self.radix_alphabet()? {
            let b64 = STANDARD_NO_PAD.encode(bytes);
            return mapper::convert(&b64, Alphabet::base64(), &target).map(String::into_bytes);
        }

        self.unresolved(&key)?;
        Ok(bytes.to_vec())
    }

    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, CipherError> {
        let Some(key) = self.base.key() else {
            return Ok(encoded.to_vec());
        };

        if let Some(codec) = self.registry.get(&key) {
            return codec.decode(std::str::from_utf8(encoded)?);
        }

        if let Some(source) = self.radix_alphabet()? {
            let text = std::str::from_utf8(encoded)?;
            let b64 = mapper::convert(text, &source, Alphabet::base64())?;
            return Ok(STANDARD_NO_PAD.decode(b64)?);
        }

        self.unresolved(&key)?;
        Ok(encoded.to_vec())
    }

    /// Whether the selector is raw, registered, or a numeric radix in range.
    pub fn resolves(&self) -> bool {
        match self.base.key() {
            None => true,
            Some(key) => self.registry.contains(&key) || self.numeric_radix().is_some(),
        }
    }

    fn numeric_radix(&self) -> Option<u32> {
        match self.base {
            Base::Radix(radix) if (2..=self.radix_limit).contains(radix) => Some(*radix),
            _ => None,
        }
    }

    fn radix_alphabet(&self) -> Result<Option<Alphabet>, CipherError> {
        self.numeric_radix()
            .map(|radix| self.char_list.prefix(radix))
            .transpose()
    }

    fn unresolved(&self, key: &str) -> Result<(), CipherError> {
        match self.policy {
            BasePolicy::Strict => Err(CipherError::CodecNotFound(key.to_owned())),
            BasePolicy::Lenient => {
                tracing::warn!(base = %key, "unknown base; leaving bytes untransformed");
                Ok(())
            }
        }
    }
}
