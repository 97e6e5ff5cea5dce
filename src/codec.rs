//! Base codecs: named encode/decode pairs between bytes and text.
//!
//! A [`CodecRegistry`] maps a base selector key (e.g. `"user_safe"`, or a
//! numeric key such as `"16"`) to a [`Codec`]. Engines resolve their
//! configured base against a registry they hold by `Arc`; tests build
//! isolated registries, everything else can share [`CodecRegistry::global`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use once_cell::sync::Lazy;

use crate::alphabet::Alphabet;
use crate::error::CipherError;
use crate::mapper;

/// 52-symbol output without vowels or symbols (avoids spelling words).
pub const BASE_USER_SAFE: &str = "user_safe";

/// 21-symbol output without ambiguous characters such as 0/O or 1/l.
pub const BASE_PRINTABLE: &str = "printable";

/// 95-symbol output using every printable ASCII character.
pub const BASE_ASCII: &str = "ascii";

static GLOBAL: Lazy<Arc<CodecRegistry>> = Lazy::new(|| Arc::new(CodecRegistry::with_builtins()));

// ---------------------------------------------------------------------------
// Codec trait
// ---------------------------------------------------------------------------

/// A reversible bytes ⇄ text mapping.
///
/// Implementations must be pure: `decode(encode(b)) == b` for every `b`.
pub trait Codec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> Result<String, CipherError>;
    fn decode(&self, text: &str) -> Result<Vec<u8>, CipherError>;
}

/// Bytes are rendered as unpadded standard base64, whose characters are read
/// as digits of the 64-symbol master prefix and re-expressed in `target`.
#[derive(Clone, Debug)]
pub struct AlphabetCodec {
    target: Alphabet,
}

impl AlphabetCodec {
    pub fn new(target: Alphabet) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Alphabet {
        &self.target
    }
}

impl Codec for AlphabetCodec {
    fn encode(&self, bytes: &[u8]) -> Result<String, CipherError> {
        let b64 = STANDARD_NO_PAD.encode(bytes);
        mapper::convert(&b64, Alphabet::base64(), &self.target)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, CipherError> {
        let b64 = mapper::convert(text, &self.target, Alphabet::base64())?;
        Ok(STANDARD_NO_PAD.decode(b64)?)
    }
}

/// A codec made of two plain functions.
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D>
where
    E: Fn(&[u8]) -> Result<String, CipherError> + Send + Sync,
    D: Fn(&str) -> Result<Vec<u8>, CipherError> + Send + Sync,
{
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<E, D> Codec for FnCodec<E, D>
where
    E: Fn(&[u8]) -> Result<String, CipherError> + Send + Sync,
    D: Fn(&str) -> Result<Vec<u8>, CipherError> + Send + Sync,
{
    fn encode(&self, bytes: &[u8]) -> Result<String, CipherError> {
        (self.encode)(bytes)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, CipherError> {
        (self.decode)(text)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Key → codec map, safe to share across threads.
///
/// Reads take a shared lock; register/unregister take the write lock, so a
/// reader never observes a half-updated map.
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Arc<dyn Codec>>>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the `user_safe`, `printable` and `ascii` codecs.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(BASE_USER_SAFE, AlphabetCodec::new(Alphabet::user_safe().clone()));
        registry.register(BASE_PRINTABLE, AlphabetCodec::new(Alphabet::printable().clone()));
        registry.register(BASE_ASCII, AlphabetCodec::new(Alphabet::master().clone()));
        registry
    }

    /// The process-wide registry, created with the built-ins on first use.
    pub fn global() -> Arc<CodecRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register `codec` under `key`, replacing any previous registration.
    pub fn register<C>(&self, key: impl Into<String>, codec: C)
    where
        C: Codec + 'static,
    {
        self.register_arc(key, Arc::new(codec));
    }

    pub fn register_arc(&self, key: impl Into<String>, codec: Arc<dyn Codec>) {
        let key = key.into();
        tracing::debug!(key = %key, "registering base codec");
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        codecs.insert(key, codec);
    }

    /// Register a pair of functions under `key`.
    pub fn register_fn<E, D>(&self, key: impl Into<String>, encode: E, decode: D)
    where
        E: Fn(&[u8]) -> Result<String, CipherError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Vec<u8>, CipherError> + Send + Sync + 'static,
    {
        self.register(key, FnCodec::new(encode, decode));
    }

    /// Remove the codec under `key`, returning it if present.
    pub fn unregister(&self, key: &str) -> Option<Arc<dyn Codec>> {
        tracing::debug!(key = %key, "unregistering base codec");
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        codecs.remove(key)
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Codec>> {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn list(&self) -> Vec<String> {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = codecs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry").field("keys", &self.list()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"\x00\x00hello \xff\xfe world\x00";

    #[test]
    fn builtins_are_registered() {
        let registry = CodecRegistry::with_builtins();
        assert_eq!(registry.list(), vec!["ascii", "printable", "user_safe"]);
    }

    #[test]
    fn new_registry_is_empty() {
        assert!(CodecRegistry::new().list().is_empty());
    }

    #[test]
    fn builtins_round_trip() {
        let registry = CodecRegistry::with_builtins();
        for key in [BASE_USER_SAFE, BASE_PRINTABLE, BASE_ASCII] {
            let codec = registry.get(key).unwrap();
            let text = codec.encode(SAMPLE).unwrap();
            assert_eq!(codec.decode(&text).unwrap(), SAMPLE, "{}", key);
        }
    }

    #[test]
    fn user_safe_has_no_vowels_or_symbols() {
        let codec = CodecRegistry::with_builtins().get(BASE_USER_SAFE).unwrap();
        let text = codec.encode(b"the quick brown fox jumps over the lazy dog").unwrap();
        assert!(!text.is_empty());
        assert!(!text.chars().any(|c| "aeiouAEIOU+/".contains(c)), "{}", text);
    }

    #[test]
    fn printable_uses_only_unambiguous_symbols() {
        let codec = CodecRegistry::with_builtins().get(BASE_PRINTABLE).unwrap();
        let text = codec.encode(SAMPLE).unwrap();
        assert!(text.chars().all(|c| crate::alphabet::PRINTABLE_SYMBOLS.contains(c)));
    }

    #[test]
    fn ascii_output_is_shorter_than_base64() {
        let codec = CodecRegistry::with_builtins().get(BASE_ASCII).unwrap();
        let bytes = [0x5au8; 64];
        let text = codec.encode(&bytes).unwrap();
        assert!(text.len() < STANDARD_NO_PAD.encode(bytes).len());
    }

    #[test]
    fn register_and_unregister() {
        let registry = CodecRegistry::new();
        registry.register_fn(
            "hex",
            |bytes| Ok(hex::encode(bytes)),
            |text| Ok(hex::decode(text)?),
        );
        assert!(registry.contains("hex"));
        assert_eq!(registry.get("hex").unwrap().encode(b"\x01\xab").unwrap(), "01ab");

        assert!(registry.unregister("hex").is_some());
        assert!(registry.get("hex").is_none());
        assert!(registry.unregister("hex").is_none());
    }

    #[test]
    fn register_replaces_existing() {
        let registry = CodecRegistry::with_builtins();
        registry.register_fn(BASE_ASCII, |_| Ok("x".into()), |_| Ok(Vec::new()));
        assert_eq!(registry.get(BASE_ASCII).unwrap().encode(b"abc").unwrap(), "x");
    }

    #[test]
    fn decode_rejects_foreign_symbols() {
        let codec = CodecRegistry::with_builtins().get(BASE_PRINTABLE).unwrap();
        assert!(matches!(codec.decode("0"), Err(CipherError::InvalidDigit { .. })));
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let registry = Arc::new(CodecRegistry::with_builtins());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let key = format!("custom-{}", i);
                    registry.register(key.clone(), AlphabetCodec::new(Alphabet::hex().clone()));
                    let codec = registry.get(BASE_USER_SAFE).unwrap();
                    let text = codec.encode(&[i as u8; 8]).unwrap();
                    assert_eq!(codec.decode(&text).unwrap(), vec![i as u8; 8]);
                    assert!(registry.contains(&key));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.list().len(), 3 + 8);
    }
}
