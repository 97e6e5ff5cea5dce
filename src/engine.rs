//! The cipher engine.
//!
//! ```text
//! encrypt:  plaintext ─ pad ─ block cipher ─ [iv ||] ciphertext ─ base encode
//! decrypt:  text ─ base decode ─ split iv ─ block cipher ─ unpad
//! ```
//!
//! An engine owns its validated configuration and shares a codec registry
//! and the three primitives by `Arc`; it holds no other state, so a single
//! engine can serve any number of threads.

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::alphabet::Alphabet;
use crate::base::{BaseEncoder, BasePolicy};
use crate::block::{AesBlockCipher, BlockCipher};
use crate::codec::CodecRegistry;
use crate::config::CipherConfig;
use crate::error::CipherError;
use crate::kdf::{hmac_digest, HashAlgorithm, Kdf, Pbkdf2};
use crate::padding;
use crate::random::{OsRandom, SecureRandom};

/// Hex characters of the obfuscation tag unless told otherwise.
pub const DEFAULT_TAG_LEN: usize = 7;

const TAG_SEPARATOR: u8 = b'-';

/// The external capabilities an engine calls into.
#[derive(Clone)]
pub struct Primitives {
    pub cipher: Arc<dyn BlockCipher>,
    pub random: Arc<dyn SecureRandom>,
    pub kdf: Arc<dyn Kdf>,
}

impl Default for Primitives {
    fn default() -> Self {
        Self {
            cipher: Arc::new(AesBlockCipher),
            random: Arc::new(OsRandom),
            kdf: Arc::new(Pbkdf2),
        }
    }
}

#[derive(Clone)]
pub struct Cipher {
    config: CipherConfig,
    char_list: Alphabet,
    registry: Arc<CodecRegistry>,
    primitives: Primitives,
}

impl Cipher {
    /// An engine using the process-wide codec registry and the default
    /// AES / OS random / PBKDF2 primitives.
    pub fn new(config: CipherConfig) -> Result<Self, CipherError> {
        Self::with_registry(config, CodecRegistry::global())
    }

    pub fn with_registry(
        config: CipherConfig,
        registry: Arc<CodecRegistry>,
    ) -> Result<Self, CipherError> {
        Self::with_primitives(config, registry, Primitives::default())
    }

    pub fn with_primitives(
        config: CipherConfig,
        registry: Arc<CodecRegistry>,
        primitives: Primitives,
    ) -> Result<Self, CipherError> {
        config.validate()?;
        let char_list = config.char_alphabet()?;
        let cipher = Self {
            config,
            char_list,
            registry,
            primitives,
        };

        if cipher.config.base_policy == BasePolicy::Strict && !cipher.base().resolves() {
            return Err(CipherError::CodecNotFound(cipher.config.base.to_string()));
        }
        Ok(cipher)
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Encryption
    // -----------------------------------------------------------------------

    /// Encrypt `plaintext` and render it in the configured base.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let (algorithm, mode) = (self.config.algorithm, self.config.mode);
        let key = self.key();
        let (iv, random_iv) = self.iv()?;

        let padded = Zeroizing::new(padding::pad(plaintext, self.config.null_safe));
        let ciphertext = self
            .primitives
            .cipher
            .encrypt(algorithm, &key, &padded, mode, &iv)?;

        let mut out = Vec::with_capacity(iv.len() + ciphertext.len());
        if random_iv {
            out.extend_from_slice(&iv);
        }
        out.extend_from_slice(&ciphertext);

        tracing::debug!(
            algorithm = %algorithm,
            mode = %mode,
            base = %self.config.base,
            random_iv,
            plaintext_len = plaintext.len(),
            ciphertext_len = out.len(),
            "encrypt"
        );
        self.base().encode(&out)
    }

    /// Reverse [`Cipher::encrypt`]. Empty input decrypts to empty output.
    pub fn decrypt(&self, encoded: &[u8]) -> Result<Vec<u8>, CipherError> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        let (algorithm, mode) = (self.config.algorithm, self.config.mode);

        let bytes = self.base().decode(encoded)?;
        let iv_len = self.primitives.cipher.iv_size(algorithm, mode);
        let (iv, ciphertext) = match &self.config.iv {
            None => {
                if bytes.len() < iv_len {
                    return Err(CipherError::Decryption);
                }
                let (iv, ciphertext) = bytes.split_at(iv_len);
                (iv.to_vec(), ciphertext)
            }
            Some(fixed) => (cycle(fixed, iv_len), bytes.as_slice()),
        };

        let key = self.key();
        let decrypted = Zeroizing::new(
            self.primitives
                .cipher
                .decrypt(algorithm, &key, ciphertext, mode, &iv)?,
        );

        tracing::debug!(
            algorithm = %algorithm,
            mode = %mode,
            base = %self.config.base,
            ciphertext_len = bytes.len(),
            "decrypt"
        );
        Ok(padding::unpad(&decrypted, self.config.null_safe))
    }

    /// [`Cipher::encrypt`] for callers that want a `String`; the configured
    /// base must produce text.
    pub fn encrypt_text(&self, plaintext: &str) -> Result<String, CipherError> {
        into_text(self.encrypt(plaintext.as_bytes())?)
    }

    pub fn decrypt_text(&self, encoded: &str) -> Result<String, CipherError> {
        into_text(self.decrypt(encoded.as_bytes())?)
    }

    // -----------------------------------------------------------------------
    // Keyed hashing and obfuscation
    // -----------------------------------------------------------------------

    /// Hex HMAC of `message` under the configured key, in the configured base.
    pub fn hash(&self, message: &[u8], algorithm: HashAlgorithm) -> Result<String, CipherError> {
        let digest = hex::encode(hmac_digest(algorithm, message, self.config.key.as_bytes())?);
        into_text(self.base().encode(digest.as_bytes())?)
    }

    /// Render `payload` with a short keyed tag so tampered tokens can be
    /// detected. The payload is not hidden from anyone who knows the base.
    pub fn obfuscate(&self, payload: &[u8], tag_len: usize) -> Result<Vec<u8>, CipherError> {
        let tag = self.tag(payload, tag_len)?;
        let mut framed = Vec::with_capacity(payload.len() + 1 + tag.len());
        framed.extend_from_slice(payload);
        framed.push(TAG_SEPARATOR);
        framed.extend_from_slice(tag.as_bytes());
        self.base().encode(&framed)
    }

    /// The payload of an [`Cipher::obfuscate`] token, or `None` if the tag
    /// does not match.
    pub fn unobfuscate(&self, token: &[u8], tag_len: usize) -> Result<Option<Vec<u8>>, CipherError> {
        let framed = self.base().decode(token)?;
        let Some(split) = framed.iter().rposition(|&b| b == TAG_SEPARATOR) else {
            return Ok(None);
        };
        let (payload, tag) = (&framed[..split], &framed[split + 1..]);

        let expected = self.tag(payload, tag_len)?;
        let matches = tag.len() == expected.len() && bool::from(tag.ct_eq(expected.as_bytes()));
        Ok(matches.then(|| payload.to_vec()))
    }

    fn tag(&self, payload: &[u8], tag_len: usize) -> Result<String, CipherError> {
        let mut tag = hex::encode(hmac_digest(
            HashAlgorithm::Sha1,
            payload,
            self.config.key.as_bytes(),
        )?);
        if tag_len == 0 || tag_len > tag.len() {
            return Err(CipherError::InvalidConfig(format!(
                "tag length {} outside 1..={}",
                tag_len,
                tag.len()
            )));
        }
        tag.truncate(tag_len);
        Ok(tag)
    }

    // -----------------------------------------------------------------------
    // Passwords
    // -----------------------------------------------------------------------

    /// `hex(salt) || hex(pbkdf2(password, salt))`, `4 * kdf_bytes` characters.
    ///
    /// `salt`, when given, must be `2 * kdf_bytes` bytes long (the salt half
    /// of an earlier result) but may hold any text; its bytes are what the
    /// KDF is salted with.
    pub fn hash_password(&self, password: &str, salt: Option<&str>) -> Result<String, CipherError> {
        let bytes = self.config.kdf_bytes;
        let salt = match salt {
            Some(salt) => {
                if salt.len() != 2 * bytes {
                    return Err(CipherError::InvalidSalt);
                }
                salt.to_owned()
            }
            None => hex::encode(self.primitives.random.bytes(bytes)?),
        };

        let derived = Zeroizing::new(self.primitives.kdf.derive(
            self.config.kdf_algorithm,
            password.as_bytes(),
            salt.as_bytes(),
            self.config.kdf_iterations,
            bytes,
        )?);

        let mut out = salt;
        out.push_str(&hex::encode(derived.as_slice()));
        Ok(out)
    }

    /// Constant-time check of `password` against a [`Cipher::hash_password`]
    /// result.
    pub fn validate_password(&self, password: &str, salt_and_hash: &str) -> bool {
        let bytes = self.config.kdf_bytes;
        if salt_and_hash.len() != 4 * bytes {
            return false;
        }
        let Some(salt) = salt_and_hash.get(..2 * bytes) else {
            return false;
        };
        match self.hash_password(password, Some(salt)) {
            Ok(expected) => bool::from(expected.as_bytes().ct_eq(salt_and_hash.as_bytes())),
            Err(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn base(&self) -> BaseEncoder<'_> {
        BaseEncoder {
            base: &self.config.base,
            registry: &self.registry,
            char_list: &self.char_list,
            radix_limit: self.config.radix_limit,
            policy: self.config.base_policy,
        }
    }

    /// Configured key cut to the cipher's key size; shorter keys pass through.
    fn key(&self) -> Zeroizing<Vec<u8>> {
        let size = self
            .primitives
            .cipher
            .key_size(self.config.algorithm, self.config.mode);
        let key = self.config.key.as_bytes();
        Zeroizing::new(key[..key.len().min(size)].to_vec())
    }

    /// The IV for one message and whether it was freshly drawn.
    fn iv(&self) -> Result<(Vec<u8>, bool), CipherError> {
        let size = self
            .primitives
            .cipher
            .iv_size(self.config.algorithm, self.config.mode);
        if size == 0 {
            return Ok((Vec::new(), false));
        }
        match &self.config.iv {
            Some(fixed) => Ok((cycle(fixed, size), false)),
            None => Ok((self.primitives.random.bytes(size)?, true)),
        }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// `pattern` repeated until `len` bytes.
fn cycle(pattern: &[u8], len: usize) -> Vec<u8> {
    pattern.iter().copied().cycle().take(len).collect()
}

fn into_text(bytes: Vec<u8>) -> Result<String, CipherError> {
    String::from_utf8(bytes).map_err(|e| CipherError::from(e.utf8_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockMode, CipherAlgorithm};
    use crate::codec::BASE_USER_SAFE;

    fn setup() -> Cipher {
        let config = CipherConfig::builder()
            .with_key("unit test key")
            .with_kdf_iterations(2)
            .build()
            .unwrap();
        Cipher::with_registry(config, Arc::new(CodecRegistry::with_builtins())).unwrap()
    }

    fn with(config: CipherConfig) -> Cipher {
        Cipher::with_registry(config, Arc::new(CodecRegistry::with_builtins())).unwrap()
    }

    #[test]
    fn round_trip_default() {
        let cipher = setup();
        let ct = cipher.encrypt(b"attack at dawn").unwrap();
        assert_ne!(ct, b"attack at dawn");
        assert_eq!(cipher.decrypt(&ct).unwrap(), b"attack at dawn");
    }

    #[test]
    fn random_iv_is_prepended() {
        let cipher = setup();
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a, b);
        // 16-byte iv + one block
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn fixed_iv_is_deterministic_and_omitted() {
        let config = setup().config().to_builder().with_iv("abc").build().unwrap();
        let cipher = with(config);
        let a = cipher.encrypt(b"same").unwrap();
        assert_eq!(a, cipher.encrypt(b"same").unwrap());
        assert_eq!(a.len(), 16);
        assert_eq!(cipher.decrypt(&a).unwrap(), b"same");
    }

    #[test]
    fn fixed_iv_repeats_cyclically() {
        assert_eq!(cycle(b"abc", 7), b"abcabca");
        assert_eq!(cycle(b"0123456789abcdefXYZ", 16), b"0123456789abcdef");
    }

    #[test]
    fn long_key_is_truncated() {
        let config = setup()
            .config()
            .to_builder()
            .with_algorithm(CipherAlgorithm::Aes128)
            .with_key([7u8; 40])
            .build()
            .unwrap();
        let cipher = with(config);
        assert_eq!(cipher.key().len(), 16);
        let ct = cipher.encrypt(b"x").unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), b"x");
    }

    #[test]
    fn trailing_nulls_survive() {
        let cipher = setup();
        let plaintext = b"data\0\0\0";
        let ct = cipher.encrypt(plaintext).unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_and_ciphertext() {
        let cipher = setup();
        assert_eq!(cipher.decrypt(b"").unwrap(), b"");
        let ct = cipher.encrypt(b"").unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), b"");
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let cipher = setup();
        assert_eq!(cipher.decrypt(b"short"), Err(CipherError::Decryption));
    }

    #[test]
    fn text_helpers_with_named_base() {
        let config = setup().config().to_builder().with_base(BASE_USER_SAFE).build().unwrap();
        let cipher = with(config);
        let ct = cipher.encrypt_text("héllo").unwrap();
        assert_eq!(cipher.decrypt_text(&ct).unwrap(), "héllo");
    }

    #[test]
    fn non_text_output_is_a_decoding_error() {
        assert!(matches!(into_text(vec![0x66, 0xff]), Err(CipherError::Decoding(_))));
        assert_eq!(into_text(b"ok".to_vec()).unwrap(), "ok");
    }

    #[test]
    fn strict_policy_rejects_unresolvable_base() {
        let config = CipherConfig::builder()
            .with_base("xyz")
            .with_base_policy(BasePolicy::Strict)
            .build()
            .unwrap();
        let err = Cipher::with_registry(config, Arc::new(CodecRegistry::with_builtins())).unwrap_err();
        assert_eq!(err, CipherError::CodecNotFound("xyz".into()));
    }

    #[test]
    fn hash_is_keyed_hex() {
        let cipher = setup();
        let h = cipher.hash(b"message", HashAlgorithm::Sha256).unwrap();
        assert_eq!(h.len(), 64);
        assert_eq!(
            h,
            hex::encode(hmac_digest(HashAlgorithm::Sha256, b"message", b"unit test key").unwrap())
        );
    }

    #[test]
    fn obfuscate_round_trip() {
        let config = setup().config().to_builder().with_base(BASE_USER_SAFE).build().unwrap();
        let cipher = with(config);
        let token = cipher.obfuscate(b"user-42", DEFAULT_TAG_LEN).unwrap();
        assert_eq!(
            cipher.unobfuscate(&token, DEFAULT_TAG_LEN).unwrap(),
            Some(b"user-42".to_vec())
        );
    }

    #[test]
    fn obfuscate_detects_tampering() {
        let cipher = setup();
        let token = cipher.obfuscate(b"42", DEFAULT_TAG_LEN).unwrap();
        let mut forged = b"43".to_vec();
        forged.extend_from_slice(&token[2..]);
        assert_eq!(cipher.unobfuscate(&forged, DEFAULT_TAG_LEN).unwrap(), None);
        assert_eq!(cipher.unobfuscate(b"no separator", DEFAULT_TAG_LEN).unwrap(), None);
    }

    #[test]
    fn obfuscate_tag_length_bounds() {
        let cipher = setup();
        assert!(cipher.obfuscate(b"1", 0).is_err());
        assert!(cipher.obfuscate(b"1", 41).is_err());
        assert!(cipher.obfuscate(b"1", 40).is_ok());
    }

    #[test]
    fn password_round_trip() {
        let cipher = setup();
        let stored = cipher.hash_password("correct horse", None).unwrap();
        assert_eq!(stored.len(), 128);
        assert!(cipher.validate_password("correct horse", &stored));
        assert!(!cipher.validate_password("battery staple", &stored));
    }

    #[test]
    fn password_with_given_salt_is_deterministic() {
        let cipher = setup();
        let salt = "ab".repeat(32);
        let a = cipher.hash_password("pw", Some(&salt)).unwrap();
        assert_eq!(a, cipher.hash_password("pw", Some(&salt)).unwrap());
        assert!(a.starts_with(&salt));
    }

    #[test]
    fn password_rejects_wrong_length_salt() {
        let cipher = setup();
        assert_eq!(cipher.hash_password("pw", Some("abc")), Err(CipherError::InvalidSalt));
        assert_eq!(
            cipher.hash_password("pw", Some(&"ab".repeat(33))),
            Err(CipherError::InvalidSalt)
        );
    }

    #[test]
    fn password_accepts_any_text_salt_of_right_length() {
        let cipher = setup();
        let salt = "legacy salt: not hex at all! ".repeat(3);
        let salt = &salt[..64];
        let stored = cipher.hash_password("pw", Some(salt)).unwrap();
        assert!(stored.starts_with(salt));
        assert_eq!(stored.len(), 128);
        assert!(cipher.validate_password("pw", &stored));
        assert!(!cipher.validate_password("pW", &stored));
    }

    #[test]
    fn validate_rejects_malformed_input() {
        let cipher = setup();
        assert!(!cipher.validate_password("pw", ""));
        assert!(!cipher.validate_password("pw", &"é".repeat(64)));
        assert!(!cipher.validate_password("pw", &"x".repeat(128)));
    }

    #[test]
    fn every_mode_round_trips() {
        for mode in [BlockMode::Ecb, BlockMode::Cbc, BlockMode::Cfb, BlockMode::Ofb, BlockMode::Gcm] {
            let config = setup().config().to_builder().with_mode(mode).build().unwrap();
            let cipher = with(config);
            let ct = cipher.encrypt(b"mode check\0").unwrap();
            assert_eq!(cipher.decrypt(&ct).unwrap(), b"mode check\0", "{}", mode);
        }
    }

    #[test]
    fn debug_does_not_leak_key() {
        let shown = format!("{:?}", setup());
        assert!(!shown.contains("unit test key"));
    }
}
