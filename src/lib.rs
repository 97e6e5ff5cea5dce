//! # Citadel Cipher
//!
//! Reversible string transformation: symmetric encryption rendered in
//! compact or human-safe alphabets, keyed obfuscation, PBKDF2 password
//! hashing, and exact radix conversion between any two bases from 2 to 95.
//!
//! ## Quick Start
//!
//! ```rust
//! use citadel_cipher::{Cipher, CipherConfig};
//!
//! let config = CipherConfig::builder()
//!     .with_key("correct horse battery staple")
//!     .with_base("user_safe")
//!     .build()
//!     .unwrap();
//! let cipher = Cipher::new(config).unwrap();
//!
//! let token = cipher.encrypt_text("order #1234").unwrap();
//! assert!(!token.contains(['a', 'e', 'i', 'o', 'u', '+', '/']));
//! assert_eq!(cipher.decrypt_text(&token).unwrap(), "order #1234");
//! ```
//!
//! ## Radix conversion
//!
//! ```rust
//! use citadel_cipher::base_convert;
//!
//! assert_eq!(base_convert("ff", 16, 10).unwrap(), "255");
//! ```
//!
//! ## Layers
//!
//! - [`mapper`]: long-division conversion between arbitrary alphabets
//! - [`CodecRegistry`]: named byte ⇄ text codecs (`user_safe`, `printable`, `ascii`)
//! - [`Cipher`]: pad, encrypt, prefix the IV, base-encode; and the reverse
//! - [`Presets`]: named configurations kept in memory or on disk
//!
//! ## What's NOT Provided
//!
//! - Authenticated encryption outside [`BlockMode::Gcm`]
//! - Key management or rotation
//! - Secrecy for [`Cipher::obfuscate`] output (it only detects tampering)

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/citadel-cipher/0.1.0")]

pub mod alphabet;
pub mod base;
pub mod block;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod kdf;
pub mod mapper;
pub mod padding;
pub mod preset;
pub mod radix;
pub mod random;

pub use alphabet::Alphabet;
pub use base::{Base, BasePolicy};
pub use block::{AesBlockCipher, BlockCipher, BlockMode, CipherAlgorithm};
pub use codec::{AlphabetCodec, Codec, CodecRegistry, FnCodec, BASE_ASCII, BASE_PRINTABLE, BASE_USER_SAFE};
pub use config::{CipherBuilder, CipherConfig, SecretBytes};
pub use engine::{Cipher, Primitives, DEFAULT_TAG_LEN};
pub use error::CipherError;
pub use kdf::{hmac_digest, HashAlgorithm, Kdf, Pbkdf2};
pub use preset::{FilePresetStore, InMemoryPresetStore, Preset, PresetStore, Presets};
pub use radix::base_convert;
pub use random::{random_hex, slug, OsRandom, SecureRandom};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
