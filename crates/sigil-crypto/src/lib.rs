//! sigil-crypto: passphrase-based authenticated encryption of values at rest
//!
//! Blob format (text, colon-delimited, every field lowercase hex):
//! ```text
//! salt(64 bytes):nonce(16 bytes):tag(16 bytes):ciphertext(N bytes)
//! ```
//!
//! Key schedule:
//! ```text
//! passphrase ──PBKDF2-HMAC-SHA256(salt, 100_000 rounds)──▶ 256-bit key
//!   └── AES-256-GCM (key, nonce=random per call, AAD=SIGIL_AAD) ──▶ ciphertext + tag
//! ```

pub mod blob;
pub mod cipher;
pub mod error;
pub mod kdf;

pub use blob::EncryptedBlob;
pub use cipher::{decrypt, encrypt, Cipher, CipherParams, NonceLen};
pub use error::{CipherError, CipherErrorKind};
pub use kdf::{derive_key, DerivedKey};

/// Size of the derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the random PBKDF2 salt stored in every blob
pub const SALT_SIZE: usize = 64;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// PBKDF2 rounds required for interoperable blobs
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Additional authenticated data bound into every tag
pub const SIGIL_AAD: &[u8] = b"sigil-at-rest-v1";
