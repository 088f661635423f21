//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → AES-256 key

use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CipherError;
use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit key derived from a passphrase.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a passphrase and salt using PBKDF2-HMAC-SHA256.
///
/// The salt is random per encryption and stored in the blob; it does not need
/// to be secret. `iterations` must match what the blob was written with.
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> Result<DerivedKey, CipherError> {
    if iterations == 0 {
        return Err(CipherError::InvalidParams("PBKDF2 iteration count must be > 0"));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        salt,
        iterations,
        &mut key,
    );

    let derived = DerivedKey::from_bytes(key);
    key.zeroize();
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    // Fast params for testing
    const TEST_ROUNDS: u32 = 1000;

    #[test]
    fn test_kdf_deterministic() {
        let passphrase = SecretString::from("test-passphrase-123");
        let salt = [1u8; SALT_SIZE];

        let key1 = derive_key(&passphrase, &salt, TEST_ROUNDS).unwrap();
        let key2 = derive_key(&passphrase, &salt, TEST_ROUNDS).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let salt = [1u8; SALT_SIZE];

        let key1 = derive_key(&SecretString::from("passphrase-a"), &salt, TEST_ROUNDS).unwrap();
        let key2 = derive_key(&SecretString::from("passphrase-b"), &salt, TEST_ROUNDS).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_different_salts() {
        let passphrase = SecretString::from("same-passphrase");

        let key1 = derive_key(&passphrase, &[1u8; SALT_SIZE], TEST_ROUNDS).unwrap();
        let key2 = derive_key(&passphrase, &[2u8; SALT_SIZE], TEST_ROUNDS).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_iteration_count_matters() {
        let passphrase = SecretString::from("same-passphrase");
        let salt = [7u8; SALT_SIZE];

        let key1 = derive_key(&passphrase, &salt, TEST_ROUNDS).unwrap();
        let key2 = derive_key(&passphrase, &salt, TEST_ROUNDS + 1).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_zero_iterations_rejected() {
        let result = derive_key(&SecretString::from("pw"), &[0u8; SALT_SIZE], 0);
        assert!(matches!(result, Err(CipherError::InvalidParams(_))));
    }

    #[test]
    fn test_kdf_rfc_style_vector() {
        // PBKDF2-HMAC-SHA256("password", 64 x 0x00, 1 round) must agree with
        // a direct HMAC of salt || INT(1).
        use hmac::{Hmac, Mac};

        let salt = [0u8; SALT_SIZE];
        let key = derive_key(&SecretString::from("password"), &salt, 1).unwrap();

        let mut mac = Hmac::<Sha256>::new_from_slice(b"password").unwrap();
        mac.update(&salt);
        mac.update(&1u32.to_be_bytes());
        let expected = mac.finalize().into_bytes();

        assert_eq!(key.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_debug_redacts() {
        let key = DerivedKey::from_bytes([0xAB; KEY_SIZE]);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("171"));
    }
}
