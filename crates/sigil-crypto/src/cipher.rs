//! AES-256-GCM encryption of string values under a passphrase-derived key
//!
//! Each call draws a fresh 64-byte salt and a fresh nonce, so a key/nonce
//! pair is never reused. The tag is carried detached in the blob and is
//! verified before any plaintext byte is released.

use aes_gcm::{
    aead::{self, consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    Aes256Gcm, AesGcm,
};
use rand::RngCore;
use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroize;

use crate::blob::EncryptedBlob;
use crate::error::CipherError;
use crate::kdf::{derive_key, DerivedKey};
use crate::{PBKDF2_ITERATIONS, SALT_SIZE, SIGIL_AAD, TAG_SIZE};

/// AES-256-GCM with a 128-bit nonce (J0 derived through GHASH).
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Nonce length used for newly encrypted blobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonceLen {
    /// 16 bytes. Bit-compatible with blobs written by existing deployments.
    #[default]
    Legacy16,
    /// 12 bytes, the standard GCM nonce.
    Standard12,
}

impl NonceLen {
    pub fn bytes(self) -> usize {
        match self {
            NonceLen::Legacy16 => 16,
            NonceLen::Standard12 => 12,
        }
    }

    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(NonceLen::Legacy16),
            12 => Some(NonceLen::Standard12),
            _ => None,
        }
    }
}

/// Cipher parameters. `Default` yields the interoperable set.
#[derive(Debug, Clone)]
pub struct CipherParams {
    /// PBKDF2 rounds (default: 100000)
    pub iterations: u32,
    /// Nonce length for new blobs (decryption follows the blob)
    pub nonce_len: NonceLen,
    /// Additional authenticated data; must match between encrypt and decrypt
    pub aad: Vec<u8>,
}

impl Default for CipherParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
            nonce_len: NonceLen::default(),
            aad: SIGIL_AAD.to_vec(),
        }
    }
}

/// Passphrase-keyed authenticated cipher. Stateless; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Cipher {
    params: CipherParams,
}

impl Cipher {
    pub fn new(params: CipherParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CipherParams {
        &self.params
    }

    /// Encrypt `plaintext`, returning a `salt:nonce:tag:ciphertext` blob.
    pub fn encrypt(&self, plaintext: &str, passphrase: &SecretString) -> Result<String, CipherError> {
        self.encrypt_blob(plaintext.as_bytes(), passphrase)
            .map(|blob| blob.to_string())
    }

    /// Encrypt raw bytes into a structured blob.
    pub fn encrypt_blob(
        &self,
        plaintext: &[u8],
        passphrase: &SecretString,
    ) -> Result<EncryptedBlob, CipherError> {
        let mut rng = rand::thread_rng();

        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);

        let mut nonce = vec![0u8; self.params.nonce_len.bytes()];
        rng.fill_bytes(&mut nonce);

        let key = derive_key(passphrase, &salt, self.params.iterations)?;

        let mut buffer = plaintext.to_vec();
        let tag = match self.params.nonce_len {
            NonceLen::Legacy16 => seal::<Aes256Gcm16>(&key, &nonce, &self.params.aad, &mut buffer),
            NonceLen::Standard12 => seal::<Aes256Gcm>(&key, &nonce, &self.params.aad, &mut buffer),
        };
        let tag = match tag {
            Ok(tag) => tag,
            Err(e) => {
                buffer.zeroize();
                return Err(e);
            }
        };

        debug!(
            nonce_len = nonce.len(),
            ciphertext_len = buffer.len(),
            "value encrypted"
        );

        Ok(EncryptedBlob {
            salt,
            nonce,
            tag,
            ciphertext: buffer,
        })
    }

    /// Decrypt a blob produced by [`Cipher::encrypt`].
    ///
    /// Fails with [`CipherError::MalformedInput`] if the blob cannot be
    /// parsed or the plaintext is not UTF-8, and with
    /// [`CipherError::AuthenticationFailed`] if the tag does not verify.
    pub fn decrypt(&self, blob: &str, passphrase: &SecretString) -> Result<String, CipherError> {
        let blob: EncryptedBlob = blob.parse()?;
        let plaintext = self.decrypt_blob(&blob, passphrase)?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CipherError::MalformedInput("plaintext is not UTF-8")
        })
    }

    /// Decrypt a structured blob to raw bytes.
    pub fn decrypt_blob(
        &self,
        blob: &EncryptedBlob,
        passphrase: &SecretString,
    ) -> Result<Vec<u8>, CipherError> {
        let nonce_len = blob
            .nonce_len()
            .ok_or(CipherError::MalformedInput("nonce has wrong length"))?;

        let key = derive_key(passphrase, &blob.salt, self.params.iterations)?;

        let mut buffer = blob.ciphertext.clone();
        let opened = match nonce_len {
            NonceLen::Legacy16 => {
                open::<Aes256Gcm16>(&key, &blob.nonce, &self.params.aad, &mut buffer, &blob.tag)
            }
            NonceLen::Standard12 => {
                open::<Aes256Gcm>(&key, &blob.nonce, &self.params.aad, &mut buffer, &blob.tag)
            }
        };

        match opened {
            Ok(()) => Ok(buffer),
            Err(e) => {
                debug!(reason = e.detail(), "value decryption rejected");
                buffer.zeroize();
                Err(e)
            }
        }
    }
}

/// Encrypt in place; returns the detached tag.
fn seal<C>(
    key: &DerivedKey,
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut Vec<u8>,
) -> Result<[u8; TAG_SIZE], CipherError>
where
    C: KeyInit + AeadInPlace,
{
    if nonce.len() != aead::Nonce::<C>::default().len() {
        return Err(CipherError::InvalidParams("nonce length does not match cipher"));
    }

    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|_| CipherError::InvalidParams("key length does not match cipher"))?;

    let tag = cipher
        .encrypt_in_place_detached(aead::Nonce::<C>::from_slice(nonce), aad, buffer)
        .map_err(|_| CipherError::Encryption("AES-256-GCM seal failed"))?;

    tag.as_slice()
        .try_into()
        .map_err(|_| CipherError::Encryption("unexpected tag length"))
}

/// Verify the tag and decrypt in place. The buffer is untouched on failure.
fn open<C>(
    key: &DerivedKey,
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut Vec<u8>,
    tag: &[u8; TAG_SIZE],
) -> Result<(), CipherError>
where
    C: KeyInit + AeadInPlace,
{
    if nonce.len() != aead::Nonce::<C>::default().len() {
        return Err(CipherError::MalformedInput("nonce has wrong length"));
    }
    if tag.len() != aead::Tag::<C>::default().len() {
        return Err(CipherError::MalformedInput("tag has wrong length"));
    }

    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|_| CipherError::InvalidParams("key length does not match cipher"))?;

    cipher
        .decrypt_in_place_detached(
            aead::Nonce::<C>::from_slice(nonce),
            aad,
            buffer,
            aead::Tag::<C>::from_slice(tag),
        )
        .map_err(|_| CipherError::AuthenticationFailed)
}

/// Encrypt with the default (interoperable) parameters.
pub fn encrypt(plaintext: &str, passphrase: &SecretString) -> Result<String, CipherError> {
    Cipher::default().encrypt(plaintext, passphrase)
}

/// Decrypt with the default (interoperable) parameters.
pub fn decrypt(blob: &str, passphrase: &SecretString) -> Result<String, CipherError> {
    Cipher::default().decrypt(blob, passphrase)
}
