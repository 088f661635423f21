//! HMAC-SHA256 signing

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::canonical::{canonical_message, Body};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("HMAC key rejected")]
    InvalidKey,
}

/// HMAC-SHA256 over an already-built message, lowercase hex.
pub fn sign_message(secret: &[u8], message: &[u8]) -> Result<String, SignError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignError::InvalidKey)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a request body the way a sender does.
pub fn sign(secret: &[u8], timestamp_ms: i64, body: &Body<'_>) -> Result<String, SignError> {
    let message = canonical_message(&timestamp_ms.to_string(), body);
    sign_message(secret, &message)
}
