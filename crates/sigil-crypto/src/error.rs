use thiserror::Error;

/// Cipher failure.
///
/// Malformed input and failed authentication must `Display` identically.
/// Use [`CipherError::kind`] and [`CipherError::detail`] for server-side logs.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("decryption failed")]
    MalformedInput(&'static str),

    #[error("decryption failed")]
    AuthenticationFailed,

    #[error("encryption failed: {0}")]
    Encryption(&'static str),

    #[error("invalid cipher parameters: {0}")]
    InvalidParams(&'static str),
}

/// Loggable classification of a [`CipherError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherErrorKind {
    MalformedInput,
    AuthenticationFailed,
    Encryption,
    InvalidParams,
}

impl CipherError {
    pub fn kind(&self) -> CipherErrorKind {
        match self {
            CipherError::MalformedInput(_) => CipherErrorKind::MalformedInput,
            CipherError::AuthenticationFailed => CipherErrorKind::AuthenticationFailed,
            CipherError::Encryption(_) => CipherErrorKind::Encryption,
            CipherError::InvalidParams(_) => CipherErrorKind::InvalidParams,
        }
    }

    /// Internal detail for logs. Never includes key material or plaintext.
    pub fn detail(&self) -> &'static str {
        match self {
            CipherError::MalformedInput(d)
            | CipherError::Encryption(d)
            | CipherError::InvalidParams(d) => d,
            CipherError::AuthenticationFailed => "authentication tag mismatch",
        }
    }
}
