//! Stateless verification of signed requests

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

use crate::canonical::{canonical_message, Body};
use crate::compare::constant_time_eq;
use crate::sign::sign_message;
use crate::{DEFAULT_SIGNATURE_HEADER, DEFAULT_TIMESTAMP_HEADER, DEFAULT_TOLERANCE_MS};

/// Verifier settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Shared secret; `None` or empty means verification is skipped
    pub secret: Option<SecretString>,
    pub signature_header: String,
    pub timestamp_header: String,
    /// Accepted skew between sender timestamp and local clock, both directions
    pub tolerance_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.into(),
            timestamp_header: DEFAULT_TIMESTAMP_HEADER.into(),
            tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }
}

/// Per-request inputs. Header values are raw bytes so that undecodable
/// headers are an internal failure rather than a missing header.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    pub signature: Option<&'a [u8]>,
    pub timestamp: Option<&'a [u8]>,
    pub body: Body<'a>,
}

/// Why a request was refused. `Display` is for server-side logs; use
/// [`Rejection::public_message`] for anything sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("signature or timestamp header missing")]
    MissingHeaders,

    #[error("timestamp unparseable or outside tolerance window")]
    StaleOrInvalidTimestamp,

    #[error("signature does not match")]
    SignatureMismatch,

    #[error("internal verification error")]
    Internal,
}

impl Rejection {
    /// Reason string safe to return across the trust boundary.
    pub fn public_message(&self) -> &'static str {
        match self {
            Rejection::MissingHeaders => "Missing signature headers",
            Rejection::StaleOrInvalidTimestamp => "Stale or invalid timestamp",
            Rejection::SignatureMismatch => "Invalid signature",
            Rejection::Internal => "Signature verification failed",
        }
    }

    /// Stable label for metrics and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingHeaders => "missing_headers",
            Rejection::StaleOrInvalidTimestamp => "stale_or_invalid_timestamp",
            Rejection::SignatureMismatch => "signature_mismatch",
            Rejection::Internal => "internal",
        }
    }
}

/// Result of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected(Rejection),
    /// No secret configured; the caller's policy decides what happens.
    Skipped,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

/// Verifies timestamped HMAC-SHA256 request signatures.
///
/// Holds no mutable state; share it freely between request handlers.
#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Whether a non-empty secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret().is_some()
    }

    fn secret(&self) -> Option<&[u8]> {
        self.config
            .secret
            .as_ref()
            .map(|s| s.expose_secret().as_bytes())
            .filter(|s| !s.is_empty())
    }

    /// Verify against the system clock.
    pub fn verify_now(&self, request: &SignedRequest<'_>) -> Outcome {
        match now_ms() {
            Some(now) => self.verify(request, now),
            None => {
                warn!("system clock unavailable, rejecting signed request");
                Outcome::Rejected(Rejection::Internal)
            }
        }
    }

    /// Verify a request as of `now_ms` (milliseconds since the Unix epoch).
    pub fn verify(&self, request: &SignedRequest<'_>, now_ms: i64) -> Outcome {
        let Some(secret) = self.secret() else {
            return Outcome::Skipped;
        };

        let outcome = match self.check(secret, request, now_ms) {
            Ok(()) => Outcome::Accepted,
            Err(rejection) => Outcome::Rejected(rejection),
        };

        match outcome {
            Outcome::Rejected(rejection) => {
                debug!(reason = rejection.as_str(), "signature rejected")
            }
            _ => debug!("signature accepted"),
        }
        outcome
    }

    fn check(&self, secret: &[u8], request: &SignedRequest<'_>, now_ms: i64) -> Result<(), Rejection> {
        let (Some(signature), Some(timestamp)) =
            (non_empty(request.signature), non_empty(request.timestamp))
        else {
            return Err(Rejection::MissingHeaders);
        };

        let timestamp = std::str::from_utf8(timestamp).map_err(|_| {
            warn!(header = %self.config.timestamp_header, "timestamp header is not valid UTF-8");
            Rejection::Internal
        })?;
        let signature = std::str::from_utf8(signature).map_err(|_| {
            warn!(header = %self.config.signature_header, "signature header is not valid UTF-8");
            Rejection::Internal
        })?;

        let sent_ms: i64 = timestamp
            .parse()
            .map_err(|_| Rejection::StaleOrInvalidTimestamp)?;
        if now_ms.abs_diff(sent_ms) > self.config.tolerance_ms {
            return Err(Rejection::StaleOrInvalidTimestamp);
        }

        let message = canonical_message(timestamp, &request.body);
        let expected = sign_message(secret, &message).map_err(|e| {
            warn!(error = %e, "HMAC computation failed");
            Rejection::Internal
        })?;

        if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            Ok(())
        } else {
            Err(Rejection::SignatureMismatch)
        }
    }
}

/// Empty header values count as absent.
fn non_empty(value: Option<&[u8]>) -> Option<&[u8]> {
    value.filter(|v| !v.is_empty())
}

fn now_ms() -> Option<i64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(elapsed.as_millis()).ok()
}
