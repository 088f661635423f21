//! sigil-signature: authenticity check for inbound requests
//!
//! A sender holding the shared secret signs every request:
//! ```text
//! message   = "{timestamp_ms}.{canonical_body}"
//! signature = hex(HMAC-SHA256(secret, message))
//! headers   : x-signature: <signature>, x-timestamp: <timestamp_ms>
//! ```
//!
//! The receiver recomputes the signature, compares it in constant time and
//! enforces a symmetric replay window around its own clock. Verification is
//! a pure decision returning an [`Outcome`]; mapping it onto a transport
//! response is left to the caller.

pub mod canonical;
pub mod compare;
pub mod sign;
pub mod verify;

pub use canonical::{canonical_body, canonical_message, Body};
pub use compare::constant_time_eq;
pub use sign::{sign, sign_message, SignError};
pub use verify::{Outcome, Rejection, SignedRequest, Verifier, VerifierConfig};

/// Default accepted clock skew in either direction (5 minutes)
pub const DEFAULT_TOLERANCE_MS: u64 = 300_000;

/// Default header carrying the hex signature
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-signature";

/// Default header carrying the timestamp in ms since epoch
pub const DEFAULT_TIMESTAMP_HEADER: &str = "x-timestamp";
