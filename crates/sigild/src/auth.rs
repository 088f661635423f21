//! Signed-request middleware
//!
//! Buffers the body, runs the verifier, and maps the outcome onto HTTP:
//!   Accepted            → forward to the handler
//!   Rejected(reason)    → 401 {"error": "<public reason>"}
//!   Skipped, permissive → forward with a warning
//!   Skipped, strict     → 401 {"error": "Signature verification failed"}

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sigil_core::Policy;
use sigil_signature::{Body as SignedBody, Outcome, Rejection, SignedRequest};
use tracing::{error, warn};

use crate::server::AppState;

pub async fn require_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, path = %parts.uri.path(), "could not buffer signed request body");
            state.metrics.observe(&Outcome::Rejected(Rejection::Internal));
            return unauthorized(Rejection::Internal);
        }
    };

    let config = state.verifier.config();
    let signed = SignedRequest {
        signature: parts
            .headers
            .get(config.signature_header.as_str())
            .map(|v| v.as_bytes()),
        timestamp: parts
            .headers
            .get(config.timestamp_header.as_str())
            .map(|v| v.as_bytes()),
        body: SignedBody::Raw(&bytes),
    };

    let outcome = state.verifier.verify_now(&signed);
    state.metrics.observe(&outcome);

    match outcome {
        Outcome::Accepted => {}
        Outcome::Rejected(rejection) => {
            warn!(
                reason = rejection.as_str(),
                method = %parts.method,
                path = %parts.uri.path(),
                "signed request rejected"
            );
            return unauthorized(rejection);
        }
        Outcome::Skipped => match state.policy {
            Policy::Permissive => {
                warn!(path = %parts.uri.path(), "no signing secret configured, skipping verification");
            }
            Policy::Strict => {
                error!(path = %parts.uri.path(), "no signing secret configured, refusing signed route");
                return unauthorized(Rejection::Internal);
            }
        },
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn unauthorized(rejection: Rejection) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": rejection.public_message() })),
    )
        .into_response()
}
