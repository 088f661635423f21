//! HTTP router: signed hook routes plus unauthenticated health and metrics
//!
//! Endpoints:
//!   POST /hooks/{*path}  - signature-protected receiver
//!   GET  /healthz        - liveness probe
//!   GET  /metrics        - Prometheus text format

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderName, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde_json::json;
use sigil_core::{Policy, SigilConfig};
use sigil_signature::{Verifier, VerifierConfig};
use std::sync::Arc;
use tracing::info;

use crate::auth::require_signature;
use crate::metrics::Metrics;

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub policy: Policy,
    pub body_limit: usize,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Build state from config. `secret` is the already-resolved shared secret.
    ///
    /// Fails if either configured header is not a valid HTTP header name.
    pub fn from_config(config: &SigilConfig, secret: Option<String>) -> Result<Self> {
        let verifier = Verifier::new(VerifierConfig {
            secret: secret.map(SecretString::from),
            signature_header: header_name(&config.signature.signature_header)?,
            timestamp_header: header_name(&config.signature.timestamp_header)?,
            tolerance_ms: config.signature.tolerance_ms,
        });

        Ok(Self {
            verifier: Arc::new(verifier),
            policy: config.signature.policy,
            body_limit: config.server.body_limit_bytes,
            metrics: Arc::new(Metrics::new()),
        })
    }
}

/// Normalized (lowercase) form of a configured header name.
fn header_name(name: &str) -> Result<String> {
    let parsed = HeaderName::from_bytes(name.as_bytes())
        .with_context(|| format!("invalid header name in config: {name:?}"))?;
    Ok(parsed.as_str().to_string())
}

pub fn router(state: AppState) -> Router {
    let signed = Router::new()
        .route("/hooks/{*path}", post(receive_hook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    Router::new()
        .merge(signed)
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve the router on `addr` until ctrl-c.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {addr}: {e}"))?;

    info!(addr = %addr, "listening on /hooks/*, /healthz, /metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("http server: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("ctrl-c handler failed: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn receive_hook(Path(hook): Path<String>, body: Bytes) -> impl IntoResponse {
    info!(hook = %hook, bytes = body.len(), "signed hook received");
    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "hook": hook })),
    )
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}
