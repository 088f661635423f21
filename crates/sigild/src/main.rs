//! sigild: signed-request boundary daemon
//!
//! Usage:
//!   sigild [--config /etc/sigil/sigil.toml] [--listen 0.0.0.0:8080]
//!
//! The signing secret is resolved as: --secret, then $SIGIL_SECRET, then
//! `signature.secret` in the config file.

mod auth;
mod metrics;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sigil_core::Policy;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sigild", version, about = "Signed-request boundary daemon")]
struct Cli {
    /// Path to sigil.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SIGIL_CONFIG",
        default_value = "/etc/sigil/sigil.toml"
    )]
    config: PathBuf,

    /// Listen address (overrides server.listen)
    #[arg(long, short = 'l')]
    listen: Option<String>,

    /// Shared signing secret (prefer $SIGIL_SECRET; argv is visible to other users)
    #[arg(long)]
    secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SIGIL_LOG", default_value = "info")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "SIGIL_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, &cli.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "sigild starting"
    );

    let config = sigil_core::load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let secret = config.signature.resolve_secret(cli.secret.as_deref());
    match (&secret, config.signature.policy) {
        (Some(_), _) => info!(
            tolerance_ms = config.signature.tolerance_ms,
            header = %config.signature.signature_header,
            "request signature verification enabled"
        ),
        (None, Policy::Permissive) => warn!(
            "no signing secret configured and policy is permissive: signed routes are NOT verified"
        ),
        (None, Policy::Strict) => warn!(
            "no signing secret configured and policy is strict: signed routes will return 401"
        ),
    }

    let listen = cli.listen.unwrap_or_else(|| config.server.listen.clone());
    let state = server::AppState::from_config(&config, secret)?;

    server::serve(&listen, state).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
