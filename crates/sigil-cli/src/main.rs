//! sigil: request signing and at-rest encryption CLI
//!
//! Commands:
//!   sign [BODY]       - print signature headers for a request body
//!   verify [BODY]     - check a signature; exit status 1 when rejected
//!   encrypt           - encrypt a value under a passphrase
//!   decrypt [BLOB]    - decrypt a blob produced by `encrypt`
//!   config show       - display the active configuration
//!
//! A BODY of `-` is read from stdin; an omitted BODY is signed as `{}`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sigil_core::{Policy, SigilConfig};
use sigil_crypto::{Cipher, CipherParams, NonceLen};
use sigil_signature::{sign, Body, Outcome, SignedRequest, Verifier, VerifierConfig};

/// Environment variable consulted before prompting for a passphrase
const PASSPHRASE_ENV: &str = "SIGIL_PASSPHRASE";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sigil",
    version,
    about = "Sign and verify requests, encrypt and decrypt values",
    long_about = "sigil: timestamped HMAC-SHA256 request signatures and \
                  passphrase-based AES-256-GCM value encryption"
)]
struct Cli {
    /// Path to sigil.toml configuration file
    #[arg(long, short = 'c', env = "SIGIL_CONFIG", default_value = "/etc/sigil/sigil.toml")]
    config: PathBuf,

    /// Log level for diagnostics on stderr
    #[arg(long, env = "SIGIL_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute signature headers for a body
    Sign {
        /// Request body (`-` reads stdin)
        body: Option<String>,
        /// Shared secret (default: $SIGIL_SECRET, then config)
        #[arg(long)]
        secret: Option<String>,
        /// Timestamp in ms since epoch (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Verify a signature the way the server does
    Verify {
        /// Request body (`-` reads stdin)
        body: Option<String>,
        /// Shared secret (default: $SIGIL_SECRET, then config)
        #[arg(long)]
        secret: Option<String>,
        /// Value of the signature header
        #[arg(long)]
        signature: Option<String>,
        /// Value of the timestamp header
        #[arg(long)]
        timestamp: Option<String>,
        /// Verify as of this time in ms since epoch (default: now)
        #[arg(long)]
        now: Option<i64>,
    },

    /// Encrypt a value (reads stdin when --value is omitted)
    Encrypt {
        #[arg(long)]
        value: Option<String>,
    },

    /// Decrypt a blob (reads stdin when omitted)
    Decrypt { blob: Option<String> },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let config = sigil_core::load_config(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    match cli.command {
        Commands::Sign { body, secret, timestamp } => {
            cmd_sign(&config, body.as_deref(), secret.as_deref(), timestamp)
        }
        Commands::Verify { body, secret, signature, timestamp, now } => cmd_verify(
            &config,
            body.as_deref(),
            secret.as_deref(),
            signature.as_deref(),
            timestamp.as_deref(),
            now,
        ),
        Commands::Encrypt { value } => cmd_encrypt(&config, value).await,
        Commands::Decrypt { blob } => cmd_decrypt(&config, blob).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ── Input helpers ─────────────────────────────────────────────────────────────

fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}

fn read_stdin_line() -> Result<String> {
    let bytes = read_stdin()?;
    let text = String::from_utf8(bytes).context("stdin is not valid UTF-8")?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

/// `None` → absent body, `-` → stdin, anything else → literal
fn load_body(arg: Option<&str>) -> Result<Option<Vec<u8>>> {
    match arg {
        None => Ok(None),
        Some("-") => read_stdin().map(Some),
        Some(text) => Ok(Some(text.as_bytes().to_vec())),
    }
}

fn as_signed_body(body: &Option<Vec<u8>>) -> Body<'_> {
    match body {
        Some(bytes) => Body::Raw(bytes),
        None => Body::Absent,
    }
}

fn now_ms() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?;
    i64::try_from(elapsed.as_millis()).context("system clock out of range")
}

fn read_passphrase(confirm: bool) -> Result<SecretString> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(SecretString::from(passphrase));
    }

    let first = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    if confirm {
        let second =
            rpassword::prompt_password("Confirm passphrase: ").context("reading passphrase")?;
        if first != second {
            anyhow::bail!("passphrases do not match");
        }
    }
    Ok(SecretString::from(first))
}

fn cipher_from_config(config: &SigilConfig) -> Result<Cipher> {
    let nonce_len = NonceLen::from_len(config.crypto.nonce_bytes).with_context(|| {
        format!(
            "crypto.nonce_bytes must be 12 or 16, got {}",
            config.crypto.nonce_bytes
        )
    })?;

    Ok(Cipher::new(CipherParams {
        iterations: config.crypto.pbkdf2_iterations,
        nonce_len,
        ..CipherParams::default()
    }))
}

// ── `sigil sign` / `sigil verify` ─────────────────────────────────────────────

fn cmd_sign(
    config: &SigilConfig,
    body: Option<&str>,
    secret: Option<&str>,
    timestamp: Option<i64>,
) -> Result<()> {
    let secret = config
        .signature
        .resolve_secret(secret)
        .context("no signing secret: pass --secret or set SIGIL_SECRET")?;
    let body = load_body(body)?;
    let timestamp = match timestamp {
        Some(ts) => ts,
        None => now_ms()?,
    };

    let signature = sign(secret.as_bytes(), timestamp, &as_signed_body(&body))?;

    println!("{}: {}", config.signature.timestamp_header, timestamp);
    println!("{}: {}", config.signature.signature_header, signature);
    Ok(())
}

fn cmd_verify(
    config: &SigilConfig,
    body: Option<&str>,
    secret: Option<&str>,
    signature: Option<&str>,
    timestamp: Option<&str>,
    now: Option<i64>,
) -> Result<()> {
    let verifier = Verifier::new(VerifierConfig {
        secret: config.signature.resolve_secret(secret).map(SecretString::from),
        signature_header: config.signature.signature_header.clone(),
        timestamp_header: config.signature.timestamp_header.clone(),
        tolerance_ms: config.signature.tolerance_ms,
    });

    let body = load_body(body)?;
    let request = SignedRequest {
        signature: signature.map(str::as_bytes),
        timestamp: timestamp.map(str::as_bytes),
        body: as_signed_body(&body),
    };

    let outcome = match now {
        Some(now) => verifier.verify(&request, now),
        None => verifier.verify_now(&request),
    };

    let (message, code) = describe_outcome(&outcome, config.signature.policy);
    println!("{message}");
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Human-readable verdict and exit status for a verification outcome
fn describe_outcome(outcome: &Outcome, policy: Policy) -> (String, i32) {
    match (outcome, policy) {
        (Outcome::Accepted, _) => ("accepted".into(), 0),
        (Outcome::Rejected(rejection), _) => {
            (format!("rejected: {}", rejection.public_message()), 1)
        }
        (Outcome::Skipped, Policy::Permissive) => {
            ("skipped: no signing secret configured (permissive)".into(), 0)
        }
        (Outcome::Skipped, Policy::Strict) => {
            ("rejected: no signing secret configured (strict)".into(), 1)
        }
    }
}

// ── `sigil encrypt` / `sigil decrypt` ─────────────────────────────────────────

async fn cmd_encrypt(config: &SigilConfig, value: Option<String>) -> Result<()> {
    let cipher = cipher_from_config(config)?;
    let value = match value {
        Some(v) => v,
        None => read_stdin_line()?,
    };
    let passphrase = read_passphrase(true)?;

    // key derivation runs on the blocking pool
    let blob = tokio::task::spawn_blocking(move || cipher.encrypt(&value, &passphrase))
        .await
        .context("encryption task failed")??;

    println!("{blob}");
    Ok(())
}

async fn cmd_decrypt(config: &SigilConfig, blob: Option<String>) -> Result<()> {
    let cipher = cipher_from_config(config)?;
    let blob = match blob {
        Some(b) => b,
        None => read_stdin_line()?,
    };
    let passphrase = read_passphrase(false)?;

    let plaintext = tokio::task::spawn_blocking(move || cipher.decrypt(&blob, &passphrase))
        .await
        .context("decryption task failed")?
        .map_err(|e| {
            tracing::debug!(kind = ?e.kind(), detail = e.detail(), "decryption rejected");
            anyhow::Error::new(e)
        })?;

    println!("{plaintext}");
    Ok(())
}

// ── `sigil config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &SigilConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
