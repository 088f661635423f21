use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SigilError, SigilResult};

/// Environment variable that overrides `signature.secret`.
pub const SECRET_ENV: &str = "SIGIL_SECRET";

/// Top-level configuration (loaded from sigil.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigilConfig {
    /// Warn if the config file is world-readable (default: true)
    pub config_file_mode_check: bool,
    pub server: ServerConfig,
    pub signature: SignatureConfig,
    pub crypto: CryptoConfig,
}

impl Default for SigilConfig {
    fn default() -> Self {
        Self {
            config_file_mode_check: true,
            server: ServerConfig::default(),
            signature: SignatureConfig::default(),
            crypto: CryptoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address (default: 127.0.0.1:8080)
    pub listen: String,
    /// Maximum buffered request body in bytes for signed routes
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".into(),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// What the boundary does when no shared secret is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Refuse every signed route with 401 (fail closed)
    #[default]
    Strict,
    /// Let requests through with a warning (fail open)
    Permissive,
}

/// Inbound request signature settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Shared HMAC secret. Never serialized back out.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Header carrying the hex HMAC-SHA256 signature
    pub signature_header: String,
    /// Header carrying the timestamp in ms since epoch
    pub timestamp_header: String,
    /// Accepted clock skew in either direction (default: 300000 = 5 min)
    pub tolerance_ms: u64,
    /// Unconfigured-secret policy
    pub policy: Policy,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: "x-signature".into(),
            timestamp_header: "x-timestamp".into(),
            tolerance_ms: 300_000,
            policy: Policy::Strict,
        }
    }
}

impl std::fmt::Debug for SignatureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("signature_header", &self.signature_header)
            .field("timestamp_header", &self.timestamp_header)
            .field("tolerance_ms", &self.tolerance_ms)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SignatureConfig {
    /// Resolve the effective secret: explicit override, then `SIGIL_SECRET`,
    /// then the config file. Empty values count as unset.
    pub fn resolve_secret(&self, explicit: Option<&str>) -> Option<String> {
        self.resolve_secret_with(explicit, |k| std::env::var(k).ok())
    }

    pub fn resolve_secret_with(
        &self,
        explicit: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| env(SECRET_ENV))
            .or_else(|| self.secret.clone())
            .filter(|s| !s.is_empty())
    }
}

/// At-rest encryption settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 iterations (default: 100000)
    pub pbkdf2_iterations: u32,
    /// Nonce length for new blobs: 16 (interoperable) or 12 (standard GCM)
    pub nonce_bytes: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: 100_000,
            nonce_bytes: 16,
        }
    }
}

impl SigilConfig {
    /// Reject values the primitives cannot work with.
    pub fn validate(&self) -> SigilResult<()> {
        if self.signature.signature_header.is_empty() || self.signature.timestamp_header.is_empty()
        {
            return Err(SigilError::Config("signature header names must not be empty".into()));
        }
        if self
            .signature
            .signature_header
            .eq_ignore_ascii_case(&self.signature.timestamp_header)
        {
            return Err(SigilError::Config(
                "signature and timestamp headers must differ".into(),
            ));
        }
        if self.crypto.pbkdf2_iterations == 0 {
            return Err(SigilError::Config("pbkdf2_iterations must be > 0".into()));
        }
        if !matches!(self.crypto.nonce_bytes, 12 | 16) {
            return Err(SigilError::Config(format!(
                "nonce_bytes must be 12 or 16, got {}",
                self.crypto.nonce_bytes
            )));
        }
        Ok(())
    }
}

/// Load and validate a config file. A missing file yields defaults.
pub fn load_config(path: &Path) -> SigilResult<SigilConfig> {
    if !path.exists() {
        tracing::warn!("config file not found: {}  (using defaults)", path.display());
        return Ok(SigilConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: SigilConfig = toml::from_str(&content)?;

    if config.config_file_mode_check {
        check_file_mode(path);
    }

    config.validate()?;
    Ok(config)
}

#[cfg(unix)]
fn check_file_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o004 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "config file is world-readable and may contain the signing secret"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_mode(_path: &Path) {}
