use thiserror::Error;

pub type SigilResult<T> = Result<T, SigilError>;

#[derive(Debug, Error)]
pub enum SigilError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
