use stratum_token::JwtError;
use thiserror::Error;

/// Errors raised while loading configuration or building components from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_saphyr::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The remote tier could not be set up.
    #[error("remote cache: {0}")]
    Redis(#[from] stratum_redis::error::Error),

    /// The token signer rejected its settings.
    #[error("token signer: {0}")]
    Signer(#[from] JwtError),

    /// Values are individually valid but inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
