use thiserror::Error;

/// Error kinds shared across the ingestion core.
///
/// Recoverable failures (paywalls, archive-not-ready, transient network
/// errors) are represented as `Outcome` values, not as errors — only truly
/// exceptional conditions surface here.
#[derive(Error, Debug)]
pub enum IntelError {
    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

pub type IntelResult<T> = Result<T, IntelError>;
