use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Reasons `Extractor::extract` can fail without raising, mirroring the
/// string codes a scraping backend would report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    PaidSubscription,
    Timeout,
    Http(u16),
    Empty,
    Unknown(String),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::PaidSubscription => write!(f, "paid_subscription"),
            ExtractionError::Timeout => write!(f, "timeout"),
            ExtractionError::Http(code) => write!(f, "http_{code}"),
            ExtractionError::Empty => write!(f, "empty"),
            ExtractionError::Unknown(msg) => write!(f, "unknown: {msg}"),
        }
    }
}
