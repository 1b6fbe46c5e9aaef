use thiserror::Error;

/// Store-layer error kinds. A `Connectivity` failure aborts the caller's
/// startup sequence with an actionable message; everything else is a normal
/// query-time failure the caller decides how to handle.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not connect to {pool}: {cause}")]
    Connectivity {
        pool: &'static str,
        cause: String,
        ipv6_unreachable: bool,
    },

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("schema probe failed: {0}")]
    SchemaProbe(String),

    #[error("migration failed: {0}")]
    Migration(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Actionable detail to append to a startup-abort log line (spec §7).
    pub fn actionable_detail(&self) -> Option<&'static str> {
        match self {
            StoreError::Connectivity {
                ipv6_unreachable: true,
                ..
            } => Some("network is unreachable over IPv6 — check DATABASE_URL host resolution or disable IPv6 routing"),
            _ => None,
        }
    }
}

/// Inspects a connection failure for the IPv6-unreachable signature so
/// callers get a distinguishing diagnostic instead of a bare driver error.
pub fn is_ipv6_unreachable(err: &sqlx::Error) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("network is unreachable") || msg.contains("enetunreach")
}
