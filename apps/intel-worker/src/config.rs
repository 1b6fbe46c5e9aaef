use std::env;

use anyhow::{Context, Result};
use intel_clients::ClientsConfig;

/// Worker-wide configuration loaded from the environment at startup. Mirrors
/// the per-crate env-var pattern `intel-clients::ClientsConfig` uses, just
/// one level up: database URLs, pool sizes, research-report directory.
pub struct WorkerConfig {
    pub research_database_url: String,
    pub meta_database_url: String,
    pub max_connections: u32,
    pub worker_count: usize,
    pub research_reports_dir: String,
    pub clients: ClientsConfig,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            research_database_url: env::var("RESEARCH_DATABASE_URL")
                .context("RESEARCH_DATABASE_URL must be set")?,
            meta_database_url: env::var("META_DATABASE_URL").context("META_DATABASE_URL must be set")?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            worker_count: env::var("WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            research_reports_dir: env::var("RESEARCH_REPORTS_DIR")
                .unwrap_or_else(|_| "./research_reports".to_string()),
            clients: ClientsConfig::default(),
        })
    }
}
