use chrono::Utc;
use intel_store::{ResearchStore, StoreResult};

const DEFAULT_THRESHOLD: i32 = 4;

/// Normalizes a URL down to its host for use as the domain-health key.
pub fn normalize_domain(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .trim_start_matches("www.")
        .to_lowercase()
}

/// Per-domain failure tracking consulted before every outbound article
/// fetch. Backed by `ResearchStore` so blacklist state survives restarts.
pub struct DomainHealth {
    store: std::sync::Arc<ResearchStore>,
    threshold: i32,
}

impl DomainHealth {
    pub fn new(store: std::sync::Arc<ResearchStore>) -> Self {
        let threshold = std::env::var("AUTO_BLACKLIST_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_THRESHOLD);
        Self { store, threshold }
    }

    pub async fn is_blacklisted(&self, url: &str) -> StoreResult<bool> {
        let domain = normalize_domain(url);
        Ok(self
            .store
            .domain_health(&domain)
            .await?
            .map(|r| r.auto_blacklisted)
            .unwrap_or(false))
    }

    pub async fn record_success(&self, url: &str) -> StoreResult<()> {
        let domain = normalize_domain(url);
        self.store.record_domain_success(&domain, Utc::now()).await
    }

    /// Returns the post-increment failure count. The increment and the
    /// auto-blacklist flip both happen inside one SQL statement so
    /// concurrent failures against the same domain can't lose an update.
    pub async fn record_failure(&self, url: &str, reason: &str) -> StoreResult<i32> {
        let domain = normalize_domain(url);
        let new_count = self
            .store
            .record_domain_failure(&domain, reason, Utc::now(), self.threshold)
            .await?;
        if new_count >= self.threshold {
            tracing::warn!(domain = %domain, failures = new_count, "domain auto-blacklisted");
        }
        Ok(new_count)
    }

    pub fn should_auto_blacklist(&self, consecutive_failures: i32) -> bool {
        exceeds_threshold(consecutive_failures, self.threshold)
    }
}

fn exceeds_threshold(consecutive_failures: i32, threshold: i32) -> bool {
    consecutive_failures >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scheme_www_and_path() {
        assert_eq!(normalize_domain("https://www.Example.com/a/b?c=1"), "example.com");
        assert_eq!(normalize_domain("http://news.example.com/x"), "news.example.com");
    }

    #[test]
    fn threshold_boundary() {
        assert!(!exceeds_threshold(3, 4));
        assert!(exceeds_threshold(4, 4));
    }
}
