use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
struct SubmitResponse {
    job_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AvailabilityResponse {
    available: bool,
    archived_url: Option<String>,
}

/// Submits URLs to an archiving service, polls for availability, and fetches
/// archived HTML with browser-like headers so the archive's own rate limiter
/// doesn't treat us as a bot.
#[derive(Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArchiveClient {
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build archive HTTP client");
        Self::with_client(client, base_url)
    }

    pub async fn submit(&self, url: &str) -> ClientResult<()> {
        let resp = self
            .client
            .post(format!("{}/save", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        let _ = resp.json::<SubmitResponse>().await.ok();
        Ok(())
    }

    pub async fn check_available(&self, url: &str) -> ClientResult<Option<String>> {
        let resp = self
            .client
            .get(format!("{}/available", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        let body = resp.json::<AvailabilityResponse>().await?;
        Ok(if body.available { body.archived_url } else { None })
    }

    pub async fn fetch_archived_html(&self, archived_url: &str) -> ClientResult<String> {
        let resp = self
            .client
            .get(archived_url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        Ok(resp.text().await?)
    }

    pub async fn health(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
