use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// News search with a small fallback list: the primary domain is tried
/// first, and on failure the client rotates to the next configured mirror.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    base_urls: Vec<String>,
}

impl SearchClient {
    pub fn with_client(client: reqwest::Client, base_urls: Vec<String>) -> Self {
        Self { client, base_urls }
    }

    pub fn new(base_urls: Vec<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build search HTTP client");
        Self::with_client(client, base_urls)
    }

    pub async fn search(&self, query: &str, limit: u32) -> ClientResult<Vec<SearchResult>> {
        let mut last_err = ClientError::ServiceUnavailable("no search endpoints configured".into());
        for base in &self.base_urls {
            match self
                .client
                .get(format!("{base}/search"))
                .query(&[("q", query), ("limit", &limit.to_string())])
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<SearchResponse>()
                        .await
                        .map(|r| r.results)
                        .map_err(ClientError::from);
                }
                Ok(resp) => {
                    last_err = ClientError::ServiceUnavailable(format!("status {}", resp.status()));
                }
                Err(e) => last_err = ClientError::from(e),
            }
        }
        Err(last_err)
    }

    pub async fn health(&self) -> bool {
        for base in &self.base_urls {
            if let Ok(resp) = self.client.get(format!("{base}/health")).send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }
        false
    }
}
