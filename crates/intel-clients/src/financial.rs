use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Deserialize)]
pub struct DisclosureRecord {
    pub politician_name: String,
    pub ticker: String,
    pub company_name: Option<String>,
    pub transaction_date: String,
    pub disclosure_date: String,
    pub transaction_type: String,
    pub amount: String,
    pub owner: Option<String>,
    pub asset_type: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub chamber: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DisclosuresResponse {
    results: Vec<DisclosureRecord>,
}

/// The upstream's documented per-page cap is larger than what it actually
/// honors; requesting page 1+ silently repeats page 0's results, so the
/// client refuses to paginate at all.
const MAX_PAGE: u32 = 0;

#[derive(Clone)]
pub struct FinancialRestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinancialRestClient {
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build financial REST HTTP client");
        Self::with_client(client, base_url, api_key)
    }

    pub async fn congress_disclosures(&self, page: u32) -> ClientResult<Vec<DisclosureRecord>> {
        if page > MAX_PAGE {
            return Ok(Vec::new());
        }
        let resp = self
            .client
            .get(format!("{}/congress-trading/disclosures", self.base_url))
            .query(&[("page", page.to_string())])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        Ok(resp.json::<DisclosuresResponse>().await?.results)
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
