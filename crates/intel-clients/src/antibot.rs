use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::llm::extract_first_json_object;

/// Anti-bot-proxy default timeout: much higher than a normal HTTP call since
/// the proxy itself waits out challenge pages before responding.
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(70);

#[derive(Debug, Clone, Serialize)]
struct ProxyRequest {
    cmd: &'static str,
    url: String,
    #[serde(rename = "maxTimeout")]
    max_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ProxySolution {
    status: Option<String>,
    response: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProxyResponse {
    status: String,
    solution: Option<ProxySolution>,
}

/// Fetches pages from behind bot-challenge interstitials via a proxy that
/// speaks the `request.get` wire contract, falling back to a direct request
/// on any proxy failure so a single flaky dependency never blocks ingestion.
#[derive(Clone)]
pub struct AntiBotClient {
    client: reqwest::Client,
    proxy_url: Option<String>,
}

impl AntiBotClient {
    pub fn with_client(client: reqwest::Client, proxy_url: Option<String>) -> Self {
        Self { client, proxy_url }
    }

    pub fn new(proxy_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROXY_TIMEOUT)
            .build()
            .expect("failed to build anti-bot HTTP client");
        Self::with_client(client, proxy_url)
    }

    /// Returns either the JSON body the proxy reported, or the first
    /// `{...}` block found inside the returned HTML — whichever is present.
    pub async fn get_json(&self, url: &str, max_timeout_ms: u64) -> ClientResult<Value> {
        if let Some(proxy_url) = &self.proxy_url {
            match self.get_via_proxy(proxy_url, url, max_timeout_ms).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(error = %e, url, "anti-bot proxy failed, falling back to direct HTTP");
                }
            }
        }
        self.get_direct(url).await
    }

    async fn get_via_proxy(&self, proxy_url: &str, url: &str, max_timeout_ms: u64) -> ClientResult<Value> {
        let resp = self
            .client
            .post(proxy_url)
            .json(&ProxyRequest {
                cmd: "request.get",
                url: url.to_string(),
                max_timeout_ms,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }

        let body: ProxyResponse = resp.json().await?;
        if body.status != "ok" {
            return Err(ClientError::ServiceUnavailable("proxy reported error status".into()));
        }
        let solution = body
            .solution
            .ok_or_else(|| ClientError::InvalidResponse("missing solution".into()))?;
        let html_or_json = solution
            .response
            .ok_or_else(|| ClientError::InvalidResponse("missing response body".into()))?;

        if let Ok(value) = serde_json::from_str::<Value>(&html_or_json) {
            return Ok(value);
        }
        extract_first_json_object(&html_or_json)
            .ok_or_else(|| ClientError::InvalidResponse("no JSON object found in proxy response".into()))
    }

    async fn get_direct(&self, url: &str) -> ClientResult<Value> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        let body = resp.text().await?;
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            return Ok(value);
        }
        extract_first_json_object(&body)
            .ok_or_else(|| ClientError::InvalidResponse("no JSON object found in direct response".into()))
    }

    pub async fn health(&self) -> bool {
        match &self.proxy_url {
            Some(url) => self
                .client
                .get(url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_via_proxy_sends_the_request_get_contract_and_parses_the_solution() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "cmd": "request.get",
                "url": "https://example.com/quote",
                "maxTimeout": 5_000u64,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "solution": { "status": 200, "response": "{\"price\": 42}" }
            })))
            .mount(&server)
            .await;

        let client = AntiBotClient::with_client(reqwest::Client::new(), Some(server.uri()));
        let body = client.get_json("https://example.com/quote", 5_000).await.unwrap();
        assert_eq!(body["price"], 42);
    }

    #[tokio::test]
    async fn get_via_proxy_falls_back_to_direct_http_on_proxy_failure() {
        let proxy = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&proxy)
            .await;

        let target = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"price\": 7}"))
            .mount(&target)
            .await;

        let client = AntiBotClient::with_client(reqwest::Client::new(), Some(proxy.uri()));
        let body = client.get_json(&target.uri(), 5_000).await.unwrap();
        assert_eq!(body["price"], 7);
    }
}
