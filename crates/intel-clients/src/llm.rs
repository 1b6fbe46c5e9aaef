use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRelevance {
    MarketRelated,
    NotMarketRelated,
}

/// Full structured output of the LLM's article-analysis pass. Every field
/// the pipeline needs out of `summarize` in one shot, since the model
/// answers all of it from a single JSON-mode completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryResult {
    pub summary: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub claims: Vec<String>,
    pub fact_check: Option<String>,
    pub conclusion: Option<String>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f64>,
    pub logic_check: Option<String>,
    pub market_relevance: MarketRelevance,
    pub market_relevance_reason: Option<String>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
    #[serde(default)]
    pub key_themes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRelationship {
    pub source: String,
    pub target: String,
    pub relationship_type: String,
}

const SUMMARY_SCHEMA: &str = r#"{"summary": "<string>", "tickers": ["<string>"], "sectors": ["<string>"], "claims": ["<string>"], "fact_check": "<string|null>", "conclusion": "<string|null>", "sentiment": "<string|null>", "sentiment_score": <number|null>, "logic_check": "<string|null>", "market_relevance": "<market_related|not_market_related>", "market_relevance_reason": "<string|null>", "relationships": [{"source": "<string>", "target": "<string>", "relationship_type": "<string>"}], "key_themes": ["<string>"]}"#;

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

/// Ollama's `/api/generate` request shape. `stream: false` collapses the
/// chunked-response contract into a single JSON object, which the spec
/// allows in place of concatenating a stream of `{response}` fragments.
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama's `/api/embeddings` request/response shape.
#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Chat-completion + embedding client speaking the Ollama wire contract.
/// Every other component that needs a model (the analyzer's JSON prompts,
/// the pipeline's embeddings, article summaries) goes through this one
/// client.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn with_client(client: reqwest::Client, base_url: String, model: String) -> Self {
        Self { client, base_url, model }
    }

    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build LLM HTTP client");
        Self::with_client(client, base_url, model)
    }

    /// Single-call article analysis: summary, extracted tickers/sectors,
    /// sentiment, logic check, market relevance and relationships, asked
    /// for as JSON through the same completion path every other analyzer
    /// prompt uses.
    pub async fn summarize(&self, title: &str, text: &str) -> ClientResult<SummaryResult> {
        let system_prompt = format!(
            "You are a financial analysis engine. Respond with a single JSON object \
             matching this schema and nothing else — no markdown, no commentary:\n{SUMMARY_SCHEMA}"
        );
        let user_prompt = format!("Title: {title}\n\nArticle:\n{text}");
        let raw = self.complete(&system_prompt, &user_prompt, 0.3).await?;
        let value = extract_first_json_object(&raw)
            .ok_or_else(|| ClientError::InvalidResponse("no JSON object found in summarize response".into()))?;
        serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Embeds up to the first 6000 chars of `text` (the pipeline is
    /// responsible for truncation before calling this).
    pub async fn embed(&self, text: &str) -> ClientResult<Vec<f32>> {
        let resp = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbeddingsRequest {
                model: self.model.clone(),
                prompt: text.to_string(),
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        Ok(resp.json::<EmbeddingsResponse>().await?.embedding)
    }

    /// Raw chat completion against `/api/generate`. Callers that need
    /// structured JSON out (the analyzer) are responsible for the
    /// extraction/retry contract.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str, temperature: f64) -> ClientResult<String> {
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: self.model.clone(),
                prompt: user_prompt.to_string(),
                system: Some(system_prompt.to_string()),
                stream: false,
                options: GenerateOptions { temperature },
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        Ok(resp.json::<GenerateResponse>().await?.response)
    }

    pub async fn health(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Extracts the first top-level `{...}` block from a blob of text, tolerating
/// LLM chatter before/after the JSON the system prompt asked for.
pub fn extract_first_json_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &raw[start..=i];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extracts_json_with_surrounding_chatter() {
        let raw = "Sure, here you go:\n{\"conflict_score\": 7, \"note\": \"a { b }\"}\nHope that helps.";
        let v = extract_first_json_object(raw).unwrap();
        assert_eq!(v["conflict_score"], 7);
    }

    #[test]
    fn returns_none_without_braces() {
        assert!(extract_first_json_object("no json here").is_none());
    }

    #[tokio::test]
    async fn complete_posts_the_ollama_generate_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "hello back",
                "done": true
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "llama3".to_string(), Duration::from_secs(5));
        let out = client.complete("system", "user", 0.2).await.unwrap();
        assert_eq!(out, "hello back");
    }

    #[tokio::test]
    async fn embed_posts_to_the_embeddings_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "llama3".to_string(), Duration::from_secs(5));
        let embedding = client.embed("some article text").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn complete_surfaces_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "llama3".to_string(), Duration::from_secs(5));
        assert!(client.complete("system", "user", 0.2).await.is_err());
    }
}
