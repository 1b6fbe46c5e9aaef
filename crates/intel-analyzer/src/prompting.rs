use std::time::Duration;

use intel_clients::{extract_first_json_object, ClientError, LlmClient};
use serde::de::DeserializeOwned;
use serde_json::Value;

const MAX_RETRIES: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// A system prompt every analyzer call shares: forces JSON-only output so
/// the extractor can reliably find the answer even when the model adds
/// commentary around it.
pub fn json_only_system_prompt(schema_description: &str) -> String {
    format!(
        "You are a financial analysis engine. Respond with a single JSON object \
         matching this schema and nothing else — no markdown, no commentary:\n{schema_description}"
    )
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("LLM call failed: {0}")]
    Client(#[from] ClientError),
    #[error("could not extract a JSON object from the model's response after {0} attempts")]
    NoJsonFound(u32),
    #[error("JSON object did not match the expected schema: {0}")]
    SchemaMismatch(String),
}

/// Runs a JSON-mode completion and parses the first `{...}` block found in
/// the response into `T`, retrying up to `MAX_RETRIES` times with a fixed
/// delay when extraction or parsing fails — mirrors the original scheduler's
/// defensive-parsing contract for all LLM calls.
pub async fn complete_json<T: DeserializeOwned>(
    client: &LlmClient,
    system_prompt: &str,
    user_prompt: &str,
    temperature: f64,
) -> Result<T, PromptError> {
    let mut attempt = 0;
    loop {
        let raw = client.complete(system_prompt, user_prompt, temperature).await?;
        match extract_first_json_object(&raw) {
            Some(value) => match serde_json::from_value::<T>(value.clone()) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    if attempt >= MAX_RETRIES {
                        return Err(PromptError::SchemaMismatch(e.to_string()));
                    }
                }
            },
            None => {
                if attempt >= MAX_RETRIES {
                    return Err(PromptError::NoJsonFound(attempt + 1));
                }
            }
        }
        attempt += 1;
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

/// Same contract but returns the raw `Value` rather than a typed struct,
/// for callers that need to inspect optional fields (e.g. a defaulted
/// `confidence_score`) before converting.
pub async fn complete_json_value(
    client: &LlmClient,
    system_prompt: &str,
    user_prompt: &str,
    temperature: f64,
) -> Result<Value, PromptError> {
    let mut attempt = 0;
    loop {
        let raw = client.complete(system_prompt, user_prompt, temperature).await?;
        if let Some(value) = extract_first_json_object(&raw) {
            return Ok(value);
        }
        if attempt >= MAX_RETRIES {
            return Err(PromptError::NoJsonFound(attempt + 1));
        }
        attempt += 1;
        tokio::time::sleep(RETRY_DELAY).await;
    }
}
