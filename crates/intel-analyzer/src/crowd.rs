use intel_clients::LlmClient;
use serde::Deserialize;

use crate::prompting::{complete_json, json_only_system_prompt, PromptError};

const CROWD_SCHEMA: &str = r#"{"label": "<Euphoric|Bullish|Neutral|Bearish|Fearful>", "reasoning": "<string>"}"#;

/// The five-point crowd-sentiment scale, mapped to the integer score the
/// session record stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CrowdSentiment {
    Euphoric,
    Bullish,
    Neutral,
    Bearish,
    Fearful,
}

impl CrowdSentiment {
    pub fn score(self) -> i32 {
        match self {
            CrowdSentiment::Euphoric => 2,
            CrowdSentiment::Bullish => 1,
            CrowdSentiment::Neutral => 0,
            CrowdSentiment::Bearish => -1,
            CrowdSentiment::Fearful => -2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrowdVerdict {
    pub sentiment: CrowdSentiment,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct RawCrowdVerdict {
    label: CrowdSentiment,
    reasoning: String,
}

/// Classifies a batch of social posts about one ticker into the five-point
/// crowd-sentiment scale.
pub async fn analyze_crowd_sentiment(
    client: &LlmClient,
    ticker: &str,
    posts: &[String],
) -> Result<CrowdVerdict, PromptError> {
    let system_prompt = json_only_system_prompt(CROWD_SCHEMA);
    let joined = posts.join("\n---\n");
    let user_prompt = format!(
        "Ticker: {ticker}\nRecent social posts:\n{joined}\n\n\
         Classify the overall crowd sentiment toward {ticker} in these posts."
    );

    let raw: RawCrowdVerdict = complete_json(client, &system_prompt, &user_prompt, 0.3).await?;
    Ok(CrowdVerdict {
        sentiment: raw.label,
        reasoning: raw.reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_mapping_matches_spec() {
        assert_eq!(CrowdSentiment::Euphoric.score(), 2);
        assert_eq!(CrowdSentiment::Bullish.score(), 1);
        assert_eq!(CrowdSentiment::Neutral.score(), 0);
        assert_eq!(CrowdSentiment::Bearish.score(), -1);
        assert_eq!(CrowdSentiment::Fearful.score(), -2);
    }
}
