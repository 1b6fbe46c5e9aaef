use intel_clients::LlmClient;
use intel_core::{Chamber, Owner, TradeType};
use serde::Deserialize;
use serde_json::Value;

use crate::low_risk::{classify, LowRiskInput};
use crate::prompting::{complete_json_value, json_only_system_prompt, PromptError};

const SINGLE_TRADE_SCHEMA: &str =
    r#"{"conflict_score": <0..1>, "confidence_score": <0..1>, "reasoning": "<string>"}"#;

/// Default applied when the model omits `confidence_score` entirely.
const DEFAULT_CONFIDENCE: f64 = 0.75;

pub struct SingleTradeInput<'a> {
    pub politician_name: &'a str,
    pub party: &'a str,
    pub state: &'a str,
    pub chamber: Chamber,
    pub owner: Owner,
    pub committees_formatted: &'a str,
    pub ticker: &'a str,
    pub company_name: &'a str,
    pub sector: Option<&'a str>,
    pub description: Option<&'a str>,
    pub transaction_date: chrono::NaiveDate,
    pub trade_type: TradeType,
    pub amount: &'a str,
}

#[derive(Debug, Clone)]
pub struct TradeVerdict {
    pub conflict_score: f64,
    pub confidence_score: f64,
    pub confidence_defaulted: bool,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct RawTradeVerdict {
    conflict_score: f64,
    confidence_score: Option<f64>,
    reasoning: String,
}

/// Runs the low-risk pre-filter first; only calls the LLM when the trade
/// could plausibly involve a conflict of interest.
pub async fn analyze_single_trade(
    client: &LlmClient,
    input: &SingleTradeInput<'_>,
) -> Result<TradeVerdict, PromptError> {
    let low_risk = classify(&LowRiskInput {
        trade_type: input.trade_type,
        ticker: input.ticker,
        company_name: input.company_name,
        sector: input.sector,
    });

    if let Some(verdict) = low_risk {
        return Ok(TradeVerdict {
            conflict_score: 0.0,
            confidence_score: 1.0,
            confidence_defaulted: false,
            reasoning: format!("Auto-filtered: {}", verdict.reason),
        });
    }

    let system_prompt = json_only_system_prompt(SINGLE_TRADE_SCHEMA);
    let user_prompt = format_user_prompt(input);

    let value: Value = complete_json_value(client, &system_prompt, &user_prompt, 0.1).await?;
    let raw: RawTradeVerdict = serde_json::from_value(value)
        .map_err(|e| PromptError::SchemaMismatch(e.to_string()))?;

    let confidence_defaulted = raw.confidence_score.is_none();
    Ok(TradeVerdict {
        conflict_score: raw.conflict_score.clamp(0.0, 1.0),
        confidence_score: raw.confidence_score.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
        confidence_defaulted,
        reasoning: raw.reasoning,
    })
}

fn format_user_prompt(input: &SingleTradeInput<'_>) -> String {
    format!(
        "Politician: {} ({}-{}, {:?})\nOwner: {:?}\nCommittees:\n{}\n\n\
         Trade: {:?} of {} ({}) in sector {}\nDescription: {}\nDate: {}\nAmount: {}\n\n\
         Score conflict_score using these bands: 0.8-1.0 direct jurisdictional overlap, \
         0.4-0.7 sector overlap, 0.0-0.3 unrelated or index fund.",
        input.politician_name,
        input.party,
        input.state,
        input.chamber,
        input.owner,
        input.committees_formatted,
        input.trade_type,
        input.ticker,
        input.company_name,
        input.sector.unwrap_or("unknown"),
        input.description.unwrap_or("none"),
        input.transaction_date,
        input.amount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_confidence_is_three_quarters() {
        assert_eq!(DEFAULT_CONFIDENCE, 0.75);
    }
}
