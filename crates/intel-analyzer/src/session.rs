use intel_clients::LlmClient;
use intel_congress::{effective_committees, has_regulatory_link};
use intel_core::{Committee, CommitteeAssignment, Politician, RiskPattern, TradeType};
use serde::Deserialize;
use serde_json::Value;

use crate::prompting::{complete_json_value, json_only_system_prompt, PromptError};

const SESSION_SCHEMA: &str =
    r#"{"risk_pattern": "<ConflictBuy|SuspiciousSell|AggressiveBet|RoutineDivestment|NoRelationship|Routine>", "conflict_score": <0..1>, "confidence_score": <0..1>, "summary": "<string>"}"#;

const SMALL_SALE_MAX: f64 = 15_000.0;
const SMALL_SALE_MIN: f64 = 1_000.0;
const LARGE_SALE_MIN: f64 = 50_000.0;

#[derive(Debug, Clone)]
pub struct SessionActivityRow {
    pub date: chrono::NaiveDate,
    pub trade_type: TradeType,
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub amount_midpoint: f64,
    pub owner: String,
    pub is_option_or_short: bool,
}

#[derive(Debug, Clone)]
pub struct SessionVerdict {
    pub risk_pattern: RiskPattern,
    pub conflict_score: f64,
    pub confidence_score: f64,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct RawSessionVerdict {
    risk_pattern: String,
    conflict_score: f64,
    confidence_score: Option<f64>,
    summary: String,
}

/// Deterministic three-step classification a session's activity implies
/// before any LLM call: regulatory link, direction, sell context. The LLM
/// is still consulted for the final narrative summary and to confirm edge
/// cases, but this function is what actually decides the risk pattern —
/// it is the authoritative version of the same three steps baked into the
/// session prompt.
pub fn classify_session(
    politician: &Politician,
    assignments: &[CommitteeAssignment],
    all_committees: &[Committee],
    activity: &[SessionActivityRow],
) -> (RiskPattern, f64) {
    let committees = effective_committees(politician, assignments, all_committees);

    let mut best: (RiskPattern, f64) = (RiskPattern::Routine, 0.0);

    for row in activity {
        let is_linked = has_regulatory_link(&committees, &row.sector);

        let (pattern, score) = match row.trade_type {
            TradeType::Purchase if is_linked => (RiskPattern::ConflictBuy, 0.9),
            TradeType::Purchase => (RiskPattern::NoRelationship, 0.0),
            TradeType::Sale if is_linked && row.is_option_or_short => (RiskPattern::AggressiveBet, 1.0),
            TradeType::Sale if is_linked && row.amount_midpoint >= LARGE_SALE_MIN => {
                (RiskPattern::SuspiciousSell, 0.8)
            }
            TradeType::Sale if is_linked && (SMALL_SALE_MIN..=SMALL_SALE_MAX).contains(&row.amount_midpoint) => {
                (RiskPattern::RoutineDivestment, 0.1)
            }
            TradeType::Sale if is_linked => (RiskPattern::SuspiciousSell, 0.8),
            TradeType::Sale => (RiskPattern::NoRelationship, 0.0),
        };

        if score > best.1 {
            best = (pattern, score);
        }
    }

    best
}

/// Produces the final narrative verdict: the deterministic classification
/// decides `risk_pattern`/`conflict_score`, the LLM fills in `summary` (and
/// may adjust `confidence_score`, defaulting to 0.75 if omitted).
pub async fn analyze_session(
    client: &LlmClient,
    politician: &Politician,
    assignments: &[CommitteeAssignment],
    all_committees: &[Committee],
    committees_formatted: &str,
    activity: &[SessionActivityRow],
    activity_table_formatted: &str,
) -> Result<SessionVerdict, PromptError> {
    let (risk_pattern, conflict_score) = classify_session(politician, assignments, all_committees, activity);

    let system_prompt = json_only_system_prompt(SESSION_SCHEMA);
    let user_prompt = format!(
        "Politician: {} ({}, {:?})\nCommittee jurisdictions:\n{committees_formatted}\n\n\
         Activity:\n{activity_table_formatted}\n\n\
         The deterministic risk_pattern is already known to be {risk_pattern:?} with \
         conflict_score {conflict_score}. Write a one-paragraph summary justifying it, \
         and return a confidence_score for how clear-cut this case is.",
        politician.canonical_name, politician.party, politician.chamber,
    );

    let value: Value = complete_json_value(client, &system_prompt, &user_prompt, 0.3).await?;
    let raw: RawSessionVerdict = serde_json::from_value(value).map_err(|e| PromptError::SchemaMismatch(e.to_string()))?;

    Ok(SessionVerdict {
        risk_pattern,
        conflict_score,
        confidence_score: raw.confidence_score.unwrap_or(0.75).clamp(0.0, 1.0),
        summary: raw.summary,
    })
    .map(|mut v| {
        // Guard against the model contradicting the deterministic pattern in its own field.
        if let Ok(parsed) = raw_pattern(&raw.risk_pattern) {
            if parsed != v.risk_pattern {
                tracing::debug!(model_pattern = %raw.risk_pattern, deterministic = ?v.risk_pattern, "model risk_pattern disagreed with deterministic classification; keeping deterministic");
            }
        }
        v.conflict_score = v.conflict_score.clamp(0.0, 1.0);
        v
    })
}

fn raw_pattern(s: &str) -> Result<RiskPattern, ()> {
    match s {
        "ConflictBuy" => Ok(RiskPattern::ConflictBuy),
        "SuspiciousSell" => Ok(RiskPattern::SuspiciousSell),
        "AggressiveBet" => Ok(RiskPattern::AggressiveBet),
        "RoutineDivestment" => Ok(RiskPattern::RoutineDivestment),
        "NoRelationship" => Ok(RiskPattern::NoRelationship),
        "Routine" => Ok(RiskPattern::Routine),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::Chamber;
    use uuid::Uuid;

    fn politician(is_leadership: bool) -> Politician {
        Politician {
            id: Uuid::new_v4(),
            canonical_name: "Jane Representative".into(),
            aliases: vec![],
            party: "I".into(),
            state: "NY".into(),
            chamber: Chamber::House,
            is_leadership,
        }
    }

    fn committee() -> Committee {
        Committee {
            id: Uuid::new_v4(),
            name: "Science & Technology".into(),
            target_sectors: vec!["Technology".into()],
        }
    }

    #[test]
    fn small_sale_on_linked_committee_is_routine_divestment() {
        let p = politician(false);
        let c = committee();
        let assignment = CommitteeAssignment {
            politician_id: p.id,
            committee_id: c.id,
            title: None,
        };
        let activity = vec![SessionActivityRow {
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            trade_type: TradeType::Sale,
            ticker: "MSFT".into(),
            company_name: "Microsoft Corporation".into(),
            sector: "Technology".into(),
            amount_midpoint: 10_000.0,
            owner: "self".into(),
            is_option_or_short: false,
        }];
        let (pattern, score) = classify_session(&p, &[assignment], &[c], &activity);
        assert_eq!(pattern, RiskPattern::RoutineDivestment);
        assert_eq!(score, 0.1);
    }

    #[test]
    fn buy_on_linked_committee_is_conflict_buy() {
        let p = politician(false);
        let c = committee();
        let assignment = CommitteeAssignment {
            politician_id: p.id,
            committee_id: c.id,
            title: None,
        };
        let activity = vec![SessionActivityRow {
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            trade_type: TradeType::Purchase,
            ticker: "MSFT".into(),
            company_name: "Microsoft Corporation".into(),
            sector: "Technology".into(),
            amount_midpoint: 10_000.0,
            owner: "self".into(),
            is_option_or_short: false,
        }];
        let (pattern, score) = classify_session(&p, &[assignment], &[c], &activity);
        assert_eq!(pattern, RiskPattern::ConflictBuy);
        assert_eq!(score, 0.9);
    }

    #[test]
    fn no_committee_link_is_no_relationship() {
        let p = politician(false);
        let activity = vec![SessionActivityRow {
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            trade_type: TradeType::Sale,
            ticker: "XOM".into(),
            company_name: "Exxon Mobil Corporation".into(),
            sector: "Energy".into(),
            amount_midpoint: 5_000.0,
            owner: "self".into(),
            is_option_or_short: false,
        }];
        let (pattern, _) = classify_session(&p, &[], &[], &activity);
        assert_eq!(pattern, RiskPattern::NoRelationship);
    }
}
