use serde::{Deserialize, Serialize};

/// Per-item result of a pipeline or job step.
///
/// Replaces exception-driven "skip this item" control flow: only a database
/// connectivity loss at startup is allowed to propagate as a hard error: see
/// `IntelError::Connectivity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outcome<T> {
    Saved(T),
    Skipped(String),
    Failed(FailureKind),
}

impl<T> Outcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, Outcome::Saved(_))
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Outcome::Skipped(r) => Some(r),
            _ => None,
        }
    }
}

/// Closed enum of non-exceptional failure reasons an item can end in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Blacklisted,
    Duplicate,
    NonMarket,
    BudgetExhausted,
    Extraction(String),
    MalformedLlmJson,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Blacklisted => write!(f, "blacklisted"),
            FailureKind::Duplicate => write!(f, "duplicate"),
            FailureKind::NonMarket => write!(f, "non-market"),
            FailureKind::BudgetExhausted => write!(f, "budget-exhausted"),
            FailureKind::Extraction(reason) => write!(f, "extraction: {reason}"),
            FailureKind::MalformedLlmJson => write!(f, "malformed-llm-json"),
        }
    }
}

/// Running counters a job accumulates across its items, emitted to the final
/// job log line so nothing is silently discarded (per spec §7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeCounters {
    pub saved: u64,
    pub skipped_blacklisted: u64,
    pub skipped_duplicate: u64,
    pub skipped_non_market: u64,
    pub skipped_budget: u64,
    pub failed_extraction: u64,
    pub failed_malformed_json: u64,
}

impl OutcomeCounters {
    pub fn record<T>(&mut self, outcome: &Outcome<T>) {
        match outcome {
            Outcome::Saved(_) => self.saved += 1,
            Outcome::Skipped(reason) => match reason.as_str() {
                "blacklisted" => self.skipped_blacklisted += 1,
                "duplicate" => self.skipped_duplicate += 1,
                "non-market" => self.skipped_non_market += 1,
                _ => self.skipped_budget += 1,
            },
            Outcome::Failed(FailureKind::Extraction(_)) => self.failed_extraction += 1,
            Outcome::Failed(FailureKind::MalformedLlmJson) => self.failed_malformed_json += 1,
            Outcome::Failed(_) => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.saved
            + self.skipped_blacklisted
            + self.skipped_duplicate
            + self.skipped_non_market
            + self.skipped_budget
            + self.failed_extraction
            + self.failed_malformed_json
    }
}
