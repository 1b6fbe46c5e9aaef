use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding dimension used across the research store and LLM client.
pub const EMBEDDING_DIM: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArticleType {
    MarketNews,
    TickerNews,
    ResearchReport,
    EtfChange,
    RedditDiscovery,
    AlphaResearch,
    SeekingAlphaSymbol,
    Earnings,
    #[default]
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

impl Sentiment {
    /// Range each label is consistent with, per the Article invariant that
    /// `sentiment_score` agrees with `sentiment`.
    pub fn score_range(&self) -> (f64, f64) {
        match self {
            Sentiment::VeryBullish => (1.0, 2.0),
            Sentiment::Bullish => (0.2, 1.0),
            Sentiment::Neutral => (-0.2, 0.2),
            Sentiment::Bearish => (-1.0, -0.2),
            Sentiment::VeryBearish => (-2.0, -1.0),
        }
    }

    pub fn is_consistent_with_score(&self, score: f64) -> bool {
        let (lo, hi) = self.score_range();
        score >= lo && score <= hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicCheck {
    DataBacked,
    HypeDetected,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRelevance {
    MarketRelated,
    NotMarketRelated,
}

/// Normalized, persisted article record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub article_type: ArticleType,
    pub tickers: Vec<String>,
    pub sector: Option<String>,
    pub relevance_score: f64,
    pub embedding: Option<Vec<f32>>,
    pub claims: Vec<String>,
    pub fact_check: Option<String>,
    pub conclusion: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub logic_check: Option<LogicCheck>,
    pub fund: Option<String>,
    pub archive_submitted_at: Option<DateTime<Utc>>,
    pub archive_checked_at: Option<DateTime<Utc>>,
    pub archive_url: Option<String>,
}

impl Article {
    /// Enforces the `len(embedding) in {0, 768}` invariant at construction.
    pub fn embedding_is_valid(&self) -> bool {
        self.embedding
            .as_ref()
            .map(|e| e.len() == EMBEDDING_DIM)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source_ticker: String,
    pub target_ticker: String,
    pub relationship_type: String,
    pub confidence: f64,
    pub source_article_id: Uuid,
    pub detected_at: DateTime<Utc>,
}

impl Relationship {
    /// Conflict-resolution rule from spec §3: re-inserting the same
    /// (source, target, type) triple bumps confidence by +0.1, clamped.
    pub fn bump_confidence(current: f64) -> f64 {
        (current + 0.1).min(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainHealthRecord {
    pub domain: String,
    pub consecutive_failure_count: i32,
    pub last_failure_reason: Option<String>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub auto_blacklisted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chamber {
    House,
    Senate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "self")]
    SelfOwner,
    Spouse,
    Dependent,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Purchase,
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Stock,
    Crypto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressTrade {
    pub id: Uuid,
    pub politician_id: Uuid,
    pub ticker: String,
    pub chamber: Chamber,
    pub party: String,
    pub state: String,
    pub owner: Owner,
    pub transaction_date: NaiveDate,
    pub disclosure_date: NaiveDate,
    pub trade_type: TradeType,
    pub amount: String,
    pub price: Option<f64>,
    pub asset_type: AssetType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskPattern {
    ConflictBuy,
    SuspiciousSell,
    AggressiveBet,
    RoutineDivestment,
    NoRelationship,
    Routine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeAnalysis {
    pub trade_id: Uuid,
    pub model_used: String,
    pub analysis_version: i32,
    pub conflict_score: f64,
    pub confidence_score: f64,
    /// Set when `confidence_score` was defaulted (LLM omitted the field) per
    /// the Open Question decision recorded in DESIGN.md — keeps the default
    /// from silently contaminating downstream analytics.
    pub confidence_defaulted: bool,
    pub risk_pattern: RiskPattern,
    pub reasoning: String,
    pub session_id: Option<Uuid>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSession {
    pub id: Uuid,
    pub politician_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trade_count: i32,
    pub conflict_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub ai_summary: Option<String>,
    pub risk_pattern: Option<RiskPattern>,
    pub model_used: Option<String>,
    pub needs_ai_analysis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Stocktwits,
    Reddit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialMetric {
    pub id: Uuid,
    pub ticker: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
    pub volume: i32,
    pub bull_bear_ratio: Option<f64>,
    pub sentiment_label: Option<String>,
    pub sentiment_score: Option<f64>,
    pub raw_posts: Option<serde_json::Value>,
    pub analysis_session_id: Option<Uuid>,
    pub extracted_at: Option<DateTime<Utc>>,
}

/// One post pulled out of a `SocialMetric`'s `raw_posts` blob, kept as its
/// own row so the Sessioning job can group posts across metric batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: Uuid,
    pub ticker: String,
    pub platform: Platform,
    pub posted_at: DateTime<Utc>,
    pub text: String,
    pub session_id: Option<Uuid>,
}

/// A 4-hour window of posts per (ticker, platform), the unit the crowd
/// sentiment LLM call analyzes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSentimentSession {
    pub id: Uuid,
    pub ticker: String,
    pub platform: Platform,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub post_count: i32,
    pub sentiment_label: Option<String>,
    pub sentiment_score: Option<f64>,
    pub reasoning: Option<String>,
    pub needs_ai_analysis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatusKind {
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: Uuid,
    pub job_name: String,
    pub target_date: NaiveDate,
    pub fund_name: Option<String>,
    pub status: JobStatusKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub funds_processed: Vec<String>,
}

/// Stale-running threshold per spec §3 / §9 glossary.
pub const STALE_RUNNING_THRESHOLD_HOURS: i64 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryQueueEntry {
    pub job_name: String,
    pub target_date: NaiveDate,
    pub entity_id: Option<String>,
    pub entity_type: Option<String>,
    pub failure_reason: String,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Politician {
    pub id: Uuid,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub party: String,
    pub state: String,
    pub chamber: Chamber,
    /// Open-question decision (see DESIGN.md): replaces a brittle
    /// name-substring allow-list check with a real, ingest-time-computed flag.
    pub is_leadership: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub id: Uuid,
    pub name: String,
    pub target_sectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeAssignment {
    pub politician_id: Uuid,
    pub committee_id: Uuid,
    pub title: Option<String>,
}

/// Ticker/company/sector reference row, looked up in chunks by both the
/// Ticker Research job and the congress analyzer's batch prefetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub ticker: String,
    pub company_name: String,
    pub sector: Option<String>,
}

/// `securities_for_tickers` issues one `IN (...)` query per chunk to stay
/// under typical URL/parameter-count limits.
pub const SECURITIES_CHUNK_SIZE: usize = 50;

/// An RSS feed the Ingest job polls on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssFeed {
    pub id: Uuid,
    pub url: String,
    pub source_name: String,
    pub enabled: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// A distinct (ticker, company, fund) triple the Ticker Research job sweeps
/// for fresh coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundPosition {
    pub ticker: String,
    pub company_name: String,
    pub fund_name: String,
}

/// A PDF or other research document discovered on disk by the Process
/// Research Reports job, before it becomes an `Article`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportType {
    pub label: &'static str,
}

impl ReportType {
    pub const TICKER: ReportType = ReportType { label: "ticker" };
    pub const MARKET: ReportType = ReportType { label: "market" };
    pub const FUND: ReportType = ReportType { label: "fund" };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_confidence_clamps_at_one() {
        let mut c = 0.8;
        for _ in 0..5 {
            c = Relationship::bump_confidence(c);
        }
        assert_eq!(c, 1.0);
    }

    #[test]
    fn sentiment_consistency() {
        assert!(Sentiment::Bullish.is_consistent_with_score(0.5));
        assert!(!Sentiment::Bullish.is_consistent_with_score(-1.0));
    }
}
