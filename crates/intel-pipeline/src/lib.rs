mod relationship;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use intel_clients::{ExternalClients, MarketRelevance as LlmMarketRelevance};
use intel_congress::{relevance_score, OwnedTicker};
use intel_core::{
    is_valid_ticker, normalize_tickers, Article, ArticleType, FailureKind, LogicCheck, Outcome,
    Sentiment,
};
use intel_domain_health::DomainHealth;
use intel_store::ResearchStore;
use uuid::Uuid;

pub use relationship::build_relationship;

const DEFAULT_ARTICLE_BUDGET: Duration = Duration::from_secs(5 * 60);
const EMBEDDING_CHAR_LIMIT: usize = 6000;
const PAYWALL_PLACEHOLDER: &str = "[Paywalled — Submitted for archive]";

/// Context a job passes into the pipeline for one article: what kind it is,
/// which fund (if any) triggered it, and the investor's current holdings
/// (for the relevance-score step).
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    pub article_type: ArticleType,
    pub fund: Option<String>,
    pub owned_tickers: Vec<OwnedTicker>,
    /// Overrides the owned-ticker relevance formula's base score. Used by
    /// the Ticker Research job's ETF/sector-search path, which carries a
    /// weaker baseline (0.7) than a direct ticker/company match.
    pub base_relevance_override: Option<f64>,
}

/// Stateless URL → persisted-article transform shared by every ingestion
/// job. The only state it touches lives in `ResearchStore` and
/// `DomainHealth`.
pub struct ArticlePipeline {
    store: Arc<ResearchStore>,
    clients: ExternalClients,
    domain_health: Arc<DomainHealth>,
    article_budget: Duration,
}

impl ArticlePipeline {
    pub fn new(store: Arc<ResearchStore>, clients: ExternalClients, domain_health: Arc<DomainHealth>) -> Self {
        Self {
            store,
            clients,
            domain_health,
            article_budget: DEFAULT_ARTICLE_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.article_budget = budget;
        self
    }

    pub async fn process(&self, url: &str, title: &str, ctx: &JobContext) -> Outcome<Uuid> {
        let deadline = Instant::now() + self.article_budget;

        // 1. Blacklist check.
        match self.domain_health.is_blacklisted(url).await {
            Ok(true) => return Outcome::Failed(FailureKind::Blacklisted),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, url, "domain health lookup failed");
                return Outcome::Failed(FailureKind::Blacklisted);
            }
        }

        // 2. Duplicate check.
        match self.store.article_exists_by_url(url).await {
            Ok(true) => return Outcome::Failed(FailureKind::Duplicate),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, url, "duplicate check failed");
                return Outcome::Skipped("store-unavailable".to_string());
            }
        }

        // 3. Budget check before the expensive extraction step.
        if Instant::now() >= deadline {
            return Outcome::Skipped("budget-exhausted".to_string());
        }

        // 4. Extraction.
        let extracted = match self.clients.extractor.extract(url).await {
            Ok(article) => article,
            Err(intel_clients::ExtractionError::PaidSubscription) => {
                return self.handle_paywall(url, title, ctx).await;
            }
            Err(reason) => {
                let _ = self.domain_health.record_failure(url, &reason.to_string()).await;
                return Outcome::Failed(FailureKind::Extraction(reason.to_string()));
            }
        };
        let _ = self.domain_health.record_success(url).await;

        if Instant::now() >= deadline {
            return Outcome::Skipped("budget-exhausted".to_string());
        }

        // LLM analysis: summary, tickers, sector, sentiment, relationships.
        let analysis = match self.clients.llm.summarize(title, &extracted.content).await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, url, "LLM analysis failed");
                return Outcome::Skipped("llm-unavailable".to_string());
            }
        };

        // 5. Market relevance gate.
        let normalized_tickers = normalize_tickers(&analysis.tickers);
        if analysis.market_relevance == LlmMarketRelevance::NotMarketRelated && normalized_tickers.is_empty() {
            return Outcome::Failed(FailureKind::NonMarket);
        }

        // 6. Ticker validation (normalize_tickers already enforces format + dedup).
        debug_assert!(normalized_tickers.iter().all(|t| is_valid_ticker(t)));

        if Instant::now() >= deadline {
            return Outcome::Skipped("budget-exhausted".to_string());
        }

        // 7. Embedding, nullable on failure.
        let truncated: String = extracted.content.chars().take(EMBEDDING_CHAR_LIMIT).collect();
        let embedding = self.clients.llm.embed(&truncated).await.ok();

        // 8. Relevance score.
        let sector = analysis.sectors.first().map(String::as_str);
        let score = match ctx.base_relevance_override {
            Some(base) => base.clamp(0.0, 1.0),
            None => relevance_score(&normalized_tickers, sector, &ctx.owned_tickers),
        };

        let sentiment = analysis.sentiment.as_deref().and_then(parse_sentiment);
        let logic_check = analysis.logic_check.as_deref().and_then(parse_logic_check);

        let article = Article {
            id: Uuid::new_v4(),
            title: title.to_string(),
            url: url.to_string(),
            content: extracted.content.clone(),
            summary: Some(analysis.summary.clone()),
            source: extracted.source.clone(),
            published_at: extracted.published_at,
            fetched_at: Utc::now(),
            article_type: ctx.article_type,
            tickers: normalized_tickers.clone(),
            sector: analysis.sectors.first().cloned(),
            relevance_score: score,
            embedding,
            claims: analysis.claims.clone(),
            fact_check: analysis.fact_check.clone(),
            conclusion: analysis.conclusion.clone(),
            sentiment,
            sentiment_score: analysis.sentiment_score,
            logic_check,
            fund: ctx.fund.clone(),
            archive_submitted_at: None,
            archive_checked_at: None,
            archive_url: None,
        };

        // 9. Persist article.
        let article_id = match self.store.save_article(&article).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, url, "failed to persist article");
                return Outcome::Skipped("store-unavailable".to_string());
            }
        };

        // 10. Relationship extraction — never runs on HypeDetected content.
        if matches!(logic_check, Some(LogicCheck::DataBacked) | Some(LogicCheck::Neutral)) {
            let initial_confidence = if logic_check == Some(LogicCheck::DataBacked) { 0.8 } else { 0.4 };
            let now = Utc::now();
            for raw in &analysis.relationships {
                let rel = build_relationship(raw, initial_confidence, article_id, now);
                if let Err(e) = self.store.upsert_relationship(&rel).await {
                    tracing::warn!(error = %e, "failed to persist relationship");
                }
            }
        }

        Outcome::Saved(article_id)
    }

    async fn handle_paywall(&self, url: &str, title: &str, ctx: &JobContext) -> Outcome<Uuid> {
        match self.clients.archive.submit(url).await {
            Ok(()) => {
                let article = Article {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    url: url.to_string(),
                    content: PAYWALL_PLACEHOLDER.to_string(),
                    summary: Some(PAYWALL_PLACEHOLDER.to_string()),
                    source: None,
                    published_at: None,
                    fetched_at: Utc::now(),
                    article_type: ctx.article_type,
                    tickers: Vec::new(),
                    sector: None,
                    relevance_score: 0.0,
                    embedding: None,
                    claims: Vec::new(),
                    fact_check: None,
                    conclusion: None,
                    sentiment: None,
                    sentiment_score: None,
                    logic_check: None,
                    fund: ctx.fund.clone(),
                    archive_submitted_at: Some(Utc::now()),
                    archive_checked_at: None,
                    archive_url: None,
                };
                match self.store.save_article(&article).await {
                    Ok(id) => Outcome::Saved(id),
                    Err(e) => {
                        tracing::error!(error = %e, url, "failed to persist paywall placeholder");
                        Outcome::Skipped("store-unavailable".to_string())
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, url, "archive submission failed for paywalled article");
                Outcome::Failed(FailureKind::Extraction("paid_subscription".to_string()))
            }
        }
    }
}

fn parse_sentiment(raw: &str) -> Option<Sentiment> {
    match raw.to_lowercase().as_str() {
        "very_bullish" => Some(Sentiment::VeryBullish),
        "bullish" => Some(Sentiment::Bullish),
        "neutral" => Some(Sentiment::Neutral),
        "bearish" => Some(Sentiment::Bearish),
        "very_bearish" => Some(Sentiment::VeryBearish),
        _ => None,
    }
}

fn parse_logic_check(raw: &str) -> Option<LogicCheck> {
    match raw.to_lowercase().as_str() {
        "data_backed" => Some(LogicCheck::DataBacked),
        "hype_detected" => Some(LogicCheck::HypeDetected),
        "neutral" => Some(LogicCheck::Neutral),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_parsing_is_case_insensitive() {
        assert_eq!(parse_sentiment("BULLISH"), Some(Sentiment::Bullish));
        assert_eq!(parse_sentiment("unknown"), None);
    }

    #[test]
    fn logic_check_parsing_round_trips_known_values() {
        assert_eq!(parse_logic_check("hype_detected"), Some(LogicCheck::HypeDetected));
    }
}
