use chrono::Utc;
use intel_core::{Article, ArticleType, DomainHealthRecord, LogicCheck, Relationship, Sentiment};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::pool::{connect, warn_if_saturated};

/// Minimum embedding dimension column name the schema probe looks for.
const TICKERS_ARRAY_COLUMN: &str = "tickers";

/// Relational + vector store for articles, extracted relationships and
/// per-domain scrape health.
pub struct ResearchStore {
    pool: PgPool,
    has_tickers_array: bool,
}

impl ResearchStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = connect("research_store", database_url, max_connections).await?;
        let has_tickers_array = Self::probe_tickers_column(&pool).await?;
        Ok(Self {
            pool,
            has_tickers_array,
        })
    }

    /// Schema probe: confirms the tickers-array column is present. Per the
    /// recorded decision the legacy single-ticker column is not supported —
    /// its absence is a hard migration error, not a silent fallback.
    async fn probe_tickers_column(pool: &PgPool) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_name = 'articles' AND column_name = $1
            ) AS present",
        )
        .bind(TICKERS_ARRAY_COLUMN)
        .fetch_one(pool)
        .await
        .map_err(StoreError::Query)?;

        let present: bool = row.try_get("present").map_err(StoreError::Query)?;
        if !present {
            return Err(StoreError::SchemaProbe(format!(
                "articles.{TICKERS_ARRAY_COLUMN} column is missing; run migrations before starting"
            )));
        }
        Ok(present)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Always true post-construction: `connect` errors out otherwise. Kept
    /// so callers that branch on schema shape read it from one place.
    pub fn has_tickers_array(&self) -> bool {
        self.has_tickers_array
    }

    pub fn warn_if_saturated(&self) {
        warn_if_saturated("research_store", &self.pool);
    }

    /// Idempotent upsert keyed on `url`: a second save of the same URL
    /// updates AI-derived fields and `fetched_at` without creating a new row.
    pub async fn save_article(&self, article: &Article) -> StoreResult<Uuid> {
        let embedding_literal = article.embedding.as_ref().map(format_vector_literal);

        let row = sqlx::query(
            r#"
            INSERT INTO articles (
                id, title, url, content, summary, source, published_at, fetched_at,
                article_type, tickers, sector, relevance_score, embedding, claims,
                fact_check, conclusion, sentiment, sentiment_score, logic_check, fund
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13::vector, $14,
                $15, $16, $17, $18, $19, $20
            )
            ON CONFLICT (url) DO UPDATE SET
                summary = EXCLUDED.summary,
                relevance_score = EXCLUDED.relevance_score,
                embedding = EXCLUDED.embedding,
                claims = EXCLUDED.claims,
                fact_check = EXCLUDED.fact_check,
                conclusion = EXCLUDED.conclusion,
                sentiment = EXCLUDED.sentiment,
                sentiment_score = EXCLUDED.sentiment_score,
                logic_check = EXCLUDED.logic_check,
                fetched_at = EXCLUDED.fetched_at
            RETURNING id
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(&article.source)
        .bind(article.published_at)
        .bind(Utc::now())
        .bind(article_type_label(article.article_type))
        .bind(&article.tickers)
        .bind(&article.sector)
        .bind(article.relevance_score)
        .bind(embedding_literal)
        .bind(&article.claims)
        .bind(&article.fact_check)
        .bind(&article.conclusion)
        .bind(article.sentiment.map(sentiment_label))
        .bind(article.sentiment_score)
        .bind(article.logic_check.map(logic_check_label))
        .bind(&article.fund)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.try_get::<Uuid, _>("id").map_err(StoreError::Query)
    }

    pub async fn article_exists_by_url(&self, url: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM articles WHERE url = $1) AS present")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        row.try_get("present").map_err(StoreError::Query)
    }

    /// Cosine-similarity search: `1 - (embedding <=> query::vector)`, with a
    /// minimum-similarity floor and descending order.
    pub async fn similar_articles(
        &self,
        query_embedding: &[f32],
        min_similarity: f64,
        limit: i64,
    ) -> StoreResult<Vec<(Uuid, f64)>> {
        let literal = format_vector_literal(&query_embedding.to_vec());
        let rows = sqlx::query(
            r#"
            SELECT id, 1 - (embedding <=> $1::vector) AS similarity
            FROM articles
            WHERE embedding IS NOT NULL
              AND 1 - (embedding <=> $1::vector) >= $2
            ORDER BY similarity DESC
            LIMIT $3
            "#,
        )
        .bind(literal)
        .bind(min_similarity)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                let id: Uuid = r.try_get("id").map_err(StoreError::Query)?;
                let similarity: f64 = r.try_get("similarity").map_err(StoreError::Query)?;
                Ok((id, similarity))
            })
            .collect()
    }

    pub async fn upsert_relationship(&self, rel: &Relationship) -> StoreResult<()> {
        let existing = sqlx::query(
            "SELECT confidence FROM relationships
             WHERE source_ticker = $1 AND target_ticker = $2 AND relationship_type = $3",
        )
        .bind(&rel.source_ticker)
        .bind(&rel.target_ticker)
        .bind(&rel.relationship_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        let confidence = if let Some(row) = existing {
            let current: f64 = row.try_get("confidence").map_err(StoreError::Query)?;
            Relationship::bump_confidence(current)
        } else {
            rel.confidence
        };

        sqlx::query(
            r#"
            INSERT INTO relationships (source_ticker, target_ticker, relationship_type, confidence, source_article_id, detected_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_ticker, target_ticker, relationship_type)
            DO UPDATE SET confidence = $4, source_article_id = $5, detected_at = $6
            "#,
        )
        .bind(&rel.source_ticker)
        .bind(&rel.target_ticker)
        .bind(&rel.relationship_type)
        .bind(confidence)
        .bind(rel.source_article_id)
        .bind(rel.detected_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(())
    }

    /// Articles the Archive Retry job should re-check: submitted to the
    /// archive at least `min_age` ago and never successfully re-extracted.
    pub async fn articles_pending_archive_check(&self, min_age: chrono::Duration) -> StoreResult<Vec<Article>> {
        let cutoff = Utc::now() - min_age;
        let rows = sqlx::query(
            r#"
            SELECT id, title, url, content, summary, source, published_at, fetched_at,
                   article_type, tickers, sector, relevance_score, claims, fact_check,
                   conclusion, sentiment, sentiment_score, logic_check, fund,
                   archive_submitted_at, archive_checked_at, archive_url
            FROM articles
            WHERE archive_submitted_at IS NOT NULL
              AND archive_submitted_at <= $1
              AND archive_url IS NULL
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_article).collect()
    }

    /// Persists a successful re-extraction: fresh content/summary/embedding
    /// plus the archive URL that unblocked it.
    pub async fn update_article_after_archive_retry(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
        summary: Option<&str>,
        embedding: Option<&[f32]>,
        sentiment: Option<Sentiment>,
        sentiment_score: Option<f64>,
        logic_check: Option<LogicCheck>,
        archive_url: &str,
    ) -> StoreResult<()> {
        let embedding_literal = embedding.map(|e| format_vector_literal(&e.to_vec()));
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE articles SET
                title = $2,
                content = $3,
                summary = $4,
                embedding = $5::vector,
                sentiment = $6,
                sentiment_score = $7,
                logic_check = $8,
                archive_url = $9,
                archive_checked_at = $10,
                fetched_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(summary)
        .bind(embedding_literal)
        .bind(sentiment.map(sentiment_label))
        .bind(sentiment_score)
        .bind(logic_check.map(logic_check_label))
        .bind(archive_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(())
    }

    /// Marks an archive check as done without unblocking the article: still
    /// paywalled, so `archive_url` stays null and the job won't retry it
    /// again until the row is resubmitted.
    pub async fn mark_archive_checked(&self, id: Uuid, checked_at: chrono::DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE articles SET archive_checked_at = $2 WHERE id = $1")
            .bind(id)
            .bind(checked_at)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn domain_health(&self, domain: &str) -> StoreResult<Option<DomainHealthRecord>> {
        let row = sqlx::query(
            "SELECT domain, consecutive_failure_count, last_failure_reason, last_failure_at, last_success_at, auto_blacklisted
             FROM domain_health WHERE domain = $1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(|r| {
            Ok(DomainHealthRecord {
                domain: r.try_get("domain").map_err(StoreError::Query)?,
                consecutive_failure_count: r.try_get("consecutive_failure_count").map_err(StoreError::Query)?,
                last_failure_reason: r.try_get("last_failure_reason").map_err(StoreError::Query)?,
                last_failure_at: r.try_get("last_failure_at").map_err(StoreError::Query)?,
                last_success_at: r.try_get("last_success_at").map_err(StoreError::Query)?,
                auto_blacklisted: r.try_get("auto_blacklisted").map_err(StoreError::Query)?,
            })
        })
        .transpose()
    }

    pub async fn upsert_domain_health(&self, record: &DomainHealthRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO domain_health (domain, consecutive_failure_count, last_failure_reason, last_failure_at, last_success_at, auto_blacklisted)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (domain) DO UPDATE SET
                consecutive_failure_count = $2,
                last_failure_reason = $3,
                last_failure_at = $4,
                last_success_at = $5,
                auto_blacklisted = $6
            "#,
        )
        .bind(&record.domain)
        .bind(record.consecutive_failure_count)
        .bind(&record.last_failure_reason)
        .bind(record.last_failure_at)
        .bind(record.last_success_at)
        .bind(record.auto_blacklisted)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Atomic success reset: zeroes the consecutive-failure counter and
    /// stamps `last_success_at` in one statement, so this can't lose a
    /// concurrent `record_domain_failure` increment to a stale read.
    pub async fn record_domain_success(&self, domain: &str, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO domain_health (domain, consecutive_failure_count, last_success_at, auto_blacklisted)
            VALUES ($1, 0, $2, false)
            ON CONFLICT (domain) DO UPDATE SET
                consecutive_failure_count = 0,
                last_success_at = $2
            "#,
        )
        .bind(domain)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Atomic failure increment done entirely in SQL
    /// (`consecutive_failure_count = domain_health.consecutive_failure_count + 1`)
    /// so two concurrent failures against the same domain both land instead
    /// of one clobbering the other's read-modify-write. Flips
    /// `auto_blacklisted` in the same statement once the new count reaches
    /// `threshold`. Returns the post-increment count.
    pub async fn record_domain_failure(
        &self,
        domain: &str,
        reason: &str,
        at: DateTime<Utc>,
        threshold: i32,
    ) -> StoreResult<i32> {
        let row = sqlx::query(
            r#"
            INSERT INTO domain_health (domain, consecutive_failure_count, last_failure_reason, last_failure_at, auto_blacklisted)
            VALUES ($1, 1, $2, $3, $4 <= 1)
            ON CONFLICT (domain) DO UPDATE SET
                consecutive_failure_count = domain_health.consecutive_failure_count + 1,
                last_failure_reason = $2,
                last_failure_at = $3,
                auto_blacklisted = domain_health.auto_blacklisted OR (domain_health.consecutive_failure_count + 1) >= $4
            RETURNING consecutive_failure_count
            "#,
        )
        .bind(domain)
        .bind(reason)
        .bind(at)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        row.try_get("consecutive_failure_count").map_err(StoreError::Query)
    }
}

fn format_vector_literal(embedding: &Vec<f32>) -> String {
    let joined = embedding
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{joined}]")
}

fn article_type_label(t: ArticleType) -> &'static str {
    match t {
        ArticleType::MarketNews => "market_news",
        ArticleType::TickerNews => "ticker_news",
        ArticleType::ResearchReport => "research_report",
        ArticleType::EtfChange => "etf_change",
        ArticleType::RedditDiscovery => "reddit_discovery",
        ArticleType::AlphaResearch => "alpha_research",
        ArticleType::SeekingAlphaSymbol => "seeking_alpha_symbol",
        ArticleType::Earnings => "earnings",
        ArticleType::General => "general",
    }
}

fn sentiment_label(s: Sentiment) -> &'static str {
    match s {
        Sentiment::VeryBullish => "very_bullish",
        Sentiment::Bullish => "bullish",
        Sentiment::Neutral => "neutral",
        Sentiment::Bearish => "bearish",
        Sentiment::VeryBearish => "very_bearish",
    }
}

fn logic_check_label(l: LogicCheck) -> &'static str {
    match l {
        LogicCheck::DataBacked => "data_backed",
        LogicCheck::HypeDetected => "hype_detected",
        LogicCheck::Neutral => "neutral",
    }
}

fn parse_article_type(raw: &str) -> ArticleType {
    match raw {
        "market_news" => ArticleType::MarketNews,
        "ticker_news" => ArticleType::TickerNews,
        "research_report" => ArticleType::ResearchReport,
        "etf_change" => ArticleType::EtfChange,
        "reddit_discovery" => ArticleType::RedditDiscovery,
        "alpha_research" => ArticleType::AlphaResearch,
        "seeking_alpha_symbol" => ArticleType::SeekingAlphaSymbol,
        "earnings" => ArticleType::Earnings,
        _ => ArticleType::General,
    }
}

fn parse_sentiment_label(raw: &str) -> Option<Sentiment> {
    match raw {
        "very_bullish" => Some(Sentiment::VeryBullish),
        "bullish" => Some(Sentiment::Bullish),
        "neutral" => Some(Sentiment::Neutral),
        "bearish" => Some(Sentiment::Bearish),
        "very_bearish" => Some(Sentiment::VeryBearish),
        _ => None,
    }
}

fn parse_logic_check_label(raw: &str) -> Option<LogicCheck> {
    match raw {
        "data_backed" => Some(LogicCheck::DataBacked),
        "hype_detected" => Some(LogicCheck::HypeDetected),
        "neutral" => Some(LogicCheck::Neutral),
        _ => None,
    }
}

fn row_to_article(r: sqlx::postgres::PgRow) -> StoreResult<Article> {
    let article_type: String = r.try_get("article_type").map_err(StoreError::Query)?;
    let sentiment: Option<String> = r.try_get("sentiment").map_err(StoreError::Query)?;
    let logic_check: Option<String> = r.try_get("logic_check").map_err(StoreError::Query)?;

    Ok(Article {
        id: r.try_get("id").map_err(StoreError::Query)?,
        title: r.try_get("title").map_err(StoreError::Query)?,
        url: r.try_get("url").map_err(StoreError::Query)?,
        content: r.try_get("content").map_err(StoreError::Query)?,
        summary: r.try_get("summary").map_err(StoreError::Query)?,
        source: r.try_get("source").map_err(StoreError::Query)?,
        published_at: r.try_get("published_at").map_err(StoreError::Query)?,
        fetched_at: r.try_get("fetched_at").map_err(StoreError::Query)?,
        article_type: parse_article_type(&article_type),
        tickers: r.try_get("tickers").map_err(StoreError::Query)?,
        sector: r.try_get("sector").map_err(StoreError::Query)?,
        relevance_score: r.try_get("relevance_score").map_err(StoreError::Query)?,
        embedding: None,
        claims: r.try_get("claims").map_err(StoreError::Query)?,
        fact_check: r.try_get("fact_check").map_err(StoreError::Query)?,
        conclusion: r.try_get("conclusion").map_err(StoreError::Query)?,
        sentiment: sentiment.as_deref().and_then(parse_sentiment_label),
        sentiment_score: r.try_get("sentiment_score").map_err(StoreError::Query)?,
        logic_check: logic_check.as_deref().and_then(parse_logic_check_label),
        fund: r.try_get("fund").map_err(StoreError::Query)?,
        archive_submitted_at: r.try_get("archive_submitted_at").map_err(StoreError::Query)?,
        archive_checked_at: r.try_get("archive_checked_at").map_err(StoreError::Query)?,
        archive_url: r.try_get("archive_url").map_err(StoreError::Query)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_literal_formats_as_bracketed_csv() {
        let v = vec![1.0_f32, 0.5, -2.25];
        assert_eq!(format_vector_literal(&v), "[1,0.5,-2.25]");
    }
}
