use chrono::{DateTime, NaiveDate, Utc};
use intel_core::{
    Chamber, Committee, CommitteeAssignment, CongressTrade, FundPosition, JobExecution,
    JobStatusKind, Owner, Platform, Politician, RetryQueueEntry, RiskPattern, RssFeed, Security,
    SocialMetric, SocialPost, SocialSentimentSession, TradeAnalysis, TradeSession,
};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::pool::{connect, warn_if_saturated};

/// Operational store: job history, retry queue, congress trade data and
/// social sentiment snapshots.
pub struct MetaStore {
    pool: PgPool,
}

impl MetaStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = connect("meta_store", database_url, max_connections).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn warn_if_saturated(&self) {
        warn_if_saturated("meta_store", &self.pool);
    }

    pub async fn start_job_execution(
        &self,
        job_name: &str,
        target_date: NaiveDate,
        fund_name: Option<&str>,
    ) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO job_executions (id, job_name, target_date, fund_name, status, started_at, funds_processed)
            VALUES ($1, $2, $3, $4, 'running', $5, '[]'::jsonb)
            "#,
        )
        .bind(id)
        .bind(job_name)
        .bind(target_date)
        .bind(fund_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(id)
    }

    pub async fn complete_job_execution(
        &self,
        id: Uuid,
        status: JobStatusKind,
        duration_ms: i64,
        error_message: Option<&str>,
        funds_processed: &[String],
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE job_executions
            SET status = $2, completed_at = $3, duration_ms = $4, error_message = $5,
                funds_processed = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(job_status_label(status))
        .bind(Utc::now())
        .bind(duration_ms)
        .bind(error_message)
        .bind(serde_json::to_value(funds_processed).unwrap_or(serde_json::json!([])))
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Rows still `running` past the stale threshold, used by the scheduler's
    /// startup sweep.
    pub async fn stale_running_jobs(&self, stale_before: DateTime<Utc>) -> StoreResult<Vec<JobExecution>> {
        let rows = sqlx::query(
            "SELECT id, job_name, target_date, fund_name, status, started_at, completed_at,
                    duration_ms, error_message, funds_processed
             FROM job_executions
             WHERE status = 'running' AND started_at < $1",
        )
        .bind(stale_before)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_job_execution).collect()
    }

    /// Most recent execution rows across all jobs, newest first — one of
    /// the scheduler's 3 status-reporting queries.
    pub async fn recent_job_executions(&self, limit: i64) -> StoreResult<Vec<JobExecution>> {
        let rows = sqlx::query(
            "SELECT id, job_name, target_date, fund_name, status, started_at, completed_at,
                    duration_ms, error_message, funds_processed
             FROM job_executions
             ORDER BY started_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_job_execution).collect()
    }

    /// Most recent execution row per distinct `job_name`, used to surface
    /// each job's `is_running`/`running_since`/`last_error` on the status
    /// endpoint without one query per job.
    pub async fn latest_job_executions(&self) -> StoreResult<Vec<JobExecution>> {
        let rows = sqlx::query(
            "SELECT DISTINCT ON (job_name) id, job_name, target_date, fund_name, status, started_at,
                    completed_at, duration_ms, error_message, funds_processed
             FROM job_executions
             ORDER BY job_name, started_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_job_execution).collect()
    }

    /// Count of rows currently `running` — the scheduler's cheap
    /// is-anything-stuck check, separate from the full stale-sweep query.
    pub async fn running_job_count(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM job_executions WHERE status = 'running'")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        row.try_get("n").map_err(StoreError::Query)
    }

    /// Count of rows in the retry queue due now or in the past — the third
    /// status-reporting query.
    pub async fn due_retry_count(&self, now: DateTime<Utc>) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM retry_queue WHERE next_attempt_at <= $1")
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        row.try_get("n").map_err(StoreError::Query)
    }

    pub async fn delete_job_execution(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM job_executions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn enqueue_retry(&self, entry: &RetryQueueEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO retry_queue (job_name, target_date, entity_id, entity_type, failure_reason, attempts, next_attempt_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entry.job_name)
        .bind(entry.target_date)
        .bind(&entry.entity_id)
        .bind(&entry.entity_type)
        .bind(&entry.failure_reason)
        .bind(entry.attempts)
        .bind(entry.next_attempt_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn due_retries(&self, now: DateTime<Utc>) -> StoreResult<Vec<RetryQueueEntry>> {
        let rows = sqlx::query(
            "SELECT job_name, target_date, entity_id, entity_type, failure_reason, attempts, next_attempt_at
             FROM retry_queue WHERE next_attempt_at <= $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(RetryQueueEntry {
                    job_name: r.try_get("job_name").map_err(StoreError::Query)?,
                    target_date: r.try_get("target_date").map_err(StoreError::Query)?,
                    entity_id: r.try_get("entity_id").map_err(StoreError::Query)?,
                    entity_type: r.try_get("entity_type").map_err(StoreError::Query)?,
                    failure_reason: r.try_get("failure_reason").map_err(StoreError::Query)?,
                    attempts: r.try_get("attempts").map_err(StoreError::Query)?,
                    next_attempt_at: r.try_get("next_attempt_at").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn save_congress_trade(&self, trade: &CongressTrade) -> StoreResult<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO congress_trades (
                id, politician_id, ticker, chamber, party, state, owner, transaction_date,
                disclosure_date, trade_type, amount, price, asset_type, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (politician_id, ticker, transaction_date, trade_type, amount)
            DO UPDATE SET disclosure_date = EXCLUDED.disclosure_date, notes = EXCLUDED.notes
            RETURNING id
            "#,
        )
        .bind(trade.id)
        .bind(trade.politician_id)
        .bind(&trade.ticker)
        .bind(chamber_label(trade.chamber))
        .bind(&trade.party)
        .bind(&trade.state)
        .bind(owner_label(trade.owner))
        .bind(trade.transaction_date)
        .bind(trade.disclosure_date)
        .bind(trade_type_label(trade.trade_type))
        .bind(&trade.amount)
        .bind(trade.price)
        .bind(asset_type_label(trade.asset_type))
        .bind(&trade.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.try_get::<Uuid, _>("id").map_err(StoreError::Query)
    }

    pub async fn save_trade_analysis(&self, analysis: &TradeAnalysis) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trade_analyses (
                trade_id, model_used, analysis_version, conflict_score, confidence_score,
                confidence_defaulted, risk_pattern, reasoning, session_id, analyzed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (trade_id, analysis_version) DO UPDATE SET
                conflict_score = EXCLUDED.conflict_score,
                confidence_score = EXCLUDED.confidence_score,
                confidence_defaulted = EXCLUDED.confidence_defaulted,
                risk_pattern = EXCLUDED.risk_pattern,
                reasoning = EXCLUDED.reasoning,
                analyzed_at = EXCLUDED.analyzed_at
            "#,
        )
        .bind(analysis.trade_id)
        .bind(&analysis.model_used)
        .bind(analysis.analysis_version)
        .bind(analysis.conflict_score)
        .bind(analysis.confidence_score)
        .bind(analysis.confidence_defaulted)
        .bind(risk_pattern_label(analysis.risk_pattern))
        .bind(&analysis.reasoning)
        .bind(analysis.session_id)
        .bind(analysis.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn sessions_needing_analysis(&self, limit: i64) -> StoreResult<Vec<TradeSession>> {
        let rows = sqlx::query(
            "SELECT id, politician_name, start_date, end_date, trade_count, conflict_score,
                    confidence_score, ai_summary, risk_pattern, model_used, needs_ai_analysis
             FROM trade_sessions
             WHERE needs_ai_analysis = true
             ORDER BY start_date DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_trade_session).collect()
    }

    pub async fn politician_by_canonical_name(&self, canonical_name: &str) -> StoreResult<Option<Politician>> {
        let row = sqlx::query(
            "SELECT id, canonical_name, aliases, party, state, chamber, is_leadership
             FROM politicians WHERE canonical_name = $1",
        )
        .bind(canonical_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(|r| {
            let chamber_label: String = r.try_get("chamber").map_err(StoreError::Query)?;
            Ok(Politician {
                id: r.try_get("id").map_err(StoreError::Query)?,
                canonical_name: r.try_get("canonical_name").map_err(StoreError::Query)?,
                aliases: r.try_get("aliases").map_err(StoreError::Query)?,
                party: r.try_get("party").map_err(StoreError::Query)?,
                state: r.try_get("state").map_err(StoreError::Query)?,
                chamber: parse_chamber(&chamber_label),
                is_leadership: r.try_get("is_leadership").map_err(StoreError::Query)?,
            })
        })
        .transpose()
    }

    /// Every trade by `politician_id` with a transaction date in
    /// `[start, end]`, used to rebuild a trade session's activity table.
    pub async fn trades_for_politician_in_range(
        &self,
        politician_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<CongressTrade>> {
        let rows = sqlx::query(
            "SELECT id, politician_id, ticker, chamber, party, state, owner, transaction_date,
                    disclosure_date, trade_type, amount, price, asset_type, notes
             FROM congress_trades
             WHERE politician_id = $1 AND transaction_date BETWEEN $2 AND $3
             ORDER BY transaction_date ASC, id ASC",
        )
        .bind(politician_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_congress_trade).collect()
    }

    pub async fn save_social_metric(&self, metric: &SocialMetric) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO social_metrics (
                id, ticker, platform, created_at, volume, bull_bear_ratio, sentiment_label,
                sentiment_score, raw_posts, analysis_session_id, extracted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(metric.id)
        .bind(&metric.ticker)
        .bind(platform_label(metric.platform))
        .bind(metric.created_at)
        .bind(metric.volume)
        .bind(metric.bull_bear_ratio)
        .bind(&metric.sentiment_label)
        .bind(metric.sentiment_score)
        .bind(&metric.raw_posts)
        .bind(metric.analysis_session_id)
        .bind(metric.extracted_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Metrics whose `raw_posts` blob hasn't been exploded into `social_posts`
    /// rows yet.
    pub async fn social_metrics_pending_extraction(&self, limit: i64) -> StoreResult<Vec<SocialMetric>> {
        let rows = sqlx::query(
            "SELECT id, ticker, platform, created_at, volume, bull_bear_ratio, sentiment_label,
                    sentiment_score, raw_posts, analysis_session_id, extracted_at
             FROM social_metrics
             WHERE raw_posts IS NOT NULL AND extracted_at IS NULL
             ORDER BY created_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_social_metric).collect()
    }

    pub async fn mark_social_metric_extracted(&self, id: Uuid, extracted_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE social_metrics SET extracted_at = $2 WHERE id = $1")
            .bind(id)
            .bind(extracted_at)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn save_social_posts(&self, posts: &[SocialPost]) -> StoreResult<()> {
        for post in posts {
            sqlx::query(
                "INSERT INTO social_posts (id, ticker, platform, posted_at, text, session_id)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(post.id)
            .bind(platform_label(post.platform))
            .bind(post.posted_at)
            .bind(&post.text)
            .bind(post.session_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        }
        Ok(())
    }

    /// Posts not yet grouped into a sentiment session, oldest first so the
    /// Sessioning job can fill 4-hour windows in order.
    pub async fn unsessioned_social_posts(&self, limit: i64) -> StoreResult<Vec<SocialPost>> {
        let rows = sqlx::query(
            "SELECT id, ticker, platform, posted_at, text, session_id
             FROM social_posts
             WHERE session_id IS NULL
             ORDER BY ticker, platform, posted_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_social_post).collect()
    }

    pub async fn save_social_sentiment_session(&self, session: &SocialSentimentSession) -> StoreResult<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO social_sentiment_sessions (
                id, ticker, platform, window_start, window_end, post_count,
                sentiment_label, sentiment_score, reasoning, needs_ai_analysis, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $4)
            RETURNING id
            "#,
        )
        .bind(session.id)
        .bind(&session.ticker)
        .bind(platform_label(session.platform))
        .bind(session.window_start)
        .bind(session.window_end)
        .bind(session.post_count)
        .bind(&session.sentiment_label)
        .bind(session.sentiment_score)
        .bind(&session.reasoning)
        .bind(session.needs_ai_analysis)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        row.try_get::<Uuid, _>("id").map_err(StoreError::Query)
    }

    pub async fn assign_posts_to_session(&self, session_id: Uuid, post_ids: &[Uuid]) -> StoreResult<()> {
        sqlx::query("UPDATE social_posts SET session_id = $1 WHERE id = ANY($2)")
            .bind(session_id)
            .bind(post_ids)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    pub async fn sessions_needing_social_analysis(&self, limit: i64) -> StoreResult<Vec<SocialSentimentSession>> {
        let rows = sqlx::query(
            "SELECT id, ticker, platform, window_start, window_end, post_count,
                    sentiment_label, sentiment_score, reasoning, needs_ai_analysis
             FROM social_sentiment_sessions
             WHERE needs_ai_analysis = true
             ORDER BY window_start ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_social_session).collect()
    }

    pub async fn posts_for_session(&self, session_id: Uuid) -> StoreResult<Vec<SocialPost>> {
        let rows = sqlx::query(
            "SELECT id, ticker, platform, posted_at, text, session_id
             FROM social_posts WHERE session_id = $1 ORDER BY posted_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_social_post).collect()
    }

    pub async fn save_social_sentiment_analysis(
        &self,
        session_id: Uuid,
        sentiment_label: &str,
        sentiment_score: f64,
        reasoning: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE social_sentiment_sessions SET sentiment_label = $2, sentiment_score = $3,
                reasoning = $4, needs_ai_analysis = false WHERE id = $1",
        )
        .bind(session_id)
        .bind(sentiment_label)
        .bind(sentiment_score)
        .bind(reasoning)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Single `IN (...)` query; callers chunk to `SECURITIES_CHUNK_SIZE` to
    /// stay clear of parameter-count/URL-length limits.
    pub async fn securities_for_tickers(&self, tickers: &[String]) -> StoreResult<Vec<Security>> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT ticker, company_name, sector FROM securities WHERE ticker = ANY($1)",
        )
        .bind(tickers)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(Security {
                    ticker: r.try_get("ticker").map_err(StoreError::Query)?,
                    company_name: r.try_get("company_name").map_err(StoreError::Query)?,
                    sector: r.try_get("sector").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn politicians_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Politician>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT id, canonical_name, aliases, party, state, chamber, is_leadership
             FROM politicians WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                let chamber: String = r.try_get("chamber").map_err(StoreError::Query)?;
                Ok(Politician {
                    id: r.try_get("id").map_err(StoreError::Query)?,
                    canonical_name: r.try_get("canonical_name").map_err(StoreError::Query)?,
                    aliases: r.try_get("aliases").map_err(StoreError::Query)?,
                    party: r.try_get("party").map_err(StoreError::Query)?,
                    state: r.try_get("state").map_err(StoreError::Query)?,
                    chamber: parse_chamber(&chamber),
                    is_leadership: r.try_get("is_leadership").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn committee_assignments_for_politicians(
        &self,
        politician_ids: &[Uuid],
    ) -> StoreResult<Vec<CommitteeAssignment>> {
        if politician_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT politician_id, committee_id, title FROM committee_assignments
             WHERE politician_id = ANY($1)",
        )
        .bind(politician_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(CommitteeAssignment {
                    politician_id: r.try_get("politician_id").map_err(StoreError::Query)?,
                    committee_id: r.try_get("committee_id").map_err(StoreError::Query)?,
                    title: r.try_get("title").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn all_committees(&self) -> StoreResult<Vec<Committee>> {
        let rows = sqlx::query("SELECT id, name, target_sectors FROM committees")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(Committee {
                    id: r.try_get("id").map_err(StoreError::Query)?,
                    name: r.try_get("name").map_err(StoreError::Query)?,
                    target_sectors: r.try_get("target_sectors").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    /// Trades with a null `conflict_score`, used by the non-rescore path of
    /// the Congress Analysis job.
    pub async fn trades_needing_analysis(&self, limit: i64) -> StoreResult<Vec<CongressTrade>> {
        let rows = sqlx::query(
            "SELECT ct.id, ct.politician_id, ct.ticker, ct.chamber, ct.party, ct.state, ct.owner,
                    ct.transaction_date, ct.disclosure_date, ct.trade_type, ct.amount, ct.price,
                    ct.asset_type, ct.notes
             FROM congress_trades ct
             LEFT JOIN trade_analyses ta ON ta.trade_id = ct.id
             WHERE ta.conflict_score IS NULL
             ORDER BY ct.transaction_date DESC, ct.id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(row_to_congress_trade).collect()
    }

    /// Cursor-paginated full trade listing for rescore mode, ordered by
    /// `(transaction_date desc, id desc)`. The cursor is pushed into the
    /// `WHERE` clause as a tuple comparison so the full sweep keeps making
    /// progress past however many rows lie before the cursor, instead of
    /// re-scanning a fixed top window every page.
    pub async fn trades_after_cursor(
        &self,
        cursor: Option<(NaiveDate, Uuid)>,
        batch_size: i64,
    ) -> StoreResult<Vec<CongressTrade>> {
        let rows = match cursor {
            None => {
                sqlx::query(
                    "SELECT id, politician_id, ticker, chamber, party, state, owner, transaction_date,
                            disclosure_date, trade_type, amount, price, asset_type, notes
                     FROM congress_trades
                     ORDER BY transaction_date DESC, id DESC
                     LIMIT $1",
                )
                .bind(batch_size)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::Query)?
            }
            Some((cursor_date, cursor_id)) => {
                sqlx::query(
                    "SELECT id, politician_id, ticker, chamber, party, state, owner, transaction_date,
                            disclosure_date, trade_type, amount, price, asset_type, notes
                     FROM congress_trades
                     WHERE transaction_date < $1 OR (transaction_date = $1 AND id < $2)
                     ORDER BY transaction_date DESC, id DESC
                     LIMIT $3",
                )
                .bind(cursor_date)
                .bind(cursor_id)
                .bind(batch_size)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::Query)?
            }
        };

        rows.into_iter().map(row_to_congress_trade).collect()
    }

    pub async fn enabled_feeds(&self) -> StoreResult<Vec<RssFeed>> {
        let rows = sqlx::query(
            "SELECT id, url, source_name, enabled, last_fetched_at FROM rss_feeds WHERE enabled = true",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(RssFeed {
                    id: r.try_get("id").map_err(StoreError::Query)?,
                    url: r.try_get("url").map_err(StoreError::Query)?,
                    source_name: r.try_get("source_name").map_err(StoreError::Query)?,
                    enabled: r.try_get("enabled").map_err(StoreError::Query)?,
                    last_fetched_at: r.try_get("last_fetched_at").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn update_feed_last_fetched(&self, feed_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE rss_feeds SET last_fetched_at = $2 WHERE id = $1")
            .bind(feed_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Distinct (ticker, company, fund) triples from active positions in
    /// production funds — the Ticker Research job's sweep list.
    pub async fn active_fund_positions(&self) -> StoreResult<Vec<FundPosition>> {
        let rows = sqlx::query(
            "SELECT DISTINCT ticker, company_name, fund_name FROM fund_positions
             WHERE is_active = true AND is_production = true",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter()
            .map(|r| {
                Ok(FundPosition {
                    ticker: r.try_get("ticker").map_err(StoreError::Query)?,
                    company_name: r.try_get("company_name").map_err(StoreError::Query)?,
                    fund_name: r.try_get("fund_name").map_err(StoreError::Query)?,
                })
            })
            .collect()
    }

    pub async fn watched_tickers(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT ticker FROM watched_tickers")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        rows.into_iter()
            .map(|r| r.try_get::<String, _>("ticker").map_err(StoreError::Query))
            .collect()
    }

    /// Resolves a politician by canonical name, inserting a new row (with
    /// `is_leadership` checked against the configured allow-list) when one
    /// doesn't already exist — used by the Congress Trades Fetch job, which
    /// only ever sees a name string on the wire.
    pub async fn find_or_create_politician(
        &self,
        canonical_name: &str,
        party: &str,
        state: &str,
        chamber: Chamber,
        is_leadership: bool,
    ) -> StoreResult<Politician> {
        if let Some(row) = sqlx::query(
            "SELECT id, canonical_name, aliases, party, state, chamber, is_leadership
             FROM politicians WHERE canonical_name = $1",
        )
        .bind(canonical_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?
        {
            let chamber_label: String = row.try_get("chamber").map_err(StoreError::Query)?;
            return Ok(Politician {
                id: row.try_get("id").map_err(StoreError::Query)?,
                canonical_name: row.try_get("canonical_name").map_err(StoreError::Query)?,
                aliases: row.try_get("aliases").map_err(StoreError::Query)?,
                party: row.try_get("party").map_err(StoreError::Query)?,
                state: row.try_get("state").map_err(StoreError::Query)?,
                chamber: parse_chamber(&chamber_label),
                is_leadership: row.try_get("is_leadership").map_err(StoreError::Query)?,
            });
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO politicians (id, canonical_name, aliases, party, state, chamber, is_leadership)
             VALUES ($1, $2, '{}', $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(canonical_name)
        .bind(party)
        .bind(state)
        .bind(chamber_label(chamber))
        .bind(is_leadership)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(Politician {
            id,
            canonical_name: canonical_name.to_string(),
            aliases: Vec::new(),
            party: party.to_string(),
            state: state.to_string(),
            chamber,
            is_leadership,
        })
    }

    pub async fn upsert_trade_session(&self, session: &TradeSession) -> StoreResult<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO trade_sessions (
                id, politician_name, start_date, end_date, trade_count, conflict_score,
                confidence_score, ai_summary, risk_pattern, model_used, needs_ai_analysis
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (politician_name, start_date, end_date) DO UPDATE SET
                trade_count = EXCLUDED.trade_count,
                needs_ai_analysis = EXCLUDED.needs_ai_analysis
            RETURNING id
            "#,
        )
        .bind(session.id)
        .bind(&session.politician_name)
        .bind(session.start_date)
        .bind(session.end_date)
        .bind(session.trade_count)
        .bind(session.conflict_score)
        .bind(session.confidence_score)
        .bind(&session.ai_summary)
        .bind(session.risk_pattern.map(risk_pattern_label))
        .bind(&session.model_used)
        .bind(session.needs_ai_analysis)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        row.try_get::<Uuid, _>("id").map_err(StoreError::Query)
    }

    pub async fn save_session_analysis(
        &self,
        session_id: Uuid,
        risk_pattern: RiskPattern,
        conflict_score: f64,
        confidence_score: f64,
        summary: &str,
        model_used: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE trade_sessions SET risk_pattern = $2, conflict_score = $3,
                confidence_score = $4, ai_summary = $5, model_used = $6, needs_ai_analysis = false
             WHERE id = $1",
        )
        .bind(session_id)
        .bind(risk_pattern_label(risk_pattern))
        .bind(conflict_score)
        .bind(confidence_score)
        .bind(summary)
        .bind(model_used)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    /// Retention sweep: clears raw post JSON at 14 days, deletes metric rows
    /// at 60 days, deletes analysis rows at 90 days — three independent
    /// cutoffs per the Social-Sentiment Retention job.
    pub async fn apply_social_retention(
        &self,
        raw_posts_cutoff: DateTime<Utc>,
        metrics_cutoff: DateTime<Utc>,
        analyses_cutoff: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE social_metrics SET raw_posts = NULL WHERE created_at < $1 AND raw_posts IS NOT NULL")
            .bind(raw_posts_cutoff)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        sqlx::query("DELETE FROM social_metrics WHERE created_at < $1")
            .bind(metrics_cutoff)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        sqlx::query("DELETE FROM social_sentiment_sessions WHERE created_at < $1")
            .bind(analyses_cutoff)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        Ok(())
    }
}

fn row_to_congress_trade(r: sqlx::postgres::PgRow) -> StoreResult<CongressTrade> {
    let chamber: String = r.try_get("chamber").map_err(StoreError::Query)?;
    let owner: String = r.try_get("owner").map_err(StoreError::Query)?;
    let trade_type: String = r.try_get("trade_type").map_err(StoreError::Query)?;
    let asset_type: String = r.try_get("asset_type").map_err(StoreError::Query)?;
    Ok(CongressTrade {
        id: r.try_get("id").map_err(StoreError::Query)?,
        politician_id: r.try_get("politician_id").map_err(StoreError::Query)?,
        ticker: r.try_get("ticker").map_err(StoreError::Query)?,
        chamber: parse_chamber(&chamber),
        party: r.try_get("party").map_err(StoreError::Query)?,
        state: r.try_get("state").map_err(StoreError::Query)?,
        owner: parse_owner(&owner),
        transaction_date: r.try_get("transaction_date").map_err(StoreError::Query)?,
        disclosure_date: r.try_get("disclosure_date").map_err(StoreError::Query)?,
        trade_type: parse_trade_type(&trade_type),
        amount: r.try_get("amount").map_err(StoreError::Query)?,
        price: r.try_get("price").map_err(StoreError::Query)?,
        asset_type: parse_asset_type(&asset_type),
        notes: r.try_get("notes").map_err(StoreError::Query)?,
    })
}

fn parse_chamber(s: &str) -> Chamber {
    match s {
        "senate" => Chamber::Senate,
        _ => Chamber::House,
    }
}

fn parse_owner(s: &str) -> Owner {
    match s {
        "spouse" => Owner::Spouse,
        "dependent" => Owner::Dependent,
        "unknown" => Owner::Unknown,
        _ => Owner::SelfOwner,
    }
}

fn parse_trade_type(s: &str) -> intel_core::TradeType {
    match s {
        "sale" => intel_core::TradeType::Sale,
        _ => intel_core::TradeType::Purchase,
    }
}

fn parse_asset_type(s: &str) -> intel_core::AssetType {
    match s {
        "crypto" => intel_core::AssetType::Crypto,
        _ => intel_core::AssetType::Stock,
    }
}

fn row_to_job_execution(r: sqlx::postgres::PgRow) -> StoreResult<JobExecution> {
    let status: String = r.try_get("status").map_err(StoreError::Query)?;
    let funds_processed: serde_json::Value = r.try_get("funds_processed").map_err(StoreError::Query)?;
    Ok(JobExecution {
        id: r.try_get("id").map_err(StoreError::Query)?,
        job_name: r.try_get("job_name").map_err(StoreError::Query)?,
        target_date: r.try_get("target_date").map_err(StoreError::Query)?,
        fund_name: r.try_get("fund_name").map_err(StoreError::Query)?,
        status: parse_job_status(&status),
        started_at: r.try_get("started_at").map_err(StoreError::Query)?,
        completed_at: r.try_get("completed_at").map_err(StoreError::Query)?,
        duration_ms: r.try_get("duration_ms").map_err(StoreError::Query)?,
        error_message: r.try_get("error_message").map_err(StoreError::Query)?,
        funds_processed: serde_json::from_value(funds_processed).unwrap_or_default(),
    })
}

fn row_to_trade_session(r: sqlx::postgres::PgRow) -> StoreResult<TradeSession> {
    let risk_pattern: Option<String> = r.try_get("risk_pattern").map_err(StoreError::Query)?;
    Ok(TradeSession {
        id: r.try_get("id").map_err(StoreError::Query)?,
        politician_name: r.try_get("politician_name").map_err(StoreError::Query)?,
        start_date: r.try_get("start_date").map_err(StoreError::Query)?,
        end_date: r.try_get("end_date").map_err(StoreError::Query)?,
        trade_count: r.try_get("trade_count").map_err(StoreError::Query)?,
        conflict_score: r.try_get("conflict_score").map_err(StoreError::Query)?,
        confidence_score: r.try_get("confidence_score").map_err(StoreError::Query)?,
        ai_summary: r.try_get("ai_summary").map_err(StoreError::Query)?,
        risk_pattern: risk_pattern.as_deref().map(parse_risk_pattern),
        model_used: r.try_get("model_used").map_err(StoreError::Query)?,
        needs_ai_analysis: r.try_get("needs_ai_analysis").map_err(StoreError::Query)?,
    })
}

fn job_status_label(s: JobStatusKind) -> &'static str {
    match s {
        JobStatusKind::Running => "running",
        JobStatusKind::Success => "success",
        JobStatusKind::Failed => "failed",
    }
}

fn parse_job_status(s: &str) -> JobStatusKind {
    match s {
        "success" => JobStatusKind::Success,
        "failed" => JobStatusKind::Failed,
        _ => JobStatusKind::Running,
    }
}

fn chamber_label(c: Chamber) -> &'static str {
    match c {
        Chamber::House => "house",
        Chamber::Senate => "senate",
    }
}

fn owner_label(o: Owner) -> &'static str {
    match o {
        Owner::SelfOwner => "self",
        Owner::Spouse => "spouse",
        Owner::Dependent => "dependent",
        Owner::Unknown => "unknown",
    }
}

fn trade_type_label(t: intel_core::TradeType) -> &'static str {
    match t {
        intel_core::TradeType::Purchase => "purchase",
        intel_core::TradeType::Sale => "sale",
    }
}

fn asset_type_label(a: intel_core::AssetType) -> &'static str {
    match a {
        intel_core::AssetType::Stock => "stock",
        intel_core::AssetType::Crypto => "crypto",
    }
}

fn risk_pattern_label(r: RiskPattern) -> &'static str {
    match r {
        RiskPattern::ConflictBuy => "conflict_buy",
        RiskPattern::SuspiciousSell => "suspicious_sell",
        RiskPattern::AggressiveBet => "aggressive_bet",
        RiskPattern::RoutineDivestment => "routine_divestment",
        RiskPattern::NoRelationship => "no_relationship",
        RiskPattern::Routine => "routine",
    }
}

fn parse_risk_pattern(s: &str) -> RiskPattern {
    match s {
        "conflict_buy" => RiskPattern::ConflictBuy,
        "suspicious_sell" => RiskPattern::SuspiciousSell,
        "aggressive_bet" => RiskPattern::AggressiveBet,
        "routine_divestment" => RiskPattern::RoutineDivestment,
        "no_relationship" => RiskPattern::NoRelationship,
        _ => RiskPattern::Routine,
    }
}

fn platform_label(p: Platform) -> &'static str {
    match p {
        Platform::Stocktwits => "stocktwits",
        Platform::Reddit => "reddit",
    }
}

fn parse_platform(s: &str) -> Platform {
    match s {
        "reddit" => Platform::Reddit,
        _ => Platform::Stocktwits,
    }
}

fn row_to_social_metric(r: sqlx::postgres::PgRow) -> StoreResult<SocialMetric> {
    let platform: String = r.try_get("platform").map_err(StoreError::Query)?;
    Ok(SocialMetric {
        id: r.try_get("id").map_err(StoreError::Query)?,
        ticker: r.try_get("ticker").map_err(StoreError::Query)?,
        platform: parse_platform(&platform),
        created_at: r.try_get("created_at").map_err(StoreError::Query)?,
        volume: r.try_get("volume").map_err(StoreError::Query)?,
        bull_bear_ratio: r.try_get("bull_bear_ratio").map_err(StoreError::Query)?,
        sentiment_label: r.try_get("sentiment_label").map_err(StoreError::Query)?,
        sentiment_score: r.try_get("sentiment_score").map_err(StoreError::Query)?,
        raw_posts: r.try_get("raw_posts").map_err(StoreError::Query)?,
        analysis_session_id: r.try_get("analysis_session_id").map_err(StoreError::Query)?,
        extracted_at: r.try_get("extracted_at").map_err(StoreError::Query)?,
    })
}

fn row_to_social_post(r: sqlx::postgres::PgRow) -> StoreResult<SocialPost> {
    let platform: String = r.try_get("platform").map_err(StoreError::Query)?;
    Ok(SocialPost {
        id: r.try_get("id").map_err(StoreError::Query)?,
        ticker: r.try_get("ticker").map_err(StoreError::Query)?,
        platform: parse_platform(&platform),
        posted_at: r.try_get("posted_at").map_err(StoreError::Query)?,
        text: r.try_get("text").map_err(StoreError::Query)?,
        session_id: r.try_get("session_id").map_err(StoreError::Query)?,
    })
}

fn row_to_social_session(r: sqlx::postgres::PgRow) -> StoreResult<SocialSentimentSession> {
    let platform: String = r.try_get("platform").map_err(StoreError::Query)?;
    Ok(SocialSentimentSession {
        id: r.try_get("id").map_err(StoreError::Query)?,
        ticker: r.try_get("ticker").map_err(StoreError::Query)?,
        platform: parse_platform(&platform),
        window_start: r.try_get("window_start").map_err(StoreError::Query)?,
        window_end: r.try_get("window_end").map_err(StoreError::Query)?,
        post_count: r.try_get("post_count").map_err(StoreError::Query)?,
        sentiment_label: r.try_get("sentiment_label").map_err(StoreError::Query)?,
        sentiment_score: r.try_get("sentiment_score").map_err(StoreError::Query)?,
        reasoning: r.try_get("reasoning").map_err(StoreError::Query)?,
        needs_ai_analysis: r.try_get("needs_ai_analysis").map_err(StoreError::Query)?,
    })
}
