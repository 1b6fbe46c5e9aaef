use async_trait::async_trait;
use chrono::{Duration, Utc};
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

/// Minimum age of an archive submission before the retry job will check it.
const MIN_RETRY_AGE: Duration = Duration::minutes(5);
const EMBEDDING_CHAR_LIMIT: usize = 6000;

pub struct ArchiveRetryJob {
    deps: JobDeps,
}

impl ArchiveRetryJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for ArchiveRetryJob {
    fn id(&self) -> &str {
        "archive_retry"
    }

    fn name(&self) -> &str {
        "Archive Retry"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(10 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let pending = self
            .deps
            .research_store
            .articles_pending_archive_check(MIN_RETRY_AGE)
            .await?;

        let mut recovered = 0u64;
        let now = Utc::now();

        for article in pending {
            let archived_url = match self.deps.clients.archive.check_available(&article.url).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    // Still paywalled: record the check so the job doesn't
                    // keep re-polling it every cycle, but leave archive_url
                    // null so a future submission can still unblock it.
                    if let Err(e) = self.deps.research_store.mark_archive_checked(article.id, now).await {
                        tracing::warn!(article_id = %article.id, error = %e, "failed to record archive check");
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(url = %article.url, error = %e, "archive availability check failed");
                    continue;
                }
            };

            let html = match self.deps.clients.archive.fetch_archived_html(&archived_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(url = %archived_url, error = %e, "failed to fetch archived snapshot");
                    continue;
                }
            };

            let extracted = match self.deps.clients.extractor.extract_from_html(&html) {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(url = %archived_url, error = %e, "archived snapshot had no extractable content");
                    continue;
                }
            };

            let title = if extracted.title.trim().is_empty() {
                article.title.clone()
            } else {
                extracted.title.clone()
            };

            let analysis = match self.deps.clients.llm.summarize(&title, &extracted.content).await {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(url = %archived_url, error = %e, "LLM re-analysis of archived content failed");
                    continue;
                }
            };

            let truncated: String = extracted.content.chars().take(EMBEDDING_CHAR_LIMIT).collect();
            let embedding = self.deps.clients.llm.embed(&truncated).await.ok();

            let sentiment = analysis.sentiment.as_deref().and_then(parse_sentiment);
            let logic_check = analysis.logic_check.as_deref().and_then(parse_logic_check);

            if let Err(e) = self
                .deps
                .research_store
                .update_article_after_archive_retry(
                    article.id,
                    &title,
                    &extracted.content,
                    Some(analysis.summary.as_str()),
                    embedding.as_deref(),
                    sentiment,
                    analysis.sentiment_score,
                    logic_check,
                    &archived_url,
                )
                .await
            {
                tracing::error!(article_id = %article.id, error = %e, "failed to persist re-extracted article");
                continue;
            }

            recovered += 1;
        }

        Ok(JobOutcome {
            items_processed: recovered,
            summary: format!("recovered={recovered}"),
        })
    }
}

fn parse_sentiment(raw: &str) -> Option<intel_core::Sentiment> {
    match raw.to_lowercase().as_str() {
        "very_bullish" => Some(intel_core::Sentiment::VeryBullish),
        "bullish" => Some(intel_core::Sentiment::Bullish),
        "neutral" => Some(intel_core::Sentiment::Neutral),
        "bearish" => Some(intel_core::Sentiment::Bearish),
        "very_bearish" => Some(intel_core::Sentiment::VeryBearish),
        _ => None,
    }
}

fn parse_logic_check(raw: &str) -> Option<intel_core::LogicCheck> {
    match raw.to_lowercase().as_str() {
        "data_backed" => Some(intel_core::LogicCheck::DataBacked),
        "hype_detected" => Some(intel_core::LogicCheck::HypeDetected),
        "neutral" => Some(intel_core::LogicCheck::Neutral),
        _ => None,
    }
}
