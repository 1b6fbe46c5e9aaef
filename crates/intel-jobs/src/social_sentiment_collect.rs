use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use intel_core::{Platform, SocialMetric};
use intel_scheduler::{Job, JobOutcome, Trigger};
use uuid::Uuid;

use crate::deps::JobDeps;

/// Window the StockTwits query covers per ticker.
const STOCKTWITS_WINDOW: Duration = Duration::from_secs(60 * 60);
const ANTIBOT_TIMEOUT_MS: u64 = 30_000;

/// One raw post as stored inside `SocialMetric.raw_posts`, independent of
/// platform — the Post Extraction job reads this shape back out.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RawPost {
    id: String,
    text: String,
    created_at: chrono::DateTime<Utc>,
    sentiment_label: Option<String>,
}

pub struct SocialSentimentCollectJob {
    deps: JobDeps,
}

impl SocialSentimentCollectJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }

    async fn collect_stocktwits(&self, ticker: &str) -> anyhow::Result<Option<SocialMetric>> {
        let url = format!("https://api.stocktwits.com/api/2/streams/symbol/{ticker}.json");
        let body = match self.deps.clients.antibot.get_json(&url, ANTIBOT_TIMEOUT_MS).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(ticker, error = %e, "stocktwits fetch failed");
                return Ok(None);
            }
        };

        let cutoff = Utc::now() - chrono::Duration::from_std(STOCKTWITS_WINDOW).unwrap();
        let messages = body.get("messages").and_then(|m| m.as_array()).cloned().unwrap_or_default();

        let mut posts = Vec::new();
        let mut bulls = 0u32;
        let mut bears = 0u32;

        for msg in messages {
            let created_at = msg
                .get("created_at")
                .and_then(|v| v.as_str())
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            let Some(created_at) = created_at else { continue };
            if created_at < cutoff {
                continue;
            }

            let label = msg
                .get("entities")
                .and_then(|e| e.get("sentiment"))
                .and_then(|s| s.get("basic"))
                .and_then(|v| v.as_str())
                .map(str::to_lowercase);
            match label.as_deref() {
                Some("bullish") => bulls += 1,
                Some("bearish") => bears += 1,
                _ => {}
            }

            let text = msg.get("body").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let id = msg.get("id").map(|v| v.to_string()).unwrap_or_default();
            posts.push(RawPost { id, text, created_at, sentiment_label: label });
        }

        let ratio = if bulls + bears > 0 {
            Some(bulls as f64 / (bulls + bears) as f64)
        } else {
            None
        };

        Ok(Some(SocialMetric {
            id: Uuid::new_v4(),
            ticker: ticker.to_string(),
            platform: Platform::Stocktwits,
            created_at: Utc::now(),
            volume: posts.len() as i32,
            bull_bear_ratio: ratio,
            sentiment_label: None,
            sentiment_score: None,
            raw_posts: Some(serde_json::to_value(&posts).unwrap_or_default()),
            analysis_session_id: None,
            extracted_at: None,
        }))
    }

    async fn collect_reddit(&self, ticker: &str) -> anyhow::Result<Option<SocialMetric>> {
        let mut posts = Vec::new();

        for (i, subreddit) in intel_clients::SUBREDDIT_WHITELIST.iter().enumerate() {
            if posts.len() >= intel_clients::ENOUGH_POSTS {
                tracing::debug!(ticker, collected = posts.len(), "reddit collect: enough posts, stopping scan");
                break;
            }
            if i > 0 {
                tokio::time::sleep(intel_clients::RATE_LIMIT).await;
            }

            let fetched = match self.deps.clients.reddit.fetch_new(subreddit, ticker).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(ticker, subreddit, error = %e, "reddit fetch failed");
                    continue;
                }
            };

            for post in fetched {
                let combined = format!("{} {}", post.title, post.selftext);
                if !intel_clients::mentions_ticker(&combined, ticker) {
                    continue;
                }
                let created_at = chrono::DateTime::from_timestamp(post.created_utc as i64, 0).unwrap_or_else(Utc::now);
                posts.push(RawPost {
                    id: post.id,
                    text: combined,
                    created_at,
                    sentiment_label: None,
                });
            }
        }

        if posts.is_empty() {
            return Ok(None);
        }

        Ok(Some(SocialMetric {
            id: Uuid::new_v4(),
            ticker: ticker.to_string(),
            platform: Platform::Reddit,
            created_at: Utc::now(),
            volume: posts.len() as i32,
            bull_bear_ratio: None,
            sentiment_label: None,
            sentiment_score: None,
            raw_posts: Some(serde_json::to_value(&posts).unwrap_or_default()),
            analysis_session_id: None,
            extracted_at: None,
        }))
    }
}

#[async_trait]
impl Job for SocialSentimentCollectJob {
    fn id(&self) -> &str {
        "social_sentiment_collect"
    }

    fn name(&self) -> &str {
        "Social Sentiment Collect"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(30 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let tickers = self.deps.meta_store.watched_tickers().await?;
        let mut saved = 0u64;

        for ticker in &tickers {
            for metric in [self.collect_stocktwits(ticker).await?, self.collect_reddit(ticker).await?]
                .into_iter()
                .flatten()
            {
                match self.deps.meta_store.save_social_metric(&metric).await {
                    Ok(()) => saved += 1,
                    Err(e) => tracing::error!(ticker, error = %e, "failed to persist social metric"),
                }
            }
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("tickers={} metrics_saved={saved}", tickers.len()),
        })
    }
}
