use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use intel_core::{Platform, SocialPost, SocialSentimentSession};
use intel_scheduler::{Job, JobOutcome, Trigger};
use uuid::Uuid;

use crate::deps::JobDeps;

const BATCH_SIZE: i64 = 500;
const SESSION_WINDOW: ChronoDuration = ChronoDuration::hours(4);

/// Groups unsessioned posts per `(ticker, platform)` into fixed 4-hour
/// windows aligned to the epoch, so two runs of this job against the same
/// posts always produce the same window boundaries.
pub struct SocialSessioningJob {
    deps: JobDeps,
}

impl SocialSessioningJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }

    fn window_bounds(posted_at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let window_secs = SESSION_WINDOW.num_seconds();
        let epoch_secs = posted_at.timestamp();
        let window_index = epoch_secs.div_euclid(window_secs);
        let start = DateTime::from_timestamp(window_index * window_secs, 0).unwrap_or(posted_at);
        (start, start + SESSION_WINDOW)
    }
}

#[async_trait]
impl Job for SocialSessioningJob {
    fn id(&self) -> &str {
        "social_sessioning"
    }

    fn name(&self) -> &str {
        "Social Sentiment Sessioning"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let posts = self.deps.meta_store.unsessioned_social_posts(BATCH_SIZE).await?;

        let mut groups: HashMap<(String, Platform, DateTime<Utc>), Vec<SocialPost>> = HashMap::new();
        for post in posts {
            let (start, _) = Self::window_bounds(post.posted_at);
            groups.entry((post.ticker.clone(), post.platform, start)).or_default().push(post);
        }

        let mut sessions_created = 0u64;
        for ((ticker, platform, window_start), posts) in groups {
            let window_end = window_start + SESSION_WINDOW;
            let session = SocialSentimentSession {
                id: Uuid::new_v4(),
                ticker,
                platform,
                window_start,
                window_end,
                post_count: posts.len() as i32,
                sentiment_label: None,
                sentiment_score: None,
                reasoning: None,
                needs_ai_analysis: true,
            };

            let session_id = match self.deps.meta_store.save_social_sentiment_session(&session).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(ticker = %session.ticker, error = %e, "failed to persist sentiment session");
                    continue;
                }
            };

            let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
            if let Err(e) = self.deps.meta_store.assign_posts_to_session(session_id, &post_ids).await {
                tracing::error!(session_id = %session_id, error = %e, "failed to assign posts to session");
                continue;
            }
            sessions_created += 1;
        }

        Ok(JobOutcome {
            items_processed: sessions_created,
            summary: format!("sessions_created={sessions_created}"),
        })
    }
}
