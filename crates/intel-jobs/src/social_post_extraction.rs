use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use intel_core::SocialPost;
use intel_scheduler::{Job, JobOutcome, Trigger};
use serde::Deserialize;
use uuid::Uuid;

use crate::deps::JobDeps;

const BATCH_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    text: String,
    created_at: chrono::DateTime<Utc>,
}

/// Explodes each collected metric's `raw_posts` JSON blob into individual
/// `social_posts` rows, so the Sessioning job can group posts across
/// separate collection runs.
pub struct SocialPostExtractionJob {
    deps: JobDeps,
}

impl SocialPostExtractionJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for SocialPostExtractionJob {
    fn id(&self) -> &str {
        "social_post_extraction"
    }

    fn name(&self) -> &str {
        "Social Post Extraction"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(15 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let metrics = self.deps.meta_store.social_metrics_pending_extraction(BATCH_SIZE).await?;
        let mut extracted = 0u64;

        for metric in &metrics {
            let Some(raw) = &metric.raw_posts else {
                self.deps.meta_store.mark_social_metric_extracted(metric.id, Utc::now()).await?;
                continue;
            };

            let raw_posts: Vec<RawPost> = match serde_json::from_value(raw.clone()) {
                Ok(posts) => posts,
                Err(e) => {
                    tracing::warn!(metric_id = %metric.id, error = %e, "unparseable raw_posts blob");
                    self.deps.meta_store.mark_social_metric_extracted(metric.id, Utc::now()).await?;
                    continue;
                }
            };

            let posts: Vec<SocialPost> = raw_posts
                .into_iter()
                .map(|p| SocialPost {
                    id: Uuid::new_v5(&Uuid::NAMESPACE_URL, p.id.as_bytes()),
                    ticker: metric.ticker.clone(),
                    platform: metric.platform,
                    posted_at: p.created_at,
                    text: p.text,
                    session_id: None,
                })
                .collect();

            let count = posts.len() as u64;
            if let Err(e) = self.deps.meta_store.save_social_posts(&posts).await {
                tracing::error!(metric_id = %metric.id, error = %e, "failed to persist extracted posts");
                continue;
            }

            self.deps.meta_store.mark_social_metric_extracted(metric.id, Utc::now()).await?;
            extracted += count;
        }

        Ok(JobOutcome {
            items_processed: extracted,
            summary: format!("metrics={} posts_extracted={extracted}", metrics.len()),
        })
    }
}
