use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

const RAW_POSTS_RETENTION_DAYS: i64 = 14;
const METRICS_RETENTION_DAYS: i64 = 60;
const ANALYSES_RETENTION_DAYS: i64 = 90;

/// Thin wrapper around the three-cutoff retention sweep: clears raw post
/// JSON at 14 days, deletes metric rows at 60 days, deletes session rows at
/// 90 days.
pub struct SocialRetentionJob {
    deps: JobDeps,
}

impl SocialRetentionJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for SocialRetentionJob {
    fn id(&self) -> &str {
        "social_retention"
    }

    fn name(&self) -> &str {
        "Social Sentiment Retention"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(24 * 60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let now = Utc::now();
        self.deps
            .meta_store
            .apply_social_retention(
                now - chrono::Duration::days(RAW_POSTS_RETENTION_DAYS),
                now - chrono::Duration::days(METRICS_RETENTION_DAYS),
                now - chrono::Duration::days(ANALYSES_RETENTION_DAYS),
            )
            .await?;

        Ok(JobOutcome {
            items_processed: 0,
            summary: "retention sweep applied".to_string(),
        })
    }
}
