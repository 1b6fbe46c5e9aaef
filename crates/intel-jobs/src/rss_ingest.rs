use async_trait::async_trait;
use intel_core::{ArticleType, Outcome};
use intel_pipeline::JobContext;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

pub struct RssIngestJob {
    deps: JobDeps,
}

impl RssIngestJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for RssIngestJob {
    fn id(&self) -> &str {
        "rss_ingest"
    }

    fn name(&self) -> &str {
        "RSS Ingest"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(10 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let feeds = self.deps.meta_store.enabled_feeds().await?;
        let mut saved = 0u64;
        let mut junk_filtered_total = 0u64;

        for feed in feeds {
            let fetched = match self.deps.clients.rss.fetch(&feed.url).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "RSS feed fetch failed");
                    continue;
                }
            };
            junk_filtered_total += fetched.junk_filtered as u64;

            for item in fetched.items {
                if item.needs_extraction() {
                    tracing::debug!(url = %item.url, "RSS item description too short, pipeline will extract full content");
                }

                let ctx = JobContext {
                    article_type: ArticleType::General,
                    ..Default::default()
                };
                if let Outcome::Saved(_) = self.deps.pipeline.process(&item.url, &item.title, &ctx).await {
                    saved += 1;
                }
            }

            if let Err(e) = self
                .deps
                .meta_store
                .update_feed_last_fetched(feed.id, chrono::Utc::now())
                .await
            {
                tracing::warn!(feed = %feed.url, error = %e, "failed to update feed last_fetched_at");
            }
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("saved={saved} junk_filtered={junk_filtered_total}"),
        })
    }
}
