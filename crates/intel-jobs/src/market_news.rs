use std::time::Duration;

use async_trait::async_trait;
use chrono::Timelike;
use intel_core::{ArticleType, Outcome};
use intel_pipeline::JobContext;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

const QUERIES: &[&str] = &[
    "stock market outlook",
    "federal reserve interest rates",
    "earnings season highlights",
    "sector rotation analysis",
    "market volatility news",
];

const NEGATIVE_KEYWORDS: &str = "-astrology -horoscope -zodiac -lottery";
const RESULTS_PER_RUN: u32 = 20;
const JOB_BUDGET: Duration = Duration::from_secs(50 * 60);

pub struct MarketNewsJob {
    deps: JobDeps,
}

impl MarketNewsJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for MarketNewsJob {
    fn id(&self) -> &str {
        "market_news"
    }

    fn name(&self) -> &str {
        "Market News"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(15 * 60))
    }

    fn budget(&self) -> Option<Duration> {
        Some(JOB_BUDGET)
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let hour = chrono::Utc::now().hour() as usize;
        let query = QUERIES[hour % QUERIES.len()];
        let full_query = format!("{query} {NEGATIVE_KEYWORDS}");

        let deadline = std::time::Instant::now() + JOB_BUDGET;
        let results = self.deps.clients.search.search(&full_query, RESULTS_PER_RUN).await?;

        let ctx = JobContext {
            article_type: ArticleType::MarketNews,
            ..Default::default()
        };

        let mut saved = 0u64;
        for result in results {
            if std::time::Instant::now() >= deadline {
                tracing::warn!("market_news job budget exhausted, stopping early");
                break;
            }
            if let Outcome::Saved(_) = self.deps.pipeline.process(&result.url, &result.title, &ctx).await {
                saved += 1;
            }
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("query=\"{query}\" saved={saved}"),
        })
    }
}
