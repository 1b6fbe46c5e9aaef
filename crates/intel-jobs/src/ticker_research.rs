use async_trait::async_trait;
use intel_core::{ArticleType, Outcome};
use intel_pipeline::JobContext;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

const ETF_SECTOR_SEARCH_RESULTS: u32 = 10;
const TICKER_SEARCH_RESULTS: u32 = 10;

/// Baseline relevance for the ETF/sector-search path, weaker than a direct
/// ticker/company match since the article was only found by sector.
const ETF_BASELINE_RELEVANCE: f64 = 0.7;

pub struct TickerResearchJob {
    deps: JobDeps,
}

impl TickerResearchJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }

    fn is_etf(ticker: &str, company_name: &str) -> bool {
        ticker.to_uppercase().contains("ETF") || company_name.to_uppercase().contains("ETF")
    }
}

#[async_trait]
impl Job for TickerResearchJob {
    fn id(&self) -> &str {
        "ticker_research"
    }

    fn name(&self) -> &str {
        "Ticker Research"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let positions = self.deps.meta_store.active_fund_positions().await?;
        let mut saved = 0u64;

        for position in positions {
            let is_etf = Self::is_etf(&position.ticker, &position.company_name);

            let mut ctx = JobContext {
                article_type: ArticleType::TickerNews,
                fund: Some(position.fund_name.clone()),
                ..Default::default()
            };

            let results = if is_etf {
                let tickers = vec![position.ticker.clone()];
                let securities = self.deps.meta_store.securities_for_tickers(&tickers).await?;
                let sector = securities.first().and_then(|s| s.sector.clone());
                let Some(sector) = sector else {
                    tracing::debug!(ticker = %position.ticker, "ETF position has no known sector, skipping");
                    continue;
                };
                ctx.base_relevance_override = Some(ETF_BASELINE_RELEVANCE);
                self.deps.clients.search.search(&sector, ETF_SECTOR_SEARCH_RESULTS).await
            } else {
                let query = format!("{} {} stock news", position.ticker, position.company_name);
                self.deps.clients.search.search(&query, TICKER_SEARCH_RESULTS).await
            };

            let results = match results {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(ticker = %position.ticker, error = %e, "ticker research search failed");
                    continue;
                }
            };

            for result in results {
                if let Outcome::Saved(_) = self.deps.pipeline.process(&result.url, &result.title, &ctx).await {
                    saved += 1;
                }
            }
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("saved={saved}"),
        })
    }
}
