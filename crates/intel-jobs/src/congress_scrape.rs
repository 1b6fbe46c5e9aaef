use async_trait::async_trait;
use chrono::Utc;
use intel_core::parse_flexible_date;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

/// Manual backfill scraper's pagination/windowing parameters. Runs
/// in-process (no subprocess spawn); what used to be streamed subprocess
/// stdout is now plain `tracing` events plus the `JobOutcome` summary.
#[derive(Debug, Clone, Copy)]
pub struct CongressScrapeParams {
    pub months_back: i64,
    pub page_size: u32,
    pub max_pages: u32,
    pub start_page: u32,
    pub skip_recent_days: i64,
}

impl Default for CongressScrapeParams {
    fn default() -> Self {
        Self {
            months_back: 6,
            page_size: 100,
            max_pages: 5,
            start_page: 0,
            skip_recent_days: 7,
        }
    }
}

pub struct CongressScrapeJob {
    deps: JobDeps,
    params: CongressScrapeParams,
}

impl CongressScrapeJob {
    pub fn new(deps: JobDeps, params: CongressScrapeParams) -> Self {
        let page_size = params.page_size.min(100);
        Self {
            deps,
            params: CongressScrapeParams { page_size, ..params },
        }
    }
}

#[async_trait]
impl Job for CongressScrapeJob {
    fn id(&self) -> &str {
        "congress_scrape"
    }

    fn name(&self) -> &str {
        "Congress Scrape"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(7 * 24 * 60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let now = Utc::now().date_naive();
        let earliest = now - chrono::Duration::days(self.params.months_back * 30);
        let recent_cutoff = now - chrono::Duration::days(self.params.skip_recent_days);

        let mut saved = 0u64;
        let mut pages_walked = 0u32;

        for page in self.params.start_page..(self.params.start_page + self.params.max_pages) {
            let records = self.deps.clients.financial.congress_disclosures(page).await?;
            if records.is_empty() {
                tracing::info!(page, "congress scrape: empty page, stopping");
                break;
            }
            pages_walked += 1;

            let page_records: Vec<_> = records.into_iter().take(self.params.page_size as usize).collect();

            for record in page_records {
                let Some(transaction_date) = parse_flexible_date(&record.transaction_date) else {
                    continue;
                };
                if transaction_date < earliest || transaction_date >= recent_cutoff {
                    continue;
                }
                let Some(disclosure_date) = parse_flexible_date(&record.disclosure_date) else {
                    continue;
                };

                let chamber = match record.chamber.as_deref().map(str::to_lowercase).as_deref() {
                    Some("senate") => intel_core::Chamber::Senate,
                    _ => intel_core::Chamber::House,
                };
                let party = record.party.clone().unwrap_or_else(|| "Unknown".to_string());
                let state = record.state.clone().unwrap_or_else(|| "Unknown".to_string());

                let politician = match self
                    .deps
                    .meta_store
                    .find_or_create_politician(&record.politician_name, &party, &state, chamber, false)
                    .await
                {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "congress scrape: politician resolution failed");
                        continue;
                    }
                };

                let Some(trade_type) = (match record.transaction_type.to_lowercase().as_str() {
                    "purchase" | "buy" => Some(intel_core::TradeType::Purchase),
                    "sale" | "sell" => Some(intel_core::TradeType::Sale),
                    _ => None,
                }) else {
                    continue;
                };

                let trade = intel_core::CongressTrade {
                    id: uuid::Uuid::new_v4(),
                    politician_id: politician.id,
                    ticker: record.ticker.clone(),
                    chamber,
                    party,
                    state,
                    owner: intel_core::Owner::Unknown,
                    transaction_date,
                    disclosure_date,
                    trade_type,
                    amount: record.amount.clone(),
                    price: None,
                    asset_type: intel_core::AssetType::Stock,
                    notes: record.company_name.clone(),
                };

                match self.deps.meta_store.save_congress_trade(&trade).await {
                    Ok(_) => saved += 1,
                    Err(e) => tracing::warn!(ticker = %record.ticker, error = %e, "congress scrape: save failed"),
                }
            }

            tracing::info!(page, saved, "congress scrape: page complete");
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("pages={pages_walked} saved={saved}"),
        })
    }
}
