use async_trait::async_trait;
use chrono::Utc;
use intel_analyzer::{analyze_single_trade, next_page, BatchPrefetch, RescoreCursor, SingleTradeInput};
use intel_congress::has_regulatory_link;
use intel_core::{CongressTrade, RiskPattern, TradeAnalysis};
use intel_scheduler::{Job, JobOutcome, Trigger};
use uuid::Uuid;

use crate::deps::JobDeps;

const BATCH_SIZE: i64 = 100;
/// Bounds how many pages a single rescore run will walk, so one execution
/// can't run unboundedly long against a large backlog.
const MAX_PAGES_PER_RUN: usize = 20;

pub struct CongressAnalysisJob {
    deps: JobDeps,
    rescore: bool,
}

impl CongressAnalysisJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps, rescore: false }
    }

    pub fn rescore_mode(deps: JobDeps) -> Self {
        Self { deps, rescore: true }
    }

    async fn analyze_batch(&self, trades: &[CongressTrade], prefetch: &BatchPrefetch) -> anyhow::Result<u64> {
        let politician_ids: Vec<Uuid> = trades.iter().map(|t| t.politician_id).collect();
        let politicians = self.deps.meta_store.politicians_by_ids(&politician_ids).await?;
        prefetch.load_politician_committees(self.deps.meta_store.as_ref(), &politicians).await?;

        let tickers: Vec<String> = trades.iter().map(|t| t.ticker.clone()).collect();
        prefetch.load_securities(self.deps.meta_store.as_ref(), &tickers).await?;

        let mut analyzed = 0u64;
        for trade in trades {
            let Some(politician) = politicians.iter().find(|p| p.id == trade.politician_id) else {
                tracing::warn!(trade_id = %trade.id, "no politician found for trade, skipping");
                continue;
            };
            let security = prefetch.security(&trade.ticker);
            let company_name = security
                .as_ref()
                .map(|s| s.company_name.clone())
                .unwrap_or_else(|| trade.ticker.clone());
            let sector = security.as_ref().and_then(|s| s.sector.as_deref());

            let committees = prefetch.committees_for(politician.id);
            let committees_formatted = if committees.is_empty() {
                "none".to_string()
            } else {
                committees.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            };
            // Not used to gate the LLM call (the low-risk pre-filter inside
            // `analyze_single_trade` already does that) — only informs the
            // reasoning the formatted committee list implies.
            let _regulatory_link = sector.map(|s| has_regulatory_link(&committees, s)).unwrap_or(false);

            let input = SingleTradeInput {
                politician_name: &politician.canonical_name,
                party: &politician.party,
                state: &politician.state,
                chamber: politician.chamber,
                owner: trade.owner,
                committees_formatted: &committees_formatted,
                ticker: &trade.ticker,
                company_name: &company_name,
                sector,
                description: trade.notes.as_deref(),
                transaction_date: trade.transaction_date,
                trade_type: trade.trade_type,
                amount: &trade.amount,
            };

            let verdict = match analyze_single_trade(&self.deps.clients.llm, &input).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(trade_id = %trade.id, error = %e, "single-trade analysis failed");
                    continue;
                }
            };

            let analysis = TradeAnalysis {
                trade_id: trade.id,
                model_used: "default".to_string(),
                analysis_version: 1,
                conflict_score: verdict.conflict_score,
                confidence_score: verdict.confidence_score,
                confidence_defaulted: verdict.confidence_defaulted,
                risk_pattern: RiskPattern::Routine,
                reasoning: verdict.reasoning,
                session_id: None,
                analyzed_at: Utc::now(),
            };
            if let Err(e) = self.deps.meta_store.save_trade_analysis(&analysis).await {
                tracing::error!(trade_id = %trade.id, error = %e, "failed to persist trade analysis");
                continue;
            }
            analyzed += 1;
        }

        Ok(analyzed)
    }
}

#[async_trait]
impl Job for CongressAnalysisJob {
    fn id(&self) -> &str {
        if self.rescore {
            "congress_analysis_rescore"
        } else {
            "congress_analysis"
        }
    }

    fn name(&self) -> &str {
        if self.rescore {
            "Congress Analysis (Rescore)"
        } else {
            "Congress Analysis"
        }
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(30 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let prefetch = BatchPrefetch::new();
        let mut analyzed = 0u64;

        if self.rescore {
            let mut cursor: Option<RescoreCursor> = None;
            for _ in 0..MAX_PAGES_PER_RUN {
                let page = next_page(self.deps.meta_store.as_ref(), cursor, BATCH_SIZE).await?;
                if page.trades.is_empty() {
                    break;
                }
                analyzed += self.analyze_batch(&page.trades, &prefetch).await?;
                prefetch.clear();
                if page.next_cursor.is_none() {
                    break;
                }
                cursor = page.next_cursor;
            }
        } else {
            let trades = self.deps.meta_store.trades_needing_analysis(BATCH_SIZE).await?;
            if !trades.is_empty() {
                analyzed += self.analyze_batch(&trades, &prefetch).await?;
                prefetch.clear();
            }
        }

        Ok(JobOutcome {
            items_processed: analyzed,
            summary: format!("analyzed={analyzed}"),
        })
    }
}
