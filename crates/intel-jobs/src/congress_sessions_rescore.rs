use async_trait::async_trait;
use intel_analyzer::{analyze_session, SessionActivityRow};
use intel_congress::parse_amount_midpoint;
use intel_core::TradeSession;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_LIMIT: i64 = 200;

pub struct CongressSessionsRescoreJob {
    deps: JobDeps,
    batch_size: usize,
    limit: i64,
}

impl CongressSessionsRescoreJob {
    pub fn new(deps: JobDeps) -> Self {
        Self {
            deps,
            batch_size: DEFAULT_BATCH_SIZE,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_bounds(deps: JobDeps, batch_size: usize, limit: i64) -> Self {
        Self { deps, batch_size, limit }
    }

    async fn rescore_one(&self, session: &TradeSession) -> anyhow::Result<bool> {
        let Some(politician) = self
            .deps
            .meta_store
            .politician_by_canonical_name(&session.politician_name)
            .await?
        else {
            tracing::warn!(politician = %session.politician_name, "no politician record for session, skipping");
            return Ok(false);
        };

        let trades = self
            .deps
            .meta_store
            .trades_for_politician_in_range(politician.id, session.start_date, session.end_date)
            .await?;
        if trades.is_empty() {
            return Ok(false);
        }

        let securities = self
            .deps
            .meta_store
            .securities_for_tickers(&trades.iter().map(|t| t.ticker.clone()).collect::<Vec<_>>())
            .await
            .unwrap_or_default();

        let activity: Vec<SessionActivityRow> = trades
            .iter()
            .map(|t| {
                let security = securities.iter().find(|s| s.ticker == t.ticker);
                SessionActivityRow {
                    date: t.transaction_date,
                    trade_type: t.trade_type,
                    ticker: t.ticker.clone(),
                    company_name: security
                        .map(|s| s.company_name.clone())
                        .unwrap_or_else(|| t.ticker.clone()),
                    sector: security.and_then(|s| s.sector.clone()).unwrap_or_default(),
                    amount_midpoint: parse_amount_midpoint(&t.amount),
                    owner: format!("{:?}", t.owner),
                    // The disclosure feed doesn't distinguish options/short
                    // positions from plain equity trades.
                    is_option_or_short: false,
                }
            })
            .collect();

        let assignments = self
            .deps
            .meta_store
            .committee_assignments_for_politicians(&[politician.id])
            .await
            .unwrap_or_default();
        let all_committees = self.deps.meta_store.all_committees().await.unwrap_or_default();
        let committees = intel_congress::effective_committees(&politician, &assignments, &all_committees);
        let committees_formatted = if committees.is_empty() {
            "none".to_string()
        } else {
            committees.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
        };

        let activity_table_formatted = activity
            .iter()
            .map(|row| {
                format!(
                    "{} | {:?} | {} | {} | {:.0} | {}",
                    row.date, row.trade_type, row.ticker, row.company_name, row.amount_midpoint, row.owner
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let verdict = analyze_session(
            &self.deps.clients.llm,
            &politician,
            &assignments,
            &all_committees,
            &committees_formatted,
            &activity,
            &activity_table_formatted,
        )
        .await?;

        self.deps
            .meta_store
            .save_session_analysis(
                session.id,
                verdict.risk_pattern,
                verdict.conflict_score,
                verdict.confidence_score,
                &verdict.summary,
                "default",
            )
            .await?;

        Ok(true)
    }
}

#[async_trait]
impl Job for CongressSessionsRescoreJob {
    fn id(&self) -> &str {
        "congress_sessions_rescore"
    }

    fn name(&self) -> &str {
        "Congress Sessions Rescore"
    }

    fn trigger(&self) -> Trigger {
        // Manual job: scheduled daily mostly so it shows up with a sane
        // next-fire time, but the expected invocation path is `run_now`.
        Trigger::Interval(std::time::Duration::from_secs(24 * 60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let sessions = self.deps.meta_store.sessions_needing_analysis(self.limit).await?;
        let mut rescored = 0u64;

        for batch in sessions.chunks(self.batch_size) {
            for session in batch {
                match self.rescore_one(session).await {
                    Ok(true) => rescored += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(session_id = %session.id, error = %e, "session rescore failed");
                    }
                }
            }
        }

        Ok(JobOutcome {
            items_processed: rescored,
            summary: format!("rescored={rescored}"),
        })
    }
}
