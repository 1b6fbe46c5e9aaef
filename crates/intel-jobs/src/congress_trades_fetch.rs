use async_trait::async_trait;
use chrono::Utc;
use intel_congress::effective_committees;
use intel_core::{
    parse_flexible_date, AssetType, Chamber, CongressTrade, Owner, RiskPattern, TradeAnalysis, TradeType,
};
use intel_scheduler::{Job, JobOutcome, Trigger};
use uuid::Uuid;

use crate::deps::JobDeps;

/// Canonical names treated as chamber/party leadership when no committee
/// data places them anywhere — mirrors the scheduler's leadership injection.
const LEADERSHIP_ALLOW_LIST: &[&str] = &[
    "Mike Johnson",
    "Hakeem Jeffries",
    "John Thune",
    "Chuck Schumer",
];

/// Trades disclosed more than this many days ago aren't worth fetching fresh.
const MAX_TRADE_AGE_DAYS: i64 = 7;

/// The upstream's page parameter is effectively fixed at 0; see
/// `FinancialRestClient::congress_disclosures`.
const FETCH_PAGE: u32 = 0;

pub struct CongressTradesFetchJob {
    deps: JobDeps,
}

impl CongressTradesFetchJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for CongressTradesFetchJob {
    fn id(&self) -> &str {
        "congress_trades_fetch"
    }

    fn name(&self) -> &str {
        "Congress Trades Fetch"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let records = self.deps.clients.financial.congress_disclosures(FETCH_PAGE).await?;
        let now = Utc::now().date_naive();
        let mut saved = 0u64;

        for record in records {
            let Some(transaction_date) = parse_flexible_date(&record.transaction_date) else {
                tracing::warn!(raw = %record.transaction_date, "unparseable transaction date, skipping");
                continue;
            };
            let Some(disclosure_date) = parse_flexible_date(&record.disclosure_date) else {
                tracing::warn!(raw = %record.disclosure_date, "unparseable disclosure date, skipping");
                continue;
            };

            if (now - transaction_date).num_days() > MAX_TRADE_AGE_DAYS {
                continue;
            }

            let is_leadership = LEADERSHIP_ALLOW_LIST.contains(&record.politician_name.as_str());
            let chamber = parse_chamber(record.chamber.as_deref());
            let party = record.party.clone().unwrap_or_else(|| "Unknown".to_string());
            let state = record.state.clone().unwrap_or_else(|| "Unknown".to_string());

            let politician = match self
                .deps
                .meta_store
                .find_or_create_politician(&record.politician_name, &party, &state, chamber, is_leadership)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(politician = %record.politician_name, error = %e, "failed to resolve politician");
                    continue;
                }
            };

            let Some(trade_type) = parse_trade_type(&record.transaction_type) else {
                tracing::warn!(raw = %record.transaction_type, "unknown transaction type, skipping");
                continue;
            };
            let owner = parse_owner(record.owner.as_deref());
            let asset_type = parse_asset_type(record.asset_type.as_deref());

            let trade = CongressTrade {
                id: Uuid::new_v4(),
                politician_id: politician.id,
                ticker: record.ticker.clone(),
                chamber,
                party: party.clone(),
                state: state.clone(),
                owner,
                transaction_date,
                disclosure_date,
                trade_type,
                amount: record.amount.clone(),
                price: None,
                asset_type,
                notes: record.company_name.clone(),
            };

            let trade_id = match self.deps.meta_store.save_congress_trade(&trade).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(ticker = %record.ticker, error = %e, "failed to persist congress trade");
                    continue;
                }
            };

            let securities = self
                .deps
                .meta_store
                .securities_for_tickers(&[record.ticker.clone()])
                .await
                .unwrap_or_default();
            let security = securities.first();
            let company_name = security
                .map(|s| s.company_name.clone())
                .or_else(|| record.company_name.clone())
                .unwrap_or_else(|| record.ticker.clone());
            let sector = security.and_then(|s| s.sector.as_deref());

            let assignments = self
                .deps
                .meta_store
                .committee_assignments_for_politicians(&[politician.id])
                .await
                .unwrap_or_default();
            let all_committees = self.deps.meta_store.all_committees().await.unwrap_or_default();
            let committees = effective_committees(&politician, &assignments, &all_committees);
            let committees_formatted = if committees.is_empty() {
                "none".to_string()
            } else {
                committees.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            };

            let input = intel_analyzer::SingleTradeInput {
                politician_name: &politician.canonical_name,
                party: &politician.party,
                state: &politician.state,
                chamber: politician.chamber,
                owner,
                committees_formatted: &committees_formatted,
                ticker: &record.ticker,
                company_name: &company_name,
                sector,
                description: trade.notes.as_deref(),
                transaction_date,
                trade_type,
                amount: &record.amount,
            };

            match intel_analyzer::analyze_single_trade(&self.deps.clients.llm, &input).await {
                Ok(verdict) => {
                    let analysis = TradeAnalysis {
                        trade_id,
                        model_used: "default".to_string(),
                        analysis_version: 1,
                        conflict_score: verdict.conflict_score,
                        confidence_score: verdict.confidence_score,
                        confidence_defaulted: verdict.confidence_defaulted,
                        // The single-trade prompt doesn't classify a risk
                        // pattern; only the session prompt does. `Routine` is
                        // a neutral placeholder until a session groups this
                        // trade.
                        risk_pattern: RiskPattern::Routine,
                        reasoning: verdict.reasoning,
                        session_id: None,
                        analyzed_at: Utc::now(),
                    };
                    if let Err(e) = self.deps.meta_store.save_trade_analysis(&analysis).await {
                        tracing::error!(trade_id = %trade_id, error = %e, "failed to persist trade analysis");
                    }
                }
                Err(e) => {
                    tracing::warn!(trade_id = %trade_id, error = %e, "inline conflict analysis failed");
                }
            }

            saved += 1;
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("saved={saved}"),
        })
    }
}

fn parse_chamber(raw: Option<&str>) -> Chamber {
    match raw.map(str::to_lowercase).as_deref() {
        Some("senate") => Chamber::Senate,
        _ => Chamber::House,
    }
}

fn parse_trade_type(raw: &str) -> Option<TradeType> {
    match raw.to_lowercase().as_str() {
        "purchase" | "buy" => Some(TradeType::Purchase),
        "sale" | "sell" | "sale (full)" | "sale (partial)" => Some(TradeType::Sale),
        _ => None,
    }
}

fn parse_owner(raw: Option<&str>) -> Owner {
    match raw.map(str::to_lowercase).as_deref() {
        Some("spouse") => Owner::Spouse,
        Some("dependent") | Some("child") => Owner::Dependent,
        Some("self") | Some("joint") => Owner::SelfOwner,
        _ => Owner::Unknown,
    }
}

fn parse_asset_type(raw: Option<&str>) -> AssetType {
    match raw.map(str::to_lowercase).as_deref() {
        Some("crypto") | Some("cryptocurrency") => AssetType::Crypto,
        _ => AssetType::Stock,
    }
}
