use dashmap::DashMap;
use intel_congress::effective_committees;
use intel_core::{Committee, CommitteeAssignment, Politician, Security, SECURITIES_CHUNK_SIZE};
use intel_store::{MetaStore, StoreResult};
use uuid::Uuid;

/// Process-local scratch caches for a single analysis batch: securities
/// fetched in chunks of `SECURITIES_CHUNK_SIZE`, and each politician's
/// effective committee list resolved once per batch. Both are cleared at
/// the end of the batch — never shared across batches, never a substitute
/// for the store.
pub struct BatchPrefetch {
    securities: DashMap<String, Security>,
    politician_committees: DashMap<Uuid, Vec<Committee>>,
}

impl BatchPrefetch {
    pub fn new() -> Self {
        Self {
            securities: DashMap::new(),
            politician_committees: DashMap::new(),
        }
    }

    /// Fetches securities for `tickers` in chunks of
    /// `SECURITIES_CHUNK_SIZE`, populating the cache. Duplicate tickers in
    /// the input are naturally deduplicated by the map.
    pub async fn load_securities(&self, store: &MetaStore, tickers: &[String]) -> StoreResult<()> {
        for chunk in tickers.chunks(SECURITIES_CHUNK_SIZE) {
            let found = store.securities_for_tickers(chunk).await?;
            for security in found {
                self.securities.insert(security.ticker.clone(), security);
            }
        }
        Ok(())
    }

    pub fn security(&self, ticker: &str) -> Option<Security> {
        self.securities.get(ticker).map(|r| r.clone())
    }

    /// Resolves each politician's effective committee list (including any
    /// injected Leadership pseudo-committee) once per batch.
    pub async fn load_politician_committees(
        &self,
        store: &MetaStore,
        politicians: &[Politician],
    ) -> StoreResult<()> {
        let ids: Vec<Uuid> = politicians.iter().map(|p| p.id).collect();
        let assignments = store.committee_assignments_for_politicians(&ids).await?;
        let all_committees = store.all_committees().await?;

        for politician in politicians {
            let assigned: Vec<CommitteeAssignment> = assignments
                .iter()
                .filter(|a| a.politician_id == politician.id)
                .cloned()
                .collect();
            let effective = effective_committees(politician, &assigned, &all_committees);
            self.politician_committees.insert(politician.id, effective);
        }
        Ok(())
    }

    pub fn committees_for(&self, politician_id: Uuid) -> Vec<Committee> {
        self.politician_committees
            .get(&politician_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Must be called at the end of every batch so stale context can't
    /// leak into the next one.
    pub fn clear(&self) {
        self.securities.clear();
        self.politician_committees.clear();
    }
}

impl Default for BatchPrefetch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::Chamber;

    fn politician() -> Politician {
        Politician {
            id: Uuid::new_v4(),
            canonical_name: "Jane Representative".into(),
            aliases: vec![],
            party: "I".into(),
            state: "NY".into(),
            chamber: Chamber::House,
            is_leadership: false,
        }
    }

    #[test]
    fn clear_empties_both_caches() {
        let prefetch = BatchPrefetch::new();
        prefetch.securities.insert(
            "MSFT".into(),
            Security {
                ticker: "MSFT".into(),
                company_name: "Microsoft Corporation".into(),
                sector: Some("Technology".into()),
            },
        );
        let p = politician();
        prefetch.politician_committees.insert(p.id, vec![]);

        assert!(prefetch.security("MSFT").is_some());
        assert!(prefetch.politician_committees.contains_key(&p.id));

        prefetch.clear();
        assert!(prefetch.security("MSFT").is_none());
        assert!(!prefetch.politician_committees.contains_key(&p.id));
    }
}
