use async_trait::async_trait;

use crate::trigger::Trigger;

/// What a job reports back to the scheduler after a run. The scheduler
/// itself only cares whether it succeeded; `intel-jobs` implementations
/// attach richer detail to the `JobExecution` row directly via the store.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub items_processed: u64,
    pub summary: String,
}

impl JobOutcome {
    pub fn empty() -> Self {
        Self {
            items_processed: 0,
            summary: String::new(),
        }
    }
}

/// A unit of scheduled work. Implementations live in `intel-jobs`; the
/// scheduler only needs identity, a trigger, and a way to run it.
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn trigger(&self) -> Trigger;

    /// Hard wall-clock budget for a single run, enforced by the worker pool
    /// via `tokio::time::timeout`. Jobs without a stated budget in §4.5 get
    /// `None` (no timeout beyond the process lifetime).
    fn budget(&self) -> Option<std::time::Duration> {
        None
    }

    async fn run(&self) -> anyhow::Result<JobOutcome>;
}
