use std::collections::HashMap;

use chrono::{DateTime, Utc};
use intel_core::{JobExecution, JobStatusKind};
use intel_store::{MetaStore, StoreResult};
use serde::Serialize;

use crate::registry::JobRegistry;
use crate::worker_pool::WorkerPool;

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub name: String,
    pub paused: bool,
    pub next_run_time: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub running_since: Option<DateTime<Utc>>,
    /// Populated only when the job's most recent execution failed.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub active_jobs: usize,
    pub worker_pool_size: usize,
    pub running_in_store: i64,
    pub due_retries: i64,
    pub recent_executions: Vec<JobExecution>,
    pub jobs: Vec<JobStatus>,
}

/// 4 store queries regardless of registry size: recent executions,
/// running-row count, due-retry count, and the latest execution per job
/// name (for per-job `is_running`/`running_since`/`last_error`). Registry/
/// pool state and each job's next fire time are in-memory.
pub async fn build_status(
    store: &MetaStore,
    registry: &JobRegistry,
    pool: &WorkerPool,
    running: bool,
) -> StoreResult<SchedulerStatus> {
    let recent_executions = store.recent_job_executions(50).await?;
    let running_in_store = store.running_job_count().await?;
    let due_retries = store.due_retry_count(Utc::now()).await?;
    let latest_by_job: HashMap<String, JobExecution> = store
        .latest_job_executions()
        .await?
        .into_iter()
        .map(|e| (e.job_name.clone(), e))
        .collect();

    let now = Utc::now();
    let jobs = registry
        .list()
        .into_iter()
        .map(|j| {
            let latest = latest_by_job.get(j.name());
            let is_running = latest.map(|e| e.status == JobStatusKind::Running).unwrap_or(false);
            let last_error = latest.and_then(|e| {
                (e.status == JobStatusKind::Failed)
                    .then(|| e.error_message.clone())
                    .flatten()
            });

            JobStatus {
                id: j.id().to_string(),
                name: j.name().to_string(),
                paused: registry.is_paused(j.id()),
                next_run_time: j.trigger().next_fire_after(now),
                is_running,
                running_since: is_running.then(|| latest.map(|e| e.started_at)).flatten(),
                last_error,
            }
        })
        .collect();

    Ok(SchedulerStatus {
        running,
        active_jobs: pool.active_count(),
        worker_pool_size: pool.size(),
        running_in_store,
        due_retries,
        recent_executions,
        jobs,
    })
}
