use chrono::Utc;
use intel_core::{JobStatusKind, RetryQueueEntry, STALE_RUNNING_THRESHOLD_HOURS};
use intel_store::{MetaStore, StoreResult};

/// Job names whose stale runs are worth a retry rather than a silent drop —
/// everything downstream of a congress-analysis pass, where losing a
/// partially-scored batch is expensive to redo from scratch.
const CALCULATION_JOBS: &[&str] = &["congress_analysis", "congress_sessions_rescore"];

/// Startup sweep: any `job_executions` row still `running` past the stale
/// threshold belongs to a process that died mid-run. Marks it failed,
/// enqueues a retry for calculation jobs, then deletes the row — the retry
/// queue, not the execution table, is the record of what still needs doing.
pub async fn sweep_stale_running(store: &MetaStore) -> StoreResult<usize> {
    let cutoff = Utc::now() - chrono::Duration::hours(STALE_RUNNING_THRESHOLD_HOURS);
    let stale = store.stale_running_jobs(cutoff).await?;

    for job in &stale {
        tracing::warn!(job_name = %job.job_name, started_at = %job.started_at, "sweeping stale running job");

        let elapsed_ms = (Utc::now() - job.started_at).num_milliseconds();
        store
            .complete_job_execution(
                job.id,
                JobStatusKind::Failed,
                elapsed_ms,
                Some("swept: exceeded stale-running threshold"),
                &job.funds_processed,
            )
            .await?;

        if CALCULATION_JOBS.contains(&job.job_name.as_str()) {
            store
                .enqueue_retry(&RetryQueueEntry {
                    job_name: job.job_name.clone(),
                    target_date: job.target_date,
                    entity_id: None,
                    entity_type: Some("job_execution".to_string()),
                    failure_reason: "stale running row swept at scheduler startup".to_string(),
                    attempts: 0,
                    next_attempt_at: Utc::now(),
                })
                .await?;
        }

        store.delete_job_execution(job.id).await?;
    }

    Ok(stale.len())
}
