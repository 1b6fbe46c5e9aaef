pub mod election;
pub mod events;
pub mod job;
pub mod registry;
pub mod status;
pub mod sweep;
pub mod trigger;
pub mod worker_pool;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use intel_store::MetaStore;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

pub use election::{Election, ElectionError, ElectionLease};
pub use events::{log_event, RestartGuard, SchedulerEvent, MAX_AUTO_RESTARTS};
pub use job::{Job, JobOutcome};
pub use registry::JobRegistry;
pub use status::{build_status, SchedulerStatus};
pub use sweep::sweep_stale_running;
pub use trigger::{Trigger, MISFIRE_GRACE};
pub use worker_pool::{WorkerPool, DEFAULT_WORKER_COUNT, HIGH_LOAD_WARNING_THRESHOLD};

/// Owns the job registry, worker pool, and cross-process election for a
/// single worker process. One `Scheduler` per `apps/intel-worker` instance.
pub struct Scheduler {
    store: Arc<MetaStore>,
    registry: Arc<RwLock<JobRegistry>>,
    pool: Arc<WorkerPool>,
    election: Election,
    lease: Mutex<Option<ElectionLease>>,
    running: AtomicBool,
    job_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(store: Arc<MetaStore>, worker_count: usize) -> Self {
        Self {
            store,
            registry: Arc::new(RwLock::new(JobRegistry::new())),
            pool: Arc::new(WorkerPool::new(worker_count)),
            election: Election::with_defaults(),
            lease: Mutex::new(None),
            running: AtomicBool::new(false),
            job_handles: Mutex::new(Vec::new()),
        }
    }

    pub fn with_heartbeat_paths(mut self, heartbeat: PathBuf, startup_lock: PathBuf) -> Self {
        self.election = Election::new(heartbeat, startup_lock);
        self
    }

    pub async fn register(&self, job: Arc<dyn Job>) {
        self.registry.write().await.register(job);
    }

    pub fn is_scheduler_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Full startup sequence: election (steps 1-8, see `election::elect`),
    /// stale-running sweep, then one tokio task per registered job driving
    /// its own trigger loop against the shared worker pool.
    pub async fn start(&self) -> Result<(), ElectionError> {
        let lease = self.election.elect().await?;
        *self.lease.lock().await = Some(lease);
        self.running.store(true, Ordering::SeqCst);

        match sweep::sweep_stale_running(&self.store).await {
            Ok(n) if n > 0 => tracing::warn!(swept = n, "cleared stale running job executions at startup"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "stale-running sweep failed at startup"),
        }

        self.spawn_heartbeat_task();

        let jobs = self.registry.read().await.list();
        let mut handles = self.job_handles.lock().await;
        for job in jobs {
            handles.push(self.spawn_job_loop(job));
        }

        tracing::info!(worker_count = self.pool.size(), jobs = handles.len(), "scheduler started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let mut handles = self.job_handles.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        *self.lease.lock().await = None;
        tracing::info!("scheduler shut down");
    }

    /// Fire-and-forget manual run: submits the job to the shared pool
    /// immediately, outside its normal trigger schedule. Exceptions inside
    /// the job are caught and logged, never propagated to the caller.
    pub async fn run_now(&self, job_id: &str) -> bool {
        let job = match self.registry.read().await.get(job_id) {
            Some(j) => j,
            None => return false,
        };
        let pool = Arc::clone(&self.pool);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            run_one(&store, &pool, job).await;
        });
        true
    }

    pub async fn pause(&self, job_id: &str) {
        self.registry.write().await.pause(job_id);
    }

    pub async fn resume(&self, job_id: &str) {
        self.registry.write().await.resume(job_id);
    }

    pub async fn status(&self) -> intel_store::StoreResult<SchedulerStatus> {
        let registry = self.registry.read().await;
        build_status(&self.store, &registry, &self.pool, self.is_scheduler_running()).await
    }

    fn spawn_heartbeat_task(&self) {
        let election = self.election.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(election::HEARTBEAT_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = election.beat().await {
                    tracing::error!(error = %e, "failed to write scheduler heartbeat");
                }
            }
        });
    }

    fn spawn_job_loop(&self, job: Arc<dyn Job>) -> JoinHandle<()> {
        let pool = Arc::clone(&self.pool);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let mut last_fire = Utc::now();
            loop {
                let trigger = job.trigger();
                let next = match trigger.next_fire_after(last_fire) {
                    Some(n) => n,
                    None => {
                        tracing::error!(job_id = job.id(), "trigger produced no next fire time, stopping loop");
                        return;
                    }
                };
                let now = Utc::now();
                if next > now {
                    if let Ok(d) = (next - now).to_std() {
                        tokio::time::sleep(d).await;
                    }
                }
                last_fire = Utc::now();

                if registry.read().await.is_paused(job.id()) {
                    log_event(&SchedulerEvent::JobSubmitted { job_id: job.id() });
                    continue;
                }

                run_one(&store, &pool, Arc::clone(&job)).await;
            }
        })
    }
}

/// `max_instances = 1` per job is enforced by awaiting the pool permit
/// inline: a job's next run can't start until the previous one released it.
async fn run_one(store: &MetaStore, pool: &WorkerPool, job: Arc<dyn Job>) {
    log_event(&SchedulerEvent::JobSubmitted { job_id: job.id() });
    let _permit = pool.acquire().await;

    let target_date = Utc::now().date_naive();
    let execution_id = match store.start_job_execution(job.name(), target_date, None).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(job_id = job.id(), error = %e, "failed to record job start");
            return;
        }
    };

    log_event(&SchedulerEvent::JobStarted { job_id: job.id() });
    let started = std::time::Instant::now();

    let run_fut = job.run();
    let result = match job.budget() {
        Some(budget) => tokio::time::timeout(budget, run_fut)
            .await
            .unwrap_or_else(|_| Err(anyhow::anyhow!("job exceeded its {:?} budget", budget))),
        None => run_fut.await,
    };

    let duration_ms = started.elapsed().as_millis() as i64;
    match result {
        Ok(outcome) => {
            log_event(&SchedulerEvent::JobCompleted {
                job_id: job.id(),
                duration_ms,
            });
            if let Err(e) = store
                .complete_job_execution(
                    execution_id,
                    intel_core::JobStatusKind::Success,
                    duration_ms,
                    None,
                    &[outcome.summary],
                )
                .await
            {
                tracing::error!(job_id = job.id(), error = %e, "failed to record job completion");
            }
        }
        Err(e) => {
            let message = format!("{e:#}");
            log_event(&SchedulerEvent::JobErrored {
                job_id: job.id(),
                error: &message,
            });
            if let Err(store_err) = store
                .complete_job_execution(
                    execution_id,
                    intel_core::JobStatusKind::Failed,
                    duration_ms,
                    Some(&message),
                    &[],
                )
                .await
            {
                tracing::error!(job_id = job.id(), error = %store_err, "failed to record job failure");
            }
        }
    }
}
