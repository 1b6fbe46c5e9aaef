use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Default concurrent-job ceiling. The heartbeat task never acquires a
/// permit from this pool, so it never counts toward the high-load warning.
pub const DEFAULT_WORKER_COUNT: usize = 7;

/// Active-job count at or above which the pool logs a high-load warning.
pub const HIGH_LOAD_WARNING_THRESHOLD: usize = 6;

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    size: usize,
}

/// Held for the duration of a job run; dropping it releases the permit and
/// decrements the active-job counter.
pub struct WorkerPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            active: Arc::new(AtomicUsize::new(0)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Acquires a permit, bumping the active-job counter, and logs a
    /// high-load warning at `HIGH_LOAD_WARNING_THRESHOLD` or above.
    pub async fn acquire(&self) -> WorkerPermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("worker pool semaphore never closes");
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        if active >= HIGH_LOAD_WARNING_THRESHOLD {
            tracing::warn!(active, pool_size = self.size, "scheduler worker pool under high load");
        }
        WorkerPermit {
            _permit: permit,
            active: Arc::clone(&self.active),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permit_release_decrements_active_count() {
        let pool = WorkerPool::new(2);
        let permit = pool.acquire().await;
        assert_eq!(pool.active_count(), 1);
        drop(permit);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn default_size_matches_spec() {
        assert_eq!(WorkerPool::default().size(), 7);
    }
}
