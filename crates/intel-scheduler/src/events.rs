use std::sync::atomic::{AtomicU32, Ordering};

/// Cap on automatic restarts after an unexpected shutdown, so a
/// crash-looping job can't spin the process forever.
pub const MAX_AUTO_RESTARTS: u32 = 5;

#[derive(Debug)]
pub enum SchedulerEvent<'a> {
    JobSubmitted { job_id: &'a str },
    JobStarted { job_id: &'a str },
    JobCompleted { job_id: &'a str, duration_ms: i64 },
    JobErrored { job_id: &'a str, error: &'a str },
    UnexpectedShutdown { reason: &'a str },
}

/// Routine scheduling noise goes to a distinct `tracing` target
/// (`intel_scheduler::heartbeat`) at debug level so it can be filtered out
/// independently of job errors, which always log at error level on the
/// default target.
pub fn log_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::JobSubmitted { job_id } => {
            tracing::debug!(target: "intel_scheduler::heartbeat", job_id, "job submitted");
        }
        SchedulerEvent::JobStarted { job_id } => {
            tracing::debug!(target: "intel_scheduler::heartbeat", job_id, "job started");
        }
        SchedulerEvent::JobCompleted { job_id, duration_ms } => {
            tracing::debug!(target: "intel_scheduler::heartbeat", job_id, duration_ms, "job completed");
        }
        SchedulerEvent::JobErrored { job_id, error } => {
            tracing::error!(job_id, error, "job failed");
        }
        SchedulerEvent::UnexpectedShutdown { reason } => {
            tracing::error!(reason, "scheduler shut down unexpectedly");
        }
    }
}

/// Tracks how many times the scheduler has auto-restarted after an
/// unexpected shutdown; refuses once `MAX_AUTO_RESTARTS` is reached.
pub struct RestartGuard {
    attempts: AtomicU32,
}

impl RestartGuard {
    pub fn new() -> Self {
        Self {
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns `true` if a restart is permitted (and records the attempt).
    pub fn try_restart(&self) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > MAX_AUTO_RESTARTS {
            tracing::error!(attempt, max = MAX_AUTO_RESTARTS, "restart budget exhausted, giving up");
            false
        } else {
            tracing::warn!(attempt, max = MAX_AUTO_RESTARTS, "restarting scheduler after unexpected shutdown");
            true
        }
    }
}

impl Default for RestartGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_guard_stops_after_max_attempts() {
        let guard = RestartGuard::new();
        for _ in 0..MAX_AUTO_RESTARTS {
            assert!(guard.try_restart());
        }
        assert!(!guard.try_restart());
    }
}
