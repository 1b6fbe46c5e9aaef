use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// How often the elected instance touches the heartbeat file.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
/// A heartbeat older than this means its writer is presumed dead.
pub const HEARTBEAT_STALENESS: Duration = Duration::from_secs(60);
/// A startup lock newer than this means another process is mid-election.
pub const STARTUP_LOCK_FRESHNESS: Duration = Duration::from_secs(10);

static IN_PROCESS_SCHEDULER_RUNNING: AtomicBool = AtomicBool::new(false);

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("a scheduler is already running in this process")]
    AlreadyRunningInProcess,
    #[error("heartbeat file is fresh ({age_secs}s old) — another instance appears to be running")]
    HeartbeatFresh { age_secs: i64 },
    #[error("startup lock is fresh ({age_secs}s old) — another instance is mid-election")]
    StartupLockFresh { age_secs: i64 },
    #[error("filesystem error during election: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct Election {
    heartbeat_path: PathBuf,
    startup_lock_path: PathBuf,
}

/// Held for the process lifetime of the elected scheduler. Dropping it
/// clears the in-process flag (the heartbeat/lock files are left in place —
/// their staleness is what signals the next process it's safe to take over).
pub struct ElectionLease {
    heartbeat_path: PathBuf,
}

impl Drop for ElectionLease {
    fn drop(&mut self) {
        IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
        let _ = &self.heartbeat_path;
    }
}

impl Election {
    pub fn new(heartbeat_path: PathBuf, startup_lock_path: PathBuf) -> Self {
        Self {
            heartbeat_path,
            startup_lock_path,
        }
    }

    pub fn with_defaults() -> Self {
        let heartbeat_path = std::env::var("SCHEDULER_HEARTBEAT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("scheduler.heartbeat"));
        let startup_lock_path = std::env::var("SCHEDULER_STARTUP_LOCK_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("scheduler.startup.lock"));
        Self::new(heartbeat_path, startup_lock_path)
    }

    /// The full 8-step startup sequence:
    /// 1. In-process check: is a scheduler already live in this process?
    /// 2. Heartbeat check: is another instance's heartbeat still fresh?
    /// 3. Startup-lock check: is another instance mid-election right now?
    /// 4. Write the startup lock (claims the election).
    /// 5. Re-read the startup lock to guard against a race with another
    ///    writer that landed between steps 3 and 4.
    /// 6. Acquire: flip the in-process flag.
    /// 7. Write an initial heartbeat so step 2 succeeds for any racer.
    /// 8. Return the lease; the caller spawns the periodic heartbeat task.
    pub async fn elect(&self) -> Result<ElectionLease, ElectionError> {
        if IN_PROCESS_SCHEDULER_RUNNING.swap(true, Ordering::SeqCst) {
            return Err(ElectionError::AlreadyRunningInProcess);
        }

        if let Err(e) = self.check_heartbeat_fresh().await {
            IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            return Err(e);
        }

        if let Err(e) = self.check_startup_lock_fresh().await {
            IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            return Err(e);
        }

        if let Err(e) = self.write_timestamp(&self.startup_lock_path).await {
            IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        // Re-check after claiming the lock: a racer that wrote between our
        // check and our write would have clobbered the file with its own
        // pid, so comparing the read-back pid against our own closes the
        // step-3-to-step-4 TOCTOU window instead of just confirming the
        // file still exists.
        if let Err(e) = self.check_startup_lock_fresh_excluding_self().await {
            IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            return Err(e);
        }

        if let Err(e) = self.write_timestamp(&self.heartbeat_path).await {
            IN_PROCESS_SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        Ok(ElectionLease {
            heartbeat_path: self.heartbeat_path.clone(),
        })
    }

    pub async fn beat(&self) -> Result<(), std::io::Error> {
        self.write_timestamp(&self.heartbeat_path).await
    }

    /// Writes `<unix-time-as-float>\n<pid>`, matching the documented lock
    /// format and letting readers tell their own write apart from a racer's.
    async fn write_timestamp(&self, path: &PathBuf) -> Result<(), std::io::Error> {
        let now = Utc::now();
        let unix_ts = now.timestamp() as f64 + now.timestamp_subsec_nanos() as f64 / 1_000_000_000.0;
        tokio::fs::write(path, format!("{unix_ts}\n{}", std::process::id())).await
    }

    async fn read_timestamp_and_pid(&self, path: &PathBuf) -> Option<(DateTime<Utc>, u32)> {
        let contents = tokio::fs::read_to_string(path).await.ok()?;
        let mut lines = contents.lines();
        let unix_ts: f64 = lines.next()?.trim().parse().ok()?;
        let pid: u32 = lines.next()?.trim().parse().ok()?;
        let secs = unix_ts.trunc() as i64;
        let nanos = (unix_ts.fract() * 1_000_000_000.0).round() as u32;
        let written = DateTime::from_timestamp(secs, nanos)?;
        Some((written, pid))
    }

    async fn read_age(&self, path: &PathBuf) -> Option<Duration> {
        let (written, _) = self.read_timestamp_and_pid(path).await?;
        (Utc::now() - written).to_std().ok()
    }

    async fn check_heartbeat_fresh(&self) -> Result<(), ElectionError> {
        if let Some(age) = self.read_age(&self.heartbeat_path).await {
            if age < HEARTBEAT_STALENESS {
                return Err(ElectionError::HeartbeatFresh {
                    age_secs: age.as_secs() as i64,
                });
            }
        }
        Ok(())
    }

    async fn check_startup_lock_fresh(&self) -> Result<(), ElectionError> {
        if let Some(age) = self.read_age(&self.startup_lock_path).await {
            if age < STARTUP_LOCK_FRESHNESS {
                return Err(ElectionError::StartupLockFresh {
                    age_secs: age.as_secs() as i64,
                });
            }
        }
        Ok(())
    }

    /// Re-reads the startup lock after claiming it and compares the pid it
    /// contains against our own. A mismatch means a racer's write landed
    /// after ours and won, so we must step down rather than proceed as if
    /// we held the lock.
    async fn check_startup_lock_fresh_excluding_self(&self) -> Result<(), ElectionError> {
        let Some((written, pid)) = self.read_timestamp_and_pid(&self.startup_lock_path).await else {
            return Err(ElectionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "startup lock disappeared after claiming it",
            )));
        };

        if pid != std::process::id() {
            let age = (Utc::now() - written).to_std().unwrap_or_default();
            if age < STARTUP_LOCK_FRESHNESS {
                return Err(ElectionError::StartupLockFresh {
                    age_secs: age.as_secs() as i64,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elect_succeeds_when_no_stale_files_present() {
        let dir = std::env::temp_dir().join(format!("intel-sched-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let election = Election::new(dir.join("heartbeat"), dir.join("lock"));
        let lease = election.elect().await;
        assert!(lease.is_ok());
    }

    #[tokio::test]
    async fn startup_lock_check_rejects_a_foreign_pid() {
        let dir = std::env::temp_dir().join(format!("intel-sched-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let lock_path = dir.join("lock");
        let election = Election::new(dir.join("heartbeat"), lock_path.clone());

        // Simulate a racer's write landing after ours: same freshness window,
        // different pid.
        let now = Utc::now();
        let unix_ts = now.timestamp() as f64;
        tokio::fs::write(&lock_path, format!("{unix_ts}\n{}", std::process::id().wrapping_add(1)))
            .await
            .unwrap();

        assert!(election.check_startup_lock_fresh_excluding_self().await.is_err());
    }

    #[tokio::test]
    async fn startup_lock_check_accepts_our_own_pid() {
        let dir = std::env::temp_dir().join(format!("intel-sched-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let lock_path = dir.join("lock");
        let election = Election::new(dir.join("heartbeat"), lock_path.clone());

        election.write_timestamp(&lock_path).await.unwrap();

        assert!(election.check_startup_lock_fresh_excluding_self().await.is_ok());
    }
}
