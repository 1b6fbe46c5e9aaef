use std::collections::HashMap;
use std::sync::Arc;

use crate::job::Job;

/// Persistent in the sense that job *identity* and trigger are fixed at
/// registration time and re-registered identically on every process start;
/// run history lives in the store (`JobExecution`), not here.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Arc<dyn Job>>,
    paused: HashMap<String, bool>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job: Arc<dyn Job>) {
        let id = job.id().to_string();
        self.paused.entry(id.clone()).or_insert(false);
        self.jobs.insert(id, job);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Job>> {
        self.jobs.get(id).cloned()
    }

    pub fn list(&self) -> Vec<Arc<dyn Job>> {
        self.jobs.values().cloned().collect()
    }

    pub fn is_paused(&self, id: &str) -> bool {
        self.paused.get(id).copied().unwrap_or(false)
    }

    pub fn pause(&mut self, id: &str) {
        self.paused.insert(id.to_string(), true);
    }

    pub fn resume(&mut self, id: &str) {
        self.paused.insert(id.to_string(), false);
    }
}
