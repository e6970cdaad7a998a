//! In-memory job sink.

use async_trait::async_trait;
use hookline_core::run::IntegrationJob;
use hookline_core::{Error, JobSink, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Jobs retained by [`InMemorySink::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Keeps the most recent created jobs in memory, in creation order.
///
/// Meant for development and tests. Once `capacity` jobs are held the oldest
/// is evicted, so name conflicts are only detected among retained jobs.
/// Rejects a job whose namespace and name are already taken, like an API
/// server would.
#[derive(Debug)]
pub struct InMemorySink {
    jobs: Mutex<VecDeque<IntegrationJob>>,
    capacity: usize,
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink retaining at most `capacity` jobs (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<IntegrationJob>>> {
        self.jobs
            .lock()
            .map_err(|_| Error::Internal("in-memory sink lock poisoned".to_string()))
    }

    /// Snapshot of every created job.
    pub fn jobs(&self) -> Vec<IntegrationJob> {
        self.lock()
            .map(|jobs| jobs.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<IntegrationJob> {
        self.lock().ok().and_then(|jobs| {
            jobs.iter()
                .find(|j| j.metadata.namespace == namespace && j.metadata.name == name)
                .cloned()
        })
    }

    pub fn len(&self) -> usize {
        self.lock().map(|jobs| jobs.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobSink for InMemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, job: &IntegrationJob) -> Result<()> {
        let mut jobs = self.lock()?;
        let taken = jobs.iter().any(|j| {
            j.metadata.namespace == job.metadata.namespace && j.metadata.name == job.metadata.name
        });
        if taken {
            return Err(Error::Conflict(format!(
                "integration job {}/{} already exists",
                job.metadata.namespace, job.metadata.name
            )));
        }

        if jobs.len() >= self.capacity {
            if let Some(evicted) = jobs.pop_front() {
                debug!(namespace = %evicted.metadata.namespace, name = %evicted.metadata.name, "Evicted integration job");
            }
        }
        debug!(namespace = %job.metadata.namespace, name = %job.metadata.name, "Stored integration job");
        jobs.push_back(job.clone());
        Ok(())
    }
}
