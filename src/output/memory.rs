//! In-memory sink for embedding the crawler in another program

use crate::output::traits::{OutputResult, ResultSink, StatusHook};
use crate::state::{CrawlJob, CrawlResult, JobStatus};
use async_trait::async_trait;
use std::sync::Mutex;

/// Collects delivered results and observed statuses
///
/// Works as both a `ResultSink` and a `StatusHook`.
#[derive(Debug, Default)]
pub struct MemorySink {
    deliveries: Mutex<Vec<(String, CrawlResult)>>,
    statuses: Mutex<Vec<(String, JobStatus)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivered `(job id, result)` pair, in delivery order
    pub fn deliveries(&self) -> Vec<(String, CrawlResult)> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// The result delivered for `job_id`, if any
    pub fn result_for(&self, job_id: &str) -> Option<CrawlResult> {
        self.deliveries()
            .into_iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, result)| result)
    }

    /// Every observed status, in order
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.statuses
            .lock()
            .map(|s| s.iter().map(|(_, status)| *status).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn deliver(&self, job: &CrawlJob, result: &CrawlResult) -> OutputResult<()> {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push((job.id.clone(), result.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusHook for MemorySink {
    async fn on_status(&self, job: &CrawlJob) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push((job.id.clone(), job.status()));
        }
    }
}
