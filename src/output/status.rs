use crate::output::traits::StatusHook;
use crate::state::{CrawlJob, JobStatus};
use async_trait::async_trait;

/// Logs job status transitions through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusHook;

#[async_trait]
impl StatusHook for LogStatusHook {
    async fn on_status(&self, job: &CrawlJob) {
        match job.status() {
            JobStatus::Running => tracing::info!(
                job_id = %job.id,
                domains = job.domains.len(),
                "Job running"
            ),
            JobStatus::Completed => {
                let elapsed = job
                    .completed_at
                    .map(|done| (done - job.created_at).num_milliseconds() as f64 / 1000.0)
                    .unwrap_or_default();
                tracing::info!(job_id = %job.id, "Job completed in {:.1}s", elapsed)
            }
        }
    }
}
