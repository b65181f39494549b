//! Port interfaces for the job tracker

use std::time::Duration;

use async_trait::async_trait;
use rcm_domain::{Job, JobId, JobStatusReport, JobUpload, Result};

use super::state::TrackerSnapshot;

/// Server side of a validation job
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Upload the files and create the job
    async fn submit(&self, upload: &JobUpload) -> Result<Job>;

    /// Fetch the current status and progress counters
    async fn status(&self, job_id: JobId) -> Result<JobStatusReport>;
}

/// Callbacks fired by the tracker
///
/// Hooks run on the polling task and should return quickly. Each terminal
/// hook fires at most once per tracked job.
pub trait JobObserver: Send + Sync {
    fn on_progress(&self, _snapshot: &TrackerSnapshot) {}

    fn on_completed(&self, _report: &JobStatusReport) {}

    fn on_failed(&self, _message: &str) {}

    fn on_timed_out(&self, _elapsed: Duration) {}

    fn on_cancelled(&self) {}
}
