//! Tracker state machine
//!
//! Transitions are plain methods on [`TrackerSnapshot`] so they can be applied
//! atomically inside `watch::Sender::send_if_modified` and tested without a
//! runtime. Every transition that targets a running job checks both the job id
//! and the `Polling` state; anything else is a no-op.

use std::time::Duration;

use rcm_domain::{impl_wire_enum, Job, JobId, JobProgress, JobStatus, JobStatusReport};
use serde::Serialize;

use super::outcome::JobOutcome;

/// Message used when the server fails a job without saying why
pub const GENERIC_FAILURE_MESSAGE: &str = "Validation failed";

/// Lifecycle of the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl_wire_enum!(TrackerState {
    Idle => "idle",
    Submitting => "submitting",
    Polling => "polling",
    Completed => "completed",
    Failed => "failed",
    TimedOut => "timed_out",
    Cancelled => "cancelled",
});

impl TrackerState {
    /// Whether tracking has ended
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled)
    }

    /// A job is in flight and a new submission must wait
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

/// What applying a status report did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEffect {
    /// Wrong job, or the tracker is no longer polling
    Ignored,
    /// The reported status ranks below the last observed one
    Regressed,
    Progress,
    Completed,
    Failed,
}

impl ReportEffect {
    /// Whether subscribers should be woken
    pub const fn publishes(self) -> bool {
        matches!(self, Self::Progress | Self::Completed | Self::Failed)
    }

    /// Whether the report ended tracking
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Everything an observer can know about the tracked job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub job_id: Option<JobId>,
    /// Last status accepted from the server
    pub status: Option<JobStatus>,
    pub progress: JobProgress,
    pub error_message: Option<String>,
    /// Status reports received since submission
    pub polls: u32,
    /// Status fetches that failed and were skipped
    pub failed_polls: u32,
    pub outcome: Option<JobOutcome>,
}

impl TrackerSnapshot {
    fn tracking(&self, job_id: JobId) -> bool {
        self.state == TrackerState::Polling && self.job_id == Some(job_id)
    }

    /// Idle or terminal → Submitting, clearing the previous job
    ///
    /// Returns `false` while another job is in flight.
    pub fn begin_submit(&mut self) -> bool {
        if self.state.is_active() {
            return false;
        }
        *self = Self { state: TrackerState::Submitting, ..Self::default() };
        true
    }

    /// Submitting → Idle after the upload was rejected or abandoned
    pub fn submit_failed(&mut self) -> bool {
        if self.state != TrackerState::Submitting {
            return false;
        }
        *self = Self::default();
        true
    }

    /// Submitting → Polling, applying the status carried by the job record
    ///
    /// A record that is already terminal resolves the tracker immediately.
    pub fn submitted(&mut self, job: &Job) -> ReportEffect {
        if self.state != TrackerState::Submitting {
            return ReportEffect::Ignored;
        }
        self.state = TrackerState::Polling;
        self.job_id = Some(job.id);
        self.apply(&job.to_report())
    }

    /// Apply a report fetched from the status endpoint
    pub fn apply_report(&mut self, job_id: JobId, report: &JobStatusReport) -> ReportEffect {
        if !self.tracking(job_id) {
            return ReportEffect::Ignored;
        }
        self.polls = self.polls.saturating_add(1);
        self.apply(report)
    }

    fn apply(&mut self, report: &JobStatusReport) -> ReportEffect {
        if let Some(last) = self.status {
            if !last.can_advance_to(report.status) {
                return ReportEffect::Regressed;
            }
        }

        self.status = Some(report.status);
        self.progress = report.progress.clone();

        match report.status {
            JobStatus::Pending | JobStatus::Processing => ReportEffect::Progress,
            JobStatus::Completed => {
                self.state = TrackerState::Completed;
                self.outcome = Some(JobOutcome::Completed(report.clone()));
                ReportEffect::Completed
            }
            JobStatus::Failed => {
                let message = report
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                self.state = TrackerState::Failed;
                self.error_message = Some(message.clone());
                self.outcome = Some(JobOutcome::Failed { message });
                ReportEffect::Failed
            }
        }
    }

    /// Count a status fetch that failed; polling continues
    pub fn record_poll_failure(&mut self, job_id: JobId) -> bool {
        if !self.tracking(job_id) {
            return false;
        }
        self.failed_polls = self.failed_polls.saturating_add(1);
        true
    }

    /// Polling → TimedOut
    pub fn time_out(&mut self, job_id: JobId, elapsed: Duration) -> bool {
        if !self.tracking(job_id) {
            return false;
        }
        self.state = TrackerState::TimedOut;
        self.outcome = Some(JobOutcome::TimedOut { elapsed });
        true
    }

    /// Polling → Cancelled
    pub fn cancel(&mut self, job_id: JobId) -> bool {
        if !self.tracking(job_id) {
            return false;
        }
        self.state = TrackerState::Cancelled;
        self.outcome = Some(JobOutcome::Cancelled);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: JobId, status: JobStatus) -> Job {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "job_id": "5b1e",
            "status": status.as_str(),
            "total_claims": 10,
            "processed_claims": 0,
        }))
        .unwrap()
    }

    fn report(status: JobStatus, processed: u64) -> JobStatusReport {
        JobStatusReport {
            job_id: None,
            status,
            progress: JobProgress::from_counts(processed, 10),
            error_message: None,
        }
    }

    fn polling(id: JobId) -> TrackerSnapshot {
        let mut snapshot = TrackerSnapshot::default();
        assert!(snapshot.begin_submit());
        assert_eq!(snapshot.submitted(&job(id, JobStatus::Pending)), ReportEffect::Progress);
        snapshot
    }

    #[test]
    fn submit_cycle_reaches_polling() {
        let snapshot = polling(7);
        assert_eq!(snapshot.state, TrackerState::Polling);
        assert_eq!(snapshot.job_id, Some(7));
        assert_eq!(snapshot.status, Some(JobStatus::Pending));
        assert_eq!(snapshot.polls, 0);
    }

    #[test]
    fn second_submit_is_refused_while_active() {
        let mut snapshot = polling(7);
        assert!(!snapshot.begin_submit());
        assert_eq!(snapshot.job_id, Some(7));
    }

    #[test]
    fn failed_submit_returns_to_idle() {
        let mut snapshot = TrackerSnapshot::default();
        snapshot.begin_submit();
        assert!(snapshot.submit_failed());
        assert_eq!(snapshot, TrackerSnapshot::default());
    }

    #[test]
    fn terminal_job_record_resolves_without_polling() {
        let mut snapshot = TrackerSnapshot::default();
        snapshot.begin_submit();
        let effect = snapshot.submitted(&job(3, JobStatus::Completed));

        assert_eq!(effect, ReportEffect::Completed);
        assert_eq!(snapshot.state, TrackerState::Completed);
        assert!(matches!(snapshot.outcome, Some(JobOutcome::Completed(_))));
    }

    #[test]
    fn progress_then_completion() {
        let mut snapshot = polling(7);

        let effect = snapshot.apply_report(7, &report(JobStatus::Processing, 4));
        assert_eq!(effect, ReportEffect::Progress);
        assert_eq!(snapshot.progress.processed, 4);

        let effect = snapshot.apply_report(7, &report(JobStatus::Completed, 10));
        assert_eq!(effect, ReportEffect::Completed);
        assert_eq!(snapshot.state, TrackerState::Completed);
        assert_eq!(snapshot.polls, 2);

        // Terminal: later reports change nothing.
        let effect = snapshot.apply_report(7, &report(JobStatus::Failed, 10));
        assert_eq!(effect, ReportEffect::Ignored);
        assert_eq!(snapshot.state, TrackerState::Completed);
    }

    #[test]
    fn regressed_status_is_ignored_including_progress() {
        let mut snapshot = polling(7);
        snapshot.apply_report(7, &report(JobStatus::Processing, 6));

        let effect = snapshot.apply_report(7, &report(JobStatus::Pending, 1));
        assert_eq!(effect, ReportEffect::Regressed);
        assert_eq!(snapshot.status, Some(JobStatus::Processing));
        assert_eq!(snapshot.progress.processed, 6);
    }

    #[test]
    fn failure_uses_server_message_or_generic_one() {
        let mut snapshot = polling(7);
        let mut failed = report(JobStatus::Failed, 2);
        failed.error_message = Some("Missing column: encounter_type".into());
        snapshot.apply_report(7, &failed);
        assert_eq!(snapshot.error_message.as_deref(), Some("Missing column: encounter_type"));

        let mut snapshot = polling(8);
        let mut failed = report(JobStatus::Failed, 2);
        failed.error_message = Some("  ".into());
        snapshot.apply_report(8, &failed);
        assert_eq!(
            snapshot.outcome,
            Some(JobOutcome::Failed { message: GENERIC_FAILURE_MESSAGE.into() })
        );
    }

    #[test]
    fn reports_for_other_jobs_are_ignored() {
        let mut snapshot = polling(7);
        assert_eq!(
            snapshot.apply_report(8, &report(JobStatus::Completed, 10)),
            ReportEffect::Ignored
        );
        assert!(!snapshot.cancel(8));
        assert_eq!(snapshot.state, TrackerState::Polling);
    }

    #[test]
    fn cancel_and_timeout_apply_once() {
        let mut snapshot = polling(7);
        assert!(snapshot.cancel(7));
        assert!(!snapshot.cancel(7));
        assert!(!snapshot.time_out(7, Duration::from_secs(300)));
        assert_eq!(snapshot.outcome, Some(JobOutcome::Cancelled));

        let mut snapshot = polling(9);
        assert!(snapshot.time_out(9, Duration::from_secs(300)));
        assert_eq!(snapshot.state, TrackerState::TimedOut);
        assert!(!snapshot.record_poll_failure(9));
    }

    #[test]
    fn terminal_state_accepts_a_new_submission() {
        let mut snapshot = polling(7);
        snapshot.cancel(7);
        assert!(snapshot.begin_submit());
        assert_eq!(snapshot.state, TrackerState::Submitting);
        assert_eq!(snapshot.job_id, None);
        assert_eq!(snapshot.outcome, None);
    }

    #[test]
    fn tracker_state_names() {
        assert_eq!(TrackerState::TimedOut.to_string(), "timed_out");
        assert!(TrackerState::Cancelled.is_terminal());
        assert!(!TrackerState::Idle.is_active());
    }
}
