//! Final results of job tracking

use std::time::Duration;

use rcm_domain::{ErrorDisposition, JobStatusReport, RcmError};
use thiserror::Error;

/// How tracking of a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Server reported `completed`
    Completed(JobStatusReport),
    /// Server reported `failed`
    Failed { message: String },
    /// Local polling budget ran out; the job may still finish server-side
    TimedOut { elapsed: Duration },
    /// Tracking was stopped before a terminal status was seen
    Cancelled,
}

impl JobOutcome {
    /// Whether the job finished successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Convert into a `Result`, treating everything but completion as an error
    ///
    /// # Errors
    ///
    /// Returns the matching [`JobError`] for failed, timed-out and cancelled
    /// outcomes.
    pub fn into_result(self) -> Result<JobStatusReport, JobError> {
        match self {
            Self::Completed(report) => Ok(report),
            Self::Failed { message } => Err(JobError::Failed(message)),
            Self::TimedOut { elapsed } => Err(JobError::TimedOut(elapsed)),
            Self::Cancelled => Err(JobError::Cancelled),
        }
    }
}

/// Errors surfaced by job submission and tracking
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JobError {
    #[error("validation failed: {0}")]
    Failed(String),

    #[error("validation did not finish within {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("job tracking was cancelled")]
    Cancelled,

    #[error(transparent)]
    Submit(#[from] RcmError),
}

impl JobError {
    /// Boundary reaction for this error
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            Self::Submit(err) => err.disposition(),
            // The job may still finish server-side; the result is unknown.
            Self::TimedOut(_) => ErrorDisposition::Alert,
            Self::Failed(_) | Self::Cancelled => ErrorDisposition::Inline,
        }
    }
}
