//! Validation job types
//!
//! A job is created by uploading a claims file and is advanced only by the
//! backend. The client observes it through the status endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_wire_enum;

/// Backend primary key of a validation job
pub type JobId = i64;

/// Server-side job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl_wire_enum!(JobStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

impl JobStatus {
    /// `completed` and `failed` never change again
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the order pending → processing → {completed, failed}
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle order
    pub const fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return self as u8 == next as u8;
        }
        next.rank() >= self.rank()
    }
}

/// Job record returned by `POST /jobs/` and `GET /jobs/{id}/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub claims_file: Option<String>,
    #[serde(default)]
    pub technical_rules_file: Option<String>,
    #[serde(default)]
    pub medical_rules_file: Option<String>,
    #[serde(default)]
    pub total_claims: u64,
    #[serde(default)]
    pub processed_claims: u64,
    #[serde(default)]
    pub validated_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Progress implied by the record's counters
    pub fn progress(&self) -> JobProgress {
        JobProgress::from_counts(self.processed_claims, self.total_claims)
            .with_outcome(self.validated_count, self.error_count)
    }

    /// View the record as a status report
    pub fn to_report(&self) -> JobStatusReport {
        JobStatusReport {
            job_id: (!self.job_id.is_empty()).then(|| self.job_id.clone()),
            status: self.status,
            progress: self.progress(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Progress counters of a running job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<u64>,
}

impl JobProgress {
    /// Build progress from raw counters; an empty job reports 0%
    pub fn from_counts(processed: u64, total: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let percentage = if total > 0 { processed as f64 / total as f64 * 100.0 } else { 0.0 };
        Self { processed, total, percentage, validated: None, errors: None }
    }

    fn with_outcome(mut self, validated: u64, errors: u64) -> Self {
        self.validated = Some(validated);
        self.errors = Some(errors);
        self
    }
}

/// Body of `GET /jobs/{id}/status/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub error_message: Option<String>,
}
