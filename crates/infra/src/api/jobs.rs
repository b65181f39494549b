//! Validation job endpoints
//!
//! [`JobsApi`] is also the [`JobBackend`] the tracker polls through.

use std::sync::Arc;

use async_trait::async_trait;
use rcm_core::JobBackend;
use rcm_domain::constants::JOBS_PATH;
use rcm_domain::{Job, JobId, JobStatusReport, JobUpload, Listing, RcmError};
use tracing::{info, instrument};

use super::errors::ApiError;
use super::request::{ApiRequest, FormField};
use super::transport::AuthenticatedTransport;

/// Validation job submission, status and listing
#[derive(Clone)]
pub struct JobsApi {
    transport: Arc<AuthenticatedTransport>,
}

impl JobsApi {
    /// Client over a shared transport
    pub fn new(transport: Arc<AuthenticatedTransport>) -> Self {
        Self { transport }
    }

    /// Upload the claims file (and optional rule documents) as a new job
    ///
    /// The backend may answer with a job that is already terminal when it
    /// validates synchronously.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message for invalid
    /// files, or any transport error.
    #[instrument(skip(self, upload), fields(claims_file = %upload.claims_file.file_name))]
    pub async fn submit(&self, upload: &JobUpload) -> Result<Job, ApiError> {
        let fields = upload
            .parts()
            .into_iter()
            .map(|(name, file)| FormField::file(name, file.clone()))
            .collect();

        let job: Job = self.transport.send_json(ApiRequest::post(JOBS_PATH).multipart(fields)).await?;
        info!(job_id = job.id, status = %job.status, "Job submitted");
        Ok(job)
    }

    /// Lightweight progress report for a job
    #[instrument(skip(self))]
    pub async fn status(&self, id: JobId) -> Result<JobStatusReport, ApiError> {
        self.transport.send_json(ApiRequest::get(format!("{JOBS_PATH}{id}/status/"))).await
    }

    /// Full job record
    #[instrument(skip(self))]
    pub async fn job(&self, id: JobId) -> Result<Job, ApiError> {
        self.transport.send_json(ApiRequest::get(format!("{JOBS_PATH}{id}/"))).await
    }

    /// `GET /jobs/`
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Listing<Job>, ApiError> {
        self.transport.send_json(ApiRequest::get(JOBS_PATH)).await
    }
}

#[async_trait]
impl JobBackend for JobsApi {
    async fn submit(&self, upload: &JobUpload) -> Result<Job, RcmError> {
        Ok(JobsApi::submit(self, upload).await?)
    }

    async fn status(&self, id: JobId) -> Result<JobStatusReport, RcmError> {
        Ok(JobsApi::status(self, id).await?)
    }
}
