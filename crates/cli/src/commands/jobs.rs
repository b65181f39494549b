//! Claims file upload and job inspection

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use rcm_core::{JobError, JobObserver, JobOutcome, TrackerSnapshot};
use rcm_domain::JobUpload;
use rcm_infra::api::read_upload;
use rcm_infra::ApiClient;
use tracing::info;

use crate::output::{self, Output};

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Claims spreadsheet (.xlsx, .xls or .csv)
    pub claims_file: PathBuf,

    /// Technical rules document (PDF)
    #[arg(long)]
    pub technical_rules: Option<PathBuf>,

    /// Medical rules document (PDF)
    #[arg(long)]
    pub medical_rules: Option<PathBuf>,

    /// Return after submission instead of waiting for the result
    #[arg(long)]
    pub no_wait: bool,
}

/// Prints tracker progress on stderr
struct ProgressPrinter;

impl JobObserver for ProgressPrinter {
    fn on_progress(&self, snapshot: &TrackerSnapshot) {
        let progress = &snapshot.progress;
        eprintln!(
            "  {} {}/{} ({:.1}%)",
            snapshot.status.map_or("pending", |status| status.as_str()),
            progress.processed,
            progress.total,
            progress.percentage
        );
    }
}

pub async fn upload(client: &ApiClient, out: Output, args: UploadArgs) -> Result<()> {
    let mut upload = JobUpload::new(read_upload(&args.claims_file).await?);
    if let Some(path) = &args.technical_rules {
        upload = upload.with_technical_rules(read_upload(path).await?);
    }
    if let Some(path) = &args.medical_rules {
        upload = upload.with_medical_rules(read_upload(path).await?);
    }

    if args.no_wait {
        let job = client.jobs().submit(&upload).await?;
        return out.emit(&job, |job| format!("Submitted job\n{}", output::job_line(job)));
    }

    let tracker = client.tracker(Some(Arc::new(ProgressPrinter)));
    let tracked = tracker.submit(&upload).await?;
    eprintln!("Submitted job #{}; waiting for validation (Ctrl-C to stop waiting)", tracked.id());

    let job_id = tracked.id();
    let outcome = tokio::select! {
        outcome = tracked.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracker.cancel();
            info!(job_id, "Stopped waiting; the job continues on the server");
            JobOutcome::Cancelled
        }
    };

    match outcome.into_result() {
        Ok(report) => out.emit(&report, |report| format!("Job #{job_id} {}", output::report_line(report))),
        Err(JobError::Cancelled) => {
            out.message(&format!("Stopped tracking job #{job_id}; check it later with `rcm job {job_id}`"));
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn show(client: &ApiClient, out: Output, id: i64) -> Result<()> {
    let job = client.jobs().job(id).await?;
    out.emit(&job, output::job_detail)
}

pub async fn list(client: &ApiClient, out: Output) -> Result<()> {
    let jobs = client.jobs().list().await?;
    out.emit(&jobs, |jobs| {
        if jobs.items().is_empty() {
            return "No jobs".to_string();
        }
        jobs.items().iter().map(output::job_line).collect::<Vec<_>>().join("\n")
    })
}
