//! Job submission and serial status polling
//!
//! Follows the scheduler pattern used elsewhere in the workspace: one spawned
//! task per tracked job, stopped through a `CancellationToken`, with a
//! `tokio::select!` loop racing the token against the poll interval and the
//! overall deadline.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rcm_domain::{Job, JobId, JobUpload, PollingConfig, RcmError, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::outcome::JobOutcome;
use super::ports::{JobBackend, JobObserver};
use super::state::{ReportEffect, TrackerSnapshot, TrackerState};

type StateTx = Arc<watch::Sender<TrackerSnapshot>>;
type ObserverRef = Option<Arc<dyn JobObserver>>;

/// Submits validation jobs and follows them to a terminal state
///
/// One tracker follows one job at a time; a second submission is refused
/// until the current job reaches a terminal state. Dropping the tracker stops
/// any polling task it spawned.
pub struct JobTracker {
    backend: Arc<dyn JobBackend>,
    config: PollingConfig,
    observer: ObserverRef,
    state: StateTx,
    shutdown: CancellationToken,
    current: Mutex<Option<CancellationToken>>,
}

impl JobTracker {
    /// Idle tracker polling `backend` with the given interval and budget
    pub fn new(backend: Arc<dyn JobBackend>, config: PollingConfig) -> Self {
        let (tx, _rx) = watch::channel(TrackerSnapshot::default());
        Self {
            backend,
            config,
            observer: None,
            state: Arc::new(tx),
            shutdown: CancellationToken::new(),
            current: Mutex::new(None),
        }
    }

    /// Attach callbacks fired on progress and on each terminal outcome
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Polling interval and budget used for every job
    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Upload the files and start following the created job
    ///
    /// # Errors
    ///
    /// - `RcmError::InvalidInput` if a job is already being tracked
    /// - Any error from the backend's submit call; the tracker returns to idle
    pub async fn submit(&self, upload: &JobUpload) -> Result<TrackedJob> {
        if !self.state.send_if_modified(TrackerSnapshot::begin_submit) {
            return Err(RcmError::InvalidInput(
                "a validation job is already being tracked".to_string(),
            ));
        }
        let guard = SubmitGuard { state: &self.state, armed: true };

        let token = self.shutdown.child_token();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let job = match self.backend.submit(upload).await {
            Ok(job) => job,
            Err(err) => {
                warn!(error = %err, "Validation job submission failed");
                return Err(err);
            }
        };

        info!(job_id = job.id, status = %job.status, "Validation job submitted");

        let mut effect = ReportEffect::Ignored;
        self.state.send_if_modified(|snapshot| {
            effect = snapshot.submitted(&job);
            // Entering Polling is always worth publishing.
            true
        });
        guard.disarm();
        dispatch(self.observer.as_deref(), effect, &self.snapshot());

        let completion = if effect.is_terminal() {
            Completion::Resolved(outcome_of(&self.state))
        } else if token.is_cancelled() {
            debug!(job_id = job.id, "Cancelled during upload; not polling");
            mark_cancelled(&self.state, self.observer.as_deref(), job.id);
            Completion::Resolved(outcome_of(&self.state))
        } else {
            let task = PollTask {
                backend: Arc::clone(&self.backend),
                state: Arc::clone(&self.state),
                observer: self.observer.clone(),
                interval: self.config.interval(),
                timeout: self.config.timeout(),
                job_id: job.id,
                token: token.clone(),
            };
            Completion::Running(tokio::spawn(task.run()))
        };

        Ok(TrackedJob {
            job,
            state: Arc::clone(&self.state),
            token,
            observer: self.observer.clone(),
            completion,
        })
    }

    /// Stop following the current job, if any
    ///
    /// Idempotent. Returns `true` if a running job was cancelled by this call.
    /// During the upload the cancellation is recorded and applied as soon as
    /// the job record comes back, so no status is ever fetched for it.
    pub fn cancel(&self) -> bool {
        let token = self.current.lock().unwrap_or_else(PoisonError::into_inner).take();
        let (state, job_id) = {
            let snapshot = self.state.borrow();
            (snapshot.state, snapshot.job_id)
        };

        let applied = match job_id {
            Some(id) => mark_cancelled(&self.state, self.observer.as_deref(), id),
            None => {
                state == TrackerState::Submitting
                    && token.as_ref().is_some_and(|t| !t.is_cancelled())
            }
        };
        if let Some(token) = token {
            token.cancel();
        }
        applied
    }

    /// Current state of the tracker
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published state change
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.state.subscribe()
    }
}

/// Puts the tracker back to Idle if the submit future ends early
///
/// Covers both a backend error and the caller dropping the future while the
/// upload is in flight.
struct SubmitGuard<'a> {
    state: &'a StateTx,
    armed: bool,
}

impl SubmitGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.state.send_if_modified(TrackerSnapshot::submit_failed) {
            debug!("Submission abandoned; tracker is idle again");
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

enum Completion {
    Running(JoinHandle<JobOutcome>),
    Resolved(JobOutcome),
}

/// Handle to a submitted job
///
/// The snapshot channel is shared with the tracker that produced this handle,
/// so after the job ends it reflects whatever the tracker does next.
pub struct TrackedJob {
    job: Job,
    state: StateTx,
    token: CancellationToken,
    observer: ObserverRef,
    completion: Completion,
}

impl TrackedJob {
    /// Job record returned by the submission
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Backend id of the job
    pub fn id(&self) -> JobId {
        self.job.id
    }

    /// Stop polling; the job keeps running server-side
    ///
    /// Idempotent. An in-flight status fetch is abandoned and its result is
    /// never applied.
    pub fn cancel(&self) {
        mark_cancelled(&self.state, self.observer.as_deref(), self.job.id);
        self.token.cancel();
    }

    /// Receiver for progress updates on this job
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.state.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state.borrow().clone()
    }

    /// Wait until tracking ends
    pub async fn wait(self) -> JobOutcome {
        match self.completion {
            Completion::Resolved(outcome) => outcome,
            Completion::Running(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(job_id = self.job.id, error = %err, "Polling task ended abnormally");
                    JobOutcome::Cancelled
                }
            },
        }
    }
}

struct PollTask {
    backend: Arc<dyn JobBackend>,
    state: StateTx,
    observer: ObserverRef,
    interval: Duration,
    timeout: Duration,
    job_id: JobId,
    token: CancellationToken,
}

impl PollTask {
    async fn run(self) -> JobOutcome {
        let started = Instant::now();
        let deadline = started + self.timeout;

        debug!(
            job_id = self.job_id,
            interval_ms = self.interval.as_millis(),
            timeout_secs = self.timeout.as_secs(),
            "Polling started"
        );

        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => return self.stopped(),
                () = sleep_until(deadline) => return self.timed_out(started.elapsed()),
                () = sleep(self.interval) => {}
            }

            let fetched = tokio::select! {
                biased;
                () = self.token.cancelled() => return self.stopped(),
                () = sleep_until(deadline) => return self.timed_out(started.elapsed()),
                fetched = self.backend.status(self.job_id) => fetched,
            };

            match fetched {
                Ok(report) => {
                    let mut effect = ReportEffect::Ignored;
                    self.state.send_if_modified(|snapshot| {
                        effect = snapshot.apply_report(self.job_id, &report);
                        effect.publishes()
                    });
                    dispatch(self.observer.as_deref(), effect, &snapshot_of(&self.state));

                    match effect {
                        ReportEffect::Progress => {
                            debug!(
                                job_id = self.job_id,
                                status = %report.status,
                                processed = report.progress.processed,
                                total = report.progress.total,
                                "Job progress"
                            );
                        }
                        ReportEffect::Regressed => {
                            debug!(job_id = self.job_id, status = %report.status, "Ignoring stale status");
                        }
                        ReportEffect::Completed => {
                            info!(job_id = self.job_id, "Validation job completed");
                            return outcome_of(&self.state);
                        }
                        ReportEffect::Failed => {
                            warn!(job_id = self.job_id, "Validation job failed");
                            return outcome_of(&self.state);
                        }
                        // The tracker left Polling while the fetch was running.
                        ReportEffect::Ignored => return self.stopped(),
                    }
                }
                Err(RcmError::SessionExpired(message)) => {
                    warn!(job_id = self.job_id, %message, "Session expired; stopping job tracking");
                    mark_cancelled(&self.state, self.observer.as_deref(), self.job_id);
                    return JobOutcome::Cancelled;
                }
                Err(err) => {
                    self.state.send_if_modified(|snapshot| {
                        snapshot.record_poll_failure(self.job_id);
                        false
                    });
                    warn!(
                        job_id = self.job_id,
                        error = %err,
                        error_type = err.label(),
                        "Status fetch failed; retrying on next tick"
                    );
                }
            }
        }
    }

    /// Token fired: either a handle cancelled us, or the tracker was dropped
    fn stopped(&self) -> JobOutcome {
        mark_cancelled(&self.state, self.observer.as_deref(), self.job_id);
        outcome_of(&self.state)
    }

    fn timed_out(&self, elapsed: Duration) -> JobOutcome {
        if self.state.send_if_modified(|snapshot| snapshot.time_out(self.job_id, elapsed)) {
            warn!(job_id = self.job_id, elapsed_secs = elapsed.as_secs(), "Job tracking timed out");
            if let Some(observer) = self.observer.as_deref() {
                observer.on_timed_out(elapsed);
            }
        }
        outcome_of(&self.state)
    }
}

/// Polling → Cancelled; fires `on_cancelled` only when this call applied it
fn mark_cancelled(state: &StateTx, observer: Option<&dyn JobObserver>, job_id: JobId) -> bool {
    let applied = state.send_if_modified(|snapshot| snapshot.cancel(job_id));
    if applied {
        info!(job_id, "Job tracking cancelled");
        if let Some(observer) = observer {
            observer.on_cancelled();
        }
    }
    applied
}

fn dispatch(observer: Option<&dyn JobObserver>, effect: ReportEffect, snapshot: &TrackerSnapshot) {
    let Some(observer) = observer else {
        return;
    };
    match (effect, &snapshot.outcome) {
        (ReportEffect::Progress, _) => observer.on_progress(snapshot),
        (ReportEffect::Completed, Some(JobOutcome::Completed(report))) => {
            observer.on_completed(report);
        }
        (ReportEffect::Failed, Some(JobOutcome::Failed { message })) => observer.on_failed(message),
        _ => {}
    }
}

// Observers get a copy so they never run while the channel is locked.
fn snapshot_of(state: &StateTx) -> TrackerSnapshot {
    state.borrow().clone()
}

fn outcome_of(state: &StateTx) -> JobOutcome {
    state.borrow().outcome.clone().unwrap_or(JobOutcome::Cancelled)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rcm_domain::{JobProgress, JobStatus, JobStatusReport, UploadFile};

    use super::*;
    use crate::jobs::state::TrackerState;

    struct FakeBackend {
        initial: JobStatus,
        submit_error: Option<RcmError>,
        script: Mutex<VecDeque<Result<JobStatusReport>>>,
        status_calls: AtomicUsize,
        delay: Duration,
        submit_delay: Duration,
    }

    impl FakeBackend {
        fn new(script: Vec<Result<JobStatusReport>>) -> Self {
            Self {
                initial: JobStatus::Pending,
                submit_error: None,
                script: Mutex::new(script.into()),
                status_calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                submit_delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobBackend for FakeBackend {
        async fn submit(&self, _upload: &JobUpload) -> Result<Job> {
            if !self.submit_delay.is_zero() {
                sleep(self.submit_delay).await;
            }
            if let Some(err) = &self.submit_error {
                return Err(err.clone());
            }
            Ok(serde_json::from_value(serde_json::json!({
                "id": 42,
                "job_id": "5b1e",
                "status": self.initial.as_str(),
                "total_claims": 10,
            }))
            .unwrap())
        }

        async fn status(&self, _job_id: JobId) -> Result<JobStatusReport> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(report(JobStatus::Processing, 5)))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        progress: Mutex<Vec<JobStatus>>,
        completed: AtomicUsize,
        failed: Mutex<Vec<String>>,
        timed_out: AtomicUsize,
        cancelled: AtomicUsize,
    }

    impl JobObserver for RecordingObserver {
        fn on_progress(&self, snapshot: &TrackerSnapshot) {
            if let Some(status) = snapshot.status {
                self.progress.lock().unwrap().push(status);
            }
        }

        fn on_completed(&self, _report: &JobStatusReport) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failed(&self, message: &str) {
            self.failed.lock().unwrap().push(message.to_string());
        }

        fn on_timed_out(&self, _elapsed: Duration) {
            self.timed_out.fetch_add(1, Ordering::SeqCst);
        }

        fn on_cancelled(&self) {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report(status: JobStatus, processed: u64) -> JobStatusReport {
        JobStatusReport {
            job_id: Some("5b1e".into()),
            status,
            progress: JobProgress::from_counts(processed, 10),
            error_message: None,
        }
    }

    fn upload() -> JobUpload {
        JobUpload::new(UploadFile::new("claims.xlsx", vec![1, 2, 3]))
    }

    fn config(interval_ms: u64, timeout_secs: u64) -> PollingConfig {
        PollingConfig { interval_ms, timeout_secs }
    }

    fn tracker(
        backend: &Arc<FakeBackend>,
        observer: &Arc<RecordingObserver>,
        polling: PollingConfig,
    ) -> JobTracker {
        let backend: Arc<dyn JobBackend> = backend.clone();
        let observer: Arc<dyn JobObserver> = observer.clone();
        JobTracker::new(backend, polling).with_observer(observer)
    }

    #[tokio::test(start_paused = true)]
    async fn completes_and_fires_completion_once() {
        let backend = Arc::new(FakeBackend::new(vec![
            Ok(report(JobStatus::Processing, 5)),
            Ok(report(JobStatus::Completed, 10)),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        assert_eq!(job.id(), 42);
        assert_eq!(job.snapshot().state, TrackerState::Polling);

        let outcome = job.wait().await;
        assert!(outcome.is_completed());
        assert_eq!(observer.completed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.snapshot().state, TrackerState::Completed);
        assert_eq!(tracker.snapshot().polls, 2);

        // No fetch is issued after the terminal state.
        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_waits_one_interval() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(2000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.calls(), 0);

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(backend.calls(), 1);
        job.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_reports_server_message() {
        let mut failed = report(JobStatus::Failed, 3);
        failed.error_message = Some("Sheet 'Claims' not found".into());
        let backend = Arc::new(FakeBackend::new(vec![Ok(failed)]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;

        assert_eq!(outcome, JobOutcome::Failed { message: "Sheet 'Claims' not found".into() });
        assert_eq!(*observer.failed.lock().unwrap(), vec!["Sheet 'Claims' not found"]);
        assert_eq!(observer.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_completion() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 5));

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;

        assert!(matches!(outcome, JobOutcome::TimedOut { elapsed } if elapsed >= Duration::from_secs(5)));
        assert_eq!(observer.timed_out.load(Ordering::SeqCst), 1);
        assert_eq!(observer.completed.load(Ordering::SeqCst), 0);
        assert!(backend.calls() <= 5);

        let calls = backend.calls();
        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_stops_polling() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.calls(), 1);

        job.cancel();
        job.cancel();
        assert!(!tracker.cancel());

        assert_eq!(job.wait().await, JobOutcome::Cancelled);
        assert_eq!(observer.cancelled.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_is_discarded_after_cancel() {
        let mut backend = FakeBackend::new(vec![Ok(report(JobStatus::Completed, 10))]);
        backend.delay = Duration::from_millis(500);
        let backend = Arc::new(backend);
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        sleep(Duration::from_millis(1200)).await;
        assert_eq!(backend.calls(), 1);

        assert!(tracker.cancel());
        sleep(Duration::from_secs(2)).await;

        assert_eq!(job.wait().await, JobOutcome::Cancelled);
        assert_eq!(observer.completed.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.snapshot().state, TrackerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_fetch_errors_keep_polling() {
        let backend = Arc::new(FakeBackend::new(vec![
            Err(RcmError::Network("connection reset".into())),
            Err(RcmError::Server("502 Bad Gateway".into())),
            Ok(report(JobStatus::Completed, 10)),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;

        assert!(outcome.is_completed());
        assert_eq!(backend.calls(), 3);
        assert_eq!(tracker.snapshot().failed_polls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn session_expiry_cancels_tracking() {
        let backend = Arc::new(FakeBackend::new(vec![Err(RcmError::SessionExpired(
            "refresh rejected".into(),
        ))]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;

        assert_eq!(outcome, JobOutcome::Cancelled);
        assert_eq!(observer.cancelled.load(Ordering::SeqCst), 1);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn regressed_status_never_reaches_observers() {
        let backend = Arc::new(FakeBackend::new(vec![
            Ok(report(JobStatus::Processing, 3)),
            Ok(report(JobStatus::Pending, 0)),
            Ok(report(JobStatus::Completed, 10)),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        let outcome = job.wait().await;

        assert!(outcome.is_completed());
        // Pending from the submission record, then Processing; the stale Pending is dropped.
        assert_eq!(
            *observer.progress.lock().unwrap(),
            vec![JobStatus::Pending, JobStatus::Processing]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn submit_failure_returns_to_idle() {
        let mut backend = FakeBackend::new(vec![]);
        backend.submit_error = Some(RcmError::Rejected("Invalid file format".into()));
        let backend = Arc::new(backend);
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let err = tracker.submit(&upload()).await.err().unwrap();

        assert_eq!(err, RcmError::Rejected("Invalid file format".into()));
        assert_eq!(tracker.snapshot().state, TrackerState::Idle);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_is_rejected_while_tracking() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let first = tracker.submit(&upload()).await.unwrap();
        let err = tracker.submit(&upload()).await.err().unwrap();
        assert!(matches!(err, RcmError::InvalidInput(_)));

        first.cancel();
        assert!(tracker.submit(&upload()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_submission_resolves_without_polling() {
        let mut backend = FakeBackend::new(vec![]);
        backend.initial = JobStatus::Completed;
        let backend = Arc::new(backend);
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;

        assert!(outcome.is_completed());
        assert_eq!(observer.completed.load(Ordering::SeqCst), 1);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_tracker_stops_polling() {
        let backend = Arc::new(FakeBackend::new(vec![]));
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let job = tracker.submit(&upload()).await.unwrap();
        let mut updates = job.subscribe();
        drop(tracker);

        assert_eq!(job.wait().await, JobOutcome::Cancelled);
        assert_eq!(updates.borrow_and_update().state, TrackerState::Cancelled);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_leaves_tracker_reusable() {
        let mut backend = FakeBackend::new(vec![Ok(report(JobStatus::Completed, 10))]);
        backend.submit_delay = Duration::from_secs(10);
        let backend = Arc::new(backend);
        let observer = Arc::new(RecordingObserver::default());
        let tracker = tracker(&backend, &observer, config(1000, 300));

        let abandoned = tokio::time::timeout(Duration::from_secs(1), tracker.submit(&upload())).await;
        assert!(abandoned.is_err());
        assert_eq!(tracker.snapshot().state, TrackerState::Idle);

        let outcome = tracker.submit(&upload()).await.unwrap().wait().await;
        assert!(outcome.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_upload_skips_polling() {
        let mut backend = FakeBackend::new(vec![]);
        backend.submit_delay = Duration::from_secs(3);
        let backend = Arc::new(backend);
        let observer = Arc::new(RecordingObserver::default());
        let tracker = Arc::new(tracker(&backend, &observer, config(1000, 300)));

        let submitting = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.submit(&upload()).await })
        };
        sleep(Duration::from_secs(1)).await;
        assert_eq!(tracker.snapshot().state, TrackerState::Submitting);

        assert!(tracker.cancel());
        assert!(!tracker.cancel());

        let job = submitting.await.unwrap().unwrap();
        assert_eq!(job.id(), 42);
        assert_eq!(job.wait().await, JobOutcome::Cancelled);
        assert_eq!(tracker.snapshot().state, TrackerState::Cancelled);
        assert_eq!(observer.cancelled.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), 0);
    }
}
