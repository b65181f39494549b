//! Retrying reqwest client shared by the API transport

use std::time::Duration;

use rcm_domain::RcmError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("rcm-client/", env!("CARGO_PKG_VERSION"));

/// When and how long to wait before replaying a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, the first one included
    pub attempts: usize,
    /// Delay before the first replay; doubled for each one after it
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, base_backoff: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    /// Delay before replay number `replay` (1-based), capped at 256x the base
    pub fn delay_for(&self, replay: usize) -> Duration {
        let exponent = replay.saturating_sub(1).min(8);
        self.base_backoff.saturating_mul(1 << exponent)
    }
}

/// What to do with the outcome of one try
enum Verdict {
    Done(Result<Response, RcmError>),
    Replay,
}

/// reqwest wrapper that replays requests which are safe to send twice.
///
/// A request is replayed only if its builder can be cloned, which rules out
/// streamed multipart uploads. A 5xx answer is replayed for idempotent
/// methods only. A connect failure is replayed for any method because the
/// server never saw the request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Builder with a 30 second timeout and three attempts
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with a 30 second timeout and the default retry policy
    pub fn new() -> Result<Self, RcmError> {
        Self::builder().build()
    }

    /// Policy applied to every request
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Start a request on the underlying reqwest client
    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Send `builder`, replaying it according to the retry policy
    ///
    /// Non-2xx answers are returned as responses; only transport failures
    /// become errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RcmError> {
        let attempts = self.retry.attempts.max(1);
        let mut pending = builder;

        for attempt in 1..=attempts {
            let spare = pending.try_clone();
            let request = pending.build().map_err(InfraError::from)?;
            let method = request.method().clone();
            let url = request.url().clone();
            let replayable = spare.is_some() && attempt < attempts;

            debug!(attempt, %method, %url, "sending request");
            let verdict = match self.inner.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "response received");
                    if replayable && status.is_server_error() && is_idempotent(&method) {
                        warn!(attempt, %method, %url, %status, "server error, replaying request");
                        Verdict::Replay
                    } else {
                        Verdict::Done(Ok(response))
                    }
                }
                Err(err) if replayable && is_transient(&err, &method) => {
                    warn!(attempt, %method, %url, error = %err, "transport failure, replaying request");
                    Verdict::Replay
                }
                Err(err) => Verdict::Done(Err(InfraError::from(err).into())),
            };

            match (verdict, spare) {
                (Verdict::Done(result), _) => return result,
                (Verdict::Replay, Some(next)) => {
                    let delay = self.retry.delay_for(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    pending = next;
                }
                (Verdict::Replay, None) => break,
            }
        }

        Err(RcmError::Internal(format!("request gave no result after {attempts} attempts")))
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), retry: RetryPolicy::default() }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total tries per request, at least one
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.attempts = attempts.max(1);
        self
    }

    /// Delay before the first replay
    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    /// Build the reqwest client
    pub fn build(self) -> Result<HttpClient, RcmError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RcmError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(HttpClient { inner, retry: self.retry })
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE)
}

fn is_transient(err: &reqwest::Error, method: &Method) -> bool {
    err.is_connect() || (is_idempotent(method) && (err.is_timeout() || err.is_request()))
}
