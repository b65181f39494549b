//! Backend client facade
//!
//! Owns one [`AuthenticatedTransport`] and hands out the resource clients
//! that share it, so every call sees the same session and refresh gate.

use std::sync::Arc;

use rcm_core::{JobObserver, JobTracker, SessionListener, SessionStore};
use rcm_domain::{ClientConfig, PollingConfig};
use tracing::{debug, instrument};

use super::auth::AuthApi;
use super::claims::ClaimsApi;
use super::errors::ApiError;
use super::jobs::JobsApi;
use super::rulesets::RuleSetsApi;
use super::transport::AuthenticatedTransport;
use crate::http::HttpClient;
use crate::session::open_session_store;

/// Entry point for every backend operation
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<AuthenticatedTransport>,
    polling: PollingConfig,
}

impl ApiClient {
    /// Open the configured session store and build a client over it
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` for an invalid base URL or an unavailable
    /// session backend.
    #[instrument(skip_all, fields(base_url = %config.api.base_url))]
    pub async fn connect(
        config: &ClientConfig,
        listener: Option<Arc<dyn SessionListener>>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(open_session_store(&config.session).await?);

        let mut builder = Self::builder().config(config.clone()).session(session);
        if let Some(listener) = listener {
            builder = builder.listener(listener);
        }
        builder.build()
    }

    /// Builder starting from default configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Login, registration and logout
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(Arc::clone(&self.transport))
    }

    /// Claim records and statistics
    pub fn claims(&self) -> ClaimsApi {
        ClaimsApi::new(Arc::clone(&self.transport))
    }

    /// Validation job submission and status
    pub fn jobs(&self) -> JobsApi {
        JobsApi::new(Arc::clone(&self.transport))
    }

    /// Rule set management
    pub fn rulesets(&self) -> RuleSetsApi {
        RuleSetsApi::new(Arc::clone(&self.transport))
    }

    /// Transport shared by every resource client
    pub fn transport(&self) -> &Arc<AuthenticatedTransport> {
        &self.transport
    }

    /// Session shared by every resource client
    pub fn session(&self) -> &Arc<SessionStore> {
        self.transport.session()
    }

    /// Job tracker polling through this client with the configured cadence
    pub fn tracker(&self, observer: Option<Arc<dyn JobObserver>>) -> JobTracker {
        let tracker = JobTracker::new(Arc::new(self.jobs()), self.polling.clone());
        match observer {
            Some(observer) => tracker.with_observer(observer),
            None => tracker,
        }
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: Option<Arc<SessionStore>>,
    listener: Option<Arc<dyn SessionListener>>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Use this configuration instead of the defaults
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the backend base URL
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = base_url.into();
        self
    }

    /// Override polling for trackers built by the client
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.config.polling = polling;
        self
    }

    /// Session store to use; defaults to an in-memory store
    #[must_use]
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Receiver of "session expired" notifications
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Use a preconfigured HTTP client instead of one built from the config
    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let session = self.session.unwrap_or_else(|| Arc::new(SessionStore::in_memory()));
        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder().timeout(self.config.api.timeout()).build()?,
        };

        let mut transport =
            AuthenticatedTransport::with_http_client(http, &self.config.api.base_url, session)?;
        if let Some(listener) = self.listener {
            transport = transport.with_listener(listener);
        }

        debug!(base_url = transport.base_url(), "API client ready");
        Ok(ApiClient { transport: Arc::new(transport), polling: self.config.polling })
    }
}
