//! Authenticated transport
//!
//! Every backend call goes through [`AuthenticatedTransport::send`]:
//! - the current access token is attached as a bearer credential
//! - a 401 triggers one token refresh and one retry of the original request
//! - a failed refresh clears the session and notifies the session listener
//!
//! Refreshes are single-flight. Concurrent requests that hit 401 with the same
//! stale token queue on one gate; the first performs the refresh and the rest
//! retry with the token it stored.

use std::sync::Arc;

use rcm_core::{NoopSessionListener, SessionListener, SessionStore};
use rcm_domain::constants::TOKEN_REFRESH_PATH;
use rcm_domain::{ApiConfig, RefreshRequest, RefreshResponse};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::errors::{extract_error_message, ApiError};
use super::request::{ApiRequest, PendingRequest, RequestBody};
use crate::http::HttpClient;

/// HTTP transport that owns bearer attachment and the refresh-and-retry cycle
pub struct AuthenticatedTransport {
    http: HttpClient,
    base_url: String,
    session: Arc<SessionStore>,
    listener: Arc<dyn SessionListener>,
    refresh_gate: Mutex<()>,
}

impl AuthenticatedTransport {
    /// Create a transport for the configured backend
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let http = HttpClient::builder().timeout(config.timeout()).build()?;
        Self::with_http_client(http, &config.base_url, session)
    }

    /// Create a transport over an existing HTTP client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid.
    pub fn with_http_client(
        http: HttpClient,
        base_url: &str,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        url::Url::parse(base_url)
            .map_err(|err| ApiError::Config(format!("invalid API base URL {base_url:?}: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            listener: Arc::new(NoopSessionListener),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Register the receiver of "session expired" notifications
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Session store the transport reads and refreshes
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request with bearer authentication and one refresh-and-retry
    ///
    /// Non-401 responses are returned as-is, whatever their status.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` if no response was received
    /// - `ApiError::SessionExpired` if the refresh token was rejected; the
    ///   session has been cleared and the listener notified
    /// - `ApiError::Unauthorized` for a 401 without stored credentials or a
    ///   401 on the retried request
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut pending = PendingRequest::new(request);

        loop {
            let token = self.session.access_token().await;
            let response = self.dispatch(pending.request(), token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let message = unauthorized_message(response).await;

            let Some(rejected) = token else {
                debug!("401 without stored credentials");
                return Err(ApiError::Unauthorized(message));
            };

            if !pending.mark_retried() {
                warn!("401 after token refresh; giving up");
                return Err(ApiError::Unauthorized(message));
            }

            self.refresh_after_unauthorized(&rejected, message).await?;
        }
    }

    /// Send and decode a JSON response
    ///
    /// 204 and 205 responses decode from `null`, so `Option<T>` and `()`
    /// targets accept them.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Self::send) returns, plus `Rejected`, `NotFound`
    /// or `Server` for non-success statuses and `Decode` for bad bodies.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let response = self.send(request).await?;
        decode_json(response).await
    }

    /// Send and check the status, ignoring the body
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        let response = self.send(request).await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Send without credentials and without the refresh cycle
    ///
    /// Used for login and registration, where a 401 means bad credentials.
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json).
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send_public_json<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, ApiError> {
        let response = self.dispatch(&request, None).await?;
        decode_json(response).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(fields) => builder.multipart(ApiRequest::form(fields)?),
        };

        Ok(self.http.send(builder).await?)
    }

    /// Run (or wait for) the refresh that follows a 401
    ///
    /// `rejected` is the access token the failed request carried. If the
    /// store already holds a different one, another request refreshed in the
    /// meantime and the caller simply retries.
    async fn refresh_after_unauthorized(&self, rejected: &str, message: String) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let Some(current) = self.session.get().await else {
            // A concurrent refresh failed and already cleared the session.
            return Err(ApiError::SessionExpired(message));
        };

        if current.access != rejected {
            debug!("Access token was refreshed by a concurrent request");
            return Ok(());
        }

        match self.refresh(&current.refresh).await {
            Ok(access) => {
                self.session.update_access(access).await?;
                info!("Access token refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed; ending session");
                if let Err(clear_err) = self.session.clear().await {
                    warn!(error = %clear_err, "Failed to remove persisted session");
                }
                self.listener.on_session_expired();
                Err(ApiError::SessionExpired(message))
            }
        }
    }

    /// `POST /token/refresh/`; never carries a bearer and is never retried
    async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(TOKEN_REFRESH_PATH)
            .json(&RefreshRequest { refresh: refresh_token })?;
        let response: RefreshResponse = self.send_public_json(request).await?;
        Ok(response.access)
    }
}

async fn unauthorized_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    extract_error_message(status, &body)
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, &body))
}

async fn decode_json<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
    let response = ensure_success(response).await?;
    let status = response.status();

    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
            ApiError::Decode(format!(
                "No content response ({}), but response type cannot be deserialized from empty body",
                status.as_u16()
            ))
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ApiError::Network(format!("failed to read response body: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Decode(format!("Failed to parse response: {err}")))
}
