//! Login, registration and logout
//!
//! Login and registration are the only calls that write a whole new session;
//! they go out without a bearer so a stale token can never trigger a refresh.

use std::sync::Arc;

use rcm_domain::constants::{LOGIN_PATH, REGISTER_PATH};
use rcm_domain::{AuthResponse, Identity, LoginRequest, RegisterRequest, Session};
use tracing::{info, instrument};

use super::errors::ApiError;
use super::request::ApiRequest;
use super::transport::AuthenticatedTransport;

/// Authentication endpoints
#[derive(Clone)]
pub struct AuthApi {
    transport: Arc<AuthenticatedTransport>,
}

impl AuthApi {
    /// Client over a shared transport
    pub fn new(transport: Arc<AuthenticatedTransport>) -> Self {
        Self { transport }
    }

    /// Exchange credentials for a session and store it
    ///
    /// # Errors
    ///
    /// - `ApiError::Unauthorized` or `ApiError::Rejected` for bad credentials
    /// - `ApiError::Storage` if the session cannot be persisted
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        let response: AuthResponse = self.transport.send_public_json(request).await?;
        let session = self.store(response).await?;

        info!(user_id = session.user.as_ref().map(|u| u.id), "Logged in");
        Ok(session)
    }

    /// Create an account; the backend logs the new user in directly
    ///
    /// # Errors
    ///
    /// - `ApiError::Rejected` with the first field error (e.g. a taken
    ///   username)
    /// - `ApiError::Storage` if the session cannot be persisted
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(request)?;

        let response: AuthResponse = self.transport.send_public_json(request).await?;
        let session = self.store(response).await?;

        info!(user_id = session.user.as_ref().map(|u| u.id), "Registered");
        Ok(session)
    }

    /// Forget the session locally; the backend keeps no logout state
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the persisted session cannot be removed.
    /// The in-memory session is gone either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.transport.session().clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// Identity of the logged-in user, if any
    pub async fn current_user(&self) -> Option<Identity> {
        self.transport.session().identity().await
    }

    async fn store(&self, response: AuthResponse) -> Result<Session, ApiError> {
        let session = Session::from(response);
        self.transport.session().set(session.tokens.clone(), session.user.clone()).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use rcm_core::SessionStore;
    use rcm_domain::CredentialPair;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::HttpClient;

    fn auth_api(server: &MockServer) -> AuthApi {
        let store = Arc::new(SessionStore::in_memory());
        let transport =
            AuthenticatedTransport::with_http_client(HttpClient::new().unwrap(), &server.uri(), store)
                .unwrap();
        AuthApi::new(Arc::new(transport))
    }

    fn auth_body() -> serde_json::Value {
        json!({
            "user": {"id": 1, "username": "a", "email": "a@example.com"},
            "tokens": {"access": "A1", "refresh": "R1"}
        })
    }

    #[tokio::test]
    async fn login_stores_session_used_by_next_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .and(body_json(json!({"username": "a", "password": "b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
            .expect(1)
            .mount(&server)
            .await;

        let api = auth_api(&server);
        let session = api.login("a", "b").await.unwrap();

        assert_eq!(session.tokens, CredentialPair::new("A1", "R1"));
        assert_eq!(api.current_user().await.unwrap().username, "a");
        assert_eq!(api.transport.session().access_token().await.as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn bad_credentials_leave_store_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        let err = api.login("a", "wrong").await.unwrap_err();

        assert_eq!(err, ApiError::Unauthorized("Invalid credentials".into()));
        assert!(!api.transport.session().is_authenticated().await);
    }

    #[tokio::test]
    async fn register_reports_first_field_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["A user with that username already exists."]
            })))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        let err = api
            .register(&RegisterRequest { username: "a".into(), password: "b".into(), email: None })
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "username: A user with that username already exists."
        );
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(auth_body()))
            .mount(&server)
            .await;

        let api = auth_api(&server);
        api.register(&RegisterRequest {
            username: "a".into(),
            password: "b".into(),
            email: Some("a@example.com".into()),
        })
        .await
        .unwrap();
        api.logout().await.unwrap();

        assert!(api.current_user().await.is_none());
        assert!(api.transport.session().get().await.is_none());
    }
}
