//! Shared fixtures for the infra integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rcm_core::{SessionListener, SessionStore};
use rcm_domain::{CredentialPair, PollingConfig};
use rcm_infra::{ApiClient, HttpClient};
use wiremock::MockServer;

/// Counts "session expired" notifications
#[derive(Default)]
pub struct CountingListener(AtomicUsize);

impl CountingListener {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl SessionListener for CountingListener {
    fn on_session_expired(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Client against `server`, optionally logged in, with fast polling
pub async fn client_for(
    server: &MockServer,
    tokens: Option<(&str, &str)>,
    listener: Arc<CountingListener>,
) -> ApiClient {
    let session = Arc::new(SessionStore::in_memory());
    if let Some((access, refresh)) = tokens {
        session.set(CredentialPair::new(access, refresh), None).await.expect("seed session");
    }

    let http = HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .base_backoff(Duration::from_millis(5))
        .build()
        .expect("http client");

    ApiClient::builder()
        .base_url(server.uri())
        .http_client(http)
        .session(session)
        .listener(listener)
        .polling(PollingConfig { interval_ms: 20, timeout_secs: 5 })
        .build()
        .expect("api client")
}
