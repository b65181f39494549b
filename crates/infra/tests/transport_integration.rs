//! End-to-end authentication scenarios against a mock backend
//!
//! **Coverage:**
//! - Login stores the pair and the next call carries it
//! - 401 → refresh → retry with the new access token
//! - Refresh rejected → session cleared, listener notified, later calls
//!   unauthenticated
//! - Concurrent 401s share one refresh, whether it succeeds or fails

#[path = "support.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use rcm_domain::{ClaimFilter, CredentialPair, ErrorDisposition, RcmError};
use rcm_infra::ApiError;
use serde_json::json;
use support::{client_for, CountingListener};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stats_body() -> serde_json::Value {
    json!({"total_claims": 3, "validated": 2, "not_validated": 1})
}

#[tokio::test]
async fn login_then_authenticated_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "username": "a", "email": "a@example.com"},
            "tokens": {"access": "A1", "refresh": "R1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, Arc::default()).await;
    client.auth().login("a", "b").await.unwrap();

    assert_eq!(client.session().get().await, Some(CredentialPair::new("A1", "R1")));
    assert_eq!(client.claims().statistics().await.unwrap().total_claims, 3);
}

#[tokio::test]
async fn expired_access_token_is_refreshed_transparently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .expect(1)
        .mount(&server)
        .await;

    let listener = Arc::new(CountingListener::default());
    let client = client_for(&server, Some(("A1", "R1")), Arc::clone(&listener)).await;

    let stats = client.claims().statistics().await.unwrap();

    assert_eq!(stats.validated, 2);
    assert_eq!(client.session().get().await, Some(CredentialPair::new("A2", "R1")));
    assert_eq!(listener.count(), 0);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/claims/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid"})))
        .expect(1)
        .mount(&server)
        .await;

    let listener = Arc::new(CountingListener::default());
    let client = client_for(&server, Some(("A1", "R1")), Arc::clone(&listener)).await;

    let err = client.claims().list(&ClaimFilter::default()).await.unwrap_err();

    assert_eq!(err, ApiError::SessionExpired("Token expired".into()));
    assert_eq!(RcmError::from(err).disposition(), ErrorDisposition::RequireLogin);
    assert!(client.session().get().await.is_none());
    assert_eq!(listener.count(), 1);

    // Later calls go out without credentials and never refresh.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&server)
        .await;

    let err = client.claims().statistics().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("Not authenticated".into()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(listener.count(), 1);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .expect(5)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(("A1", "R1")), Arc::default()).await;
    let claims = client.claims();

    let results = futures::future::join_all((0..5).map(|_| claims.statistics())).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(client.session().access_token().await.as_deref(), Some("A2"));
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_failed_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/claims/statistics/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let listener = Arc::new(CountingListener::default());
    let client = client_for(&server, Some(("A1", "R1")), Arc::clone(&listener)).await;
    let claims = client.claims();

    let results = futures::future::join_all((0..4).map(|_| claims.statistics())).await;

    for result in results {
        assert_eq!(result.unwrap_err(), ApiError::SessionExpired("Token expired".into()));
    }
    assert_eq!(listener.count(), 1);
    assert!(client.session().get().await.is_none());
}
