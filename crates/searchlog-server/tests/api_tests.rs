//! Router tests over in-memory backends

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use searchlog_core::{DebounceConfig, DebounceCoordinator, MonotonicClock};
use searchlog_observability::Metrics;
use searchlog_server::{AppState, router};
use searchlog_storage::{MemoryQueryCache, MemorySearchLogStore};
use tower::ServiceExt; // for oneshot

struct TestApp {
    app: Router,
    coordinator: DebounceCoordinator,
    metrics: Arc<Metrics>,
}

fn test_app() -> TestApp {
    let cache = Arc::new(MemoryQueryCache::new());
    let store = Arc::new(MemorySearchLogStore::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let config = DebounceConfig::new(Duration::from_secs(3), Duration::from_secs(30)).unwrap();

    let coordinator = DebounceCoordinator::new(cache, store, config)
        .with_clock(Arc::new(MonotonicClock::new()))
        .with_observer(metrics.clone());
    let app = router(AppState::new(coordinator.clone(), metrics.clone()));

    TestApp {
        app,
        coordinator,
        metrics,
    }
}

fn submit(client_id: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/search-logs")
        .header("content-type", "application/json")
        .header("x-client-id", client_id)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn count(query_text: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/search-logs/count?query_text={}", query_text))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_submit_returns_accepted_and_counts_after_delay() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(submit("device-1", r#"{"query_text": "  Rust Async "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = t.app.clone().oneshot(count("rust%20async")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 0);

    assert!(t.coordinator.wait_idle(Duration::from_secs(10)).await);

    let response = t.app.clone().oneshot(count("RUST%20ASYNC")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["query_text"], "rust async");
    assert_eq!(body["count"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_typing_sequence_counts_final_query_only() {
    let t = test_app();

    for text in ["r", "ru", "rus", "rust"] {
        let body = format!(r#"{{"query_text": "{}"}}"#, text);
        let response = t.app.clone().oneshot(submit("device-1", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        tokio::time::advance(Duration::from_millis(150)).await;
    }
    assert!(t.coordinator.wait_idle(Duration::from_secs(10)).await);

    for (text, expected) in [("rust", 1), ("rus", 0), ("ru", 0), ("r", 0)] {
        let response = t.app.clone().oneshot(count(text)).await.unwrap();
        assert_eq!(body_json(response).await["count"], expected, "count for {text}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_malformed_json_is_bad_request() {
    let t = test_app();

    let response = t
        .app
        .clone()
        .oneshot(submit("device-1", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(t.coordinator.in_flight(), 0);

    let response = t
        .app
        .clone()
        .oneshot(submit("device-1", r#"{"text": "wrong field"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_missing_client_identity_is_bad_request() {
    let t = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/search-logs")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query_text": "cats"}"#))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Unable to determine client identity"
    );
}

#[tokio::test(start_paused = true)]
async fn test_peer_address_identifies_client() {
    let t = test_app();
    let peer: SocketAddr = "192.0.2.10:50000".parse().unwrap();

    let mut request = Request::builder()
        .method("POST")
        .uri("/search-logs")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query_text": "cats"}"#))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(t.coordinator.in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forwarded_for_distinguishes_clients() {
    let t = test_app();

    for ip in ["203.0.113.7", "203.0.113.8"] {
        let request = Request::builder()
            .method("POST")
            .uri("/search-logs")
            .header("content-type", "application/json")
            .header("x-forwarded-for", format!("{}, 10.0.0.1", ip))
            .body(Body::from(r#"{"query_text": "cats"}"#))
            .unwrap();
        let response = t.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    assert!(t.coordinator.wait_idle(Duration::from_secs(10)).await);

    let response = t.app.clone().oneshot(count("cats")).await.unwrap();
    assert_eq!(body_json(response).await["count"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_count_requires_query_text() {
    let t = test_app();

    let response = t.app.clone().oneshot(count("%20%20")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/search-logs/count")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_submission_metrics() {
    let t = test_app();

    t.app
        .clone()
        .oneshot(submit("device-1", r#"{"query_text": "cats"}"#))
        .await
        .unwrap();
    t.app
        .clone()
        .oneshot(submit("device-1", "{oops"))
        .await
        .unwrap();
    assert!(t.coordinator.wait_idle(Duration::from_secs(10)).await);

    let accepted = t
        .metrics
        .submissions_total
        .with_label_values(&["accepted"])
        .get();
    let rejected = t
        .metrics
        .submissions_total
        .with_label_values(&["rejected"])
        .get();
    let persisted = t
        .metrics
        .decisions_total
        .with_label_values(&["persisted"])
        .get();

    assert_eq!(accepted, 1.0);
    assert_eq!(rejected, 1.0);
    assert_eq!(persisted, 1.0);
}
