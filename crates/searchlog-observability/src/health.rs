//! Health endpoints
//!
//! - `/healthz` - Liveness probe (200 while the process serves requests)
//! - `/readyz` - Readiness probe (checks cache and store reachability)
//! - `/metrics` - Prometheus metrics endpoint

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::TextEncoder;
use searchlog_core::{ClientQueryCache, DebounceCoordinator, SearchLogStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::Metrics;

/// Key and text used by readiness probes; never written
const PROBE_KEY: &str = "__searchlog_readyz__";

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub components: Vec<ComponentStatus>,
}

/// One backend's status in a readiness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentStatus {
    fn from_result<T>(name: &str, result: searchlog_core::Result<T>) -> Self {
        match result {
            Ok(_) => Self {
                name: name.to_string(),
                healthy: true,
                error: None,
            },
            Err(e) => Self {
                name: name.to_string(),
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Readiness checker trait
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn check(&self) -> Vec<ComponentStatus>;
}

/// Readiness from a read against each backend
pub struct BackendReadiness {
    cache: Arc<dyn ClientQueryCache>,
    store: Arc<dyn SearchLogStore>,
}

impl BackendReadiness {
    pub fn new(cache: Arc<dyn ClientQueryCache>, store: Arc<dyn SearchLogStore>) -> Self {
        Self { cache, store }
    }
}

#[async_trait]
impl ReadinessChecker for BackendReadiness {
    async fn check(&self) -> Vec<ComponentStatus> {
        let (cache, store) = tokio::join!(
            self.cache.get(PROBE_KEY),
            self.store.get_by_text(PROBE_KEY)
        );
        vec![
            ComponentStatus::from_result("cache", cache),
            ComponentStatus::from_result("store", store),
        ]
    }
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub metrics: Arc<Metrics>,
    pub readiness_checker: Option<Arc<dyn ReadinessChecker>>,
    /// Source for the in-flight decisions gauge
    pub coordinator: Option<DebounceCoordinator>,
}

impl HealthState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            readiness_checker: None,
            coordinator: None,
        }
    }

    pub fn with_readiness_checker(mut self, checker: Arc<dyn ReadinessChecker>) -> Self {
        self.readiness_checker = Some(checker);
        self
    }

    pub fn with_coordinator(mut self, coordinator: DebounceCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// 200 when every component is healthy, 503 otherwise
async fn readyz(State(state): State<HealthState>) -> Response {
    let components = match &state.readiness_checker {
        Some(checker) => checker.check().await,
        None => Vec::new(),
    };

    if components.iter().all(|c| c.healthy) {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
                components,
            }),
        )
            .into_response()
    } else {
        for component in components.iter().filter(|c| !c.healthy) {
            tracing::warn!(
                component = %component.name,
                error = component.error.as_deref().unwrap_or(""),
                "Readiness check failed"
            );
        }
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready".to_string(),
                components,
            }),
        )
            .into_response()
    }
}

async fn metrics_handler(State(state): State<HealthState>) -> Response {
    if let Some(coordinator) = &state.coordinator {
        state.metrics.set_decisions_in_flight(coordinator.in_flight());
    }

    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use searchlog_core::{ClientQueryEntry, DebounceConfig, Error, Result, SearchLogRecord};
    use searchlog_storage::{MemoryQueryCache, MemorySearchLogStore};
    use std::time::Duration;
    use tower::ServiceExt; // for oneshot

    struct DownCache;

    #[async_trait]
    impl ClientQueryCache for DownCache {
        async fn get(&self, _key: &str) -> Result<Option<ClientQueryEntry>> {
            Err(Error::Cache("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _entry: &ClientQueryEntry, _ttl: Duration) -> Result<()> {
            Err(Error::Cache("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::Cache("connection refused".to_string()))
        }
    }

    struct UpStore;

    #[async_trait]
    impl SearchLogStore for UpStore {
        async fn increment_and_get(&self, query_text: &str) -> Result<SearchLogRecord> {
            Ok(SearchLogRecord::first(query_text, chrono::Utc::now()))
        }

        async fn get_by_text(&self, _query_text: &str) -> Result<Option<SearchLogRecord>> {
            Ok(None)
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = health_router(HealthState::new(Arc::new(Metrics::new().unwrap())));
        let response = get(app, "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_readyz_without_checker() {
        let app = health_router(HealthState::new(Arc::new(Metrics::new().unwrap())));
        let response = get(app, "/readyz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_with_healthy_backends() {
        let checker = Arc::new(BackendReadiness::new(
            Arc::new(MemoryQueryCache::new()),
            Arc::new(MemorySearchLogStore::new()),
        ));
        let state =
            HealthState::new(Arc::new(Metrics::new().unwrap())).with_readiness_checker(checker);

        let response = get(health_router(state), "/readyz").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["components"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_readyz_with_failing_cache() {
        let checker = Arc::new(BackendReadiness::new(Arc::new(DownCache), Arc::new(UpStore)));
        let state =
            HealthState::new(Arc::new(Metrics::new().unwrap())).with_readiness_checker(checker);

        let response = get(health_router(state), "/readyz").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["components"][0]["name"], "cache");
        assert_eq!(body["components"][0]["healthy"], false);
        assert_eq!(body["components"][1]["healthy"], true);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reports_in_flight() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let coordinator = DebounceCoordinator::new(
            Arc::new(MemoryQueryCache::new()),
            Arc::new(MemorySearchLogStore::new()),
            DebounceConfig::default(),
        );
        coordinator.log_search("client-a", "cats").await.unwrap();

        let state = HealthState::new(metrics).with_coordinator(coordinator);
        let response = get(health_router(state), "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("searchlog_decisions_in_flight 1"));
    }
}
