//! `/search-logs` routes

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use searchlog_core::normalize_query;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::client_key::ClientKey;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SubmitSearchRequest {
    pub query_text: String,
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub query_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub query_text: String,
    pub count: i64,
}

/// Build the search log router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search-logs", post(submit_search))
        .route("/search-logs/count", get(search_count))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accept a submission; 202 once it is recorded as the client's latest query
async fn submit_search(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
    payload: Result<Json<SubmitSearchRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let started = Instant::now();

    let result = match payload {
        Ok(Json(request)) => state
            .coordinator
            .log_search(&client_key, &request.query_text)
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    };

    let label = match &result {
        Ok(()) => "accepted",
        Err(e) if e.status().is_client_error() => "rejected",
        Err(_) => "failed",
    };
    state.metrics.record_submission(label);
    state
        .metrics
        .record_request_duration("submit", started.elapsed().as_secs_f64());

    result.map(|()| StatusCode::ACCEPTED)
}

async fn search_count(
    State(state): State<AppState>,
    params: Result<Query<CountParams>, QueryRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let started = Instant::now();

    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let result = state.coordinator.get_count_by_text(&params.query_text).await;

    state
        .metrics
        .record_request_duration("count", started.elapsed().as_secs_f64());

    Ok(Json(CountResponse {
        query_text: normalize_query(&params.query_text),
        count: result?,
    }))
}
