//! REST API route handlers.
//!
//! Every handler goes through `RouteService`, which absorbs upstream
//! flakiness via the stale cache. Error mapping: unknown ids and missing
//! plans/airports are 404, a feed outage with no fallback is 502.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use flightnet_core::types::RouteError;

use crate::feeds::unix_now;
use crate::web::AppState;

// ---------------------------------------------------------------------------
// Query param types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"error": "upstream networks unavailable"})),
    )
}

fn route_error(err: RouteError) -> (StatusCode, Json<Value>) {
    let status = match err {
        RouteError::Feed(_) => StatusCode::BAD_GATEWAY,
        RouteError::PlanNotFound
        | RouteError::PilotNotFound
        | RouteError::AirportNotFound => StatusCode::NOT_FOUND,
    };
    (status, Json(json!({"error": err.to_string()})))
}

// ---------------------------------------------------------------------------
// Pilot endpoints
// ---------------------------------------------------------------------------

/// GET /api/pilots — merged listing across both networks.
pub async fn api_pilots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.service.list_pilots(unix_now()).await {
        Ok(listing) => Json(serde_json::to_value(&listing).unwrap_or(json!({}))).into_response(),
        Err(_) => unavailable().into_response(),
    }
}

/// GET /api/pilots/search?query=... — filtered listing.
pub async fn api_pilots_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.query.unwrap_or_default();
    match state.service.search(&query, unix_now()).await {
        Ok(listing) => Json(serde_json::to_value(&listing).unwrap_or(json!({}))).into_response(),
        Err(_) => unavailable().into_response(),
    }
}

/// GET /api/pilots/:id — single pilot snapshot.
pub async fn api_pilot_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.service.find_pilot(id, unix_now()).await {
        Ok(Some(cached)) => Json(json!({
            "pilot": cached.payload,
            "stale": cached.stale,
        }))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "pilot not found"})),
        )
            .into_response(),
        Err(_) => unavailable().into_response(),
    }
}

/// GET /api/pilots/:id/progress — percent of route remaining.
pub async fn api_pilot_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.service.progress(id, unix_now()).await {
        Ok(report) => Json(serde_json::to_value(&report).unwrap_or(json!({}))).into_response(),
        Err(err) => route_error(err).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Route + network endpoints
// ---------------------------------------------------------------------------

/// GET /api/route/:id — constructed route for rendering.
pub async fn api_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.service.construct_route(id, unix_now()).await {
        Ok(route) => Json(serde_json::to_value(&route).unwrap_or(json!({}))).into_response(),
        Err(err) => route_error(err).into_response(),
    }
}

/// GET /api/network/:id — which network an id is connected to.
pub async fn api_network(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.service.which_network(id, unix_now()).await {
        Ok(Some(network)) => Json(json!({
            "network_id": id,
            "network": network,
        }))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "pilot not found"})),
        )
            .into_response(),
        Err(_) => unavailable().into_response(),
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/status — feed cache ages and directory counts.
pub async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = unix_now();
    let service = &state.service;

    Json(json!({
        "vatsim": feed_status(now, service.vatsim.last_fetched(), service.vatsim.ttl()),
        "ivao": feed_status(now, service.ivao.last_fetched(), service.ivao.ttl()),
        "directory": {
            "airports": service.directory.airport_count(),
            "waypoints": service.directory.waypoint_count(),
        },
    }))
}

fn feed_status(now: f64, last_fetched: Option<f64>, ttl: f64) -> Value {
    match last_fetched {
        Some(at) => json!({
            "fetched": true,
            "age_s": now - at,
            "fresh": now - at < ttl,
            "ttl_s": ttl,
        }),
        None => json!({
            "fetched": false,
            "fresh": false,
            "ttl_s": ttl,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
