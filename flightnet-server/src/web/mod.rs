//! Web server: axum JSON API over the route service.
//!
//! CORS is wide open; the map front end is served from elsewhere and only
//! ever reads.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::service::RouteService;

pub mod routes;

pub struct AppState {
    pub service: RouteService,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/pilots", axum::routing::get(routes::api_pilots))
        .route(
            "/api/pilots/search",
            axum::routing::get(routes::api_pilots_search),
        )
        .route(
            "/api/pilots/:id",
            axum::routing::get(routes::api_pilot_detail),
        )
        .route(
            "/api/pilots/:id/progress",
            axum::routing::get(routes::api_pilot_progress),
        )
        .route("/api/route/:id", axum::routing::get(routes::api_route))
        .route("/api/network/:id", axum::routing::get(routes::api_network))
        .route("/api/status", axum::routing::get(routes::api_status))
        .with_state(state)
        .layer(cors)
}

/// Start the web server.
pub async fn serve(state: Arc<AppState>, host: String, port: u16) {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    tracing::info!("flightnet API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
