//! REST and WebSocket API for the gateway

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use peerlink_signaling::router::RouterStatsSnapshot;
use peerlink_signaling::UserHandle;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::GatewayState;

pub mod calls;
pub mod error;
pub mod ws;

pub use error::ApiError;

/// Create the API router
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/call", post(calls::start_call))
        .route("/accept", post(calls::accept_call))
        .route("/reject", post(calls::reject_call))
        .route("/end", post(calls::end_call))
        .route("/calls/:email", get(calls::calls_by_email))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: usize,
    /// Handles with a live connection, sorted
    pub users: Vec<UserHandle>,
    pub routing: RouterStatsSnapshot,
}

async fn stats(State(state): State<GatewayState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connections: state.registry.len(),
        users: state.registry.handles(),
        routing: state.router.stats(),
    })
}
