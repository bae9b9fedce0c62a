// src/routes/health.rs
//! API health check endpoint for the Sensorlens backend.
//!
//! This module defines the `/health` route used by container orchestrators
//! and the browser front end to verify that the service is running. It is a
//! sibling module in the `routes` directory and follows the Explicit Module
//! Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the `/health` route

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

/// Handle `GET /health`.
///
/// Reports liveness and the number of sessions currently held in memory.
async fn health(State((store, _)): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: store.len().await,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
