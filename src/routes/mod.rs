//! HTTP gateway (EMBP): merges the sibling subrouters and owns the shared
//! state type, request helpers and the error-to-response mapping.
//!
//! Handlers are thin: extract parameters, fetch the session table, call one
//! pipeline function, serialize the result.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{Config, PipelineError, SensorTable, SessionStore, Variable};

mod analysis;
mod filter;
mod health;
mod sessions;
mod site;

// ---

/// State shared by every route.
pub type AppState = (Arc<SessionStore>, Config);

pub fn router(store: Arc<SessionStore>, config: Config) -> Router {
    // ---
    let body_limit = config.max_upload_bytes;

    Router::new()
        .merge(sessions::router())
        .merge(analysis::router())
        .merge(filter::router())
        .merge(site::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state((store, config))
}

// ---

/// Errors returned by handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    // ---
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Session {0} not found or expired; upload the file again")]
    SessionNotFound(Uuid),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(PipelineError::InvalidWindow) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("{} - {}", status, message);
        } else {
            warn!("{} - {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ---

/// `?variable=temperature|humidity`
#[derive(Debug, Deserialize)]
pub(crate) struct VariableQuery {
    pub variable: Variable,
}

/// Fetch the table of a live session.
pub(crate) async fn session_table(
    store: &SessionStore,
    id: Uuid,
) -> Result<Arc<SensorTable>, ApiError> {
    store.get(&id).await.ok_or(ApiError::SessionNotFound(id))
}
