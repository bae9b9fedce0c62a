//! Session lifecycle: upload a CSV, page through its rows, close it.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{session_table, ApiError, AppState};
use crate::{pipeline, Reading, Variable};

// ---

/// Default page size for `GET /sessions/{id}/readings`.
const DEFAULT_PAGE_LIMIT: usize = 1000;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sessions", post(upload))
        .route("/sessions/{id}", delete(close))
        .route("/sessions/{id}/readings", get(readings))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    session_id: Uuid,
    rows: usize,
    variables: Vec<Variable>,
    extra_columns: Vec<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

async fn upload(
    State((store, config)): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("POST /sessions - {} bytes", body.len());

    let table = pipeline::load_csv(&body, &config.loader)?;
    let rows = table.len();
    let variables = table.variables().to_vec();
    let extra_columns = table.extra_columns().to_vec();
    let range = table.time_range();

    let response = UploadResponse {
        session_id: store.insert(table).await,
        rows,
        variables,
        extra_columns,
        start: range.map(|(start, _)| start),
        end: range.map(|(_, end)| end),
    };

    info!(
        "POST /sessions - session {} holds {} rows",
        response.session_id, response.rows
    );
    Ok((StatusCode::CREATED, Json(response)))
}

async fn close(
    Path(id): Path<Uuid>,
    State((store, _)): State<AppState>,
) -> Result<StatusCode, ApiError> {
    // ---
    info!("DELETE /sessions/{}", id);
    if store.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ReadingsPage {
    total: usize,
    offset: usize,
    rows: Vec<Reading>,
}

async fn readings(
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<ReadingsPage>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    let offset = page.offset.unwrap_or(0);
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    debug!("GET /sessions/{}/readings offset={} limit={}", id, offset, limit);

    let rows = table
        .readings()
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(ReadingsPage {
        total: table.len(),
        offset,
        rows,
    }))
}
