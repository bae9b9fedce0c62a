//! Range filter, slider defaults and CSV download.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{session_table, ApiError, AppState, VariableQuery};
use crate::pipeline::{self, Direction, FilterBounds, EXPORT_FILE_NAME};
use crate::{Reading, Variable};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sessions/{id}/filter", get(filter))
        .route("/sessions/{id}/filter/bounds", get(bounds))
        .route("/sessions/{id}/export", get(export))
}

/// Direction defaults to "greater than", the subset the download offers.
#[derive(Debug, Deserialize)]
struct FilterQuery {
    variable: Variable,
    threshold: f64,
    direction: Option<Direction>,
}

/// Selects the same subset as [`FilterQuery`]; `comfort` appends the flag columns.
#[derive(Debug, Deserialize)]
struct ExportQuery {
    variable: Variable,
    threshold: f64,
    direction: Option<Direction>,
    comfort: Option<bool>,
}

#[derive(Debug, Serialize)]
struct FilterResponse {
    variable: Variable,
    threshold: f64,
    direction: Direction,
    count: usize,
    rows: Vec<Reading>,
}

async fn filter(
    Path(id): Path<Uuid>,
    Query(q): Query<FilterQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<FilterResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    let direction = q.direction.unwrap_or_default();
    info!(
        "GET /sessions/{}/filter {} {:?} {}",
        id, q.variable, direction, q.threshold
    );

    let subset = pipeline::filter_range(&table, q.variable, q.threshold, direction);
    Ok(Json(FilterResponse {
        variable: q.variable,
        threshold: q.threshold,
        direction,
        count: subset.len(),
        rows: subset.readings().to_vec(),
    }))
}

async fn bounds(
    Path(id): Path<Uuid>,
    Query(q): Query<VariableQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<FilterBounds>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    info!("GET /sessions/{}/filter/bounds variable={}", id, q.variable);

    Ok(Json(pipeline::filter_bounds(&table, q.variable)))
}

async fn export(
    Path(id): Path<Uuid>,
    Query(q): Query<ExportQuery>,
    State((store, _)): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    let direction = q.direction.unwrap_or_default();

    let subset = pipeline::filter_range(&table, q.variable, q.threshold, direction);
    let bytes = pipeline::export_csv(&subset, q.comfort.unwrap_or(false))?;
    info!(
        "GET /sessions/{}/export - {} rows, {} bytes",
        id,
        subset.len(),
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        bytes,
    ))
}
