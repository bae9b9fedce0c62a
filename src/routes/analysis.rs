//! Read-only analyses of a session table: chart series, statistics,
//! correlation, temporal profiles, anomalies and comfort.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{session_table, ApiError, AppState, VariableQuery};
use crate::pipeline::{
    self, AnomalySet, Bucket, ChartKind, ComfortLabel, ComfortSummary, Correlation, Direction,
    Grouping, HeadlineMetrics, Profile, RollingPoint, Series, SeriesView, SummaryStats,
};
use crate::{SensorTable, Variable};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sessions/{id}/series", get(series))
        .route("/sessions/{id}/stats", get(stats))
        .route("/sessions/{id}/correlation", get(correlation))
        .route("/sessions/{id}/profile", get(profile))
        .route("/sessions/{id}/profile/hourly", get(hourly_slots))
        .route("/sessions/{id}/rolling", get(rolling))
        .route("/sessions/{id}/anomalies", get(anomalies))
        .route("/sessions/{id}/comfort", get(comfort))
}

// ---

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    view: Option<SeriesView>,
    chart: Option<ChartKind>,
}

#[derive(Debug, Serialize)]
struct SeriesResponse {
    view: SeriesView,
    chart: ChartKind,
    series: Vec<Series>,
}

async fn series(
    Path(id): Path<Uuid>,
    Query(q): Query<SeriesQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<SeriesResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    let view = q.view.unwrap_or_default();
    let chart = q.chart.unwrap_or_default();
    info!("GET /sessions/{}/series view={:?} chart={:?}", id, view, chart);

    match view {
        SeriesView::Temperature => table.require(Variable::Temperature)?,
        SeriesView::Humidity | SeriesView::LowHumidity => table.require(Variable::Humidity)?,
        SeriesView::Both => {}
    }

    Ok(Json(SeriesResponse {
        view,
        chart,
        series: pipeline::build_view(&table, view),
    }))
}

// ---

/// Statistics of one variable, optionally over a filtered subset of rows.
#[derive(Debug, Deserialize)]
struct StatsQuery {
    variable: Variable,
    threshold: Option<f64>,
    direction: Option<Direction>,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    stats: SummaryStats,
    headline: HeadlineMetrics,
}

async fn stats(
    Path(id): Path<Uuid>,
    Query(q): Query<StatsQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    info!(
        "GET /sessions/{}/stats variable={} threshold={:?}",
        id, q.variable, q.threshold
    );

    let filtered: SensorTable;
    let source = match q.threshold {
        Some(threshold) => {
            let direction = q.direction.unwrap_or_default();
            filtered = pipeline::filter_range(&table, q.variable, threshold, direction);
            &filtered
        }
        None => table.as_ref(),
    };

    let stats = pipeline::summarize(source, q.variable);
    let headline = HeadlineMetrics::from_stats(&stats);
    Ok(Json(StatsResponse { stats, headline }))
}

async fn correlation(
    Path(id): Path<Uuid>,
    State((store, _)): State<AppState>,
) -> Result<Json<Correlation>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    for variable in Variable::ALL {
        table.require(variable)?;
    }
    info!("GET /sessions/{}/correlation", id);

    Ok(Json(pipeline::correlate(&table)))
}

// ---

#[derive(Debug, Deserialize)]
struct ProfileQuery {
    by: Option<Grouping>,
}

async fn profile(
    Path(id): Path<Uuid>,
    Query(q): Query<ProfileQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    let grouping = q.by.unwrap_or_default();
    info!("GET /sessions/{}/profile by={:?}", id, grouping);

    Ok(Json(pipeline::profile(&table, grouping)))
}

#[derive(Debug, Serialize)]
struct SlotsResponse {
    grouping: Grouping,
    slots: Vec<Bucket>,
}

/// All 24 hours, empty ones marked with `count: 0` and null means.
async fn hourly_slots(
    Path(id): Path<Uuid>,
    State((store, _)): State<AppState>,
) -> Result<Json<SlotsResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    info!("GET /sessions/{}/profile/hourly", id);

    let profile = pipeline::hourly_profile(&table);
    Ok(Json(SlotsResponse {
        grouping: profile.grouping,
        slots: profile.slots(),
    }))
}

#[derive(Debug, Deserialize)]
struct RollingQuery {
    variable: Variable,
    window: usize,
}

#[derive(Debug, Serialize)]
struct RollingResponse {
    variable: Variable,
    window: usize,
    points: Vec<RollingPoint>,
}

async fn rolling(
    Path(id): Path<Uuid>,
    Query(q): Query<RollingQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<RollingResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    info!(
        "GET /sessions/{}/rolling variable={} window={}",
        id, q.variable, q.window
    );

    let points = pipeline::rolling_mean(&table, q.variable, q.window)?;
    Ok(Json(RollingResponse {
        variable: q.variable,
        window: q.window,
        points,
    }))
}

// ---

async fn anomalies(
    Path(id): Path<Uuid>,
    Query(q): Query<VariableQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<AnomalySet>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    table.require(q.variable)?;
    info!("GET /sessions/{}/anomalies variable={}", id, q.variable);

    Ok(Json(pipeline::detect_anomalies(&table, q.variable)))
}

#[derive(Debug, Deserialize)]
struct ComfortQuery {
    labels: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ComfortResponse {
    summary: ComfortSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<ComfortLabel>>,
}

async fn comfort(
    Path(id): Path<Uuid>,
    Query(q): Query<ComfortQuery>,
    State((store, _)): State<AppState>,
) -> Result<Json<ComfortResponse>, ApiError> {
    // ---
    let table = session_table(&store, id).await?;
    info!("GET /sessions/{}/comfort", id);

    let labels = q
        .labels
        .unwrap_or(false)
        .then(|| pipeline::label_rows(&table));

    Ok(Json(ComfortResponse {
        summary: pipeline::summarize_comfort(&table),
        labels,
    }))
}
