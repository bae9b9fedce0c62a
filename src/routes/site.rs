//! Static description of the measurement site and sensor.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;
use crate::config::SiteInfo;
use crate::Variable;

#[derive(Serialize)]
struct MeasuredVariable {
    name: &'static str,
    unit: &'static str,
}

#[derive(Serialize)]
struct SiteResponse {
    #[serde(flatten)]
    site: SiteInfo,
    variables: Vec<MeasuredVariable>,
}

async fn site(State((_, config)): State<AppState>) -> Json<SiteResponse> {
    Json(SiteResponse {
        site: config.site,
        variables: Variable::ALL
            .iter()
            .map(|v| MeasuredVariable {
                name: v.name(),
                unit: v.unit(),
            })
            .collect(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/site", get(site))
}
