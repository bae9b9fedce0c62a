//! Time series handed to the charting layer.
//!
//! The service does not draw. It returns points plus the requested chart
//! kind so any front end can pick a renderer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{SensorTable, Variable};
use crate::pipeline::filter::low_humidity;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Area,
    Bar,
}

/// What to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesView {
    #[default]
    Temperature,
    Humidity,
    /// Both variables, one series each.
    Both,
    /// Humidity readings strictly below 30%.
    LowHumidity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub variable: Variable,
    pub unit: &'static str,
    pub points: Vec<SeriesPoint>,
}

pub fn series(table: &SensorTable, variable: Variable) -> Series {
    // ---
    Series {
        variable,
        unit: variable.unit(),
        points: table
            .readings()
            .iter()
            .map(|r| SeriesPoint {
                time: r.time,
                value: r.value(variable),
            })
            .collect(),
    }
}

/// Series for `view`, skipping variables the table does not carry.
pub fn build_view(table: &SensorTable, view: SeriesView) -> Vec<Series> {
    // ---
    let wanted: &[Variable] = match view {
        SeriesView::Temperature => &[Variable::Temperature],
        SeriesView::Humidity | SeriesView::LowHumidity => &[Variable::Humidity],
        SeriesView::Both => &Variable::ALL,
    };

    let source = match view {
        SeriesView::LowHumidity => low_humidity(table),
        _ => table.clone(),
    };

    wanted
        .iter()
        .filter(|v| source.has(**v))
        .map(|v| series(&source, *v))
        .collect()
}
