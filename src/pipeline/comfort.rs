//! Comfort-zone classification.
//!
//! A row is comfortable when both variables sit inside their fixed ranges
//! (bounds inclusive). A missing value is never in range.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Reading, SensorTable, Variable};

// ---

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortRange {
    pub min: f64,
    pub max: f64,
}

impl ComfortRange {
    // ---
    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.min && v <= self.max)
    }
}

pub const TEMPERATURE_COMFORT: ComfortRange = ComfortRange {
    min: 18.0,
    max: 26.0,
};

pub const HUMIDITY_COMFORT: ComfortRange = ComfortRange {
    min: 30.0,
    max: 70.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortLabel {
    // ---
    pub time: NaiveDateTime,
    pub temp_in_range: bool,
    pub humidity_in_range: bool,
    pub comfort_total: bool,
}

pub fn classify(reading: &Reading) -> ComfortLabel {
    // ---
    let temp_in_range = TEMPERATURE_COMFORT.contains(reading.temperature);
    let humidity_in_range = HUMIDITY_COMFORT.contains(reading.humidity);

    ComfortLabel {
        time: reading.time,
        temp_in_range,
        humidity_in_range,
        comfort_total: temp_in_range && humidity_in_range,
    }
}

/// One label per row, in table order.
pub fn label_rows(table: &SensorTable) -> Vec<ComfortLabel> {
    table.readings().iter().map(classify).collect()
}

/// Share of rows (in percent) inside each comfort range.
///
/// All percentages are `None` for an empty table. A variable the table
/// was loaded without has no percentage, and neither does the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortSummary {
    // ---
    pub rows: usize,
    pub temperature_range: ComfortRange,
    pub humidity_range: ComfortRange,
    pub temperature_pct: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub total_pct: Option<f64>,
}

pub fn summarize_comfort(table: &SensorTable) -> ComfortSummary {
    // ---
    let labels = label_rows(table);
    let rows = labels.len();

    let has_temperature = table.has(Variable::Temperature);
    let has_humidity = table.has(Variable::Humidity);

    let pct = |loaded: bool, hits: usize| {
        (loaded && rows > 0).then(|| hits as f64 * 100.0 / rows as f64)
    };
    let temp_hits = labels.iter().filter(|l| l.temp_in_range).count();
    let humidity_hits = labels.iter().filter(|l| l.humidity_in_range).count();
    let total_hits = labels.iter().filter(|l| l.comfort_total).count();

    ComfortSummary {
        rows,
        temperature_range: TEMPERATURE_COMFORT,
        humidity_range: HUMIDITY_COMFORT,
        temperature_pct: pct(has_temperature, temp_hits),
        humidity_pct: pct(has_humidity, humidity_hits),
        total_pct: pct(has_temperature && has_humidity, total_hits),
    }
}
