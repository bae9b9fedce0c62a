//! Range filter and CSV export.

use csv::Writer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{SensorTable, Variable};
use crate::pipeline::comfort::classify;
use crate::schema::DEFAULT_TIME_COLUMN;

// ---

/// Threshold of the "humidity below 30%" preset view.
pub const LOW_HUMIDITY_THRESHOLD: f64 = 30.0;

/// Suggested file name for downloads.
pub const EXPORT_FILE_NAME: &str = "filtered_data.csv";

/// Fractional seconds are written only when present.
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Comparison applied by [`filter_range`]. Both directions are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "gt", alias = "greater_than")]
    GreaterThan,
    #[serde(rename = "lt", alias = "less_than")]
    LessThan,
}

impl Direction {
    // ---
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::GreaterThan => value > threshold,
            Direction::LessThan => value < threshold,
        }
    }
}

/// Rows whose `variable` strictly passes `threshold` in `direction`.
///
/// Rows missing the value never match; order is preserved.
pub fn filter_range(
    table: &SensorTable,
    variable: Variable,
    threshold: f64,
    direction: Direction,
) -> SensorTable {
    // ---
    let subset = table.subset(|r| {
        r.value(variable)
            .is_some_and(|v| direction.matches(v, threshold))
    });
    debug!(
        "Filter {} {:?} {} kept {} of {} rows",
        variable,
        direction,
        threshold,
        subset.len(),
        table.len()
    );
    subset
}

/// Preset view: humidity strictly below 30%.
pub fn low_humidity(table: &SensorTable) -> SensorTable {
    filter_range(
        table,
        Variable::Humidity,
        LOW_HUMIDITY_THRESHOLD,
        Direction::LessThan,
    )
}

/// Serialize `table` as UTF-8 CSV.
///
/// Columns: `Time`, the loaded variables in canonical order, pass-through
/// columns, then the three comfort flags when `include_comfort` is set.
pub fn export_csv(table: &SensorTable, include_comfort: bool) -> Result<Vec<u8>> {
    // ---
    let mut wtr = Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = vec![DEFAULT_TIME_COLUMN];
    header.extend(table.variables().iter().map(|v| v.name()));
    header.extend(table.extra_columns().iter().map(String::as_str));
    if include_comfort {
        header.extend(["temp_in_range", "humidity_in_range", "comfort_total"]);
    }
    wtr.write_record(&header)?;

    for r in table.readings() {
        let mut row = vec![r.time.format(EXPORT_TIME_FORMAT).to_string()];
        row.extend(
            table
                .variables()
                .iter()
                .map(|v| r.value(*v).map(|x| x.to_string()).unwrap_or_default()),
        );
        row.extend(r.extra.iter().cloned());
        if include_comfort {
            let label = classify(r);
            row.extend(
                [label.temp_in_range, label.humidity_in_range, label.comfort_total]
                    .map(|b| b.to_string()),
            );
        }
        wtr.write_record(&row)?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Export(e.to_string()))
}
