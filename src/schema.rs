//! Column schema for uploaded sensor files.
//!
//! Vendor exports label the measured variables with a device selector
//! embedded in the header. Exactly two such headers are recognized and
//! renamed to the canonical `temperature`/`humidity`; the canonical names
//! are accepted as-is so exported files load back. Any other header is
//! carried through untouched.

use csv::StringRecord;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::Variable;

// ---

/// Vendor header for the temperature series.
pub const RAW_TEMPERATURE_HEADER: &str = r#"temperatura1 {device="ESP32", name="Final_IOT"}"#;

/// Vendor header for the humidity series.
pub const RAW_HUMIDITY_HEADER: &str = r#"humedad1 {device="ESP32", name="Final_IOT"}"#;

/// Header of the time column in vendor exports.
pub const DEFAULT_TIME_COLUMN: &str = "Time";

/// Map a header to the variable it names, applying the rename map.
pub fn canonical_variable(header: &str) -> Option<Variable> {
    // ---
    match header.trim() {
        RAW_TEMPERATURE_HEADER | "temperature" => Some(Variable::Temperature),
        RAW_HUMIDITY_HEADER | "humidity" => Some(Variable::Humidity),
        _ => None,
    }
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    // ---
    pub time: usize,
    pub temperature: Option<usize>,
    pub humidity: Option<usize>,

    /// Pass-through columns as `(position, header)`.
    pub extra: Vec<(usize, String)>,
}

impl ColumnLayout {
    // ---
    pub fn variables(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        if self.temperature.is_some() {
            out.push(Variable::Temperature);
        }
        if self.humidity.is_some() {
            out.push(Variable::Humidity);
        }
        out
    }

    pub fn position(&self, variable: Variable) -> Option<usize> {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
        }
    }
}

fn expected_columns(time_column: &str) -> String {
    format!(
        "'{time_column}' plus '{RAW_TEMPERATURE_HEADER}' (or 'temperature') and/or \
         '{RAW_HUMIDITY_HEADER}' (or 'humidity')"
    )
}

/// Resolve the header row into a [`ColumnLayout`].
///
/// The configured `time_column` wins; without it the canonical
/// [`DEFAULT_TIME_COLUMN`] is taken, which is what exports write.
///
/// Fails with [`PipelineError::MissingColumn`] when the time column is
/// absent or neither variable is present, and with
/// [`PipelineError::MalformedCsv`] when a column is named twice.
pub fn resolve(headers: &StringRecord, time_column: &str) -> Result<ColumnLayout> {
    // ---
    let mut time = None;
    let mut temperature = None;
    let mut humidity = None;
    let mut extra = Vec::new();

    let time_header = if headers.iter().any(|h| h.trim() == time_column) {
        time_column
    } else {
        DEFAULT_TIME_COLUMN
    };

    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim();

        if header == time_header {
            if time.replace(idx).is_some() {
                return Err(PipelineError::MalformedCsv(format!(
                    "duplicate time column '{time_header}'"
                )));
            }
            continue;
        }

        let slot = match canonical_variable(header) {
            Some(Variable::Temperature) => &mut temperature,
            Some(Variable::Humidity) => &mut humidity,
            None => {
                extra.push((idx, header.to_string()));
                continue;
            }
        };
        if slot.replace(idx).is_some() {
            return Err(PipelineError::MalformedCsv(format!(
                "more than one column maps to '{}'",
                canonical_variable(header).map(|v| v.name()).unwrap_or(header)
            )));
        }
        debug!("Column {} '{}' mapped to canonical name", idx, header);
    }

    let Some(time) = time else {
        return Err(PipelineError::MissingColumn {
            missing: time_column.to_string(),
            expected: expected_columns(time_column),
        });
    };

    if temperature.is_none() && humidity.is_none() {
        return Err(PipelineError::MissingColumn {
            missing: "temperature and humidity".to_string(),
            expected: expected_columns(time_column),
        });
    }

    Ok(ColumnLayout {
        time,
        temperature,
        humidity,
        extra,
    })
}
