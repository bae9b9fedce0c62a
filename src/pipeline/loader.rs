//! Table loader: CSV bytes in, [`SensorTable`] out.
//!
//! The loader applies the rename map from [`crate::schema`], parses the time
//! column with an ordered list of chrono formats and sorts the rows by time.
//! Nothing is returned unless the whole upload parses.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{Reading, SensorTable, Variable};
use crate::schema::{self, ColumnLayout, DEFAULT_TIME_COLUMN};

// ---

/// Accepted timestamp formats, tried in order.
///
/// Offsets (`%z`, `%:z`, `%+`) are parsed but ignored: the wall-clock time
/// is kept as written. Day-first formats win over month-first ones.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%+",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d",
];

/// Knobs for [`load_csv`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    // ---
    /// Header of the time column.
    pub time_column: String,

    /// chrono format strings tried in order for each time cell.
    pub timestamp_formats: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Parse an uploaded CSV into a time-sorted [`SensorTable`].
pub fn load_csv(bytes: &[u8], options: &LoaderOptions) -> Result<SensorTable> {
    // ---
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let layout = schema::resolve(&headers, &options.time_column)?;

    debug!(
        "Resolved columns: time={} temperature={:?} humidity={:?} pass-through={}",
        layout.time,
        layout.temperature,
        layout.humidity,
        layout.extra.len()
    );

    let mut readings = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        readings.push(parse_row(&record, &layout, i + 1, options)?);
    }

    let extra_columns = layout.extra.iter().map(|(_, name)| name.clone()).collect();
    let table = SensorTable::new(readings, layout.variables(), extra_columns);

    info!(
        "Loaded {} rows with variables {:?}",
        table.len(),
        table.variables()
    );
    Ok(table)
}

/// `row` is the 1-based data row number used in error messages.
fn parse_row(
    record: &StringRecord,
    layout: &ColumnLayout,
    row: usize,
    options: &LoaderOptions,
) -> Result<Reading> {
    // ---
    let raw_time = record.get(layout.time).unwrap_or_default();
    let time = parse_timestamp(raw_time, &options.timestamp_formats).ok_or_else(|| {
        PipelineError::InvalidTimestamp {
            row,
            value: raw_time.to_string(),
            formats: options.timestamp_formats.join(" | "),
        }
    })?;

    let temperature = parse_value(record, layout, Variable::Temperature, row)?;
    let humidity = parse_value(record, layout, Variable::Humidity, row)?;

    let extra = layout
        .extra
        .iter()
        .map(|(idx, _)| record.get(*idx).unwrap_or_default().to_string())
        .collect();

    Ok(Reading {
        time,
        temperature,
        humidity,
        extra,
    })
}

/// Empty cells and `NaN`/infinite values load as missing.
fn parse_value(
    record: &StringRecord,
    layout: &ColumnLayout,
    variable: Variable,
    row: usize,
) -> Result<Option<f64>> {
    // ---
    let Some(idx) = layout.position(variable) else {
        return Ok(None);
    };
    let cell = record.get(idx).unwrap_or_default();
    if cell.is_empty() {
        return Ok(None);
    }

    let value = cell.parse::<f64>().map_err(|_| {
        PipelineError::MalformedCsv(format!(
            "row {row}: {variable} value '{cell}' is not a number"
        ))
    })?;

    Ok(value.is_finite().then_some(value))
}

/// Try each format in order; date-only formats yield midnight.
pub fn parse_timestamp(raw: &str, formats: &[String]) -> Option<NaiveDateTime> {
    // ---
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt).ok().or_else(|| {
            NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::schema::{RAW_HUMIDITY_HEADER, RAW_TEMPERATURE_HEADER};
    use chrono::Timelike;

    fn vendor_csv(rows: &[&str]) -> String {
        let mut out = format!(
            "Time,\"{}\",\"{}\"\n",
            RAW_TEMPERATURE_HEADER.replace('"', "\"\""),
            RAW_HUMIDITY_HEADER.replace('"', "\"\"")
        );
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    fn formats() -> Vec<String> {
        LoaderOptions::default().timestamp_formats
    }

    #[test]
    fn test_vendor_file_loads_sorted() {
        // ---
        let csv = vendor_csv(&[
            "2024-11-05 12:00:00,23.5,55",
            "2024-11-05 10:00:00,21.0,60",
            "2024-11-05 11:00:00,22.0,58",
        ]);
        let table = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.variables(), &[Variable::Temperature, Variable::Humidity]);
        assert_eq!(table.values(Variable::Temperature), vec![21.0, 22.0, 23.5]);
        assert_eq!(table.readings()[0].time.hour(), 10);
    }

    #[test]
    fn test_loading_is_idempotent() {
        // ---
        let csv = vendor_csv(&["2024-11-05 10:00:00,21.0,60", "2024-11-05 09:30:00,20.5,"]);
        let a = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap();
        let b = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_nan_cells_are_missing() {
        // ---
        let csv = vendor_csv(&["2024-11-05 10:00:00,,60", "2024-11-05 11:00:00,NaN,61"]);
        let table = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap();

        assert!(table.readings().iter().all(|r| r.temperature.is_none()));
        assert_eq!(table.values(Variable::Humidity), vec![60.0, 61.0]);
    }

    #[test]
    fn test_missing_time_column_produces_no_table() {
        // ---
        let csv = "temperature,humidity\n21,60\n";
        let err = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        // ---
        let csv = "Time,temperature\n2024-11-05 10:00:00,warm\n";
        let err = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCsv(ref m) if m.contains("warm")));
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        // ---
        let csv = "Time,temperature\n2024-11-05 10:00:00,21,99\n";
        let err = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCsv(_)));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        // ---
        let mut bytes = b"Time,temperature\n2024-11-05 10:00:00,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let err = load_csv(&bytes, &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCsv(_)));
    }

    #[test]
    fn test_bad_timestamp_names_row() {
        // ---
        let csv = "Time,humidity\n2024-11-05 10:00:00,40\nyesterday,41\n";
        let err = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTimestamp { row: 2, ref value, .. } if value == "yesterday"
        ));
    }

    #[test]
    fn test_empty_input_is_missing_column() {
        // ---
        let err = load_csv(b"", &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        // ---
        let table = load_csv(b"Time,temperature,humidity\n", &LoaderOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.variables().len(), 2);
    }

    #[test]
    fn test_pass_through_columns_kept() {
        // ---
        let csv = "Time,temperature,site\n2024-11-05 10:00:00,21,roof\n";
        let table = load_csv(csv.as_bytes(), &LoaderOptions::default()).unwrap();
        assert_eq!(table.extra_columns(), &["site".to_string()]);
        assert_eq!(table.readings()[0].extra, vec!["roof".to_string()]);
    }

    #[test]
    fn test_custom_time_column() {
        // ---
        let options = LoaderOptions {
            time_column: "timestamp".to_string(),
            ..LoaderOptions::default()
        };
        let csv = "timestamp,humidity\n2024-11-05 10:00,40\n";
        let table = load_csv(csv.as_bytes(), &options).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_timestamp_formats() {
        // ---
        let f = formats();
        let expected = NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        for raw in [
            "2024-11-05 14:30:00",
            "2024-11-05T14:30:00",
            "2024-11-05 14:30",
            "2024/11/05 14:30:00",
            "05/11/2024 14:30:00",
            "05/11/2024 14:30",
            "2024-11-05T14:30:00Z",
            "2024-11-05T14:30:00-05:00",
            "2024-11-05 14:30:00-05:00",
        ] {
            assert_eq!(parse_timestamp(raw, &f), Some(expected), "format {raw}");
        }

        let midnight = NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-11-05", &f), Some(midnight));
        assert_eq!(parse_timestamp("", &f), None);
        assert_eq!(parse_timestamp("not a date", &f), None);
    }

    #[test]
    fn test_fractional_seconds() {
        // ---
        let parsed = parse_timestamp("2024-11-05 14:30:00.250", &formats()).unwrap();
        assert_eq!(parsed.nanosecond(), 250_000_000);
    }
}
