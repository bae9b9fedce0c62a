//! Pure analysis pipeline over an immutable [`SensorTable`].
//!
//! Gateway module (EMBP): siblings stay private to the crate layout and the
//! public surface is re-exported here. Every function is synchronous and
//! deterministic; nothing in this tree performs I/O beyond reading the
//! uploaded bytes.
//!
//! [`SensorTable`]: crate::models::SensorTable

mod comfort;
mod filter;
mod loader;
mod outliers;
mod series;
mod stats;
mod temporal;

pub use comfort::{
    classify, label_rows, summarize_comfort, ComfortLabel, ComfortRange, ComfortSummary,
    HUMIDITY_COMFORT, TEMPERATURE_COMFORT,
};
pub use filter::{
    export_csv, filter_range, low_humidity, Direction, EXPORT_FILE_NAME, LOW_HUMIDITY_THRESHOLD,
};
pub use loader::{load_csv, parse_timestamp, LoaderOptions, DEFAULT_TIMESTAMP_FORMATS};
pub use outliers::{detect_anomalies, Anomaly, AnomalySet, SIGMA_FACTOR};
pub use series::{build_view, series, ChartKind, Series, SeriesPoint, SeriesView};
pub use stats::{
    correlate, filter_bounds, pearson, percentile, summarize, Correlation, CorrelationStrength,
    FilterBounds, HeadlineMetrics, SummaryStats,
};
pub use temporal::{hourly_profile, profile, rolling_mean, Bucket, Grouping, Profile, RollingPoint};
