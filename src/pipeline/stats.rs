//! Descriptive statistics and correlation.
//!
//! Conventions follow the usual data-frame defaults: sample standard
//! deviation (n - 1) and percentiles by linear interpolation between the
//! closest ranks. Anything that cannot be computed is `None`.

use serde::Serialize;

use crate::models::{SensorTable, Variable};

// ---

/// Qualitative correlation bands.
pub const STRONG_CORRELATION: f64 = 0.7;
pub const MODERATE_CORRELATION: f64 = 0.3;

/// `describe()`-style summary of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    // ---
    pub variable: Variable,

    /// Number of present (non-missing) values.
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Arithmetic mean; `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    // ---
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Percentile of already sorted values, `pct` in `[0, 100]`.
///
/// Uses linear interpolation between nearest ranks.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    // ---
    let n = sorted.len();
    match n {
        0 => None,
        1 => Some(sorted[0]),
        _ => {
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = rank - lower as f64;
            Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
        }
    }
}

/// Summarize the present values of `variable`.
pub fn summarize(table: &SensorTable, variable: Variable) -> SummaryStats {
    // ---
    let mut values = table.values(variable);
    values.sort_by(|a, b| a.total_cmp(b));

    SummaryStats {
        variable,
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        p25: percentile(&values, 25.0),
        p50: percentile(&values, 50.0),
        p75: percentile(&values, 75.0),
        max: values.last().copied(),
    }
}

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    // ---
    /// `|r| > 0.7` strong, `0.3 < |r| <= 0.7` moderate, otherwise weak.
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r > STRONG_CORRELATION {
            CorrelationStrength::Strong
        } else if r > MODERATE_CORRELATION {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

/// Correlation between temperature and humidity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    // ---
    /// Rows where both values are present.
    pub pairs: usize,
    pub coefficient: Option<f64>,
    pub strength: Option<CorrelationStrength>,
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Pearson r over rows where both variables are present.
///
/// `None` with fewer than two pairs or when either side is constant.
pub fn pearson(table: &SensorTable) -> Option<f64> {
    // ---
    let (xs, ys): (Vec<f64>, Vec<f64>) = table
        .readings()
        .iter()
        .filter_map(|r| Some((r.temperature?, r.humidity?)))
        .unzip();

    if xs.len() < 2 || is_constant(&xs) || is_constant(&ys) {
        return None;
    }
    let mx = mean(&xs)?;
    let my = mean(&ys)?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

pub fn correlate(table: &SensorTable) -> Correlation {
    // ---
    let pairs = table
        .readings()
        .iter()
        .filter(|r| r.temperature.is_some() && r.humidity.is_some())
        .count();
    let coefficient = pearson(table);

    Correlation {
        pairs,
        coefficient,
        strength: coefficient.map(CorrelationStrength::from_coefficient),
    }
}

// ---

/// Slider defaults for a range filter: the observed extent and the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterBounds {
    pub variable: Variable,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

pub fn filter_bounds(table: &SensorTable, variable: Variable) -> FilterBounds {
    let stats = summarize(table, variable);
    FilterBounds {
        variable,
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
    }
}

/// Mean/max/min rendered with two decimals and the variable's unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub variable: Variable,
    pub mean: Option<String>,
    pub max: Option<String>,
    pub min: Option<String>,
}

impl HeadlineMetrics {
    // ---
    pub fn from_stats(stats: &SummaryStats) -> Self {
        let unit = stats.variable.unit();
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}{unit}"));
        HeadlineMetrics {
            variable: stats.variable,
            mean: fmt(stats.mean),
            max: fmt(stats.max),
            min: fmt(stats.min),
        }
    }
}
