//! Two-sigma anomaly detection.
//!
//! Mean and standard deviation come from the whole table for the variable,
//! not from a rolling window. Without a standard deviation (fewer than two
//! values) nothing is flagged.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{SensorTable, Variable};
use crate::pipeline::stats::{mean, sample_std};

// ---

/// Distance from the mean, in standard deviations, beyond which a value is flagged.
pub const SIGMA_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Row position in the table.
    pub index: usize,
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySet {
    // ---
    pub variable: Variable,
    pub mean: Option<f64>,
    pub std: Option<f64>,

    /// `mean - 2·std` and `mean + 2·std`.
    pub lower: Option<f64>,
    pub upper: Option<f64>,

    pub count: usize,
    pub anomalies: Vec<Anomaly>,
}

/// Rows where `|value - mean| > 2·std` for `variable`.
pub fn detect_anomalies(table: &SensorTable, variable: Variable) -> AnomalySet {
    // ---
    let values = table.values(variable);
    let mean = mean(&values);
    let std = sample_std(&values);

    let anomalies: Vec<Anomaly> = match (mean, std) {
        (Some(m), Some(s)) => table
            .readings()
            .iter()
            .enumerate()
            .filter_map(|(index, r)| {
                let value = r.value(variable)?;
                ((value - m).abs() > SIGMA_FACTOR * s).then_some(Anomaly {
                    index,
                    time: r.time,
                    value,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    let band = mean.zip(std);
    AnomalySet {
        variable,
        mean,
        std,
        lower: band.map(|(m, s)| m - SIGMA_FACTOR * s),
        upper: band.map(|(m, s)| m + SIGMA_FACTOR * s),
        count: anomalies.len(),
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::pipeline::test_support::table;

    fn spiky() -> SensorTable {
        // ten calm readings and one spike in each variable
        let mut rows: Vec<(u32, Option<f64>, Option<f64>)> = (0..10u32)
            .map(|h| (h, Some(21.0 + (h % 2) as f64 * 0.5), Some(50.0)))
            .collect();
        rows.push((10, Some(35.0), Some(50.0)));
        rows.push((11, Some(21.0), Some(5.0)));
        table(&rows)
    }

    #[test]
    fn test_spikes_flagged_per_variable() {
        // ---
        let t = spiky();

        let temp = detect_anomalies(&t, Variable::Temperature);
        assert_eq!(temp.count, 1);
        assert_eq!(temp.anomalies[0].index, 10);
        assert_eq!(temp.anomalies[0].value, 35.0);

        let hum = detect_anomalies(&t, Variable::Humidity);
        assert_eq!(hum.count, 1);
        assert_eq!(hum.anomalies[0].index, 11);
    }

    #[test]
    fn test_membership_matches_two_sigma_rule() {
        // ---
        let t = spiky();
        for variable in Variable::ALL {
            let set = detect_anomalies(&t, variable);
            let (m, s) = (set.mean.unwrap(), set.std.unwrap());

            for (i, r) in t.readings().iter().enumerate() {
                let v = r.value(variable).unwrap();
                let flagged = set.anomalies.iter().any(|a| a.index == i);
                assert_eq!(flagged, (v - m).abs() > 2.0 * s, "row {i} {variable}");
            }
            assert!(set.lower.unwrap() < m && m < set.upper.unwrap());
        }
    }

    #[test]
    fn test_fewer_than_two_values_reports_none() {
        // ---
        let set = detect_anomalies(&table(&[(0, Some(99.0), None)]), Variable::Temperature);
        assert_eq!(set.std, None);
        assert_eq!(set.count, 0);
        assert_eq!(set.lower, None);

        let empty = detect_anomalies(&table(&[]), Variable::Humidity);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn test_constant_column_has_no_anomalies() {
        // ---
        let t = table(&[(0, Some(22.0), None), (1, Some(22.0), None), (2, Some(22.0), None)]);
        let set = detect_anomalies(&t, Variable::Temperature);
        assert_eq!(set.std, Some(0.0));
        assert_eq!(set.count, 0);
    }
}
