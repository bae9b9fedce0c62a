//! Temporal aggregation: cyclic per-bucket means and rolling means.
//!
//! Timestamps are grouped exactly as stored; no timezone conversion.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::{SensorTable, Variable};

// ---

/// Calendar component used as the bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Hour of day, 0-23.
    #[default]
    Hour,
    /// ISO weekday, Monday = 0 through Sunday = 6.
    Weekday,
    /// Calendar month, 1-12.
    Month,
}

impl Grouping {
    // ---
    pub fn key(self, time: &NaiveDateTime) -> u32 {
        match self {
            Grouping::Hour => time.hour(),
            Grouping::Weekday => time.weekday().num_days_from_monday(),
            Grouping::Month => time.month(),
        }
    }

    /// Every possible key for this grouping.
    pub fn keys(self) -> Range<u32> {
        match self {
            Grouping::Hour => 0..24,
            Grouping::Weekday => 0..7,
            Grouping::Month => 1..13,
        }
    }
}

/// Means of one bucket. A variable with no values in the bucket is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    // ---
    pub key: u32,
    pub count: usize,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// Buckets that received at least one row, sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub grouping: Grouping,
    pub buckets: Vec<Bucket>,
}

impl Profile {
    // ---
    /// One entry per possible key. Keys without rows have `count == 0` and
    /// `None` means so charts draw a gap.
    pub fn slots(&self) -> Vec<Bucket> {
        // ---
        self.grouping
            .keys()
            .map(|key| {
                self.buckets
                    .iter()
                    .find(|b| b.key == key)
                    .cloned()
                    .unwrap_or(Bucket {
                        key,
                        count: 0,
                        temperature: None,
                        humidity: None,
                    })
            })
            .collect()
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    temperature: (f64, usize),
    humidity: (f64, usize),
}

fn ratio((sum, n): (f64, usize)) -> Option<f64> {
    (n > 0).then(|| sum / n as f64)
}

/// Mean temperature and humidity per bucket of `grouping`.
pub fn profile(table: &SensorTable, grouping: Grouping) -> Profile {
    // ---
    let mut acc: BTreeMap<u32, Accumulator> = BTreeMap::new();

    for r in table.readings() {
        let entry = acc.entry(grouping.key(&r.time)).or_default();
        entry.count += 1;
        if let Some(t) = r.temperature {
            entry.temperature.0 += t;
            entry.temperature.1 += 1;
        }
        if let Some(h) = r.humidity {
            entry.humidity.0 += h;
            entry.humidity.1 += 1;
        }
    }

    let buckets = acc
        .into_iter()
        .map(|(key, a)| Bucket {
            key,
            count: a.count,
            temperature: ratio(a.temperature),
            humidity: ratio(a.humidity),
        })
        .collect();

    Profile { grouping, buckets }
}

/// Hour-of-day profile, at most 24 buckets.
pub fn hourly_profile(table: &SensorTable) -> Profile {
    profile(table, Grouping::Hour)
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub time: NaiveDateTime,
    pub value: Option<f64>,
}

/// Trailing mean over `window` rows.
///
/// The first `window - 1` points, and any window containing a missing
/// value, are `None`.
pub fn rolling_mean(
    table: &SensorTable,
    variable: Variable,
    window: usize,
) -> Result<Vec<RollingPoint>> {
    // ---
    if window == 0 {
        return Err(PipelineError::InvalidWindow);
    }

    let values: Vec<Option<f64>> = table.readings().iter().map(|r| r.value(variable)).collect();

    let means = values.windows(window).map(|w| {
        w.iter()
            .copied()
            .sum::<Option<f64>>()
            .map(|sum| sum / window as f64)
    });

    let padded = std::iter::repeat(None)
        .take(window.saturating_sub(1).min(values.len()))
        .chain(means);

    Ok(table
        .readings()
        .iter()
        .zip(padded)
        .map(|(r, value)| RollingPoint {
            time: r.time,
            value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::pipeline::test_support::table;

    #[test]
    fn test_hourly_means() {
        // ---
        // offsets are hours from midnight; 24 wraps to hour 0 next day
        let t = table(&[
            (0, Some(10.0), Some(50.0)),
            (24, Some(20.0), Some(70.0)),
            (13, Some(30.0), None),
        ]);
        let p = hourly_profile(&t);

        assert_eq!(p.buckets.len(), 2);
        assert_eq!(p.buckets[0].key, 0);
        assert_eq!(p.buckets[0].count, 2);
        assert_eq!(p.buckets[0].temperature, Some(15.0));
        assert_eq!(p.buckets[0].humidity, Some(60.0));

        assert_eq!(p.buckets[1].key, 13);
        assert_eq!(p.buckets[1].temperature, Some(30.0));
        assert_eq!(p.buckets[1].humidity, None);
    }

    #[test]
    fn test_profile_never_exceeds_24_hours() {
        // ---
        let rows: Vec<_> = (0..100u32).map(|h| (h, Some(h as f64), None)).collect();
        let p = hourly_profile(&table(&rows));
        assert_eq!(p.buckets.len(), 24);

        // each bucket mean is the mean of exactly its rows
        for b in &p.buckets {
            let members: Vec<f64> = (0..100u32)
                .filter(|h| h % 24 == b.key)
                .map(|h| h as f64)
                .collect();
            let expected = members.iter().sum::<f64>() / members.len() as f64;
            assert_eq!(b.count, members.len());
            assert!((b.temperature.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_slots_mark_gaps() {
        // ---
        let p = hourly_profile(&table(&[(5, Some(21.0), Some(40.0))]));
        let slots = p.slots();

        assert_eq!(slots.len(), 24);
        assert_eq!(slots[5].temperature, Some(21.0));
        assert_eq!(slots[6].count, 0);
        assert_eq!(slots[6].temperature, None);
        assert_eq!(slots[6].humidity, None);
    }

    #[test]
    fn test_weekday_and_month_grouping() {
        // ---
        // base date 2024-11-04 is a Monday
        let t = table(&[(0, Some(1.0), None), (24 * 6, Some(3.0), None)]);

        let by_day = profile(&t, Grouping::Weekday);
        let keys: Vec<u32> = by_day.buckets.iter().map(|b| b.key).collect();
        assert_eq!(keys, vec![0, 6]);

        let by_month = profile(&t, Grouping::Month);
        assert_eq!(by_month.buckets.len(), 1);
        assert_eq!(by_month.buckets[0].key, 11);
        assert_eq!(by_month.buckets[0].temperature, Some(2.0));
        assert_eq!(by_month.slots().len(), 12);
    }

    #[test]
    fn test_empty_table_profile() {
        // ---
        let p = hourly_profile(&table(&[]));
        assert!(p.buckets.is_empty());
        assert!(p.slots().iter().all(|b| b.temperature.is_none()));
    }

    #[test]
    fn test_rolling_mean() {
        // ---
        let t = table(&[
            (0, Some(1.0), None),
            (1, Some(2.0), None),
            (2, Some(3.0), None),
            (3, None, None),
            (4, Some(5.0), None),
            (5, Some(7.0), None),
        ]);
        let values: Vec<Option<f64>> = rolling_mean(&t, Variable::Temperature, 2)
            .unwrap()
            .into_iter()
            .map(|p| p.value)
            .collect();

        assert_eq!(values, vec![None, Some(1.5), Some(2.5), None, None, Some(6.0)]);
    }

    #[test]
    fn test_rolling_window_longer_than_table() {
        // ---
        let t = table(&[(0, Some(1.0), None), (1, Some(2.0), None)]);
        let points = rolling_mean(&t, Variable::Temperature, 5).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_rolling_zero_window_rejected() {
        // ---
        let t = table(&[(0, Some(1.0), None)]);
        assert_eq!(
            rolling_mean(&t, Variable::Temperature, 0),
            Err(PipelineError::InvalidWindow)
        );
    }
}
