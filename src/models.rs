//! Data models for the sensor analysis pipeline.
//!
//! A [`SensorTable`] is built once per upload by the loader and never
//! mutated afterwards; every analysis reads it and produces a new value.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// ---

/// The two measured variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Temperature,
    Humidity,
}

impl Variable {
    // ---
    pub const ALL: [Variable; 2] = [Variable::Temperature, Variable::Humidity];

    /// Canonical column name.
    pub fn name(self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Humidity => "humidity",
        }
    }

    /// Display unit suffix.
    pub fn unit(self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::Humidity => "%",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timestamped row of a [`SensorTable`].
///
/// A missing or empty cell is `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,

    /// Raw text of unrecognized columns, in [`SensorTable::extra_columns`] order.
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl Reading {
    // ---
    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
        }
    }
}

/// Time-indexed table of readings, sorted by timestamp ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorTable {
    // ---
    readings: Vec<Reading>,
    variables: Vec<Variable>,
    extra_columns: Vec<String>,
}

impl SensorTable {
    // ---
    /// Build a table, sorting rows by time. The sort is stable so rows
    /// sharing a timestamp keep their file order.
    pub fn new(
        mut readings: Vec<Reading>,
        mut variables: Vec<Variable>,
        extra_columns: Vec<String>,
    ) -> Self {
        // ---
        readings.sort_by_key(|r| r.time);
        variables.sort();
        variables.dedup();

        SensorTable {
            readings,
            variables,
            extra_columns,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Variables whose column was present in the source file.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn has(&self, variable: Variable) -> bool {
        self.variables.contains(&variable)
    }

    /// Fail with [`PipelineError::MissingColumn`] if `variable` was not loaded.
    pub fn require(&self, variable: Variable) -> Result<()> {
        // ---
        if self.has(variable) {
            return Ok(());
        }
        let expected = self
            .variables
            .iter()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join(", ");
        Err(PipelineError::MissingColumn {
            missing: variable.name().to_string(),
            expected: format!("one of the loaded columns [{expected}]"),
        })
    }

    /// Header names of pass-through columns.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Present values of `variable`, in row order.
    pub fn values(&self, variable: Variable) -> Vec<f64> {
        self.readings
            .iter()
            .filter_map(|r| r.value(variable))
            .collect()
    }

    /// New table holding the rows matching `keep`, in their original order.
    pub fn subset<F>(&self, keep: F) -> SensorTable
    where
        F: Fn(&Reading) -> bool,
    {
        // ---
        SensorTable {
            readings: self.readings.iter().filter(|r| keep(r)).cloned().collect(),
            variables: self.variables.clone(),
            extra_columns: self.extra_columns.clone(),
        }
    }

    /// First and last timestamp, if any rows exist.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.readings.first()?;
        let last = self.readings.last()?;
        Some((first.time, last.time))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(hour: u32, temperature: f64) -> Reading {
        Reading {
            time: at(hour),
            temperature: Some(temperature),
            humidity: None,
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_rows_sorted_and_stable() {
        // ---
        let table = SensorTable::new(
            vec![reading(3, 1.0), reading(1, 2.0), reading(3, 3.0)],
            vec![Variable::Temperature],
            Vec::new(),
        );

        let temps: Vec<f64> = table.values(Variable::Temperature);
        assert_eq!(temps, vec![2.0, 1.0, 3.0]);
        assert_eq!(table.time_range(), Some((at(1), at(3))));
    }

    #[test]
    fn test_require_missing_variable() {
        // ---
        let table = SensorTable::new(vec![], vec![Variable::Temperature], vec![]);
        assert!(table.require(Variable::Temperature).is_ok());
        assert!(matches!(
            table.require(Variable::Humidity),
            Err(PipelineError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_subset_keeps_metadata() {
        // ---
        let table = SensorTable::new(
            vec![reading(1, 10.0), reading(2, 20.0)],
            vec![Variable::Temperature],
            vec!["note".to_string()],
        );
        let sub = table.subset(|r| r.temperature > Some(15.0));

        assert_eq!(sub.len(), 1);
        assert_eq!(sub.variables(), table.variables());
        assert_eq!(sub.extra_columns(), table.extra_columns());
    }

    #[test]
    fn test_variable_names_and_units() {
        // ---
        assert_eq!(Variable::Temperature.to_string(), "temperature");
        assert_eq!(Variable::Humidity.unit(), "%");
    }
}
