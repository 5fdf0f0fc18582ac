use chrono::NaiveDate;
use serde::Serialize;

use crate::types::series::Observation;

/// Where a trajectory value came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Taken from the archive.
    Observed,
    /// Produced by the model from the given lag inputs.
    Projected { lag1: f64, lag2: f64 },
}

/// One day of a trajectory, either observed or projected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub provenance: Provenance,
}

impl ForecastPoint {
    pub fn observed(observation: Observation) -> Self {
        Self {
            date: observation.date,
            value: observation.value,
            provenance: Provenance::Observed,
        }
    }

    pub fn projected(date: NaiveDate, value: f64, lag1: f64, lag2: f64) -> Self {
        Self {
            date,
            value,
            provenance: Provenance::Projected { lag1, lag2 },
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self.provenance, Provenance::Projected { .. })
    }

    /// The `(lag1, lag2)` inputs used to produce a projected value.
    pub fn lags(&self) -> Option<(f64, f64)> {
        match self.provenance {
            Provenance::Projected { lag1, lag2 } => Some((lag1, lag2)),
            Provenance::Observed => None,
        }
    }
}

/// The latest archived reading together with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentObservation {
    pub date: NaiveDate,
    pub value: f64,
    pub previous_value: f64,
}

impl CurrentObservation {
    /// Day-over-day change, positive when warming.
    pub fn delta(&self) -> f64 {
        self.value - self.previous_value
    }
}
