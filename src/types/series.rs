//! Daily observation series as returned by the archive.

use crate::types::location::{DateRange, LatLon};
use chrono::NaiveDate;
use log::warn;
use polars::prelude::*;
use serde::Serialize;

/// A single daily maximum temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered daily observations for one location and requested date range.
///
/// Dates are strictly increasing. Missing days are simply absent: a `Series`
/// never contains interpolated or defaulted values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    location: LatLon,
    range: DateRange,
    observations: Vec<Observation>,
}

impl Series {
    /// Builds a series, dropping non-finite values and any entry whose date does not
    /// come strictly after the previously kept one (duplicates, out-of-order rows).
    pub fn new(
        location: LatLon,
        range: DateRange,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Self {
        let mut kept: Vec<Observation> = Vec::new();
        let mut dropped = 0usize;
        for observation in observations {
            let increasing = kept
                .last()
                .map_or(true, |previous| observation.date > previous.date);
            if observation.value.is_finite() && increasing {
                kept.push(observation);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(
                "Dropped {} non-finite or out-of-order observations for {} over {}",
                dropped, location, range
            );
        }
        Self {
            location,
            range,
            observations: kept,
        }
    }

    pub fn location(&self) -> LatLon {
        self.location
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// The two most recent observations as `(previous, latest)`.
    pub fn latest_pair(&self) -> Option<(Observation, Observation)> {
        match self.observations.as_slice() {
            [.., previous, latest] => Some((*previous, *latest)),
            _ => None,
        }
    }

    /// The last `n` observations (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    /// Materialises the series as a two column frame: `date` (`YYYY-MM-DD` strings)
    /// and `value` (`f64`).
    pub fn to_data_frame(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.date.format("%Y-%m-%d").to_string())
            .collect();
        let values: Vec<f64> = self.observations.iter().map(|o| o.value).collect();
        df!("date" => dates, "value" => values)
    }

    pub fn to_lazy_frame(&self) -> PolarsResult<LazyFrame> {
        Ok(self.to_data_frame()?.lazy())
    }
}
