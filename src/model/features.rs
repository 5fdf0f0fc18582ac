//! Lag feature construction.
//!
//! Each retained row pairs a day's value with the values of the two observations
//! before it. The shift is done on a polars `LazyFrame` so the same table can be
//! handed to frame-based consumers unchanged.

use crate::error::ForecastError;
use crate::types::series::Series;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

/// Minimum number of feature rows required before a model is fit.
pub const MIN_FEATURE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub value: f64,
    /// Value of the previous observation.
    pub lag1: f64,
    /// Value two observations back.
    pub lag2: f64,
}

/// Date ordered lag table derived from one [`Series`].
#[derive(Debug, Clone)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    frame: DataFrame,
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// The table as a frame with columns `date`, `value`, `lag1`, `lag2`.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds lag-1/lag-2 features from `series`.
///
/// The first two observations never produce a row, so a series of length `n >= 2`
/// yields exactly `n - 2` rows. Fails with [`ForecastError::InsufficientData`] when
/// fewer than `min_rows` rows remain.
///
/// ```
/// use chrono::NaiveDate;
/// use tmax_forecast::{build_features, DateRange, LatLon, Observation, Series};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let series = Series::new(
///     LatLon(-20.3, -40.3),
///     DateRange::new(d(1), d(4)),
///     [(1, 20.0), (2, 22.0), (3, 21.0), (4, 23.0)]
///         .map(|(day, v)| Observation::new(d(day), v)),
/// );
/// let table = build_features(&series, 0).unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!((table.rows()[0].lag1, table.rows()[0].lag2), (22.0, 20.0));
/// ```
pub fn build_features(series: &Series, min_rows: usize) -> Result<FeatureTable, ForecastError> {
    let frame = series
        .to_lazy_frame()?
        .with_columns([
            col("value").shift(lit(1i64)).alias("lag1"),
            col("value").shift(lit(2i64)).alias("lag2"),
        ])
        .filter(col("lag2").is_not_null())
        .collect()?;

    let rows = extract_rows(&frame)?;
    if rows.len() < min_rows {
        return Err(ForecastError::InsufficientData {
            required: min_rows,
            found: rows.len(),
        });
    }
    Ok(FeatureTable { rows, frame })
}

fn extract_rows(frame: &DataFrame) -> Result<Vec<FeatureRow>, ForecastError> {
    let dates = frame.column("date")?.str()?;
    let values = frame.column("value")?.f64()?;
    let lag1_col = frame.column("lag1")?.f64()?;
    let lag2_col = frame.column("lag2")?.f64()?;

    let mut rows = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let (Some(date), Some(value), Some(lag1), Some(lag2)) =
            (dates.get(idx), values.get(idx), lag1_col.get(idx), lag2_col.get(idx))
        else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ForecastError::DateParsing(date.to_string()))?;
        rows.push(FeatureRow {
            date,
            value,
            lag1,
            lag2,
        });
    }
    Ok(rows)
}
