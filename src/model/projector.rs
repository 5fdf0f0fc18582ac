//! Recursive multi-step projection.
//!
//! Each step's prediction becomes the next step's `lag1` and the previous `lag1`
//! becomes `lag2`. Observations are never consulted inside the loop, so errors
//! compound with the horizon.

use crate::error::ForecastError;
use crate::model::regression::TrainedModel;
use crate::types::forecast_point::ForecastPoint;
use chrono::{Days, NaiveDate};

/// Projects `horizon_days` values past `anchor`, the date of the last observation.
///
/// `seed_lag1` is the most recent observed value and `seed_lag2` the one before it.
/// Any `horizon_days >= 1` is accepted; capping is left to callers.
///
/// ```
/// use chrono::NaiveDate;
/// use tmax_forecast::{project, TrainedModel};
///
/// let identity = TrainedModel::from_coefficients(0.0, 1.0, 0.0);
/// let anchor = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
/// let points = project(&identity, anchor, 23.0, 21.0, 3).unwrap();
/// let values: Vec<f64> = points.iter().map(|p| p.value).collect();
/// assert_eq!(values, vec![23.0, 23.0, 23.0]);
/// ```
pub fn project(
    model: &TrainedModel,
    anchor: NaiveDate,
    seed_lag1: f64,
    seed_lag2: f64,
    horizon_days: u32,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    if horizon_days == 0 {
        return Err(ForecastError::InvalidHorizon {
            requested: horizon_days,
            reason: "at least one day must be projected".to_string(),
        });
    }

    let mut points = Vec::with_capacity(horizon_days as usize);
    let (mut lag1, mut lag2) = (seed_lag1, seed_lag2);
    for step in 1..=horizon_days {
        let predicted = model.predict(lag1, lag2);
        let date = anchor
            .checked_add_days(Days::new(u64::from(step)))
            .ok_or(ForecastError::DateOutOfRange {
                anchor,
                days: step,
            })?;
        points.push(ForecastPoint::projected(date, predicted, lag1, lag2));
        lag2 = lag1;
        lag1 = predicted;
    }
    Ok(points)
}
