use crate::archive::error::FetchError;
use chrono::NaiveDate;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Insufficient data: need at least {required} usable rows, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Regression input is degenerate: {0}")]
    DegenerateInput(String),

    #[error("Invalid forecast horizon of {requested} day(s): {reason}")]
    InvalidHorizon { requested: u32, reason: String },

    #[error("Projected date {anchor} + {days} day(s) is outside the supported calendar")]
    DateOutOfRange { anchor: NaiveDate, days: u32 },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to parse date '{0}'")]
    DateParsing(String),
}
