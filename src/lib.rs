//! Short-range forecasts of daily maximum temperature for a single location.
//!
//! History comes from the Open-Meteo archive (or any [`SeriesSource`]), is cached
//! with a time-to-live, and feeds a two-lag linear autoregression that is projected
//! forward one day at a time.
//!
//! The crate logs through the [`log`] facade and never installs a logger itself.

pub mod archive;
pub mod cache;
mod error;
mod forecaster;
pub mod model;
mod settings;
pub mod types;

pub use error::ForecastError;
pub use forecaster::Forecaster;
pub use settings::*;

pub use archive::client::{ArchiveClient, DEFAULT_REQUEST_TIMEOUT, OPEN_METEO_ARCHIVE_URL};
pub use archive::error::FetchError;
pub use archive::SeriesSource;
pub use cache::series_cache::{SeriesCache, DEFAULT_CACHE_TTL};

pub use model::features::{build_features, FeatureRow, FeatureTable, MIN_FEATURE_ROWS};
pub use model::projector::project;
pub use model::regression::{FitDiagnostics, TrainedModel};

pub use types::forecast_point::{CurrentObservation, ForecastPoint, Provenance};
pub use types::location::{DateRange, LatLon};
pub use types::series::{Observation, Series};
