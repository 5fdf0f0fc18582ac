use crate::archive::client::{DEFAULT_REQUEST_TIMEOUT, OPEN_METEO_ARCHIVE_URL};
use crate::cache::series_cache::DEFAULT_CACHE_TTL;
use crate::model::features::MIN_FEATURE_ROWS;
use crate::types::location::LatLon;
use std::time::Duration;

/// Vitória, Espírito Santo.
pub const DEFAULT_LOCATION: LatLon = LatLon(-20.3155, -40.3128);
pub const DEFAULT_HISTORY_DAYS: u32 = 365;
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 7;

/// Tunables for a [`crate::Forecaster`]. Every field has a default.
///
/// # Examples
///
/// ```
/// use tmax_forecast::{ForecastSettings, LatLon};
/// use std::time::Duration;
///
/// let settings = ForecastSettings::builder()
///     .location(LatLon(52.52, 13.40))
///     .max_horizon_days(14)
///     .cache_ttl(Duration::from_secs(600))
///     .build();
/// assert_eq!(settings.history_days, 365);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ForecastSettings {
    /// The single point forecasts are made for.
    #[builder(default = DEFAULT_LOCATION)]
    pub location: LatLon,
    /// Days of history requested, ending yesterday on the host's local calendar.
    #[builder(default = DEFAULT_HISTORY_DAYS)]
    pub history_days: u32,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    /// Largest horizon [`crate::Forecaster::forecast`] accepts.
    #[builder(default = DEFAULT_MAX_HORIZON_DAYS)]
    pub max_horizon_days: u32,
    #[builder(default = MIN_FEATURE_ROWS)]
    pub min_feature_rows: usize,
    #[builder(into, default = OPEN_METEO_ARCHIVE_URL.to_string())]
    pub base_url: String,
    /// Passed to the archive so daily boundaries follow local time.
    #[builder(into, default = "auto".to_string())]
    pub timezone: String,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
