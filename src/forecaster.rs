//! This module provides the main entry point of the crate: a [`Forecaster`] owns the
//! series cache and the model fitted from the cached series, and answers
//! "what is the temperature now" and "what will it be over the next N days".

use crate::archive::client::ArchiveClient;
use crate::archive::SeriesSource;
use crate::cache::series_cache::SeriesCache;
use crate::error::ForecastError;
use crate::model::features::{build_features, FeatureTable};
use crate::model::projector::project;
use crate::model::regression::TrainedModel;
use crate::settings::ForecastSettings;
use crate::types::forecast_point::{CurrentObservation, ForecastPoint};
use crate::types::location::DateRange;
use crate::types::series::{Observation, Series};
use bon::bon;
use chrono::{Local, NaiveDate};
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything derived from one cached series. Replaced wholesale, never mutated.
struct FittedSnapshot {
    series: Arc<Series>,
    features: Arc<FeatureTable>,
    model: Arc<TrainedModel>,
}

/// The forecasting pipeline for a single location.
///
/// Fetches go through a [`SeriesCache`]; the model is fit once per distinct cached
/// series and reused until the cache refreshes. Construct one per process or service
/// and share it by reference (it is `Send + Sync`).
///
/// # Examples
///
/// ```no_run
/// # use tmax_forecast::{ForecastError, ForecastSettings, Forecaster};
/// # #[tokio::main]
/// # async fn main() -> Result<(), ForecastError> {
/// let forecaster = Forecaster::open_meteo(ForecastSettings::default())?;
///
/// let now = forecaster.current_observation().await?;
/// println!("{}: {:.1} °C ({:+.1})", now.date, now.value, now.delta());
///
/// for point in forecaster.forecast(7).await? {
///     println!("{}: {:.1} °C", point.date, point.value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Forecaster<S> {
    settings: ForecastSettings,
    cache: SeriesCache<S>,
    fitted: Mutex<Option<Arc<FittedSnapshot>>>,
}

impl Forecaster<ArchiveClient> {
    /// A forecaster backed by the Open-Meteo archive, configured from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Fetch`] if the HTTP client cannot be built.
    pub fn open_meteo(settings: ForecastSettings) -> Result<Self, ForecastError> {
        let client = ArchiveClient::builder()
            .base_url(settings.base_url.clone())
            .timezone(settings.timezone.clone())
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Forecaster::builder()
            .source(client)
            .settings(settings)
            .build())
    }
}

#[bon]
impl<S: SeriesSource> Forecaster<S> {
    /// Creates a forecaster over any [`SeriesSource`]. `settings` defaults to
    /// [`ForecastSettings::default`].
    #[builder]
    pub fn new(source: S, settings: Option<ForecastSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        Self {
            cache: SeriesCache::new(source, settings.cache_ttl),
            settings,
            fitted: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// The history window ending yesterday on the host's local calendar, so a
    /// forecaster running near its location never requests a partial current day.
    fn request_range(&self) -> Result<DateRange, ForecastError> {
        self.range_ending_before(Local::now().date_naive())
    }

    fn range_ending_before(&self, today: NaiveDate) -> Result<DateRange, ForecastError> {
        DateRange::trailing(today, self.settings.history_days).ok_or(
            ForecastError::InsufficientData {
                required: self.settings.min_feature_rows + 2,
                found: 0,
            },
        )
    }

    fn check_horizon(&self, horizon_days: u32) -> Result<(), ForecastError> {
        let max = self.settings.max_horizon_days;
        if horizon_days == 0 || horizon_days > max {
            return Err(ForecastError::InvalidHorizon {
                requested: horizon_days,
                reason: format!("must be between 1 and {} days", max),
            });
        }
        Ok(())
    }

    /// The cached historical series, fetching it if needed.
    pub async fn history(&self) -> Result<Arc<Series>, ForecastError> {
        let range = self.request_range()?;
        Ok(self.cache.get(self.settings.location, range).await?)
    }

    async fn snapshot(&self) -> Result<Arc<FittedSnapshot>, ForecastError> {
        let series = self.history().await?;
        let mut fitted = self.fitted.lock().await;
        if let Some(snapshot) = fitted.as_ref() {
            if Arc::ptr_eq(&snapshot.series, &series) {
                return Ok(Arc::clone(snapshot));
            }
        }

        let features = build_features(&series, self.settings.min_feature_rows)?;
        let model = TrainedModel::fit(features.rows())?;
        info!(
            "Fitted {} on {} feature rows for {}",
            model,
            features.len(),
            series.location()
        );

        let snapshot = Arc::new(FittedSnapshot {
            series,
            features: Arc::new(features),
            model: Arc::new(model),
        });
        *fitted = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The lag table the current model was fit on.
    pub async fn features(&self) -> Result<Arc<FeatureTable>, ForecastError> {
        Ok(Arc::clone(&self.snapshot().await?.features))
    }

    /// The model fitted from the current cached series.
    pub async fn model(&self) -> Result<Arc<TrainedModel>, ForecastError> {
        Ok(Arc::clone(&self.snapshot().await?.model))
    }

    /// The most recent archived value and the one before it.
    pub async fn current_observation(&self) -> Result<CurrentObservation, ForecastError> {
        let series = self.history().await?;
        let (previous, latest) = latest_pair(&series)?;
        Ok(CurrentObservation {
            date: latest.date,
            value: latest.value,
            previous_value: previous.value,
        })
    }

    /// Projects `horizon_days` days past the last observation.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InvalidHorizon`] unless `1 <= horizon_days <= max_horizon_days`.
    /// * [`ForecastError::Fetch`] if the series has to be fetched and the fetch fails.
    /// * [`ForecastError::InsufficientData`] if the series yields too few feature rows.
    pub async fn forecast(&self, horizon_days: u32) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.check_horizon(horizon_days)?;
        let snapshot = self.snapshot().await?;
        project_snapshot(&snapshot, horizon_days)
    }

    /// The last `observed_tail` observations followed by a `horizon_days` projection,
    /// both taken from the same cached series.
    pub async fn trajectory(
        &self,
        horizon_days: u32,
        observed_tail: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.check_horizon(horizon_days)?;
        let snapshot = self.snapshot().await?;
        let mut points: Vec<ForecastPoint> = snapshot
            .series
            .tail(observed_tail)
            .iter()
            .copied()
            .map(ForecastPoint::observed)
            .collect();
        points.extend(project_snapshot(&snapshot, horizon_days)?);
        Ok(points)
    }

    /// Drops the cached series and fitted model; the next call refetches and refits.
    pub async fn refresh(&self) {
        self.cache.invalidate().await;
        self.fitted.lock().await.take();
        info!("Forecast pipeline refresh requested");
    }
}

fn latest_pair(series: &Series) -> Result<(Observation, Observation), ForecastError> {
    series
        .latest_pair()
        .ok_or(ForecastError::InsufficientData {
            required: 2,
            found: series.len(),
        })
}

fn project_snapshot(
    snapshot: &FittedSnapshot,
    horizon_days: u32,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    let (previous, latest) = latest_pair(&snapshot.series)?;
    project(
        &snapshot.model,
        latest.date,
        latest.value,
        previous.value,
        horizon_days,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::error::FetchError;
    use crate::types::location::LatLon;
    use chrono::Days;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        values: Vec<f64>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn with_values(values: Vec<f64>) -> Self {
            Self {
                values,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_values(Vec::new())
            }
        }
    }

    fn first_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    impl SeriesSource for StubSource {
        async fn fetch(&self, location: LatLon, range: DateRange) -> Result<Series, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::HttpStatus {
                    url: "http://archive.test/v1/archive".to_string(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            Ok(Series::new(
                location,
                range,
                self.values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Observation::new(first_day() + Days::new(i as u64), *v)),
            ))
        }
    }

    fn seasonal_values(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 28.0 + 2.5 * (i as f64 * 0.4).sin() + 0.8 * (i as f64 * 1.3).cos())
            .collect()
    }

    fn forecaster(values: Vec<f64>) -> Forecaster<StubSource> {
        Forecaster::builder()
            .source(StubSource::with_values(values))
            .build()
    }

    fn calls(forecaster: &Forecaster<StubSource>) -> usize {
        forecaster.cache.source().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_forecast_starts_day_after_last_observation() {
        let forecaster = forecaster(seasonal_values(60));
        let points = forecaster.forecast(7).await.unwrap();

        assert_eq!(points.len(), 7);
        let last_observed = first_day() + Days::new(59);
        for (step, point) in points.iter().enumerate() {
            assert_eq!(point.date, last_observed + Days::new(step as u64 + 1));
            assert!(point.is_projected());
        }
    }

    #[tokio::test]
    async fn test_first_step_uses_latest_observations() {
        let values = seasonal_values(45);
        let forecaster = forecaster(values.clone());

        let points = forecaster.forecast(1).await.unwrap();
        let model = forecaster.model().await.unwrap();

        assert_eq!(points[0].value, model.predict(values[44], values[43]));
        assert_eq!(points[0].lags(), Some((values[44], values[43])));
    }

    #[tokio::test]
    async fn test_model_is_fit_once_per_refresh() {
        let forecaster = forecaster(seasonal_values(60));

        let first = forecaster.model().await.unwrap();
        forecaster.forecast(3).await.unwrap();
        let again = forecaster.model().await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(calls(&forecaster), 1);

        forecaster.refresh().await;
        let refit = forecaster.model().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &refit));
        assert_eq!(*first, *refit);
        assert_eq!(calls(&forecaster), 2);
    }

    #[tokio::test]
    async fn test_horizon_outside_cap_is_rejected_before_fetching() {
        let forecaster = forecaster(seasonal_values(60));

        for horizon in [0, 8, 30] {
            let result = forecaster.forecast(horizon).await;
            assert!(
                matches!(result, Err(ForecastError::InvalidHorizon { requested, .. }) if requested == horizon)
            );
        }
        assert_eq!(calls(&forecaster), 0);
    }

    #[tokio::test]
    async fn test_horizon_cap_is_configurable() {
        let forecaster = Forecaster::builder()
            .source(StubSource::with_values(seasonal_values(60)))
            .settings(ForecastSettings::builder().max_horizon_days(14).build())
            .build();

        assert_eq!(forecaster.forecast(14).await.unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_current_observation() {
        let forecaster = forecaster(vec![20.0, 22.0, 21.0, 23.0]);
        let current = forecaster.current_observation().await.unwrap();

        assert_eq!(current.date, first_day() + Days::new(3));
        assert_eq!(current.value, 23.0);
        assert_eq!(current.previous_value, 21.0);
        assert_eq!(current.delta(), 2.0);
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient_data() {
        let forecaster = forecaster(seasonal_values(8));
        let result = forecaster.forecast(3).await;

        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData {
                required: 10,
                found: 6
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_terminal() {
        let forecaster = Forecaster::builder()
            .source(StubSource::failing())
            .build();

        let result = forecaster.forecast(3).await;
        assert!(matches!(
            result,
            Err(ForecastError::Fetch(FetchError::HttpStatus { .. }))
        ));
        assert!(matches!(
            forecaster.current_observation().await,
            Err(ForecastError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_trajectory_joins_observed_tail_and_projection() {
        let values = seasonal_values(30);
        let forecaster = forecaster(values.clone());

        let points = forecaster.trajectory(3, 5).await.unwrap();

        assert_eq!(points.len(), 8);
        assert!(points[..5].iter().all(|p| !p.is_projected()));
        assert!(points[5..].iter().all(ForecastPoint::is_projected));
        assert_eq!(points[4].value, values[29]);
        assert_eq!(points[5].date, points[4].date + Days::new(1));
    }

    #[test]
    fn test_history_window_ends_yesterday_locally() {
        let forecaster = forecaster(Vec::new());
        let before = Local::now().date_naive();
        let range = forecaster.request_range().unwrap();
        let after = Local::now().date_naive();

        assert!(range.end == before.pred_opt().unwrap() || range.end == after.pred_opt().unwrap());
        assert_eq!(range.len_days(), 365);

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let range = forecaster.range_ending_before(today).unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 3, 2).unwrap());
    }

    #[test]
    fn test_empty_history_window_is_rejected() {
        let forecaster = Forecaster::builder()
            .source(StubSource::with_values(Vec::new()))
            .settings(ForecastSettings::builder().history_days(0).build())
            .build();
        assert!(matches!(
            forecaster.request_range(),
            Err(ForecastError::InsufficientData { found: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_features_match_cached_history() {
        let forecaster = forecaster(seasonal_values(40));
        let features = forecaster.features().await.unwrap();
        let history = forecaster.history().await.unwrap();

        assert_eq!(features.len(), history.len() - 2);
        assert_eq!(calls(&forecaster), 1);
    }
}
