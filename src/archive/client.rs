use crate::archive::error::FetchError;
use crate::archive::response::ArchiveResponse;
use crate::archive::SeriesSource;
use crate::types::location::{DateRange, LatLon};
use crate::types::series::Series;
use bon::bon;
use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DAILY_VARIABLE: &str = "temperature_2m_max";

/// HTTP client for the Open-Meteo historical archive.
///
/// Each [`SeriesSource::fetch`] call issues exactly one GET request and never retries.
/// Requests that exceed the configured timeout fail with [`FetchError::Timeout`].
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    base_url: String,
    timezone: String,
    timeout: Duration,
}

#[bon]
impl ArchiveClient {
    /// Creates a client. All arguments are optional builder fields.
    ///
    /// ```no_run
    /// # use tmax_forecast::{ArchiveClient, FetchError};
    /// # use std::time::Duration;
    /// # fn run() -> Result<(), FetchError> {
    /// let client = ArchiveClient::builder()
    ///     .timeout(Duration::from_secs(3))
    ///     .timezone("America/Sao_Paulo")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn new(
        #[builder(into, default = OPEN_METEO_ARCHIVE_URL.to_string())] base_url: String,
        #[builder(into, default = "auto".to_string())] timezone: String,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::ClientBuild(Arc::new(e)))?;
        Ok(Self {
            client,
            base_url,
            timezone,
            timeout,
        })
    }

    fn archive_url(&self) -> String {
        format!("{}/v1/archive", self.base_url.trim_end_matches('/'))
    }

    fn request_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
                source: Arc::new(error),
            }
        } else {
            FetchError::NetworkRequest(url.to_string(), Arc::new(error))
        }
    }

    /// Downloads daily maximum temperature for `location` over `range`.
    pub async fn daily_max_temperature(
        &self,
        location: LatLon,
        range: DateRange,
    ) -> Result<Series, FetchError> {
        let url = self.archive_url();
        info!(
            "Requesting {} for {} over {} from {}",
            DAILY_VARIABLE, location, range, url
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.0.to_string()),
                ("longitude", location.1.to_string()),
                ("start_date", range.start.format("%Y-%m-%d").to_string()),
                ("end_date", range.end.format("%Y-%m-%d").to_string()),
                ("daily", DAILY_VARIABLE.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| self.request_error(&url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(&url, e))?;

        if !status.is_success() {
            warn!("HTTP error {} for {}", status, url);
            // Prefer the archive's own explanation when the body carries one
            if let Ok(ArchiveResponse {
                error: true,
                reason: Some(reason),
                ..
            }) = serde_json::from_slice::<ArchiveResponse>(&body)
            {
                return Err(FetchError::Api { url, reason });
            }
            return Err(FetchError::HttpStatus { url, status });
        }

        let payload: ArchiveResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                url: url.clone(),
                source: Arc::new(e),
            })?;
        let series = payload.into_series(&url, location, range)?;
        info!(
            "Received {} of {} daily observations for {} over {}",
            series.len(),
            range.len_days(),
            location,
            range
        );
        Ok(series)
    }
}

impl SeriesSource for ArchiveClient {
    async fn fetch(&self, location: LatLon, range: DateRange) -> Result<Series, FetchError> {
        self.daily_max_temperature(location, range).await
    }
}
