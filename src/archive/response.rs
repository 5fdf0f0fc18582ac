use crate::archive::error::FetchError;
use crate::types::location::{DateRange, LatLon};
use crate::types::series::{Observation, Series};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

/// Body of an Open-Meteo archive response, either data or an error report.
#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveResponse {
    #[serde(default)]
    pub error: bool,
    pub reason: Option<String>,
    pub daily: Option<DailyBlock>,
}

/// Parallel `time` / value arrays. Entries are kept as raw JSON so that a single
/// malformed element is dropped instead of failing the whole payload.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DailyBlock {
    #[serde(default)]
    pub time: Vec<Value>,
    #[serde(default, rename = "temperature_2m_max")]
    pub values: Vec<Value>,
}

impl DailyBlock {
    /// Pairs dates with values, skipping unparsable dates, nulls and non-numeric values.
    pub fn observations(&self) -> Vec<Observation> {
        if self.time.len() != self.values.len() {
            warn!(
                "Archive returned {} dates but {} values; unmatched entries are dropped",
                self.time.len(),
                self.values.len()
            );
        }

        let observations: Vec<Observation> = self
            .time
            .iter()
            .zip(self.values.iter())
            .filter_map(|(date, value)| {
                let date = date
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;
                let value = value.as_f64()?;
                Some(Observation::new(date, value))
            })
            .collect();

        let paired = self.time.len().min(self.values.len());
        if observations.len() < paired {
            debug!(
                "Dropped {} missing or malformed daily entries",
                paired - observations.len()
            );
        }
        observations
    }
}

impl ArchiveResponse {
    pub fn into_series(
        self,
        url: &str,
        location: LatLon,
        range: DateRange,
    ) -> Result<Series, FetchError> {
        if self.error {
            return Err(FetchError::Api {
                url: url.to_string(),
                reason: self
                    .reason
                    .unwrap_or_else(|| "unspecified archive error".to_string()),
            });
        }

        let observations = self.daily.unwrap_or_default().observations();
        let parsed = observations.len();
        let in_range: Vec<Observation> = observations
            .into_iter()
            .filter(|o| range.contains(o.date))
            .collect();
        if in_range.len() < parsed {
            warn!(
                "Dropped {} archive rows outside {}",
                parsed - in_range.len(),
                range
            );
        }
        let series = Series::new(location, range, in_range);
        if series.is_empty() {
            return Err(FetchError::EmptyPayload { location, range });
        }
        Ok(series)
    }
}
