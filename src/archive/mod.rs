//! Retrieval of historical daily series from a remote weather archive.

pub mod client;
pub mod error;
pub(crate) mod response;

use crate::types::location::{DateRange, LatLon};
use crate::types::series::Series;
use error::FetchError;
use std::future::Future;

/// Anything that can produce a daily maximum temperature [`Series`] for a location and range.
///
/// Implementations issue at most one upstream request per call and must not retry;
/// retry policy belongs to callers. [`client::ArchiveClient`] is the HTTP implementation.
pub trait SeriesSource: Send + Sync {
    fn fetch(
        &self,
        location: LatLon,
        range: DateRange,
    ) -> impl Future<Output = Result<Series, FetchError>> + Send;
}
