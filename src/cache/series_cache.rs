use crate::archive::error::FetchError;
use crate::archive::SeriesSource;
use crate::types::location::{DateRange, LatLon};
use crate::types::series::Series;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    location: LatLon,
    range: DateRange,
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    series: Arc<Series>,
    fetched_at: Instant,
}

/// Outcome of the last flight when it failed, kept for the callers queued behind it.
#[derive(Debug)]
struct FailedFlight {
    key: CacheKey,
    flight: u64,
    error: FetchError,
}

#[derive(Debug, Default)]
struct CacheSlot {
    entry: Option<CacheEntry>,
    failure: Option<FailedFlight>,
}

/// Time-bounded memo of the most recent fetch.
///
/// Holds a single entry. The refresh path runs while holding the slot lock, so
/// concurrent callers inside one TTL window trigger one upstream fetch and all
/// receive its outcome: the same `Arc<Series>`, or a clone of the same error.
/// A failed refresh clears any stale entry; stale data is never served in place
/// of an error. Callers arriving after a failed flight has finished start a new one.
pub struct SeriesCache<S> {
    source: S,
    ttl: Duration,
    slot: Mutex<CacheSlot>,
    // number of finished fetches, read before queueing on the lock
    flights: AtomicU64,
}

impl<S: SeriesSource> SeriesCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: Mutex::new(CacheSlot::default()),
            flights: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the cached series for `(location, range)`, fetching when the entry is
    /// missing, older than the TTL, or was fetched for a different key.
    pub async fn get(&self, location: LatLon, range: DateRange) -> Result<Arc<Series>, FetchError> {
        let key = CacheKey { location, range };
        let seen = self.flights.load(Ordering::Acquire);
        let mut slot = self.slot.lock().await;

        if let Some(failed) = slot.failure.as_ref() {
            if failed.key == key && failed.flight > seen {
                debug!("Joining failed fetch for {} over {}", location, range);
                return Err(failed.error.clone());
            }
        }

        match slot.entry.as_ref() {
            Some(cached) if cached.key == key && cached.fetched_at.elapsed() <= self.ttl => {
                debug!("Cache hit for {} over {}", location, range);
                return Ok(Arc::clone(&cached.series));
            }
            Some(cached) if cached.key != key => {
                info!(
                    "Cache key changed from {} over {} to {} over {}. Refetching.",
                    cached.key.location, cached.key.range, location, range
                );
            }
            Some(cached) => {
                info!(
                    "Cache entry for {} expired after {:?}. Refetching.",
                    location,
                    cached.fetched_at.elapsed()
                );
            }
            None => {
                info!("Cache miss for {} over {}. Fetching.", location, range);
            }
        }

        let result = self.source.fetch(location, range).await;
        let flight = self.flights.fetch_add(1, Ordering::AcqRel) + 1;
        match result {
            Ok(series) => {
                let series = Arc::new(series);
                slot.failure = None;
                slot.entry = Some(CacheEntry {
                    key,
                    series: Arc::clone(&series),
                    fetched_at: Instant::now(),
                });
                Ok(series)
            }
            Err(e) => {
                warn!("Fetch for {} over {} failed: {}", location, range, e);
                slot.entry = None;
                slot.failure = Some(FailedFlight {
                    key,
                    flight,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    /// Forces the next [`SeriesCache::get`] to refetch regardless of age.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.failure = None;
        if slot.entry.take().is_some() {
            info!("Cache invalidated");
        }
    }

    /// Age of the current entry, if any.
    pub async fn age(&self) -> Option<Duration> {
        self.slot
            .lock()
            .await
            .entry
            .as_ref()
            .map(|cached| cached.fetched_at.elapsed())
    }

    pub async fn is_fresh(&self) -> bool {
        self.age().await.is_some_and(|age| age <= self.ttl)
    }
}
