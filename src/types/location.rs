//! Geographic point and calendar range types used to parameterise archive requests.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use tmax_forecast::LatLon;
///
/// let vitoria = LatLon(-20.3155, -40.3128);
/// assert_eq!(vitoria.0, -20.3155); // Latitude
/// assert_eq!(vitoria.1, -40.3128); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon(pub f64, pub f64);

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.0, self.1)
    }
}

/// An inclusive range of calendar days `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` calendar days strictly before `today`: `[today - days, today - 1]`.
    ///
    /// Returns `None` when `days` is zero or the range would leave chrono's supported dates.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use tmax_forecast::DateRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    /// let range = DateRange::trailing(today, 7).unwrap();
    /// assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    /// assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    /// ```
    pub fn trailing(today: NaiveDate, days: u32) -> Option<Self> {
        if days == 0 {
            return None;
        }
        Some(Self {
            start: today.checked_sub_days(Days::new(u64::from(days)))?,
            end: today.checked_sub_days(Days::new(1))?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, inclusive of both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..={}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
