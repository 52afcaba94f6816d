//! Time types for the report.
//!
//! This module provides [`DateWindow`], the inclusive range of calendar dates
//! being reported, [`ReportTimeZone`], the single zone every instant is
//! converted to before it is bucketed by date, and [`TimeWindow`], the UTC
//! range handed to providers when querying events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The zone used to turn event instants into local wall-clock times.
///
/// `Local` follows the system zone of the machine running the report.
/// `Named` pins an IANA zone so the output does not depend on where it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportTimeZone {
    /// The system local zone.
    #[default]
    Local,
    /// An explicit IANA zone such as `Europe/Paris`.
    Named(Tz),
}

impl ReportTimeZone {
    /// Converts a UTC instant to local wall-clock time in this zone.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Local => instant.with_timezone(&chrono::Local).naive_local(),
            Self::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Returns the local date of `now` in this zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date()
    }

    /// Returns the instant of local midnight at the start of `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self {
            Self::Local => resolve_local(&chrono::Local, midnight),
            Self::Named(tz) => resolve_local(tz, midnight),
        }
    }
}

/// Maps a local wall-clock time to an instant.
///
/// Ambiguous times take the earlier instant; times inside a DST gap move
/// forward by one hour.
fn resolve_local<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            local
                .checked_add_signed(Duration::hours(1))
                .and_then(|shifted| zone.from_local_datetime(&shifted).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

impl FromStr for ReportTimeZone {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let name = s.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| CoreError::UnknownTimeZone(name.to_string()))
    }
}

impl fmt::Display for ReportTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// An inclusive range of calendar dates.
///
/// Built from a first date and a day count; `end = start + (days - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window of `days` dates beginning at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWindow`] if `days` is zero or the end date
    /// is out of range.
    pub fn starting(start: NaiveDate, days: u32) -> CoreResult<Self> {
        if days == 0 {
            return Err(CoreError::InvalidWindow(
                "days_to_fetch must be at least 1".to_string(),
            ));
        }
        let end = start
            .checked_add_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| {
                CoreError::InvalidWindow(format!("{} days from {} is out of range", days, start))
            })?;
        Ok(Self { start, end })
    }

    /// First date of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the window (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates covered.
    pub fn day_count(&self) -> usize {
        // end >= start by construction
        (self.end - self.start).num_days() as usize + 1
    }

    /// Iterates every date in the window in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start.iter_days().take(self.day_count())
    }

    /// Returns `true` if `date` lies inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Intersects the inclusive range `[first, last]` with the window.
    ///
    /// Returns `None` when the ranges do not overlap.
    pub fn clip(&self, first: NaiveDate, last: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let first = first.max(self.start);
        let last = last.min(self.end);
        (first <= last).then_some((first, last))
    }

    /// Returns the UTC range used to query providers.
    ///
    /// Runs from local midnight on the first date to local midnight at the
    /// end of the last date. A window ending on the last representable date
    /// runs to the end of time.
    pub fn to_time_window(&self, zone: &ReportTimeZone) -> TimeWindow {
        let start = zone.start_of_day(self.start);
        let end = match self.end.succ_opt() {
            Some(next) => zone.start_of_day(next),
            None => DateTime::<Utc>::MAX_UTC,
        };
        TimeWindow::new(start, end)
    }
}

/// A half-open `[start, end)` interval in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window. `start` must not be after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod date_window {
        use super::*;

        #[test]
        fn single_day() {
            let window = DateWindow::starting(date(2025, 2, 5), 1).unwrap();
            assert_eq!(window.start(), window.end());
            assert_eq!(window.day_count(), 1);
        }

        #[test]
        fn week_crosses_month_boundary() {
            let window = DateWindow::starting(date(2025, 1, 29), 7).unwrap();
            assert_eq!(window.end(), date(2025, 2, 4));
            assert_eq!(window.day_count(), 7);

            let dates: Vec<_> = window.dates().collect();
            assert_eq!(dates.len(), 7);
            assert_eq!(dates[0], date(2025, 1, 29));
            assert_eq!(dates[3], date(2025, 2, 1));
            assert!(dates.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
        }

        #[test]
        fn zero_days_rejected() {
            let result = DateWindow::starting(date(2025, 2, 5), 0);
            assert!(matches!(result, Err(CoreError::InvalidWindow(_))));
        }

        #[test]
        fn contains_is_inclusive() {
            let window = DateWindow::starting(date(2025, 2, 5), 3).unwrap();
            assert!(window.contains(date(2025, 2, 5)));
            assert!(window.contains(date(2025, 2, 7)));
            assert!(!window.contains(date(2025, 2, 4)));
            assert!(!window.contains(date(2025, 2, 8)));
        }

        #[test]
        fn clip_ranges() {
            let window = DateWindow::starting(date(2025, 2, 5), 3).unwrap();

            // Overhangs both ends
            assert_eq!(
                window.clip(date(2025, 2, 1), date(2025, 2, 20)),
                Some((date(2025, 2, 5), date(2025, 2, 7)))
            );
            // Inside
            assert_eq!(
                window.clip(date(2025, 2, 6), date(2025, 2, 6)),
                Some((date(2025, 2, 6), date(2025, 2, 6)))
            );
            // Entirely before / after
            assert_eq!(window.clip(date(2025, 2, 1), date(2025, 2, 4)), None);
            assert_eq!(window.clip(date(2025, 2, 8), date(2025, 2, 9)), None);
        }

        #[test]
        fn query_range_in_named_zone() {
            let zone: ReportTimeZone = "Europe/Paris".parse().unwrap();
            let window = DateWindow::starting(date(2025, 2, 5), 2).unwrap();
            let range = window.to_time_window(&zone);

            // Paris is UTC+1 in February
            assert_eq!(range.start, utc(2025, 2, 4, 23, 0));
            assert_eq!(range.end, utc(2025, 2, 6, 23, 0));
        }

        #[test]
        fn query_range_at_the_end_of_the_calendar() {
            let last = NaiveDate::MAX;
            let window = DateWindow::starting(last - Days::new(2), 3).unwrap();
            assert_eq!(window.end(), last);

            let range = window.to_time_window(&ReportTimeZone::Named(Tz::UTC));
            assert_eq!(range.start, (last - Days::new(2)).and_time(NaiveTime::MIN).and_utc());
            assert_eq!(range.end, DateTime::<Utc>::MAX_UTC);

            let window = DateWindow::starting(last - Days::new(3), 3).unwrap();
            let range = window.to_time_window(&ReportTimeZone::Named(Tz::UTC));
            assert_eq!(range.end, last.and_time(NaiveTime::MIN).and_utc());
        }
    }

    mod report_zone {
        use super::*;

        #[test]
        fn parses_names() {
            assert_eq!("local".parse::<ReportTimeZone>().unwrap(), ReportTimeZone::Local);
            assert_eq!("".parse::<ReportTimeZone>().unwrap(), ReportTimeZone::Local);
            assert_eq!(
                "UTC".parse::<ReportTimeZone>().unwrap(),
                ReportTimeZone::Named(Tz::UTC)
            );
            assert!(matches!(
                "Nowhere/Special".parse::<ReportTimeZone>(),
                Err(CoreError::UnknownTimeZone(_))
            ));
        }

        #[test]
        fn display_round_trips() {
            let zone: ReportTimeZone = "America/New_York".parse().unwrap();
            assert_eq!(zone.to_string(), "America/New_York");
            assert_eq!(ReportTimeZone::Local.to_string(), "local");
        }

        #[test]
        fn converts_to_local_wall_clock() {
            let zone: ReportTimeZone = "America/New_York".parse().unwrap();
            let local = zone.to_local(utc(2025, 2, 5, 3, 30));
            assert_eq!(local.date(), date(2025, 2, 4));
            assert_eq!(local.time(), NaiveTime::from_hms_opt(22, 30, 0).unwrap());
            assert_eq!(zone.today(utc(2025, 2, 5, 3, 30)), date(2025, 2, 4));
        }

        #[test]
        fn start_of_day_in_utc() {
            let zone = ReportTimeZone::Named(Tz::UTC);
            assert_eq!(zone.start_of_day(date(2025, 2, 5)), utc(2025, 2, 5, 0, 0));
        }

        #[test]
        fn start_of_day_inside_dst_gap() {
            // Santiago skips from 00:00 to 01:00 when DST starts
            let zone: ReportTimeZone = "America/Santiago".parse().unwrap();
            let start = zone.start_of_day(date(2024, 9, 8));
            assert_eq!(zone.to_local(start).date(), date(2024, 9, 8));
        }
    }
}
