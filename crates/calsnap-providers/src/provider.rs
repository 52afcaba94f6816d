//! CalendarProvider trait definition.
//!
//! A provider lists the calendars visible to an account and returns the raw
//! events of a set of calendars over a UTC time window. Everything after
//! that (splitting, bucketing by date, sorting) happens in
//! [`crate::normalize`], so providers stay thin.

use std::future::Future;
use std::pin::Pin;

use calsnap_core::TimeWindow;

use crate::error::ProviderResult;
use crate::raw_event::RawEvent;

/// Information about a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    /// Unique identifier for the calendar.
    pub id: String,
    /// Human-readable name of the calendar.
    pub name: String,
    /// Whether this is the account's primary calendar.
    pub is_primary: bool,
    /// The timezone of the calendar (IANA identifier).
    pub timezone: Option<String>,
    /// Access role of the account on this calendar (e.g. "owner", "reader").
    pub access_role: Option<String>,
}

impl CalendarInfo {
    /// Creates a new CalendarInfo with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_primary: false,
            timezone: None,
            access_role: None,
        }
    }

    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_access_role(mut self, role: impl Into<String>) -> Self {
        self.access_role = Some(role.into());
        self
    }
}

/// Options for fetching events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// UTC range to query.
    pub time_window: TimeWindow,
    /// Only fetch events from these calendars. `None` means every calendar
    /// the account can see.
    pub calendar_ids: Option<Vec<String>>,
}

impl FetchOptions {
    pub fn new(time_window: TimeWindow) -> Self {
        Self {
            time_window,
            calendar_ids: None,
        }
    }

    /// Restricts the fetch to the given calendars.
    pub fn with_calendar_ids(mut self, ids: Vec<String>) -> Self {
        self.calendar_ids = Some(ids);
        self
    }
}

/// Events collected across calendars.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// Events from every calendar that answered, concatenated in calendar order.
    pub events: Vec<RawEvent>,
    /// Calendars whose events were fetched.
    pub calendars_fetched: usize,
    /// Calendars that failed; their events are missing from `events`.
    pub failed_calendars: Vec<String>,
}

impl FetchResult {
    /// Returns true if at least one calendar could not be fetched.
    pub fn is_partial(&self) -> bool {
        !self.failed_calendars.is_empty()
    }
}

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction over calendar backends.
///
/// Implementations hold an authenticated session; creating one is the
/// backend's business (see `GoogleProvider::connect`).
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "google").
    fn name(&self) -> &str;

    /// Lists the calendars the account has access to.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network or authentication failures.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;

    /// Fetches the events of each requested calendar over the time window.
    ///
    /// Recurring events come back expanded into single instances and
    /// pagination is handled internally. A calendar that fails is recorded
    /// in [`FetchResult::failed_calendars`] and does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the set of calendars cannot be determined.
    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn calendar_info_builder() {
        let info = CalendarInfo::new("team@group.calendar.google.com", "Team")
            .with_primary(false)
            .with_timezone("Europe/Paris")
            .with_access_role("reader");

        assert_eq!(info.id, "team@group.calendar.google.com");
        assert_eq!(info.name, "Team");
        assert!(!info.is_primary);
        assert_eq!(info.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(info.access_role.as_deref(), Some("reader"));
    }

    #[test]
    fn fetch_options_builder() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 12, 0, 0, 0).unwrap(),
        );

        let options = FetchOptions::new(window.clone());
        assert!(options.calendar_ids.is_none());

        let options = options.with_calendar_ids(vec!["primary".to_string()]);
        assert_eq!(options.time_window, window);
        assert_eq!(options.calendar_ids, Some(vec!["primary".to_string()]));
    }

    #[test]
    fn partial_fetch_result() {
        let mut result = FetchResult::default();
        assert!(!result.is_partial());

        result.failed_calendars.push("holidays".to_string());
        assert!(result.is_partial());
    }
}
