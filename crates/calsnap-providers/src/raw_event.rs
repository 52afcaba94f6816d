//! Raw event type from calendar providers.
//!
//! A [`RawEvent`] is an event as a provider returned it, before it is split
//! into per-day entries. Providers report start/end either as instants or
//! as bare dates; the pair is mapped once, at the provider boundary, to an
//! [`EventSpan`] so the normalizer never has to inspect half-filled fields.

use chrono::{DateTime, NaiveDate, Utc};

/// One bound of an event as a provider reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// A date with no time-of-day (all-day events).
    Date(NaiveDate),
}

/// When an event happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSpan {
    /// Starts and ends at specific instants.
    Timed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Covers whole dates. `end` is exclusive, as providers encode it.
    AllDay { start: NaiveDate, end: NaiveDate },
}

impl EventSpan {
    /// Builds a span from a provider's start/end pair.
    ///
    /// Returns `None` when one bound is a date and the other an instant.
    pub fn from_bounds(start: RawEventTime, end: RawEventTime) -> Option<Self> {
        match (start, end) {
            (RawEventTime::DateTime(start), RawEventTime::DateTime(end)) => {
                Some(Self::Timed { start, end })
            }
            (RawEventTime::Date(start), RawEventTime::Date(end)) => {
                Some(Self::AllDay { start, end })
            }
            _ => None,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay { .. })
    }
}

/// A raw calendar event from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Provider identifier of the event.
    pub id: String,
    /// The calendar this event was listed from.
    pub calendar_id: String,
    pub span: EventSpan,
    /// The event title.
    pub summary: Option<String>,
    pub location: Option<String>,
    /// Provider status (e.g., "confirmed", "tentative", "cancelled").
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the required fields.
    pub fn new(id: impl Into<String>, span: EventSpan, calendar_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            span,
            summary: None,
            location: None,
            status: None,
        }
    }

    /// Creates a timed event.
    pub fn timed(
        id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self::new(id, EventSpan::Timed { start, end }, calendar_id)
    }

    /// Creates an all-day event; `end` is exclusive.
    pub fn all_day(
        id: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self::new(id, EventSpan::AllDay { start, end }, calendar_id)
    }

    /// Returns the title, or `None` if it is absent or blank.
    pub fn title(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Returns the location, or `None` if it is absent or empty.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns true if the event is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    pub fn is_all_day(&self) -> bool {
        self.span.is_all_day()
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
