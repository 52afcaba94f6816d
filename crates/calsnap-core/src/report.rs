//! The per-day schedule report and its JSON serializer.
//!
//! A [`Report`] holds one [`DaySchedule`] for every date of a
//! [`DateWindow`], each carrying the [`NormalizedEvent`]s that fall on it.
//! The serialized shape is the `calendar_events.json` document:
//!
//! ```text
//! { "week_start", "week_end", "days": [
//!     { "date", "weekday", "events": [
//!         { "title", "start_time", "end_time", "duration_minutes",
//!           "location", "is_all_day" } ] } ] }
//! ```

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::time::DateWindow;

/// Title used when an event has none.
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// Duration reported for each day an all-day event covers.
pub const MINUTES_PER_DAY: u32 = 1440;

/// One event (or one day's fragment of an event) on a day's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    /// Local start as `HH:MM`, `None` for all-day entries.
    pub start_time: Option<String>,
    /// Local end as `HH:MM`, `None` for all-day entries.
    pub end_time: Option<String>,
    pub duration_minutes: u32,
    pub location: Option<String>,
    pub is_all_day: bool,
}

impl NormalizedEvent {
    /// Creates an all-day entry covering one whole date.
    pub fn all_day(title: impl Into<String>, location: Option<String>) -> Self {
        Self {
            title: title.into(),
            start_time: None,
            end_time: None,
            duration_minutes: MINUTES_PER_DAY,
            location,
            is_all_day: true,
        }
    }

    /// Creates a timed entry between two local wall-clock times.
    pub fn timed(
        title: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        duration_minutes: u32,
        location: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            start_time: Some(format_clock(start)),
            end_time: Some(format_clock(end)),
            duration_minutes,
            location,
            is_all_day: false,
        }
    }

    /// Ordering used within a day.
    ///
    /// All-day entries (no start) come first, then ascending start time,
    /// then end time, then title.
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.end_time.cmp(&other.end_time))
            .then_with(|| self.title.cmp(&other.title))
    }
}

fn format_clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// The events of a single calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    /// English day name, e.g. `Monday`.
    pub weekday: String,
    pub events: Vec<NormalizedEvent>,
}

impl DaySchedule {
    /// Creates an empty schedule for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: date.format("%A").to_string(),
            events: Vec::new(),
        }
    }

    /// Sorts events with [`NormalizedEvent::schedule_order`]; full ties keep
    /// their insertion order.
    pub fn sort_events(&mut self) {
        self.events.sort_by(NormalizedEvent::schedule_order);
    }
}

/// The schedule for every date of a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<DaySchedule>,
}

impl Report {
    /// Creates a report with one empty day per date of `window`.
    pub fn empty(window: &DateWindow) -> Self {
        Self {
            week_start: window.start(),
            week_end: window.end(),
            days: window.dates().map(DaySchedule::new).collect(),
        }
    }

    /// Returns the schedule for `date`, if it is part of the report.
    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DaySchedule> {
        let offset = (date - self.week_start).num_days();
        if offset < 0 {
            return None;
        }
        self.days
            .get_mut(offset as usize)
            .filter(|day| day.date == date)
    }

    /// Total number of entries across all days.
    pub fn event_count(&self) -> usize {
        self.days.iter().map(|d| d.events.len()).sum()
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the report to `path` as JSON.
    ///
    /// The document goes to a sibling temp file first and is renamed into
    /// place, so a failed write never leaves a truncated report behind.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        let mut content = self.to_json()?;
        content.push('\n');

        let io_err = |source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = Path::new(&temp_name);

        fs::write(temp_path, content).map_err(io_err)?;
        fs::rename(temp_path, path).map_err(io_err)?;

        debug!("wrote report with {} event(s) to {:?}", self.event_count(), path);
        Ok(())
    }
}
