//! RawEvent to day schedule conversion.
//!
//! Every event is converted to wall-clock time in the report zone and then
//! cut into one [`NormalizedEvent`] per local date it touches:
//!
//! - all-day events give a 1440-minute entry with no times for each date
//!   they cover (the provider's end date is exclusive);
//! - timed events on one date give a single entry;
//! - timed events crossing midnight give a fragment ending at `23:59` on the
//!   first date, full `00:00`-`23:59` fragments in between and a fragment
//!   starting at `00:00` on the last date.
//!
//! Only dates inside the [`DateWindow`] are kept.

use calsnap_core::{
    DateWindow, MINUTES_PER_DAY, NormalizedEvent, Report, ReportTimeZone, UNTITLED_EVENT,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::raw_event::{EventSpan, RawEvent};

/// Wall-clock end of a fragment that runs to the end of its date.
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Why an event could not be placed on the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("ends ({end}) before it starts ({start})")]
    EndsBeforeStart { start: String, end: String },
}

/// A single entry and the date it belongs to.
pub type DatedEvent = (NaiveDate, NormalizedEvent);

/// Builds the schedule for `window` from raw provider events.
///
/// Cancelled events are dropped. Events that cannot be placed are logged
/// and skipped. Each day's entries are sorted with
/// [`NormalizedEvent::schedule_order`].
pub fn normalize_events(window: &DateWindow, events: &[RawEvent], zone: &ReportTimeZone) -> Report {
    let mut report = Report::empty(window);
    let mut cancelled = 0usize;
    let mut skipped = 0usize;

    for event in events {
        if event.is_cancelled() {
            cancelled += 1;
            continue;
        }
        match normalize_event(event, window, zone) {
            Ok(entries) => {
                for (date, entry) in entries {
                    if let Some(day) = report.day_mut(date) {
                        day.events.push(entry);
                    }
                }
            }
            Err(err) => {
                warn!(
                    event_id = %event.id,
                    calendar = %event.calendar_id,
                    "skipping event: {}",
                    err
                );
                skipped += 1;
            }
        }
    }

    for day in &mut report.days {
        day.sort_events();
    }

    debug!(
        "normalized {} event(s) into {} entries ({} cancelled, {} skipped)",
        events.len(),
        report.event_count(),
        cancelled,
        skipped
    );
    report
}

/// Cuts one event into dated entries, keeping only dates inside `window`.
///
/// The status of the event is not looked at; callers drop cancelled events.
///
/// # Errors
///
/// Returns [`NormalizeError::EndsBeforeStart`] when the end precedes the start.
pub fn normalize_event(
    event: &RawEvent,
    window: &DateWindow,
    zone: &ReportTimeZone,
) -> Result<Vec<DatedEvent>, NormalizeError> {
    let title = event.title().unwrap_or(UNTITLED_EVENT);
    let location = event.location().map(str::to_string);

    match event.span {
        EventSpan::AllDay { start, end } => all_day_entries(title, location, start, end, window),
        EventSpan::Timed { start, end } => timed_entries(title, location, start, end, window, zone),
    }
}

fn all_day_entries(
    title: &str,
    location: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
    window: &DateWindow,
) -> Result<Vec<DatedEvent>, NormalizeError> {
    if end < start {
        return Err(NormalizeError::EndsBeforeStart {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    // exclusive end; an end equal to the start still covers the start date
    let last = end.pred_opt().filter(|d| *d >= start).unwrap_or(start);

    let Some((first, last)) = window.clip(start, last) else {
        return Ok(Vec::new());
    };
    Ok(first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| (d, NormalizedEvent::all_day(title, location.clone())))
        .collect())
}

fn timed_entries(
    title: &str,
    location: Option<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: &DateWindow,
    zone: &ReportTimeZone,
) -> Result<Vec<DatedEvent>, NormalizeError> {
    if end < start {
        return Err(NormalizeError::EndsBeforeStart {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }

    let local_start = zone.to_local(start);
    let local_end = zone.to_local(end);
    let first_date = local_start.date();

    // An event ending at midnight stops on the previous date.
    let ends_at_midnight = local_end.time() == NaiveTime::MIN && local_end.date() > first_date;
    let last_date = if ends_at_midnight {
        local_end.date().pred_opt().unwrap_or(first_date)
    } else {
        local_end.date()
    };

    if first_date == last_date && !ends_at_midnight {
        if !window.contains(first_date) {
            return Ok(Vec::new());
        }
        let entry = NormalizedEvent::timed(
            title,
            local_start.time(),
            local_end.time(),
            whole_minutes(end - start),
            location,
        );
        return Ok(vec![(first_date, entry)]);
    }

    let Some((from, to)) = window.clip(first_date, last_date) else {
        return Ok(Vec::new());
    };

    let entries = from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| {
            let entry = if date == first_date {
                NormalizedEvent::timed(
                    title,
                    local_start.time(),
                    END_OF_DAY,
                    whole_minutes(END_OF_DAY - local_start.time()),
                    location.clone(),
                )
            } else if date == last_date && !ends_at_midnight {
                NormalizedEvent::timed(
                    title,
                    NaiveTime::MIN,
                    local_end.time(),
                    whole_minutes(local_end.time() - NaiveTime::MIN),
                    location.clone(),
                )
            } else {
                NormalizedEvent::timed(
                    title,
                    NaiveTime::MIN,
                    END_OF_DAY,
                    MINUTES_PER_DAY,
                    location.clone(),
                )
            };
            (date, entry)
        })
        .collect();
    Ok(entries)
}

fn whole_minutes(delta: TimeDelta) -> u32 {
    u32::try_from(delta.num_minutes().max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn utc_zone() -> ReportTimeZone {
        ReportTimeZone::Named(Tz::UTC)
    }

    /// Monday 2025-02-03 through Sunday 2025-02-09.
    fn week() -> DateWindow {
        DateWindow::starting(date(2025, 2, 3), 7).unwrap()
    }

    fn times(entry: &NormalizedEvent) -> (Option<&str>, Option<&str>, u32) {
        (
            entry.start_time.as_deref(),
            entry.end_time.as_deref(),
            entry.duration_minutes,
        )
    }

    mod single_event {
        use super::*;

        #[test]
        fn same_day_meeting() {
            let event = RawEvent::timed("e1", utc(2025, 2, 4, 9, 0), utc(2025, 2, 4, 10, 30), "primary")
                .with_summary("Planning")
                .with_location("Room 2");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 1);
            let (day, entry) = &entries[0];
            assert_eq!(*day, date(2025, 2, 4));
            assert_eq!(entry.title, "Planning");
            assert_eq!(times(entry), (Some("09:00"), Some("10:30"), 90));
            assert_eq!(entry.location.as_deref(), Some("Room 2"));
            assert!(!entry.is_all_day);
        }

        #[test]
        fn three_day_all_day_event() {
            let event = RawEvent::all_day("e2", date(2025, 2, 4), date(2025, 2, 7), "primary")
                .with_summary("Offsite");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            let days: Vec<_> = entries.iter().map(|(d, _)| *d).collect();
            assert_eq!(days, vec![date(2025, 2, 4), date(2025, 2, 5), date(2025, 2, 6)]);
            for (_, entry) in &entries {
                assert!(entry.is_all_day);
                assert_eq!(times(entry), (None, None, MINUTES_PER_DAY));
            }
        }

        #[test]
        fn all_day_with_equal_bounds_is_one_day() {
            let event = RawEvent::all_day("e3", date(2025, 2, 5), date(2025, 2, 5), "primary");
            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].0, date(2025, 2, 5));
        }

        #[test]
        fn crosses_midnight() {
            let event = RawEvent::timed("e4", utc(2025, 2, 4, 23, 0), utc(2025, 2, 5, 1, 0), "primary");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].0, date(2025, 2, 4));
            assert_eq!(times(&entries[0].1), (Some("23:00"), Some("23:59"), 59));
            assert_eq!(entries[1].0, date(2025, 2, 5));
            assert_eq!(times(&entries[1].1), (Some("00:00"), Some("01:00"), 60));
        }

        #[test]
        fn spans_three_dates() {
            let event = RawEvent::timed("e5", utc(2025, 2, 4, 22, 0), utc(2025, 2, 6, 2, 0), "primary");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            let shape: Vec<_> = entries.iter().map(|(d, e)| (*d, times(e))).collect();
            assert_eq!(
                shape,
                vec![
                    (date(2025, 2, 4), (Some("22:00"), Some("23:59"), 119)),
                    (date(2025, 2, 5), (Some("00:00"), Some("23:59"), 1440)),
                    (date(2025, 2, 6), (Some("00:00"), Some("02:00"), 120)),
                ]
            );
        }

        #[test]
        fn ending_at_midnight_stays_on_its_date() {
            let event = RawEvent::timed("e6", utc(2025, 2, 4, 22, 0), utc(2025, 2, 5, 0, 0), "primary");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].0, date(2025, 2, 4));
            assert_eq!(times(&entries[0].1), (Some("22:00"), Some("23:59"), 119));
        }

        #[test]
        fn multi_day_ending_at_midnight_has_full_last_day() {
            let event = RawEvent::timed("e7", utc(2025, 2, 4, 22, 0), utc(2025, 2, 6, 0, 0), "primary");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[1].0, date(2025, 2, 5));
            assert_eq!(times(&entries[1].1), (Some("00:00"), Some("23:59"), 1440));
        }

        #[test]
        fn zero_length_event() {
            let at = utc(2025, 2, 4, 12, 0);
            let entries = normalize_event(&RawEvent::timed("e8", at, at, "primary"), &week(), &utc_zone())
                .unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(times(&entries[0].1), (Some("12:00"), Some("12:00"), 0));
        }

        #[test]
        fn defaults_for_missing_fields() {
            let event = RawEvent::timed("e9", utc(2025, 2, 4, 9, 0), utc(2025, 2, 4, 9, 30), "primary")
                .with_summary("  ")
                .with_location("");

            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries[0].1.title, UNTITLED_EVENT);
            assert_eq!(entries[0].1.location, None);
        }

        #[test]
        fn inverted_events_are_rejected() {
            let timed = RawEvent::timed("e10", utc(2025, 2, 4, 10, 0), utc(2025, 2, 4, 9, 0), "primary");
            assert!(matches!(
                normalize_event(&timed, &week(), &utc_zone()),
                Err(NormalizeError::EndsBeforeStart { .. })
            ));

            let all_day = RawEvent::all_day("e11", date(2025, 2, 5), date(2025, 2, 4), "primary");
            assert!(matches!(
                normalize_event(&all_day, &week(), &utc_zone()),
                Err(NormalizeError::EndsBeforeStart { .. })
            ));
        }

        #[test]
        fn clipped_to_window() {
            // Starts the Saturday before the window and ends the Wednesday inside it
            let event = RawEvent::all_day("e12", date(2025, 2, 1), date(2025, 2, 6), "primary");
            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            let days: Vec<_> = entries.iter().map(|(d, _)| *d).collect();
            assert_eq!(days, vec![date(2025, 2, 3), date(2025, 2, 4), date(2025, 2, 5)]);

            // Overnight into the day after the window
            let event = RawEvent::timed("e13", utc(2025, 2, 9, 23, 0), utc(2025, 2, 10, 1, 0), "primary");
            let entries = normalize_event(&event, &week(), &utc_zone()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].0, date(2025, 2, 9));
        }

        #[test]
        fn outside_window_yields_nothing() {
            let before = RawEvent::timed("e14", utc(2025, 2, 2, 9, 0), utc(2025, 2, 2, 10, 0), "primary");
            let after = RawEvent::all_day("e15", date(2025, 2, 10), date(2025, 2, 11), "primary");
            assert!(normalize_event(&before, &week(), &utc_zone()).unwrap().is_empty());
            assert!(normalize_event(&after, &week(), &utc_zone()).unwrap().is_empty());
        }

        #[test]
        fn bucketed_by_report_zone() {
            // 03:30 UTC on Wednesday is 22:30 Tuesday in New York
            let zone: ReportTimeZone = "America/New_York".parse().unwrap();
            let event = RawEvent::timed("e16", utc(2025, 2, 5, 3, 30), utc(2025, 2, 5, 4, 0), "primary");

            let entries = normalize_event(&event, &week(), &zone).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].0, date(2025, 2, 4));
            assert_eq!(times(&entries[0].1), (Some("22:30"), Some("23:00"), 30));
        }
    }

    mod report {
        use super::*;

        fn sample_events() -> Vec<RawEvent> {
            vec![
                RawEvent::timed("a", utc(2025, 2, 4, 14, 0), utc(2025, 2, 4, 15, 0), "primary")
                    .with_summary("Review"),
                RawEvent::all_day("b", date(2025, 2, 4), date(2025, 2, 5), "holidays")
                    .with_summary("Company holiday"),
                RawEvent::timed("c", utc(2025, 2, 4, 9, 0), utc(2025, 2, 4, 9, 15), "primary")
                    .with_summary("Standup"),
                RawEvent::timed("d", utc(2025, 2, 4, 11, 0), utc(2025, 2, 4, 12, 0), "primary")
                    .with_summary("Dropped")
                    .with_status("cancelled"),
                RawEvent::timed("e", utc(2025, 2, 6, 9, 0), utc(2025, 2, 6, 8, 0), "primary")
                    .with_summary("Broken"),
                RawEvent::timed("f", utc(2025, 1, 20, 9, 0), utc(2025, 1, 20, 10, 0), "primary")
                    .with_summary("Long ago"),
            ]
        }

        #[test]
        fn covers_every_date_once() {
            let report = normalize_events(&week(), &[], &utc_zone());
            assert_eq!(report.days.len(), 7);
            assert_eq!(report.week_start, date(2025, 2, 3));
            assert_eq!(report.week_end, date(2025, 2, 9));
            assert!(report.days.windows(2).all(|w| w[0].date.succ_opt() == Some(w[1].date)));
            assert_eq!(report.event_count(), 0);
        }

        #[test]
        fn sorts_and_filters() {
            let report = normalize_events(&week(), &sample_events(), &utc_zone());

            let tuesday = &report.days[1];
            assert_eq!(tuesday.weekday, "Tuesday");
            let titles: Vec<_> = tuesday.events.iter().map(|e| e.title.as_str()).collect();
            assert_eq!(titles, vec!["Company holiday", "Standup", "Review"]);

            // cancelled, inverted and out-of-window events leave no trace
            assert_eq!(report.event_count(), 3);
        }

        #[test]
        fn normalizing_twice_is_byte_identical() {
            let events = sample_events();
            let first = normalize_events(&week(), &events, &utc_zone()).to_json().unwrap();
            let second = normalize_events(&week(), &events, &utc_zone()).to_json().unwrap();
            assert_eq!(first, second);
        }
    }
}
