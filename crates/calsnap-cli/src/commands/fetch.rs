//! The default command: fetch events and write the report.

use calsnap_core::{DateWindow, Report, ReportTimeZone};
use calsnap_providers::google::GoogleProvider;
use calsnap_providers::{CalendarProvider, FetchOptions, normalize_events};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::credentials;
use crate::error::ClientResult;

/// Runs the whole pipeline against Google Calendar.
pub async fn run(config: &AppConfig, print: bool) -> ClientResult<()> {
    let days = config.days_to_fetch()?;
    let zone = config.report_zone()?;
    let window = DateWindow::starting(zone.today(Utc::now()), days)?;
    info!(
        "fetching {} day(s) from {} to {} ({})",
        window.day_count(),
        window.start(),
        window.end(),
        zone
    );

    let (creds, source) = credentials::resolve(config)?;
    info!("using Google credentials from {}", source);
    let provider = GoogleProvider::connect(config.google_config(creds)).await?;

    let report = build_report(&provider, &window, &zone, config.calendar_filter()).await?;

    let output = config.output_path();
    report.write_to(&output)?;
    log_summary(&report);

    if print {
        println!("{}", report.to_json()?);
    } else {
        println!(
            "Saved {} event(s) over {} day(s) to {}",
            report.event_count(),
            report.days.len(),
            output.display()
        );
    }
    Ok(())
}

/// Lists calendars, fetches their events over the window and normalizes them.
///
/// `calendar_filter` restricts the calendars fetched; without it every
/// listed calendar is used. A calendar that fails to answer is skipped.
///
/// # Errors
///
/// Fails when the calendar list cannot be retrieved.
pub async fn build_report(
    provider: &dyn CalendarProvider,
    window: &DateWindow,
    zone: &ReportTimeZone,
    calendar_filter: Option<&[String]>,
) -> ClientResult<Report> {
    let calendars = provider.list_calendars().await?;
    info!("found {} calendar(s)", calendars.len());
    for calendar in &calendars {
        debug!("calendar {} ({})", calendar.name, calendar.id);
    }

    let calendar_ids: Vec<String> = match calendar_filter {
        Some(ids) => ids.to_vec(),
        None => calendars.into_iter().map(|c| c.id).collect(),
    };

    let options = FetchOptions::new(window.to_time_window(zone)).with_calendar_ids(calendar_ids);
    let result = provider.fetch_events(options).await?;
    if result.is_partial() {
        warn!(
            "{} calendar(s) could not be fetched: {}",
            result.failed_calendars.len(),
            result.failed_calendars.join(", ")
        );
    }
    info!(
        "fetched {} raw event(s) from {} calendar(s)",
        result.events.len(),
        result.calendars_fetched
    );

    Ok(normalize_events(window, &result.events, zone))
}

fn log_summary(report: &Report) {
    for day in &report.days {
        info!("{} {}: {} event(s)", day.weekday, day.date, day.events.len());
        for event in &day.events {
            match (&event.start_time, &event.end_time) {
                (Some(start), Some(end)) => debug!("  {}-{} {}", start, end, event.title),
                _ => debug!("  all day {}", event.title),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsnap_providers::{
        BoxFuture, CalendarInfo, FetchResult, ProviderError, ProviderResult, RawEvent,
    };
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;
    use std::sync::Mutex;

    /// In-memory provider that records what it was asked for.
    struct FakeProvider {
        calendars: Vec<CalendarInfo>,
        events: Vec<RawEvent>,
        fail_listing: bool,
        failing_calendar: Option<String>,
        requested: Mutex<Option<FetchOptions>>,
    }

    impl FakeProvider {
        fn new(events: Vec<RawEvent>) -> Self {
            Self {
                calendars: vec![
                    CalendarInfo::new("me@example.com", "Me").with_primary(true),
                    CalendarInfo::new("team@example.com", "Team"),
                ],
                events,
                fail_listing: false,
                failing_calendar: None,
                requested: Mutex::new(None),
            }
        }
    }

    impl CalendarProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
            Box::pin(async move {
                if self.fail_listing {
                    return Err(ProviderError::network("connection refused"));
                }
                Ok(self.calendars.clone())
            })
        }

        fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
            Box::pin(async move {
                let ids = options.calendar_ids.clone().unwrap_or_default();
                *self.requested.lock().unwrap() = Some(options);

                let mut result = FetchResult::default();
                for id in ids {
                    if self.failing_calendar.as_deref() == Some(id.as_str()) {
                        result.failed_calendars.push(id);
                        continue;
                    }
                    result
                        .events
                        .extend(self.events.iter().filter(|e| e.calendar_id == id).cloned());
                    result.calendars_fetched += 1;
                }
                Ok(result)
            })
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::starting(date(3), 3).unwrap()
    }

    fn zone() -> ReportTimeZone {
        ReportTimeZone::Named(Tz::UTC)
    }

    fn sample_events() -> Vec<RawEvent> {
        vec![
            RawEvent::timed(
                "1",
                Utc.with_ymd_and_hms(2025, 2, 3, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap(),
                "me@example.com",
            )
            .with_summary("Standup"),
            RawEvent::all_day("2", date(4), date(5), "team@example.com").with_summary("Offsite"),
        ]
    }

    #[tokio::test]
    async fn fetches_every_listed_calendar() {
        let provider = FakeProvider::new(sample_events());
        let report = build_report(&provider, &window(), &zone(), None).await.unwrap();

        assert_eq!(report.days.len(), 3);
        assert_eq!(report.days[0].events[0].title, "Standup");
        assert_eq!(report.days[1].events[0].title, "Offsite");
        assert!(report.days[2].events.is_empty());

        let requested = provider.requested.lock().unwrap().clone().unwrap();
        assert_eq!(
            requested.calendar_ids,
            Some(vec!["me@example.com".to_string(), "team@example.com".to_string()])
        );
        // query stops at midnight after the last date
        assert_eq!(requested.time_window.start, Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap());
        assert_eq!(requested.time_window.end, Utc.with_ymd_and_hms(2025, 2, 6, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn applies_calendar_filter() {
        let provider = FakeProvider::new(sample_events());
        let filter = vec!["team@example.com".to_string()];
        let report = build_report(&provider, &window(), &zone(), Some(filter.as_slice()))
            .await
            .unwrap();

        assert_eq!(report.event_count(), 1);
        assert_eq!(report.days[1].events[0].title, "Offsite");
    }

    #[tokio::test]
    async fn failing_calendar_is_skipped() {
        let mut provider = FakeProvider::new(sample_events());
        provider.failing_calendar = Some("team@example.com".to_string());

        let report = build_report(&provider, &window(), &zone(), None).await.unwrap();
        assert_eq!(report.event_count(), 1);
        assert_eq!(report.days[0].events[0].title, "Standup");
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let mut provider = FakeProvider::new(sample_events());
        provider.fail_listing = true;

        let result = build_report(&provider, &window(), &zone(), None).await;
        assert!(matches!(result, Err(crate::error::ClientError::Provider(_))));
    }

    #[tokio::test]
    async fn no_calendars_gives_empty_days() {
        let mut provider = FakeProvider::new(vec![]);
        provider.calendars.clear();

        let report = build_report(&provider, &window(), &zone(), None).await.unwrap();
        assert_eq!(report.days.len(), 3);
        assert_eq!(report.event_count(), 0);
    }
}
