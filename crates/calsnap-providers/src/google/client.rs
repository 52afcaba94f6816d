//! Google Calendar API v3 client.
//!
//! Thin wrapper over the two list endpoints the report needs,
//! `calendarList.list` and `events.list`, with pagination and HTTP status
//! mapping.

use std::time::Duration;

use calsnap_core::TimeWindow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::CalendarInfo;
use crate::raw_event::{EventSpan, RawEvent, RawEventTime};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page `events.list` serves.
pub const MAX_EVENTS_PER_PAGE: u32 = 2500;

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a client that authenticates with `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(
        access_token: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
        })
    }

    /// Lists every calendar in the account's calendar list.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarInfo>> {
        let url = format!("{}/users/me/calendarList", CALENDAR_API_BASE);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = Vec::new();
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }
            let page: CalendarListResponse = self.get_json(&url, &query).await?;
            calendars.extend(page.items.into_iter().map(CalendarListEntry::into_info));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("calendar list has {} entries", calendars.len());
        Ok(calendars)
    }

    /// Lists the events of one calendar that overlap `window`.
    ///
    /// Recurring events are expanded into instances by the API. Events the
    /// API returns with unusable start/end fields are logged and skipped.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<RawEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", MAX_EVENTS_PER_PAGE.to_string()),
            ];
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: EventListResponse = self.get_json(&url, &query).await?;
            events.extend(
                page.items
                    .into_iter()
                    .filter_map(|event| convert_event(event, calendar_id)),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("fetched {} events from calendar {}", events.len(), calendar_id);
        Ok(events)
    }

    /// Sends an authenticated GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                ProviderError::network(message).with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network("failed to read response").with_source(e))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse API response").with_source(e)
        })
    }
}

/// Maps a non-2xx status to a provider error.
fn status_error(status: reqwest::StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("access token expired or invalid")
        }
        reqwest::StatusCode::FORBIDDEN => {
            ProviderError::authorization(format!("access denied: {}", body.trim()))
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        _ => ProviderError::server(format!("API error ({}): {}", status, body.trim())),
    }
}

/// Converts an API event, or returns `None` when its bounds are unusable.
fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<RawEvent> {
    let id = event.id.unwrap_or_default();

    let bounds = match (event.start.as_ref(), event.end.as_ref()) {
        (Some(start), Some(end)) => parse_bound(start).and_then(|s| Ok((s, parse_bound(end)?))),
        _ => Err("missing start or end".to_string()),
    };
    let span = match bounds {
        Ok((start, end)) => EventSpan::from_bounds(start, end)
            .ok_or_else(|| "start and end mix a date with a date-time".to_string()),
        Err(reason) => Err(reason),
    };

    match span {
        Ok(span) => {
            let mut raw = RawEvent::new(id, span, calendar_id);
            raw.summary = event.summary;
            raw.location = event.location;
            raw.status = event.status;
            Some(raw)
        }
        Err(reason) => {
            warn!(event_id = %id, calendar = %calendar_id, "dropping event: {}", reason);
            None
        }
    }
}

fn parse_bound(time: &ApiEventTime) -> Result<RawEventTime, String> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
            .map(|t| RawEventTime::DateTime(t.with_timezone(&Utc)))
            .map_err(|e| format!("bad dateTime '{}': {}", dt, e)),
        (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(RawEventTime::Date)
            .map_err(|e| format!("bad date '{}': {}", date, e)),
        (None, None) => Err("bound has neither date nor dateTime".to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    status: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    /// Name the user gave the calendar in their own list.
    #[serde(default)]
    summary_override: Option<String>,
    #[serde(default)]
    primary: bool,
    time_zone: Option<String>,
    access_role: Option<String>,
}

impl CalendarListEntry {
    fn into_info(self) -> CalendarInfo {
        let name = self
            .summary_override
            .or(self.summary)
            .unwrap_or_else(|| self.id.clone());
        CalendarInfo {
            id: self.id,
            name,
            is_primary: self.primary,
            timezone: self.time_zone,
            access_role: self.access_role,
        }
    }
}
