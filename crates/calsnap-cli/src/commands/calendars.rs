//! Calendar listing command.

use calsnap_providers::google::GoogleProvider;
use calsnap_providers::{CalendarInfo, CalendarProvider};

use crate::config::AppConfig;
use crate::credentials;
use crate::error::ClientResult;

/// Prints the calendars visible to the account, one per line.
pub async fn list(config: &AppConfig) -> ClientResult<()> {
    let (creds, _) = credentials::resolve(config)?;
    let provider = GoogleProvider::connect(config.google_config(creds)).await?;
    let calendars = provider.list_calendars().await?;

    if calendars.is_empty() {
        println!("No calendars found.");
        return Ok(());
    }
    let filter = config.calendar_filter();
    for calendar in &calendars {
        let selected = filter.is_none_or(|ids| ids.contains(&calendar.id));
        println!("{}", calendar_line(calendar, selected));
    }
    Ok(())
}

/// Formats one listing row: markers, id, name, then zone and role.
///
/// `*` marks the primary calendar and `-` a calendar the configured
/// filter leaves out.
pub fn calendar_line(calendar: &CalendarInfo, selected: bool) -> String {
    let marker = match (calendar.is_primary, selected) {
        (_, false) => '-',
        (true, true) => '*',
        (false, true) => ' ',
    };
    let mut line = format!("{} {}  {}", marker, calendar.id, calendar.name);
    let details: Vec<&str> = [calendar.timezone.as_deref(), calendar.access_role.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !details.is_empty() {
        line.push_str(&format!(" ({})", details.join(", ")));
    }
    line
}
