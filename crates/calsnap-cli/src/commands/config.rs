//! Configuration commands.

use crate::config::AppConfig;
use crate::credentials;
use crate::error::{ClientError, ClientResult};

/// Dumps the effective configuration to stdout, secrets masked.
pub fn dump(config: &AppConfig) -> ClientResult<()> {
    println!("# config.toml ({})", AppConfig::default_path().display());
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &AppConfig) -> ClientResult<String> {
    toml::to_string_pretty(&config.redacted())
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))
}

/// Validates the configuration and the credentials it resolves to.
pub fn validate(config: &AppConfig) -> ClientResult<()> {
    for line in check(config)? {
        println!("{}", line);
    }
    println!("Configuration is valid.");
    Ok(())
}

fn check(config: &AppConfig) -> ClientResult<Vec<String>> {
    let days = config.days_to_fetch()?;
    let zone = config.report_zone()?;
    let (creds, source) = credentials::resolve(config)?;
    creds.validate().map_err(|e| {
        ClientError::config(format!("invalid Google credentials from {}: {}", source, e))
    })?;
    config.google_config(creds).validate()?;
    if let Some(ids) = config.calendar_filter()
        && ids.is_empty()
    {
        return Err(ClientError::config("google.calendar_ids must not be empty"));
    }

    Ok(vec![
        format!("days to fetch: {}", days),
        format!("time zone: {}", zone),
        format!("output: {}", config.output_path().display()),
        format!("Google credentials: {}", source),
    ])
}

/// Shows the configuration file path.
pub fn path() -> ClientResult<()> {
    println!("config: {}", AppConfig::default_path().display());
    Ok(())
}
