//! calsnap configuration.
//!
//! Settings come from an optional `config.toml` (`--config`, or
//! `~/.config/calsnap/config.toml`), then environment variables and
//! command-line flags, which win over the file:
//!
//! ```toml
//! days_to_fetch = 7
//! output = "calendar_events.json"
//! timezone = "Europe/Paris"
//!
//! [google]
//! client_id = "1234-abcd.apps.googleusercontent.com"
//! client_secret = "..."
//! calendar_ids = ["primary", "team@group.calendar.google.com"]
//! token_path = "token.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calsnap_core::ReportTimeZone;
use calsnap_providers::google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

pub const DEFAULT_OUTPUT: &str = "calendar_events.json";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

/// Settings for a calsnap run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Length of the report window in days, starting today.
    pub days_to_fetch: Option<u32>,

    /// Report path (defaults to `calendar_events.json`).
    pub output: Option<PathBuf>,

    /// IANA zone for the report; the system zone when unset.
    pub timezone: Option<String>,

    pub google: GoogleSettings,
}

/// The `[google]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub project_id: Option<String>,

    /// Cloud Console credentials JSON (defaults to `credentials.json`).
    pub credentials_file: Option<PathBuf>,

    /// Token cache (defaults to `token.json`).
    pub token_path: Option<PathBuf>,

    /// Calendars to include; every listed calendar when unset.
    pub calendar_ids: Option<Vec<String>>,

    /// Port for the OAuth loopback redirect; any free port when unset.
    pub loopback_port: Option<u16>,

    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads the configuration file.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and defaults apply otherwise.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("no config file at {:?}, using defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            ClientError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        debug!("loaded config from {:?}", path);
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calsnap")
            .join("config.toml")
    }

    /// Applies command-line flags (and the environment variables clap
    /// read for them) on top of the file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(days) = cli.days {
            self.days_to_fetch = Some(days);
        }
        if let Some(ref output) = cli.output {
            self.output = Some(output.clone());
        }
        if let Some(ref timezone) = cli.timezone {
            self.timezone = Some(timezone.clone());
        }
        if let Some(ref path) = cli.credentials_file {
            self.google.credentials_file = Some(path.clone());
        }
        if let Some(ref path) = cli.token_file {
            self.google.token_path = Some(path.clone());
        }
    }

    /// Returns the window length.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no value is set anywhere or it is 0.
    pub fn days_to_fetch(&self) -> ClientResult<u32> {
        match self.days_to_fetch {
            Some(0) => Err(ClientError::config("days_to_fetch must be at least 1")),
            Some(days) => Ok(days),
            None => Err(ClientError::config(
                "DAYS_TO_FETCH environment variable is required \
                 (or pass --days, or set days_to_fetch in config.toml)",
            )),
        }
    }

    /// Returns the report zone.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown zone name.
    pub fn report_zone(&self) -> ClientResult<ReportTimeZone> {
        match self.timezone.as_deref() {
            None => Ok(ReportTimeZone::Local),
            Some(name) => name.parse().map_err(|e| ClientError::config(format!("{}", e))),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    /// Returns the configured calendar filter, if any.
    pub fn calendar_filter(&self) -> Option<&[String]> {
        self.google.calendar_ids.as_deref()
    }

    /// Builds the Google provider configuration around `credentials`.
    ///
    /// The calendar filter is not copied; the fetch pipeline applies it.
    pub fn google_config(&self, credentials: OAuthCredentials) -> GoogleConfig {
        let mut config = GoogleConfig::new(credentials);
        if let Some(ref path) = self.google.token_path {
            config = config.with_token_path(path);
        }
        if let Some(port) = self.google.loopback_port {
            config = config.with_loopback_port(port);
        }
        if let Some(secs) = self.google.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    /// Returns a copy safe to print, with the client secret masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.google.client_secret.is_some() {
            copy.google.client_secret = Some("********".to_string());
        }
        copy
    }
}
