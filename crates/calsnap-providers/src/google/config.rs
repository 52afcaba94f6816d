//! Google Calendar provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// OAuth 2.0 client credentials for a Google Cloud project.
///
/// Google only serves the Calendar API to registered applications, so the
/// user supplies their own desktop client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub project_id: Option<String>,
    /// Authorization endpoint the browser is sent to.
    pub auth_uri: String,
    /// Endpoint that exchanges codes and refresh tokens.
    pub token_uri: String,
}

/// Google's downloadable credentials JSON.
///
/// Either the Cloud Console layout, with an `installed` or `web` section,
/// or a flat object with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
    #[serde(flatten)]
    flat: FlatSection,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatSection {
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

impl OAuthCredentials {
    pub const DEFAULT_AUTH_URI: &'static str = "https://accounts.google.com/o/oauth2/auth";
    pub const DEFAULT_TOKEN_URI: &'static str = "https://oauth2.googleapis.com/token";

    /// Creates credentials pointing at Google's default endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            project_id: None,
            auth_uri: Self::DEFAULT_AUTH_URI.to_string(),
            token_uri: Self::DEFAULT_TOKEN_URI.to_string(),
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_auth_uri(mut self, uri: impl Into<String>) -> Self {
        self.auth_uri = uri.into();
        self
    }

    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = uri.into();
        self
    }

    /// Loads credentials from a file downloaded from the Cloud Console.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read credentials file {}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses a credentials JSON document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid JSON or when neither
    /// layout is present.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration("failed to parse credentials JSON").with_source(e)
        })?;

        if let Some(section) = file.installed.or(file.web) {
            let mut creds = Self::new(section.client_id, section.client_secret);
            creds.project_id = section.project_id;
            if let Some(uri) = section.auth_uri {
                creds.auth_uri = uri;
            }
            if let Some(uri) = section.token_uri {
                creds.token_uri = uri;
            }
            return Ok(creds);
        }

        if let (Some(client_id), Some(client_secret)) = (file.flat.client_id, file.flat.client_secret)
        {
            let mut creds = Self::new(client_id, client_secret);
            creds.project_id = file.flat.project_id;
            return Ok(creds);
        }

        Err(ProviderError::configuration(
            "credentials file must contain an 'installed' or 'web' section, or 'client_id' and 'client_secret' at the root",
        ))
    }

    /// Checks that the credentials look usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending field.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.is_empty() {
            return Err(ProviderError::configuration("client_id is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err(ProviderError::configuration(
                "client_id should end with .apps.googleusercontent.com",
            ));
        }
        if self.client_secret.is_empty() {
            return Err(ProviderError::configuration("client_secret is required"));
        }
        for (name, uri) in [("auth_uri", &self.auth_uri), ("token_uri", &self.token_uri)] {
            if !uri.starts_with("https://") && !uri.starts_with("http://") {
                return Err(ProviderError::configuration(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, uri
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Where the OAuth token is cached between runs.
    ///
    /// Defaults to `token.json` in the working directory.
    pub token_path: PathBuf,

    /// Calendars to fetch. `None` fetches every calendar in the account's list.
    pub calendar_ids: Option<Vec<String>>,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// Port for the loopback OAuth redirect; 0 picks any free port.
    pub loopback_port: u16,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read-only access to calendars and events.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    pub const DEFAULT_TOKEN_FILE: &'static str = "token.json";

    /// Creates a configuration with defaults for everything but the credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_FILE),
            calendar_ids: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calsnap/{}", env!("CARGO_PKG_VERSION")),
            loopback_port: 0,
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
        }
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Restricts fetching to the given calendars.
    pub fn with_calendar_ids(mut self, ids: Vec<String>) -> Self {
        self.calendar_ids = Some(ids);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_loopback_port(mut self, port: u16) -> Self {
        self.loopback_port = port;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for bad credentials, no scopes, or an
    /// empty calendar filter.
    pub fn validate(&self) -> ProviderResult<()> {
        self.credentials.validate()?;
        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        if self.calendar_ids.as_ref().is_some_and(|ids| ids.is_empty()) {
            return Err(ProviderError::configuration(
                "calendar_ids is set but empty; remove it to fetch every calendar",
            ));
        }
        Ok(())
    }
}
