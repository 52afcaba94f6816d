//! OAuth token cache.
//!
//! The token lives in a single JSON file (`token.json` by default). Files
//! written by Google's Python client use `token` and `expiry` instead of
//! `access_token` and `expires_at`; both spellings are accepted on load.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds shaved off the advertised lifetime so a token is refreshed
/// before the API starts rejecting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token for API requests.
    #[serde(alias = "token")]
    pub access_token: String,

    pub refresh_token: Option<String>,

    /// When the access token stops being accepted.
    #[serde(default, alias = "expiry")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes the token was granted.
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default = "Utc::now")]
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Builds a token set from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// A token without a known expiry is treated as valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true if every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Returns a copy carrying a freshly refreshed access token.
    ///
    /// The refresh token and scopes are kept.
    pub fn refreshed(&self, access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: expires_in_secs.map(expiry_from_now),
            last_refresh: Utc::now(),
            ..self.clone()
        }
    }

    /// Returns the time until the token expires, if known.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|at| at - Utc::now())
    }
}

fn expiry_from_now(expires_in_secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in_secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached token.
    ///
    /// Returns `Ok(None)` when there is no token file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file exists but cannot be read
    /// or parsed.
    pub fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read token file {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        let token: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to parse token file {}; delete it to authorize again",
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!("loaded token from {:?}", self.path);
        Ok(Some(token))
    }

    /// Writes the token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be written.
    pub fn save(&self, token: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration("failed to create token directory").with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(token).map_err(|e| {
            ProviderError::internal("failed to serialize token").with_source(e)
        })?;

        // temp file + rename so a crash never leaves half a token behind
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to write token file {}",
                temp_path.display()
            ))
            .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| {
                ProviderError::configuration("failed to restrict token file permissions")
                    .with_source(e)
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to move token file into {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!("saved token to {:?}", self.path);
        Ok(())
    }

    /// Deletes the token file, if any.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file exists but cannot be removed.
    pub fn clear(&self) -> ProviderResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration("failed to remove token file").with_source(e)
            })?;
            info!("removed cached token {:?}", self.path);
        }
        Ok(())
    }
}
