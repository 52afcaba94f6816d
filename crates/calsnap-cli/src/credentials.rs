//! Google OAuth client credential resolution.
//!
//! Priority (highest to lowest):
//! 1. `GOOGLE_CLIENT_ID` + `GOOGLE_CLIENT_SECRET` + `GOOGLE_PROJECT_ID` in the
//!    environment (or `.env`), with optional `GOOGLE_AUTH_URI` and
//!    `GOOGLE_TOKEN_URI`
//! 2. `client_id` + `client_secret` in the `[google]` section of config.toml
//! 3. the credentials JSON file (`credentials.json` unless configured)

use std::fmt;
use std::path::{Path, PathBuf};

use calsnap_providers::google::OAuthCredentials;
use tracing::debug;

use crate::config::{AppConfig, DEFAULT_CREDENTIALS_FILE};
use crate::error::{ClientError, ClientResult};

const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
const ENV_PROJECT_ID: &str = "GOOGLE_PROJECT_ID";
const ENV_AUTH_URI: &str = "GOOGLE_AUTH_URI";
const ENV_TOKEN_URI: &str = "GOOGLE_TOKEN_URI";

/// Where the credentials were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    ConfigFile,
    CredentialsFile(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment variables"),
            Self::ConfigFile => write!(f, "config.toml [google] section"),
            Self::CredentialsFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolves credentials from the process environment and `config`.
pub fn resolve(config: &AppConfig) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    resolve_with(|name| std::env::var(name).ok(), config)
}

/// Resolves credentials, reading environment variables through `env`.
///
/// # Errors
///
/// Returns a configuration error when no source provides credentials or
/// the credentials file is unreadable.
pub fn resolve_with<F>(env: F, config: &AppConfig) -> ClientResult<(OAuthCredentials, CredentialSource)>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    match (env(ENV_CLIENT_ID), env(ENV_CLIENT_SECRET), env(ENV_PROJECT_ID)) {
        (Some(id), Some(secret), Some(project)) => {
            let mut creds = OAuthCredentials::new(id, secret).with_project_id(project);
            if let Some(uri) = env(ENV_AUTH_URI) {
                creds = creds.with_auth_uri(uri);
            }
            if let Some(uri) = env(ENV_TOKEN_URI) {
                creds = creds.with_token_uri(uri);
            }
            return Ok((creds, CredentialSource::Environment));
        }
        (None, None, None) => {}
        _ => debug!(
            "ignoring partial Google credentials in the environment; {}, {} and {} are all required",
            ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_PROJECT_ID
        ),
    }

    let google = &config.google;
    if let (Some(id), Some(secret)) = (&google.client_id, &google.client_secret) {
        let mut creds = OAuthCredentials::new(id, secret);
        creds.project_id = google.project_id.clone();
        return Ok((creds, CredentialSource::ConfigFile));
    }

    let path = google
        .credentials_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
    if path.exists() {
        let creds = OAuthCredentials::from_file(&path)?;
        return Ok((creds, CredentialSource::CredentialsFile(path)));
    }

    Err(missing_credentials(&path))
}

fn missing_credentials(path: &Path) -> ClientError {
    ClientError::config(format!(
        "Google credentials not found. Either:\n  \
         - set {}, {} and {} (environment or .env),\n  \
         - add client_id and client_secret to the [google] section of {},\n  \
         - or place the OAuth client JSON from the Google Cloud Console at {}",
        ENV_CLIENT_ID,
        ENV_CLIENT_SECRET,
        ENV_PROJECT_ID,
        AppConfig::default_path().display(),
        path.display()
    ))
}
