//! Google Calendar backend.
//!
//! # Authentication
//!
//! 1. The user registers a desktop OAuth client in Google Cloud and hands
//!    calsnap its ID and secret.
//! 2. On first use a loopback listener is started on `127.0.0.1` and the
//!    browser is sent to Google's consent page with a PKCE challenge.
//! 3. Google redirects back with a code, exchanged for an access token and a
//!    refresh token, cached in `token.json`.
//! 4. Later runs reuse the cached token and refresh it when it expires.
//!
//! # Example
//!
//! ```ignore
//! use calsnap_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let provider = GoogleProvider::connect(GoogleConfig::new(credentials)).await?;
//! let calendars = provider.list_calendars().await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::{GoogleCalendarClient, MAX_EVENTS_PER_PAGE};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::{Authenticator, GoogleProvider};
pub use tokens::{TokenInfo, TokenStore};
