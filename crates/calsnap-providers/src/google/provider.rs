//! Google Calendar provider.
//!
//! [`GoogleProvider::connect`] settles authentication up front (cached
//! token, refresh, or the browser flow) and then only talks to the API, so
//! the provider itself holds no mutable state.

use tracing::{debug, info, warn};

use crate::error::ProviderResult;
use crate::provider::{BoxFuture, CalendarInfo, CalendarProvider, FetchOptions, FetchResult};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStore};

const PROVIDER_NAME: &str = "google";

/// What to do with the cached token.
#[derive(Debug, PartialEq, Eq)]
enum CachedToken {
    Usable(TokenInfo),
    Refresh { token: TokenInfo, refresh_token: String },
    Authorize,
}

fn assess(cached: Option<TokenInfo>, scopes: &[String]) -> CachedToken {
    let Some(token) = cached else {
        return CachedToken::Authorize;
    };
    if !token.has_scopes(scopes) {
        info!("cached token lacks the required scopes, authorization needed");
        return CachedToken::Authorize;
    }
    if !token.is_expired() {
        return CachedToken::Usable(token);
    }
    match token.refresh_token.clone() {
        Some(refresh_token) => CachedToken::Refresh {
            token,
            refresh_token,
        },
        None => {
            info!("cached token expired and has no refresh token");
            CachedToken::Authorize
        }
    }
}

/// Produces a valid access token for a Google client.
#[derive(Debug)]
pub struct Authenticator {
    store: TokenStore,
    oauth: OAuthClient,
    scopes: Vec<String>,
    loopback_port: u16,
}

impl Authenticator {
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        Ok(Self {
            store: TokenStore::new(&config.token_path),
            oauth: OAuthClient::new(config.credentials.clone(), config.timeout)?,
            scopes: config.scopes.clone(),
            loopback_port: config.loopback_port,
        })
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Returns a token that is valid right now.
    ///
    /// Uses the cached token when it is fresh and carries the required
    /// scopes, refreshes it when it has expired, and otherwise (or when
    /// `force` is set) runs the browser flow. A new or refreshed token is
    /// written back to the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache is unreadable, the browser flow fails,
    /// or the new token cannot be saved.
    pub async fn token(&self, force: bool) -> ProviderResult<TokenInfo> {
        let cached = if force {
            info!("forcing a new authorization");
            None
        } else {
            self.store.load()?
        };

        match assess(cached, &self.scopes) {
            CachedToken::Usable(token) => {
                debug!(
                    "using cached token (expires in {} min)",
                    token
                        .time_until_expiry()
                        .map(|d| d.num_minutes().to_string())
                        .unwrap_or_else(|| "?".to_string())
                );
                return Ok(token);
            }
            CachedToken::Refresh {
                token,
                refresh_token,
            } => match self.oauth.refresh_token(&refresh_token).await {
                Ok((access_token, expires_in)) => {
                    let token = token.refreshed(access_token, expires_in);
                    self.store.save(&token)?;
                    return Ok(token);
                }
                Err(e) => warn!("token refresh failed, authorizing again: {}", e),
            },
            CachedToken::Authorize => {}
        }

        let token = self.oauth.authorize(&self.scopes, self.loopback_port).await?;
        self.store.save(&token)?;
        info!("authorization complete, token saved to {:?}", self.store.path());
        Ok(token)
    }
}

/// Calendar provider backed by the Google Calendar API.
#[derive(Debug)]
pub struct GoogleProvider {
    config: GoogleConfig,
    client: GoogleCalendarClient,
}

impl GoogleProvider {
    /// Authenticates and returns a ready provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no token can be
    /// obtained.
    pub async fn connect(config: GoogleConfig) -> ProviderResult<Self> {
        let token = Authenticator::new(&config)?.token(false).await?;
        Self::with_token(config, &token)
    }

    /// Builds a provider around an already valid token.
    pub fn with_token(config: GoogleConfig, token: &TokenInfo) -> ProviderResult<Self> {
        let client =
            GoogleCalendarClient::new(&token.access_token, config.timeout, &config.user_agent)?;
        Ok(Self { config, client })
    }

    async fn fetch_all(&self, options: FetchOptions) -> ProviderResult<FetchResult> {
        let calendar_ids = match options
            .calendar_ids
            .or_else(|| self.config.calendar_ids.clone())
        {
            Some(ids) => ids,
            None => self
                .client
                .list_calendars()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))?
                .into_iter()
                .map(|c| c.id)
                .collect(),
        };

        let mut result = FetchResult::default();
        for calendar_id in &calendar_ids {
            match self.client.list_events(calendar_id, &options.time_window).await {
                Ok(events) => {
                    info!("{}: {} event(s)", calendar_id, events.len());
                    result.events.extend(events);
                    result.calendars_fetched += 1;
                }
                Err(e) => {
                    warn!(calendar = %calendar_id, "could not fetch events: {}", e);
                    result.failed_calendars.push(calendar_id.clone());
                }
            }
        }
        Ok(result)
    }
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            self.client
                .list_calendars()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        Box::pin(self.fetch_all(options))
    }
}
