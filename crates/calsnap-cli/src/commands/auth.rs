//! Authentication command.

use calsnap_providers::google::{Authenticator, TokenStore};
use chrono::Utc;
use tracing::info;

use crate::config::AppConfig;
use crate::credentials;
use crate::error::ClientResult;

/// Makes sure a usable Google token is cached.
///
/// A valid cached token is kept unless `force` is set, in which case the
/// cache is deleted before the browser flow runs. An expired token is
/// refreshed, and the browser flow runs when neither works.
pub async fn google(config: &AppConfig, force: bool) -> ClientResult<()> {
    let (creds, source) = credentials::resolve(config)?;
    info!("using Google credentials from {}", source);
    let google_config = config.google_config(creds);
    let authenticator = Authenticator::new(&google_config)?;

    if force {
        forget_cached_token(authenticator.store())?;
        println!("A browser window will open for you to authorize calsnap.");
        println!();
    }

    let token = authenticator.token(force).await?;

    println!("Authenticated with Google Calendar.");
    println!("Token cached at {}", authenticator.store().path().display());
    if let Some(expires_at) = token.expires_at {
        let minutes = (expires_at - Utc::now()).num_minutes().max(0);
        println!("Access token valid for {} more minute(s).", minutes);
    }
    Ok(())
}

/// Deletes the cached token, if any, ahead of a forced authorization.
fn forget_cached_token(store: &TokenStore) -> ClientResult<()> {
    Ok(store.clear()?)
}
