//! CLI error types.

use calsnap_core::CoreError;
use calsnap_providers::ProviderError;
use thiserror::Error;

/// Result type for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced to the user by the `calsnap` binary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Talking to the calendar provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Building or writing the report failed.
    #[error("report error: {0}")]
    Report(#[from] CoreError),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Renders the error with its chain of causes, `outer: inner: ...`.
    pub fn render(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !rendered.ends_with(&text) {
                rendered.push_str(": ");
                rendered.push_str(&text);
            }
            source = cause.source();
        }
        rendered
    }
}
