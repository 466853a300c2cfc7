//! Shared context and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use lumina_client::{
    ActionDispatcher, ApiClient, ApiError, CollectionState, CredentialStore, ListScope,
};
use url::Url;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Map a client-library error: local rejections are validation, the
    /// rest are operational failures.
    pub(crate) fn from_api(error: ApiError) -> Self {
        match error {
            ApiError::Invalid(message) => Self::Validation(message),
            other => Self::Failure(other.into()),
        }
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
}

impl AppContext {
    /// Build the context from resolved CLI options.
    pub(crate) fn new(api_url: Url, timeout_secs: u64, store: CredentialStore) -> CliResult<Self> {
        let api = ApiClient::with_timeout(api_url, store, Duration::from_secs(timeout_secs))
            .map_err(CliError::from_api)?;
        Ok(Self { api })
    }

    /// A dispatcher over a fresh collection for `scope`.
    pub(crate) fn dispatcher(&self, scope: ListScope) -> ActionDispatcher {
        ActionDispatcher::new(self.api.clone(), CollectionState::new(), scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_api_splits_validation_from_failure() {
        let err = CliError::from_api(ApiError::Invalid("bad input".to_string()));
        assert!(matches!(err, CliError::Validation(message) if message == "bad input"));
        assert_eq!(
            CliError::from_api(ApiError::Invalid(String::new())).exit_code(),
            2
        );

        let err = CliError::from_api(ApiError::Forbidden);
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("forbidden"));
    }
}
