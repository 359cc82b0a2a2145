//! Dispatcher error types.

use simplegen_core::StoreError;
use thiserror::Error;

/// Errors returned by [`ChatDispatcher`](crate::ChatDispatcher).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The provider answered with an `error` object. The model has been
    /// disabled and the request log entry marked unsuccessful.
    #[error("error encountered calling chat model ({model}); see request log ID {log_id}: {message}")]
    Provider {
        model: String,
        log_id: u64,
        message: String,
    },

    /// The model's stored parameters have the wrong shape.
    #[error("model {model} has malformed parameters: {source}")]
    Config {
        model: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the configuration or writing the request log failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Network failure, timeout, or a response body that is not JSON.
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DispatchError {
    /// Whether this is a provider-reported error (the model is now disabled).
    pub fn is_provider_error(&self) -> bool {
        matches!(self, DispatchError::Provider { .. })
    }
}
