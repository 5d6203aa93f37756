//! Error types for the notification transports.

use std::time::Duration;

use thiserror::Error;

use crate::http_client::HttpClientPoolError;

/// Defines the possible errors that can occur while delivering a
/// notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// An error related to invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An external command could not be run or exited unsuccessfully.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// An error indicating that the notification failed to be sent.
    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    /// An internal error that should not occur under normal circumstances.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// An error originating from the HTTP client pool.
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] HttpClientPoolError),

    /// An error from the underlying `reqwest` or `reqwest_middleware`
    /// libraries.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest_middleware::Error),

    /// A single delivery attempt took too long.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl NotificationError {
    /// Whether trying again could succeed. Configuration problems will not go
    /// away on their own.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, NotificationError::ConfigError(_) | NotificationError::InternalError(_))
    }
}
