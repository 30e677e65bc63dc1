//! Error types and error handling
//!
//! Each concern has its own error enum; [`DermAssistError`] aggregates them
//! for callers that do not care which layer failed.
//!
//! Validation and request errors never escape the workflow: they are stored
//! in the [`WorkflowState`](crate::state::WorkflowState) as data. The
//! variants here exist for direct use of the lower layers.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum DermAssistError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A file was rejected
    #[error(transparent)]
    Validation(#[from] crate::upload::ValidationError),

    /// A preview could not be created or released
    #[error("Preview error: {0}")]
    Preview(#[from] crate::preview::PreviewError),

    /// An analysis request failed
    #[error(transparent)]
    Request(#[from] crate::client::RequestError),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The workflow is no longer running
    #[error(transparent)]
    Closed(#[from] crate::workflow::WorkflowClosed),

    /// A global log subscriber was already installed
    #[error("Logging error: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using [`DermAssistError`]
pub type Result<T, E = DermAssistError> = std::result::Result<T, E>;
