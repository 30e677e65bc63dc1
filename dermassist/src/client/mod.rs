//! Client contract with the external analysis service
//!
//! The service is a black box: `POST {backend}/analyze` with a multipart
//! body holding one `file` part, answered by a JSON [`AnalysisResult`].
//! [`AnalysisService`] is the seam the workflow talks to; the production
//! implementation is [`HttpAnalysisClient`].
//!
//! One call is one attempt. Retrying is the caller's decision and happens by
//! analyzing again.

mod http;
mod types;

pub use http::HttpAnalysisClient;
pub use types::{AnalysisResult, RequestError};

use crate::state::Selection;
use async_trait::async_trait;

/// Submits a selection for analysis
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use dermassist::client::{AnalysisResult, AnalysisService, RequestError};
/// use dermassist::state::Selection;
///
/// /// Always answers 503, for demos without a backend
/// struct Offline;
///
/// #[async_trait]
/// impl AnalysisService for Offline {
///     async fn submit(&self, _selection: &Selection) -> Result<AnalysisResult, RequestError> {
///         Err(RequestError::Service { status: 503 })
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Uploads the selected file and waits for the verdict
    ///
    /// # Errors
    ///
    /// - [`RequestError::Transport`] if no response arrives
    /// - [`RequestError::Service`] for non-2xx statuses
    /// - [`RequestError::MalformedResponse`] for 2xx bodies that do not parse
    async fn submit(&self, selection: &Selection) -> Result<AnalysisResult, RequestError>;
}
