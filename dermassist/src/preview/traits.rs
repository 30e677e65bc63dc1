//! Preview backend trait and handle type

use crate::upload::CandidateFile;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while acquiring or releasing a preview
#[derive(Debug, Error)]
pub enum PreviewError {
    /// I/O error while materializing or deleting a preview
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The handle was never issued, or was already released
    #[error("Unknown preview handle: {0}")]
    UnknownHandle(Uuid),

    /// Generic preview error
    #[error("Preview error: {0}")]
    Other(String),
}

/// Result type for preview operations
pub type PreviewResult<T> = Result<T, PreviewError>;

/// An opaque, revocable reference to a renderable copy of the selection
///
/// Handles are cheap to clone. A clone is only a reference: releasing goes
/// through the [`PreviewManager`](super::PreviewManager) that acquired it,
/// after which the URL no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    dimensions: Option<(u32, u32)>,
}

impl PreviewHandle {
    /// Creates a handle; called by backends when they issue one
    #[must_use]
    pub fn new(id: Uuid, url: impl Into<String>, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            id,
            url: url.into(),
            dimensions,
        }
    }

    /// Unique id of this handle
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Where the preview can be rendered from (`blob:` or `file://`)
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pixel dimensions, when the image header could be read
    #[must_use]
    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Source of preview handles
///
/// Implementations must issue a fresh handle on every `acquire` and report
/// [`PreviewError::UnknownHandle`] when asked to release a handle that is
/// not live, so double releases are visible.
#[cfg_attr(test, mockall::automock)]
pub trait PreviewBackend: Send {
    /// Materializes a preview for `candidate` and returns its handle
    fn acquire(&self, candidate: &CandidateFile) -> PreviewResult<PreviewHandle>;

    /// Revokes a previously issued handle
    fn release(&self, handle: &PreviewHandle) -> PreviewResult<()>;
}
