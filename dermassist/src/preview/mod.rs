//! Preview resources for the current selection
//!
//! A preview is a renderable stand-in for the selected image: an in-memory
//! `blob:` reference, or a file the user can open from the terminal. Either
//! way it is a resource that has to be released, and the
//! [`PreviewManager`] is the only thing allowed to acquire or release it.
//!
//! # Guarantees
//!
//! - At most one handle is live at a time. [`PreviewManager::set`] releases
//!   the held handle before acquiring the next one.
//! - [`PreviewManager::clear`] is idempotent.
//! - Dropping the manager releases whatever it still holds, including while
//!   unwinding.
//!
//! # Examples
//!
//! ```rust
//! use dermassist::preview::{BlobPreviewStore, PreviewManager};
//! use dermassist::upload::CandidateFile;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BlobPreviewStore::new();
//! let mut previews = PreviewManager::new(store.clone());
//!
//! let first = CandidateFile::new("a.jpg", "image/jpeg", vec![1, 2, 3]);
//! let second = CandidateFile::new("b.png", "image/png", vec![4, 5, 6]);
//!
//! previews.set(&first)?;
//! previews.set(&second)?;
//! assert_eq!(store.live_count(), 1);
//! assert_eq!(store.released_count(), 1);
//!
//! drop(previews);
//! assert_eq!(store.live_count(), 0);
//! # Ok(())
//! # }
//! ```

mod blob;
mod local;
mod traits;

pub use blob::BlobPreviewStore;
pub use local::FilePreviewStore;
pub use traits::{PreviewBackend, PreviewError, PreviewHandle, PreviewResult};

#[cfg(test)]
pub use traits::MockPreviewBackend;

use crate::upload::CandidateFile;
use std::io::Cursor;
use tracing::{debug, warn};

/// Owns the lifecycle of the single live preview handle
pub struct PreviewManager<B: PreviewBackend> {
    backend: B,
    current: Option<PreviewHandle>,
}

impl<B: PreviewBackend> PreviewManager<B> {
    /// Creates a manager holding nothing
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Replaces the held preview with one for `candidate`
    ///
    /// The previous handle is released first. If acquiring the new handle
    /// fails, the manager is left holding nothing.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the new preview cannot be created.
    pub fn set(&mut self, candidate: &CandidateFile) -> PreviewResult<PreviewHandle> {
        self.clear();

        let handle = self.backend.acquire(candidate)?;
        debug!(url = handle.url(), filename = %candidate.filename, "Acquired preview");
        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Releases the held preview, if any
    ///
    /// Release failures are logged, not returned. The handle is forgotten
    /// either way.
    pub fn clear(&mut self) {
        if let Some(handle) = self.current.take() {
            match self.backend.release(&handle) {
                Ok(()) => debug!(url = handle.url(), "Released preview"),
                Err(e) => warn!(url = handle.url(), error = %e, "Failed to release preview"),
            }
        }
    }

    /// The currently held handle
    #[must_use]
    pub const fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    /// The backend issuing handles
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: PreviewBackend> Drop for PreviewManager<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<B: PreviewBackend> std::fmt::Debug for PreviewManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewManager")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Reads pixel dimensions from an image header without decoding it
///
/// Returns `None` when the bytes are not a recognizable image; previews are
/// still issued for those, just without dimensions.
#[must_use]
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn jpeg(name: &str) -> CandidateFile {
        CandidateFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[test]
    fn test_set_releases_previous_handle_first() {
        let store = BlobPreviewStore::new();
        let mut previews = PreviewManager::new(store.clone());

        let first = previews.set(&jpeg("a.jpg")).unwrap();
        let second = previews.set(&jpeg("b.jpg")).unwrap();

        assert_ne!(first, second);
        assert!(!store.is_live(&first));
        assert!(store.is_live(&second));
        assert_eq!(previews.current(), Some(&second));
    }

    #[test]
    fn test_n_selections_leave_one_live() {
        let store = BlobPreviewStore::new();
        let mut previews = PreviewManager::new(store.clone());

        for i in 0..25 {
            previews.set(&jpeg(&format!("{i}.jpg"))).unwrap();
            assert_eq!(store.live_count(), 1);
        }

        assert_eq!(store.acquired_count(), 25);
        assert_eq!(store.released_count(), 24);
        assert_eq!(store.failed_release_count(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = BlobPreviewStore::new();
        let mut previews = PreviewManager::new(store.clone());

        previews.clear();
        previews.set(&jpeg("a.jpg")).unwrap();
        previews.clear();
        previews.clear();

        assert_eq!(store.live_count(), 0);
        assert_eq!(store.released_count(), 1);
        assert_eq!(store.failed_release_count(), 0);
        assert!(previews.current().is_none());
    }

    #[test]
    fn test_drop_releases_held_handle() {
        let store = BlobPreviewStore::new();
        {
            let mut previews = PreviewManager::new(store.clone());
            previews.set(&jpeg("a.jpg")).unwrap();
            assert_eq!(store.live_count(), 1);
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_drop_releases_while_unwinding() {
        let store = BlobPreviewStore::new();
        let inner = store.clone();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut previews = PreviewManager::new(inner);
            previews.set(&jpeg("a.jpg")).unwrap();
            panic!("view crashed");
        }));

        assert!(outcome.is_err());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_failed_acquire_leaves_nothing_held() {
        let handle = PreviewHandle::new(Uuid::new_v4(), "blob:test/1", None);
        let mut backend = MockPreviewBackend::new();
        let issued = handle.clone();
        let mut calls = 0;
        backend.expect_acquire().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(issued.clone())
            } else {
                Err(PreviewError::Other("disk full".into()))
            }
        });
        backend
            .expect_release()
            .with(eq(handle))
            .times(1)
            .returning(|_| Ok(()));

        let mut previews = PreviewManager::new(backend);
        previews.set(&jpeg("a.jpg")).unwrap();
        assert!(previews.set(&jpeg("b.jpg")).is_err());
        assert!(previews.current().is_none());
    }

    #[test]
    fn test_release_failure_is_swallowed() {
        let handle = PreviewHandle::new(Uuid::new_v4(), "blob:test/2", None);
        let mut backend = MockPreviewBackend::new();
        let issued = handle.clone();
        backend
            .expect_acquire()
            .returning(move |_| Ok(issued.clone()));
        backend
            .expect_release()
            .times(1)
            .returning(|h| Err(PreviewError::UnknownHandle(h.id())));

        let mut previews = PreviewManager::new(backend);
        previews.set(&jpeg("a.jpg")).unwrap();
        previews.clear();
        assert!(previews.current().is_none());
    }

    #[test]
    fn test_probe_dimensions_of_non_image() {
        assert_eq!(probe_dimensions(b"definitely not an image"), None);
    }

    #[test]
    fn test_probe_dimensions_of_png() {
        let mut png = Vec::new();
        image::RgbImage::new(3, 2)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(probe_dimensions(&png), Some((3, 2)));
    }
}
