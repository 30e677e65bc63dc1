//! In-memory `blob:` preview store

use super::traits::{PreviewBackend, PreviewError, PreviewHandle, PreviewResult};
use crate::upload::CandidateFile;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Issues `blob:dermassist/<uuid>` handles backed by an in-memory registry
///
/// Clones share the registry, so a caller can keep a clone to resolve
/// handles or inspect the counters while a
/// [`PreviewManager`](super::PreviewManager) owns another.
#[derive(Debug, Clone, Default)]
pub struct BlobPreviewStore {
    inner: Arc<Mutex<BlobRegistry>>,
}

#[derive(Debug, Default)]
struct BlobRegistry {
    live: HashMap<Uuid, Arc<Vec<u8>>>,
    acquired: usize,
    released: usize,
    failed_releases: usize,
}

impl BlobPreviewStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes behind a live handle
    #[must_use]
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<Vec<u8>>> {
        self.inner.lock().live.get(&handle.id()).cloned()
    }

    /// Whether `handle` still resolves
    #[must_use]
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.inner.lock().live.contains_key(&handle.id())
    }

    /// Number of handles currently live
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    /// Number of handles issued so far
    #[must_use]
    pub fn acquired_count(&self) -> usize {
        self.inner.lock().acquired
    }

    /// Number of handles released so far
    #[must_use]
    pub fn released_count(&self) -> usize {
        self.inner.lock().released
    }

    /// Number of release calls for handles that were not live
    #[must_use]
    pub fn failed_release_count(&self) -> usize {
        self.inner.lock().failed_releases
    }
}

impl PreviewBackend for BlobPreviewStore {
    fn acquire(&self, candidate: &CandidateFile) -> PreviewResult<PreviewHandle> {
        let id = Uuid::new_v4();
        let handle = PreviewHandle::new(
            id,
            format!("blob:dermassist/{id}"),
            super::probe_dimensions(&candidate.data),
        );

        let mut registry = self.inner.lock();
        registry.live.insert(id, Arc::new(candidate.data.clone()));
        registry.acquired += 1;
        Ok(handle)
    }

    fn release(&self, handle: &PreviewHandle) -> PreviewResult<()> {
        let mut registry = self.inner.lock();
        if registry.live.remove(&handle.id()).is_some() {
            registry.released += 1;
            Ok(())
        } else {
            registry.failed_releases += 1;
            Err(PreviewError::UnknownHandle(handle.id()))
        }
    }
}
