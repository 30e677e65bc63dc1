//! File-backed preview store

use super::traits::{PreviewBackend, PreviewError, PreviewHandle, PreviewResult};
use crate::upload::CandidateFile;
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes previews into a directory and issues `file://` handles
///
/// This is the terminal counterpart of an object URL: the user can open the
/// link to look at what they selected. Releasing a handle deletes the file.
///
/// # Directory Structure
///
/// ```text
/// /tmp/dermassist-previews-4242/
/// └── 550e8400-e29b-41d4-a716-446655440000.jpg
/// ```
#[derive(Debug)]
pub struct FilePreviewStore {
    /// Directory previews are written to
    dir: PathBuf,
    /// Live handles and the files behind them
    files: Mutex<HashMap<Uuid, PathBuf>>,
}

impl FilePreviewStore {
    /// Creates a store writing into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` exists but is not a directory, or cannot
    /// be created.
    pub fn new(dir: impl Into<PathBuf>) -> PreviewResult<Self> {
        let dir = dir.into();
        if dir.exists() && !dir.is_dir() {
            return Err(PreviewError::Other(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a store in a per-process directory under the system temp dir
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn in_temp_dir() -> PreviewResult<Self> {
        Self::new(std::env::temp_dir().join(format!("dermassist-previews-{}", std::process::id())))
    }

    /// Directory previews are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file behind a live handle
    #[must_use]
    pub fn path_of(&self, handle: &PreviewHandle) -> Option<PathBuf> {
        self.files.lock().get(&handle.id()).cloned()
    }

    fn extension_for(candidate: &CandidateFile) -> String {
        candidate
            .extension()
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
            .or_else(|| {
                mime_guess::get_mime_extensions_str(&candidate.media_type())
                    .and_then(|exts| exts.first())
                    .map(|ext| (*ext).to_string())
            })
            .unwrap_or_else(|| "bin".to_string())
    }

    fn file_url(path: &Path) -> String {
        Url::from_file_path(path).map_or_else(
            |()| format!("file://{}", path.display()),
            |url| url.to_string(),
        )
    }
}

impl PreviewBackend for FilePreviewStore {
    fn acquire(&self, candidate: &CandidateFile) -> PreviewResult<PreviewHandle> {
        let id = Uuid::new_v4();
        let path = self
            .dir
            .join(format!("{id}.{}", Self::extension_for(candidate)));
        fs::write(&path, &candidate.data)?;

        let handle = PreviewHandle::new(
            id,
            Self::file_url(&path),
            super::probe_dimensions(&candidate.data),
        );
        self.files.lock().insert(id, path);
        Ok(handle)
    }

    fn release(&self, handle: &PreviewHandle) -> PreviewResult<()> {
        let path = self
            .files
            .lock()
            .remove(&handle.id())
            .ok_or(PreviewError::UnknownHandle(handle.id()))?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            // Someone else cleaned the temp dir; the handle is gone either way.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FilePreviewStore {
    fn drop(&mut self) {
        // Only removes the directory when every preview was released.
        let _ = fs::remove_dir(&self.dir);
    }
}
