//! Core types for candidate uploads

use super::validation::Validator;
use std::fmt;
use std::io;
use std::path::Path;

/// A file the user picked that has not been accepted yet
///
/// The content type is the *declared* one: whatever the picker reported,
/// or what [`CandidateFile::load`] derives from the file extension. It is
/// never sniffed from the bytes.
///
/// # Examples
///
/// ```rust
/// use dermassist::upload::CandidateFile;
///
/// let file = CandidateFile::new("skin.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]);
/// assert_eq!(file.size(), 3);
/// assert_eq!(file.media_type(), "image/jpeg");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Original filename, echoed to the analysis service
    pub filename: String,

    /// Declared MIME content type (e.g. "image/png")
    pub content_type: String,

    /// File contents
    ///
    /// Empty when [`CandidateFile::load`] rejected the file from its
    /// metadata alone.
    pub data: Vec<u8>,

    /// Size reported by the filesystem for a payload that was never read
    unread_size: Option<u64>,
}

impl CandidateFile {
    /// Creates a candidate from an in-memory payload
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
            unread_size: None,
        }
    }

    /// Reads a candidate from disk
    ///
    /// The content type is guessed from the extension, the way a browser
    /// fills in `File.type`. Unknown extensions become
    /// `application/octet-stream`, which the validator then rejects.
    ///
    /// Type and size are checked against the file's metadata first. A file
    /// the [`Validator`] would reject is returned without its payload, so
    /// an oversized file is never read into memory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub async fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let mut candidate = Self {
            filename,
            content_type,
            data: Vec::new(),
            unread_size: Some(size),
        };
        if let Err(e) = Validator::new().validate(&candidate) {
            tracing::debug!(
                filename = %candidate.filename,
                content_type = %candidate.content_type,
                size,
                reason = %e,
                "Skipped reading rejected candidate file"
            );
            return Ok(candidate);
        }

        candidate.data = tokio::fs::read(path).await?;
        candidate.unread_size = None;
        tracing::debug!(
            filename = %candidate.filename,
            content_type = %candidate.content_type,
            size = candidate.data.len(),
            "Loaded candidate file"
        );
        Ok(candidate)
    }

    /// Size of the payload in bytes
    ///
    /// For a file rejected before reading, the size on disk.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.unread_size.unwrap_or(self.data.len() as u64)
    }

    /// Whether [`CandidateFile::data`] holds the file contents
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.unread_size.is_none()
    }

    /// Declared media type without parameters, lowercased
    ///
    /// ```rust
    /// use dermassist::upload::CandidateFile;
    ///
    /// let file = CandidateFile::new("a.png", "IMAGE/PNG; charset=binary", vec![]);
    /// assert_eq!(file.media_type(), "image/png");
    /// ```
    #[must_use]
    pub fn media_type(&self) -> String {
        self.content_type.parse::<mime::Mime>().map_or_else(
            |_| {
                self.content_type
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase()
            },
            |parsed| parsed.essence_str().to_ascii_lowercase(),
        )
    }

    /// Extension of the original filename, if any
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

impl fmt::Debug for CandidateFile {
    // Payloads run to megabytes; keep them out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{ValidationError, MAX_UPLOAD_BYTES};
    use tempfile::TempDir;

    #[test]
    fn test_size() {
        let file = CandidateFile::new("skin.jpg", "image/jpeg", vec![1, 2, 3, 4, 5]);
        assert_eq!(file.size(), 5);
    }

    #[test]
    fn test_media_type_normalization() {
        let file = CandidateFile::new("a.webp", "Image/WebP", vec![]);
        assert_eq!(file.media_type(), "image/webp");

        let with_params = CandidateFile::new("a.png", "image/png; q=1", vec![]);
        assert_eq!(with_params.media_type(), "image/png");

        let garbage = CandidateFile::new("a", "not a mime", vec![]);
        assert_eq!(garbage.media_type(), "not a mime");
    }

    #[test]
    fn test_extension() {
        let file = CandidateFile::new("skin.jpeg", "image/jpeg", vec![]);
        assert_eq!(file.extension(), Some("jpeg"));

        let no_ext = CandidateFile::new("README", "text/plain", vec![]);
        assert_eq!(no_ext.extension(), None);
    }

    #[test]
    fn test_debug_omits_payload() {
        let file = CandidateFile::new("skin.jpg", "image/jpeg", vec![42; 64]);
        let debug = format!("{file:?}");
        assert!(debug.contains("skin.jpg"));
        assert!(debug.contains("size: 64"));
        assert!(!debug.contains("42, 42"));
    }

    #[tokio::test]
    async fn test_load_guesses_type_from_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mole.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let file = CandidateFile::load(&path).await.unwrap();
        assert_eq!(file.filename, "mole.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.size(), 16);
    }

    #[tokio::test]
    async fn test_load_unknown_extension_is_octet_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.zzz-unknown");
        std::fs::write(&path, b"hello").unwrap();

        let file = CandidateFile::load(&path).await.unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_load_skips_payload_of_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("holiday.png");
        let sparse = std::fs::File::create(&path).unwrap();
        sparse.set_len(1 << 30).unwrap();
        drop(sparse);

        let file = CandidateFile::load(&path).await.unwrap();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.size(), 1 << 30);
        assert!(file.data.is_empty());
        assert!(!file.is_loaded());
        assert_eq!(
            Validator::new().validate(&file),
            Err(ValidationError::TooLarge {
                size: 1 << 30,
                limit: MAX_UPLOAD_BYTES,
            })
        );
    }

    #[tokio::test]
    async fn test_load_skips_payload_of_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, vec![7; 4096]).unwrap();

        let file = CandidateFile::load(&path).await.unwrap();
        assert!(file.data.is_empty());
        assert_eq!(file.size(), 4096);
        assert!(matches!(
            Validator::new().validate(&file),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_reads_file_at_the_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edge.webp");
        std::fs::write(&path, vec![1; 8 * 1024 * 1024]).unwrap();

        let file = CandidateFile::load(&path).await.unwrap();
        assert!(file.is_loaded());
        assert_eq!(file.data.len(), 8 * 1024 * 1024);
        assert!(Validator::new().validate(&file).is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = CandidateFile::load("/nonexistent/dermassist/skin.jpg").await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
