//! Upload validation by declared type and size
//!
//! The analysis service only understands JPEG, PNG and WEBP images up to
//! 8 MiB. Checking that on the client keeps obviously bad uploads off the
//! network and gives the user an immediate, specific message.
//!
//! Validation trusts the declared content type on purpose: the service does
//! its own decoding, and the client only needs to mirror its contract.
//!
//! # Examples
//!
//! ```rust
//! use dermassist::upload::{CandidateFile, ValidationError, Validator};
//!
//! let validator = Validator::new();
//!
//! let photo = CandidateFile::new("skin.jpg", "image/jpeg", vec![0; 1024]);
//! assert!(validator.validate(&photo).is_ok());
//!
//! let document = CandidateFile::new("notes.pdf", "application/pdf", vec![0; 1024]);
//! assert!(matches!(
//!     validator.validate(&document),
//!     Err(ValidationError::UnsupportedType { .. })
//! ));
//! ```

use super::types::CandidateFile;
use thiserror::Error;

/// Largest accepted upload (8 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 8 * 1024 * 1024;

/// Declared content types the analysis service accepts
///
/// `image/jpg` is not a registered type but some pickers report it.
pub const ACCEPTED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Why a candidate file was rejected
///
/// The `Display` text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Declared type is not on the allow-list
    #[error("Please upload a JPG, PNG, or WEBP image")]
    UnsupportedType {
        /// The declared content type that was rejected
        content_type: String,
    },

    /// Payload is larger than the limit
    #[error("Please upload an image smaller than 8MB")]
    TooLarge {
        /// Actual size in bytes
        size: u64,
        /// Maximum allowed size in bytes
        limit: u64,
    },
}

/// Checks candidate files against the accepted types and size limit
///
/// Type is checked first, so an oversized file of the wrong type reports
/// the type error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Creates the validator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The size limit in bytes
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        MAX_UPLOAD_BYTES
    }

    /// Returns whether a declared content type is on the allow-list
    ///
    /// ```rust
    /// use dermassist::upload::Validator;
    ///
    /// let validator = Validator::new();
    /// assert!(validator.accepts_type("image/webp"));
    /// assert!(!validator.accepts_type("image/gif"));
    /// ```
    #[must_use]
    pub fn accepts_type(&self, media_type: &str) -> bool {
        ACCEPTED_TYPES.contains(&media_type)
    }

    /// Validates a candidate file
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnsupportedType`] if the declared type is not JPEG, PNG or WEBP
    /// - [`ValidationError::TooLarge`] if the payload exceeds [`MAX_UPLOAD_BYTES`]
    pub fn validate(&self, candidate: &CandidateFile) -> Result<(), ValidationError> {
        let media_type = candidate.media_type();
        if !self.accepts_type(&media_type) {
            return Err(ValidationError::UnsupportedType {
                content_type: candidate.content_type.clone(),
            });
        }

        let size = candidate.size();
        if size > self.max_bytes() {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_bytes(),
            });
        }

        Ok(())
    }
}
