//! Candidate files and upload validation
//!
//! A [`CandidateFile`] is whatever the user dropped or browsed to. It only
//! becomes a selection once the [`Validator`] accepts it.

pub mod types;
pub mod validation;

pub use types::CandidateFile;
pub use validation::{ValidationError, Validator, ACCEPTED_TYPES, MAX_UPLOAD_BYTES};
