//! Wire types for the analysis endpoint

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verdict returned by the analysis service
///
/// Immutable once received. A later analysis replaces it wholesale.
///
/// # Examples
///
/// ```rust
/// use dermassist::client::AnalysisResult;
///
/// let body = br#"{
///     "condition": "Eczema",
///     "confidence": 87,
///     "description": "Dry, itchy patches.",
///     "suggestions": ["See a dermatologist"],
///     "filename": "skin.jpg",
///     "size_kb": 2048,
///     "latency_ms": 340
/// }"#;
///
/// let result = AnalysisResult::from_json(body)?;
/// assert_eq!(result.condition, "Eczema");
/// assert_eq!(result.suggestions, vec!["See a dermatologist"]);
/// # Ok::<(), dermassist::client::RequestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Most likely condition label
    pub condition: String,

    /// Confidence in percent, 0 to 100 inclusive
    pub confidence: f64,

    /// Free-text explanation
    pub description: String,

    /// Care suggestions in display order
    ///
    /// Missing in the response means "no suggestions".
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Filename the service received
    pub filename: String,

    /// Payload size the service received, in KB
    pub size_kb: f64,

    /// Server-side processing time in milliseconds
    pub latency_ms: f64,
}

impl AnalysisResult {
    /// Parses and checks a response body
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MalformedResponse`] if the body is not JSON of
    /// the expected shape, or if `confidence` is outside 0–100.
    pub fn from_json(body: &[u8]) -> Result<Self, RequestError> {
        let result: Self =
            serde_json::from_slice(body).map_err(|e| RequestError::MalformedResponse {
                reason: e.to_string(),
            })?;

        if !(0.0..=100.0).contains(&result.confidence) {
            return Err(RequestError::MalformedResponse {
                reason: format!("confidence {} is outside 0-100", result.confidence),
            });
        }

        Ok(result)
    }
}

/// Why an analysis attempt failed
///
/// Every variant ends up as one user-visible message in the workflow state;
/// the variants only change the wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request never got a response (connect failure, timeout, broken body)
    #[error("Could not reach the analysis service: {reason}")]
    Transport {
        /// What went wrong on the wire
        reason: String,
    },

    /// The service answered with a non-success status
    #[error("Analysis failed ({status})")]
    Service {
        /// HTTP status code
        status: u16,
    },

    /// The service answered 2xx with a body that is not an analysis result
    #[error("The analysis service sent an unreadable response: {reason}")]
    MalformedResponse {
        /// Parse failure details
        reason: String,
    },
}

impl RequestError {
    /// Builds a transport error from a reqwest failure
    #[must_use]
    pub fn transport(error: &reqwest::Error) -> Self {
        let reason = if error.is_timeout() {
            "the request timed out".to_string()
        } else if error.is_connect() {
            "connection failed".to_string()
        } else {
            error.to_string()
        };
        Self::Transport { reason }
    }

    /// HTTP status, for service errors
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_parses_full_result() {
        let result = AnalysisResult::from_json(&body(&json!({
            "condition": "Psoriasis",
            "confidence": 64.5,
            "description": "Scaly plaques.",
            "suggestions": ["Moisturize", "See a dermatologist"],
            "filename": "arm.png",
            "size_kb": 512.3,
            "latency_ms": 120
        })))
        .unwrap();

        assert_eq!(result.condition, "Psoriasis");
        assert!((result.confidence - 64.5).abs() < f64::EPSILON);
        assert_eq!(result.suggestions, vec!["Moisturize", "See a dermatologist"]);
        assert!((result.latency_ms - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_suggestions_default_to_empty() {
        let result = AnalysisResult::from_json(&body(&json!({
            "condition": "Acne",
            "confidence": 50,
            "description": "",
            "filename": "face.webp",
            "size_kb": 10,
            "latency_ms": 5
        })))
        .unwrap();

        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let result = AnalysisResult::from_json(&body(&json!({
            "confidence": 50,
            "description": "",
            "filename": "face.webp",
            "size_kb": 10,
            "latency_ms": 5
        })));

        assert!(matches!(result, Err(RequestError::MalformedResponse { .. })));
    }

    #[test]
    fn test_not_json_is_malformed() {
        let result = AnalysisResult::from_json(b"<html>Bad Gateway</html>");
        assert!(matches!(result, Err(RequestError::MalformedResponse { .. })));
    }

    #[test]
    fn test_confidence_bounds() {
        let make = |confidence: f64| {
            body(&json!({
                "condition": "Acne",
                "confidence": confidence,
                "description": "",
                "filename": "a.jpg",
                "size_kb": 1,
                "latency_ms": 1
            }))
        };

        assert!(AnalysisResult::from_json(&make(0.0)).is_ok());
        assert!(AnalysisResult::from_json(&make(100.0)).is_ok());
        assert!(AnalysisResult::from_json(&make(100.5)).is_err());
        assert!(AnalysisResult::from_json(&make(-1.0)).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RequestError::Service { status: 500 }.to_string(),
            "Analysis failed (500)"
        );
        assert_eq!(RequestError::Service { status: 502 }.status(), Some(502));
        assert_eq!(
            RequestError::Transport {
                reason: "connection failed".into()
            }
            .status(),
            None
        );
    }
}
