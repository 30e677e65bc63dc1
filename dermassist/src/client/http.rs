//! reqwest implementation of the analysis client

use super::types::{AnalysisResult, RequestError};
use super::AnalysisService;
use crate::config::DermAssistConfig;
use crate::error::DermAssistError;
use crate::state::Selection;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

/// Multipart field the service reads the image from
const FILE_FIELD: &str = "file";

/// Talks to `POST {backend}/analyze` over HTTP
///
/// # Examples
///
/// ```rust,no_run
/// use dermassist::client::HttpAnalysisClient;
/// use dermassist::config::DermAssistConfig;
///
/// # fn example() -> Result<(), dermassist::error::DermAssistError> {
/// let client = HttpAnalysisClient::from_config(&DermAssistConfig::default())?;
/// assert_eq!(client.endpoint().as_str(), "http://localhost:8000/analyze");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    endpoint: Url,
}

impl HttpAnalysisClient {
    /// Creates a client for the service at `backend`
    ///
    /// `backend` is the base URL; `/analyze` is appended to its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be formed or the HTTP
    /// client cannot be built.
    pub fn new(backend: &Url, timeout: Duration) -> Result<Self, DermAssistError> {
        let endpoint = Url::parse(&format!(
            "{}/analyze",
            backend.as_str().trim_end_matches('/')
        ))
        .map_err(|e| DermAssistError::Config(crate::config::ConfigError::InvalidBackendUrl {
            url: backend.to_string(),
            reason: e.to_string(),
        }))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    /// Creates a client from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend URL is invalid.
    pub fn from_config(config: &DermAssistConfig) -> Result<Self, DermAssistError> {
        Self::new(&config.backend_url()?, config.request_timeout())
    }

    /// Full URL requests are sent to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form_for(selection: &Selection) -> Result<Form, RequestError> {
        let file = selection.file();
        let part = Part::bytes(file.data.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.media_type())
            .map_err(|e| RequestError::Transport {
                reason: format!("could not encode upload: {e}"),
            })?;
        Ok(Form::new().part(FILE_FIELD, part))
    }

    async fn send(&self, selection: &Selection) -> Result<AnalysisResult, RequestError> {
        let form = Self::form_for(selection)?;
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Analysis request failed before a response");
                RequestError::transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Analysis service returned an error status");
            return Err(RequestError::Service {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read analysis response body");
            RequestError::transport(&e)
        })?;

        let result = AnalysisResult::from_json(&body).inspect_err(|e| {
            warn!(error = %e, "Analysis response did not parse");
        })?;

        info!(
            condition = %result.condition,
            confidence = result.confidence,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Analysis completed"
        );
        Ok(result)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn submit(&self, selection: &Selection) -> Result<AnalysisResult, RequestError> {
        let span = info_span!(
            "analyze",
            filename = %selection.file().filename,
            size = selection.file().size(),
            selection = %selection.id(),
        );
        debug!(parent: &span, endpoint = %self.endpoint, "Submitting image for analysis");
        self.send(selection).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_analyze() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let client = HttpAnalysisClient::new(&base, Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8000/analyze");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        let client = HttpAnalysisClient::new(&base, Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint().as_str(), "https://api.example.com/v1/analyze");
    }
}
