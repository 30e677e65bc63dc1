//! Shared fixtures for unit tests

use crate::client::{AnalysisResult, AnalysisService, RequestError};
use crate::state::Selection;
use crate::upload::CandidateFile;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

pub const MIB: usize = 1024 * 1024;

pub fn jpeg_of_size(name: &str, size: usize) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", vec![0xAB; size])
}

pub fn eczema_result() -> AnalysisResult {
    AnalysisResult {
        condition: "Eczema".into(),
        confidence: 87.0,
        description: "Dry, itchy, inflamed patches of skin.".into(),
        suggestions: vec!["Moisturize twice daily".into(), "See a dermatologist".into()],
        filename: "skin.jpg".into(),
        size_kb: 2048.0,
        latency_ms: 340.0,
    }
}

/// A request held by [`GatedService`] until the test answers it
pub struct PendingCall {
    pub filename: String,
    responder: oneshot::Sender<Result<AnalysisResult, RequestError>>,
}

impl PendingCall {
    pub fn respond(self, outcome: Result<AnalysisResult, RequestError>) {
        // The workflow may have cancelled the request already.
        let _ = self.responder.send(outcome);
    }
}

/// Analysis service whose responses are released by the test, in any order
pub struct GatedService {
    calls: mpsc::UnboundedSender<PendingCall>,
}

impl GatedService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Self { calls }, rx)
    }
}

#[async_trait]
impl AnalysisService for GatedService {
    async fn submit(&self, selection: &Selection) -> Result<AnalysisResult, RequestError> {
        let (responder, response) = oneshot::channel();
        let call = PendingCall {
            filename: selection.file().filename.clone(),
            responder,
        };
        if self.calls.send(call).is_err() {
            return Err(RequestError::Transport {
                reason: "test harness dropped".into(),
            });
        }
        response.await.unwrap_or_else(|_| {
            Err(RequestError::Transport {
                reason: "test dropped the call".into(),
            })
        })
    }
}
