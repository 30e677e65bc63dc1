//! The upload state machine
//!
//! [`UploadStateMachine`] is the single source of truth for the workflow.
//! Its state is a tagged [`WorkflowState`], so combinations such as
//! "analyzing with nothing selected" cannot be expressed.
//!
//! # Transitions
//!
//! | From | Event | To |
//! |---|---|---|
//! | any | `select_file`, accepted | `Selected` |
//! | any | `select_file`, rejected | `Invalid` |
//! | `Selected`, `Succeeded`, `Failed` | `analyze` | `Analyzing` |
//! | `Analyzing` | `analysis_succeeded` | `Succeeded` |
//! | `Analyzing` | `analysis_failed` | `Failed` |
//!
//! `analyze` with nothing selected, or while a request is in flight, does
//! nothing. Completions carry the [`AnalysisTicket`] that `analyze` handed
//! out and are dropped as [`Completion::Stale`] unless that ticket is still
//! the one in flight, so a response for a superseded selection never lands.
//!
//! # Examples
//!
//! ```rust
//! use dermassist::prelude::*;
//!
//! let mut machine = UploadStateMachine::new(BlobPreviewStore::new());
//! machine.select_file(CandidateFile::new("a.jpg", "image/jpeg", vec![0; 16]));
//! let ticket = machine.analyze().expect("a file is selected");
//!
//! // The user picks another file before the response arrives.
//! machine.select_file(CandidateFile::new("b.jpg", "image/jpeg", vec![0; 16]));
//!
//! let late = machine.analysis_failed(ticket, RequestError::Service { status: 500 });
//! assert_eq!(late, Completion::Stale);
//! assert_eq!(machine.state().kind(), StateKind::Selected);
//! ```

use crate::client::{AnalysisResult, RequestError};
use crate::preview::{PreviewBackend, PreviewHandle, PreviewManager};
use crate::upload::{CandidateFile, ValidationError, Validator};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identifies one accepted selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(u64);

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selection-{}", self.0)
    }
}

/// Identifies one analysis request issued by [`UploadStateMachine::analyze`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// Proof of which request a completion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisTicket {
    request: RequestId,
    selection: SelectionId,
}

impl AnalysisTicket {
    /// The request this ticket was issued for
    #[must_use]
    pub const fn request(&self) -> RequestId {
        self.request
    }

    /// The selection being analyzed
    #[must_use]
    pub const fn selection(&self) -> SelectionId {
        self.selection
    }
}

/// An accepted file and the preview derived from it
///
/// Cloning is cheap: the payload is shared and the preview handle is only a
/// reference. The [`PreviewManager`] keeps the authority to release it.
#[derive(Debug, Clone)]
pub struct Selection {
    id: SelectionId,
    file: Arc<CandidateFile>,
    preview: Option<PreviewHandle>,
}

impl Selection {
    /// Selection id
    #[must_use]
    pub const fn id(&self) -> SelectionId {
        self.id
    }

    /// The accepted file
    #[must_use]
    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    /// Preview of the file; absent if the preview could not be created
    #[must_use]
    pub const fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Where the workflow currently is
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Nothing selected yet
    Empty,

    /// A file was accepted and can be analyzed
    Selected {
        /// The accepted file
        selection: Selection,
    },

    /// The last selection attempt was rejected; nothing is selected
    Invalid {
        /// Why it was rejected
        error: ValidationError,
    },

    /// An analysis request is in flight
    Analyzing {
        /// The file being analyzed
        selection: Selection,
        /// Ticket of the in-flight request
        ticket: AnalysisTicket,
    },

    /// The last analysis produced a result
    Succeeded {
        /// The analyzed file
        selection: Selection,
        /// The verdict
        result: Arc<AnalysisResult>,
    },

    /// The last analysis failed; the selection is kept for a retry
    Failed {
        /// The file that failed to analyze
        selection: Selection,
        /// Why it failed
        error: RequestError,
    },
}

/// Discriminant of [`WorkflowState`], for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// See [`WorkflowState::Empty`]
    Empty,
    /// See [`WorkflowState::Selected`]
    Selected,
    /// See [`WorkflowState::Invalid`]
    Invalid,
    /// See [`WorkflowState::Analyzing`]
    Analyzing,
    /// See [`WorkflowState::Succeeded`]
    Succeeded,
    /// See [`WorkflowState::Failed`]
    Failed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Selected => "selected",
            Self::Invalid => "invalid",
            Self::Analyzing => "analyzing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl WorkflowState {
    /// Discriminant of this state
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Empty => StateKind::Empty,
            Self::Selected { .. } => StateKind::Selected,
            Self::Invalid { .. } => StateKind::Invalid,
            Self::Analyzing { .. } => StateKind::Analyzing,
            Self::Succeeded { .. } => StateKind::Succeeded,
            Self::Failed { .. } => StateKind::Failed,
        }
    }

    /// The current selection, if any
    #[must_use]
    pub const fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Selected { selection }
            | Self::Analyzing { selection, .. }
            | Self::Succeeded { selection, .. }
            | Self::Failed { selection, .. } => Some(selection),
            Self::Empty | Self::Invalid { .. } => None,
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_analyzing(&self) -> bool {
        matches!(self, Self::Analyzing { .. })
    }

    /// Whether `analyze` would start a request from this state
    #[must_use]
    pub const fn can_analyze(&self) -> bool {
        matches!(
            self,
            Self::Selected { .. } | Self::Succeeded { .. } | Self::Failed { .. }
        )
    }

    /// Whether the last user action has fully played out
    ///
    /// True for a result, a request error or a rejected file.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Invalid { .. }
        )
    }

    /// The analysis result, if the last analysis succeeded
    #[must_use]
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    /// User-facing error message, for `Invalid` and `Failed`
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Invalid { error } => Some(error.to_string()),
            Self::Failed { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }
}

/// Outcome of delivering a completion to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completion belonged to the in-flight request and was applied
    Applied,
    /// The completion was for a superseded request and was dropped
    Stale,
}

/// Owns the workflow state and the preview lifecycle
pub struct UploadStateMachine<B: PreviewBackend> {
    validator: Validator,
    previews: PreviewManager<B>,
    state: WorkflowState,
    next_selection: u64,
    next_request: u64,
}

impl<B: PreviewBackend> UploadStateMachine<B> {
    /// Creates a machine in [`WorkflowState::Empty`]
    #[must_use]
    pub const fn new(previews: B) -> Self {
        Self {
            validator: Validator::new(),
            previews: PreviewManager::new(previews),
            state: WorkflowState::Empty,
            next_selection: 0,
            next_request: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The preview manager, for inspecting the live handle
    #[must_use]
    pub const fn previews(&self) -> &PreviewManager<B> {
        &self.previews
    }

    /// Offers a file as the new selection
    ///
    /// Accepted files become `Selected` with a fresh preview, dropping any
    /// previous result or error. Rejected files become `Invalid` and release
    /// the previous preview. Either way an in-flight request is superseded.
    pub fn select_file(&mut self, candidate: CandidateFile) -> &WorkflowState {
        if let WorkflowState::Analyzing { ticket, .. } = &self.state {
            info!(request = %ticket.request, "New selection supersedes in-flight analysis");
        }

        match self.validator.validate(&candidate) {
            Ok(()) => {
                let preview = match self.previews.set(&candidate) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!(filename = %candidate.filename, error = %e, "Selecting without a preview");
                        None
                    }
                };

                let id = SelectionId(self.next_selection);
                self.next_selection += 1;
                debug!(selection = %id, filename = %candidate.filename, size = candidate.size(), "File selected");

                self.state = WorkflowState::Selected {
                    selection: Selection {
                        id,
                        file: Arc::new(candidate),
                        preview,
                    },
                };
            }
            Err(error) => {
                debug!(filename = %candidate.filename, %error, "File rejected");
                self.previews.clear();
                self.state = WorkflowState::Invalid { error };
            }
        }

        &self.state
    }

    /// Starts an analysis of the current selection
    ///
    /// Returns the ticket the completion must be delivered with, or `None`
    /// when nothing is selected or a request is already in flight.
    pub fn analyze(&mut self) -> Option<AnalysisTicket> {
        let selection = match &self.state {
            WorkflowState::Selected { selection }
            | WorkflowState::Succeeded { selection, .. }
            | WorkflowState::Failed { selection, .. } => selection.clone(),
            WorkflowState::Analyzing { ticket, .. } => {
                debug!(request = %ticket.request, "Analysis already in flight; ignoring");
                return None;
            }
            WorkflowState::Empty | WorkflowState::Invalid { .. } => {
                debug!("Nothing selected; ignoring analyze");
                return None;
            }
        };

        let ticket = AnalysisTicket {
            request: RequestId(self.next_request),
            selection: selection.id,
        };
        self.next_request += 1;

        debug!(request = %ticket.request, selection = %selection.id, "Analysis started");
        self.state = WorkflowState::Analyzing { selection, ticket };
        Some(ticket)
    }

    /// Delivers a successful response
    pub fn analysis_succeeded(&mut self, ticket: AnalysisTicket, result: AnalysisResult) -> Completion {
        self.complete(ticket, Ok(result))
    }

    /// Delivers a failed response
    pub fn analysis_failed(&mut self, ticket: AnalysisTicket, error: RequestError) -> Completion {
        self.complete(ticket, Err(error))
    }

    /// Delivers a response of either kind
    pub fn complete(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<AnalysisResult, RequestError>,
    ) -> Completion {
        let selection = match &self.state {
            WorkflowState::Analyzing {
                selection,
                ticket: current,
            } if *current == ticket => selection.clone(),
            other => {
                info!(request = %ticket.request, state = %other.kind(), "Discarding stale analysis response");
                return Completion::Stale;
            }
        };

        self.state = match outcome {
            Ok(result) => {
                debug!(request = %ticket.request, condition = %result.condition, "Analysis succeeded");
                WorkflowState::Succeeded {
                    selection,
                    result: Arc::new(result),
                }
            }
            Err(error) => {
                debug!(request = %ticket.request, %error, "Analysis failed");
                WorkflowState::Failed { selection, error }
            }
        };
        Completion::Applied
    }
}

impl<B: PreviewBackend> fmt::Debug for UploadStateMachine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadStateMachine")
            .field("state", &self.state.kind())
            .field("previews", &self.previews)
            .finish_non_exhaustive()
    }
}
