//! The workflow event loop
//!
//! A [`Workflow`] owns the [`UploadStateMachine`] and processes one event at
//! a time from a single queue: user intents sent through a
//! [`WorkflowHandle`], and completions from spawned analysis tasks. Every
//! state change is published on a watch channel for the view.
//!
//! ```text
//!  WorkflowHandle ──select/analyze──▶ ┌──────────┐ ──watch──▶ view
//!                                     │ Workflow │
//!  analysis task ──completion───────▶ └──────────┘
//!        ▲                                 │
//!        └────────── spawn + token ────────┘
//! ```
//!
//! Selecting a new file cancels the in-flight request. A completion that
//! still slips through is rejected by its [`AnalysisTicket`], so the stale
//! response never reaches the published state.

mod cancellation;

pub use cancellation::{CancellationToken, Cancelled};

use crate::client::{AnalysisResult, AnalysisService, RequestError};
use crate::preview::PreviewBackend;
use crate::state::{AnalysisTicket, Completion, UploadStateMachine, WorkflowState};
use crate::upload::CandidateFile;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn, Instrument};

/// The workflow is no longer running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the workflow has shut down")]
pub struct WorkflowClosed;

enum Event {
    Select(CandidateFile),
    Analyze,
    Completed {
        ticket: AnalysisTicket,
        outcome: Result<AnalysisResult, RequestError>,
    },
    Shutdown,
}

/// Sends user intents to a running [`Workflow`]
///
/// Cheap to clone. The workflow stops once every handle is dropped or
/// [`WorkflowHandle::shutdown`] is called.
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    events: mpsc::UnboundedSender<Event>,
    states: watch::Receiver<WorkflowState>,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select(file) => f.debug_tuple("Select").field(file).finish(),
            Self::Analyze => f.write_str("Analyze"),
            Self::Completed { ticket, .. } => {
                f.debug_struct("Completed").field("ticket", ticket).finish_non_exhaustive()
            }
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl WorkflowHandle {
    /// Offers a file as the new selection
    pub fn select_file(&self, file: CandidateFile) -> Result<(), WorkflowClosed> {
        self.send(Event::Select(file))
    }

    /// Asks for an analysis of the current selection
    ///
    /// Ignored by the workflow when nothing is selected or a request is
    /// already in flight.
    pub fn analyze(&self) -> Result<(), WorkflowClosed> {
        self.send(Event::Analyze)
    }

    /// Stops the workflow, cancelling any in-flight request
    pub fn shutdown(&self) -> Result<(), WorkflowClosed> {
        self.send(Event::Shutdown)
    }

    /// A receiver that sees every published state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.states.clone()
    }

    /// The most recently published state
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.states.borrow().clone()
    }

    fn send(&self, event: Event) -> Result<(), WorkflowClosed> {
        self.events.send(event).map_err(|_| WorkflowClosed)
    }
}

/// Drives an [`UploadStateMachine`] against an [`AnalysisService`]
pub struct Workflow<B: PreviewBackend> {
    machine: UploadStateMachine<B>,
    service: Arc<dyn AnalysisService>,
    events: mpsc::UnboundedReceiver<Event>,
    completions: mpsc::WeakUnboundedSender<Event>,
    states: watch::Sender<WorkflowState>,
    in_flight: Option<CancellationToken>,
}

impl<B: PreviewBackend + 'static> Workflow<B> {
    /// Creates a workflow and the handle that drives it
    ///
    /// Nothing happens until [`Workflow::run`] is awaited or spawned.
    #[must_use]
    pub fn new(
        machine: UploadStateMachine<B>,
        service: Arc<dyn AnalysisService>,
    ) -> (Self, WorkflowHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (states, state_rx) = watch::channel(machine.state().clone());

        let workflow = Self {
            machine,
            service,
            events: rx,
            completions: tx.downgrade(),
            states,
            in_flight: None,
        };
        let handle = WorkflowHandle {
            events: tx,
            states: state_rx,
        };
        (workflow, handle)
    }

    /// A receiver that sees every published state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.states.subscribe()
    }

    /// Processes events until shutdown or until every handle is dropped
    ///
    /// Returning drops the state machine, which releases the live preview.
    pub async fn run(mut self) {
        info!("Workflow started");

        while let Some(event) = self.events.recv().await {
            debug!(?event, "Workflow event");
            match event {
                Event::Select(file) => self.select(file),
                Event::Analyze => self.analyze(),
                Event::Completed { ticket, outcome } => self.complete(ticket, outcome),
                Event::Shutdown => break,
            }
        }

        self.cancel_in_flight();
        info!(state = %self.machine.state().kind(), "Workflow stopped");
    }

    fn select(&mut self, file: CandidateFile) {
        self.cancel_in_flight();
        self.machine.select_file(file);
        self.publish();
    }

    fn analyze(&mut self) {
        let Some(ticket) = self.machine.analyze() else {
            return;
        };
        self.publish();

        let Some(selection) = self.machine.state().selection().cloned() else {
            return;
        };
        let Some(completions) = self.completions.upgrade() else {
            // No handle is left to observe a result; settle the request here.
            warn!(request = %ticket.request(), "Workflow is closing; abandoning analysis");
            self.complete(
                ticket,
                Err(RequestError::Transport {
                    reason: "the workflow is shutting down".into(),
                }),
            );
            return;
        };

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        let service = Arc::clone(&self.service);
        let span = tracing::debug_span!("analysis_task", request = %ticket.request());

        tokio::spawn(
            async move {
                match token.run_until_cancelled(service.submit(&selection)).await {
                    Ok(outcome) => {
                        if completions.send(Event::Completed { ticket, outcome }).is_err() {
                            debug!("Workflow stopped before the analysis completed");
                        }
                    }
                    Err(Cancelled) => debug!("Analysis cancelled"),
                }
            }
            .instrument(span),
        );
    }

    fn complete(&mut self, ticket: AnalysisTicket, outcome: Result<AnalysisResult, RequestError>) {
        if self.machine.complete(ticket, outcome) == Completion::Applied {
            self.in_flight = None;
            self.publish();
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn publish(&self) {
        self.states.send_replace(self.machine.state().clone());
    }
}

impl<B: PreviewBackend> std::fmt::Debug for Workflow<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("machine", &self.machine)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}
