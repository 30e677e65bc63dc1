//! dermassist: client-side upload-and-analysis workflow
//!
//! The crate models the whole path from "the user picked an image" to "a
//! verdict is on screen" as a small set of cooperating pieces:
//!
//! - [`upload`]: candidate files and the [`Validator`](upload::Validator)
//!   (declared type allow-list, 8 MiB limit)
//! - [`preview`]: the [`PreviewManager`](preview::PreviewManager), which owns
//!   the single live preview handle and releases it on replacement or drop
//! - [`state`]: the [`UploadStateMachine`](state::UploadStateMachine) and its
//!   tagged [`WorkflowState`](state::WorkflowState)
//! - [`client`]: the [`AnalysisService`](client::AnalysisService) contract
//!   and its reqwest-backed implementation
//! - [`workflow`]: the event loop that serialises user intents and analysis
//!   completions and publishes every new state
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dermassist::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DermAssistConfig::load()?;
//!     let client = HttpAnalysisClient::from_config(&config)?;
//!     let machine = UploadStateMachine::new(BlobPreviewStore::new());
//!
//!     let (workflow, handle) = Workflow::new(machine, Arc::new(client));
//!     let mut states = workflow.subscribe();
//!     let runner = tokio::spawn(workflow.run());
//!
//!     let file = CandidateFile::load("skin.jpg").await?;
//!     handle.select_file(file)?;
//!     handle.analyze()?;
//!     states.wait_for(WorkflowState::is_settled).await?;
//!
//!     handle.shutdown()?;
//!     runner.await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod preview;
pub mod state;
pub mod upload;
pub mod workflow;

#[cfg(test)]
mod testing;

/// URL type of backend addresses and preview references
pub use reqwest::Url;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use dermassist::prelude::*;
    //! ```

    pub use crate::client::{AnalysisResult, AnalysisService, HttpAnalysisClient, RequestError};
    pub use crate::config::{ConfigError, DermAssistConfig};
    pub use crate::error::DermAssistError;
    pub use crate::preview::{
        BlobPreviewStore, FilePreviewStore, PreviewBackend, PreviewError, PreviewHandle,
        PreviewManager,
    };
    pub use crate::state::{
        AnalysisTicket, Completion, Selection, StateKind, UploadStateMachine, WorkflowState,
    };
    pub use crate::upload::{CandidateFile, ValidationError, Validator};
    pub use crate::workflow::{Workflow, WorkflowClosed, WorkflowHandle};
}
