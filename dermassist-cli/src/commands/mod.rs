//! CLI command implementations

pub mod analyze;
pub mod session;

pub use analyze::AnalyzeCommand;
pub use session::SessionCommand;

use anyhow::{Context, Result};
use dermassist::prelude::*;
use dermassist_cli_lib::preview_store;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A workflow running on its own task
pub struct Session {
    pub handle: WorkflowHandle,
    pub states: watch::Receiver<WorkflowState>,
    runner: JoinHandle<()>,
}

impl Session {
    /// Builds the client and preview store from `config` and starts the loop
    pub fn start(config: &DermAssistConfig) -> Result<Self> {
        let client = HttpAnalysisClient::from_config(config)
            .context("Failed to create the analysis client")?;
        let machine = UploadStateMachine::new(preview_store(config)?);

        let (workflow, handle) = Workflow::new(machine, Arc::new(client));
        let states = workflow.subscribe();
        let runner = tokio::spawn(workflow.run());

        Ok(Self {
            handle,
            states,
            runner,
        })
    }

    /// Waits for the next published state
    pub async fn next_state(&mut self) -> Result<WorkflowState> {
        self.states
            .changed()
            .await
            .context("The workflow stopped unexpectedly")?;
        Ok(self.states.borrow_and_update().clone())
    }

    /// Waits for a just-requested analysis to settle, with a spinner
    pub async fn wait_for_analysis(&mut self) -> Result<WorkflowState> {
        let started = self.next_state().await?;
        if !started.is_analyzing() {
            return Ok(started);
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("Failed to set progress style")?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Running analysis...");

        let settled = self
            .states
            .wait_for(|state| !state.is_analyzing())
            .await
            .map(|state| state.clone())
            .context("The workflow stopped unexpectedly");

        spinner.finish_and_clear();
        settled
    }

    /// Stops the loop and waits for previews to be released
    pub async fn finish(self) -> Result<()> {
        // Already stopped is fine; the runner result says how it ended.
        let _ = self.handle.shutdown();
        self.runner.await.context("The workflow task panicked")
    }
}
