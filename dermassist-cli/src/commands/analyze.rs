//! One-shot analysis of a single file

use super::Session;
use anyhow::{Context, Result};
use console::style;
use dermassist::prelude::*;
use dermassist_cli_lib::render_state;
use std::path::PathBuf;

/// Select one file, analyze it, print the outcome
pub struct AnalyzeCommand {
    path: PathBuf,
}

impl AnalyzeCommand {
    /// Create a new command instance
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Execute the command
    ///
    /// Returns whether the analysis succeeded. A rejected file or a failed
    /// request is reported, not returned as an error.
    pub async fn execute(&self, config: &DermAssistConfig) -> Result<bool> {
        let file = CandidateFile::load(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        println!(
            "{} {}",
            style("Analyzing").green().bold(),
            style(self.path.display()).cyan()
        );

        let mut session = Session::start(config)?;
        session.handle.select_file(file)?;
        let selected = session.next_state().await?;
        print!("{}", render_state(&selected));

        if selected.kind() == StateKind::Invalid {
            session.finish().await?;
            return Ok(false);
        }

        session.handle.analyze()?;
        let outcome = session.wait_for_analysis().await?;
        println!();
        print!("{}", render_state(&outcome));

        session.finish().await?;
        Ok(outcome.kind() == StateKind::Succeeded)
    }
}
