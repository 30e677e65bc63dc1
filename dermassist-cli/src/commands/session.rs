//! Interactive session: drop files, analyze, repeat

use super::Session;
use anyhow::{Context, Result};
use console::style;
use dermassist::prelude::*;
use dermassist_cli_lib::{parse_dropped_path, render_state};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::{debug, warn};

/// What the user can do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Drop,
    Analyze,
    Quit,
}

impl Action {
    const fn label(self) -> &'static str {
        match self {
            Self::Drop => "Drop an image (or paste its path)",
            Self::Analyze => "Analyze image",
            Self::Quit => "Quit",
        }
    }

    /// Analyze is only offered when it would start a request
    fn available(state: &WorkflowState) -> Vec<Self> {
        if state.can_analyze() {
            vec![Self::Analyze, Self::Drop, Self::Quit]
        } else {
            vec![Self::Drop, Self::Quit]
        }
    }
}

/// Interactive loop over one workflow
pub struct SessionCommand;

impl SessionCommand {
    /// Create a new command instance
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Execute the command
    pub async fn execute(&self, config: &DermAssistConfig) -> Result<()> {
        println!(
            "{} {}",
            style("DermAssist").green().bold(),
            style(format!("→ {}", config.backend_url)).dim()
        );
        println!();

        let mut session = Session::start(config)?;
        let mut state = session.states.borrow_and_update().clone();
        print!("{}", render_state(&state));

        loop {
            let actions = Action::available(&state);
            let Some(action) = prompt_action(actions).await? else {
                break;
            };
            debug!(?action, "Session action");

            state = match action {
                Action::Quit => break,
                Action::Drop => {
                    let Some(path) = prompt_path().await? else {
                        continue;
                    };
                    match CandidateFile::load(&path).await {
                        Ok(file) => {
                            session.handle.select_file(file)?;
                            session.next_state().await?
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Could not read dropped file");
                            println!(
                                "{} {}: {e}",
                                style("Could not read").red(),
                                path.display()
                            );
                            continue;
                        }
                    }
                }
                Action::Analyze => {
                    session.handle.analyze()?;
                    session.wait_for_analysis().await?
                }
            };

            println!();
            print!("{}", render_state(&state));
        }

        session.finish().await
    }
}

impl Default for SessionCommand {
    fn default() -> Self {
        Self::new()
    }
}

async fn prompt_action(actions: Vec<Action>) -> Result<Option<Action>> {
    tokio::task::spawn_blocking(move || {
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("Failed to read selection")?;
        Ok(choice.map(|i| actions[i]))
    })
    .await
    .context("Prompt task panicked")?
}

async fn prompt_path() -> Result<Option<std::path::PathBuf>> {
    let text = tokio::task::spawn_blocking(|| {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Image")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read path")
    })
    .await
    .context("Prompt task panicked")??;

    Ok(parse_dropped_path(&text))
}
