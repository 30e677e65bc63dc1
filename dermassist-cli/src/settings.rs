//! Global command-line flags and how they combine with file configuration

use anyhow::{Context, Result};
use clap::Args;
use dermassist::config::DermAssistConfig;
use dermassist::preview::FilePreviewStore;
use std::path::PathBuf;

/// Flags accepted by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Base URL of the analysis service
    #[arg(long, global = true, env = "DERMASSIST_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Load configuration from this file instead of the standard locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to write image previews to
    #[arg(long, global = true, value_name = "DIR")]
    pub preview_dir: Option<PathBuf>,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Loads configuration and applies the flags on top
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the result
    /// is invalid.
    pub fn resolve(&self) -> Result<DermAssistConfig> {
        let mut config = match &self.config {
            Some(path) => DermAssistConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => DermAssistConfig::load().context("Failed to load configuration")?,
        };

        if let Some(url) = &self.backend_url {
            config.backend_url.clone_from(url);
        }
        if let Some(dir) = &self.preview_dir {
            config.preview_dir = Some(dir.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Log filter directives for the requested verbosity
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info,dermassist=debug",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Opens the preview store the configuration asks for
///
/// # Errors
///
/// Returns an error if the preview directory cannot be created.
pub fn preview_store(config: &DermAssistConfig) -> Result<FilePreviewStore> {
    let store = match &config.preview_dir {
        Some(dir) => FilePreviewStore::new(dir),
        None => FilePreviewStore::in_temp_dir(),
    };
    store.context("Failed to prepare the preview directory")
}
