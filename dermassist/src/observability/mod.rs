//! Observability (structured logging)
//!
//! Logs go to stderr so that anything a binary renders on stdout stays clean.

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
    /// One JSON object per event
    Json,
    /// `Pretty` in debug builds, `Json` in release builds
    #[default]
    Auto,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub default_filter: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            default_filter: if cfg!(debug_assertions) {
                "info,dermassist=debug".to_string()
            } else {
                "info".to_string()
            },
            format: LogFormat::Auto,
        }
    }
}

impl ObservabilityConfig {
    /// Replaces the fallback filter directives
    #[must_use]
    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.default_filter = directives.into();
        self
    }

    /// Sets the output format
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    const fn resolved_format(&self) -> LogFormat {
        match self.format {
            LogFormat::Auto if cfg!(debug_assertions) => LogFormat::Pretty,
            LogFormat::Auto => LogFormat::Json,
            other => other,
        }
    }
}

/// Initializes logging with the default configuration
///
/// # Example
///
/// ```rust,no_run
/// use dermassist::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("Application started");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init() -> crate::error::Result<()> {
    init_with(&ObservabilityConfig::default())
}

/// Initializes logging with an explicit configuration
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_with(config: &ObservabilityConfig) -> crate::error::Result<()> {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.resolved_format() {
        LogFormat::Pretty | LogFormat::Auto => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(config.env_filter())
        .try_init()?;

    Ok(())
}
