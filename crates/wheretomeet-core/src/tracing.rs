//! Shared tracing setup.
//!
//! The CLI logs compact single-line text; the daemon switches to JSON so
//! log collectors can ingest structured fields. `RUST_LOG` always wins
//! over the configured default level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Error)]
pub enum TracingError {
    /// Some other subscriber was installed first.
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The env filter directive did not parse.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Shape of emitted log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Compact single-line text, the CLI default.
    #[default]
    Text,
    /// JSON lines, used by the daemon.
    Json,
}

/// How logging should be wired up at startup.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied when `RUST_LOG` is absent.
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Whether log lines carry the emitting module path.
    pub include_target: bool,
    /// Explicit filter directive, taking precedence over `default_level`.
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Text,
            include_target: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Verbose CLI profile, selected by `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_target: true,
            ..Default::default()
        }
    }

    /// Daemon profile: structured JSON at INFO.
    #[must_use]
    pub fn daemon() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Json,
            include_target: true,
            env_filter: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(directive) = &self.env_filter {
            return Ok(EnvFilter::try_new(directive)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("wheretomeet={}", self.default_level))
        }))
    }
}

/// Installs the global subscriber. Call once, before any log line.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let registry = tracing_subscriber::registry().with(config.filter()?);
    let layer = fmt::layer().with_target(config.include_target);

    match config.output_format {
        TracingOutputFormat::Text => {
            tracing::subscriber::set_global_default(registry.with(layer.compact()))?
        }
        TracingOutputFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(layer.json()))?
        }
    }

    Ok(())
}
