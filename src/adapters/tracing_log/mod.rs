// Tracing log adapter - Structured logging using tracing crate

use crate::domain::errors::*;
use crate::ports::*;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Tracing log adapter
pub struct TracingLogAdapter {
    current_level: LogLevel,
}

impl TracingLogAdapter {
    /// Create an adapter that forwards messages at `level` and above
    pub fn new(level: LogLevel) -> Self {
        Self {
            current_level: level,
        }
    }

    /// Install the global subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over `level` when set. Returns `false` when
    /// a subscriber was already installed.
    pub fn install(level: LogLevel, json: bool) -> Result<bool, DomainError> {
        let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
                .map_err(|e| DomainError::ConfigError(format!("Invalid RUST_LOG: {}", e)))?,
            _ => EnvFilter::new(level.as_filter()),
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let installed = if json {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        };
        Ok(installed)
    }

    /// Check if log level should be logged
    fn should_log(&self, level: &LogLevel) -> bool {
        level >= &self.current_level
    }
}

#[async_trait]
impl LogPort for TracingLogAdapter {
    async fn info(&self, message: &str) {
        if self.should_log(&LogLevel::Info) {
            info!("{}", message);
        }
    }

    async fn warn(&self, message: &str) {
        if self.should_log(&LogLevel::Warn) {
            warn!("{}", message);
        }
    }

    async fn error(&self, message: &str) {
        if self.should_log(&LogLevel::Error) {
            error!("{}", message);
        }
    }

    async fn debug(&self, message: &str) {
        if self.should_log(&LogLevel::Debug) {
            debug!("{}", message);
        }
    }

    async fn log_event(&self, event: &LogEvent) {
        if !self.should_log(&event.level) {
            return;
        }

        match event.level {
            LogLevel::Error => tracing::error!(message = %event.message, context = ?event.context),
            LogLevel::Warn => tracing::warn!(message = %event.message, context = ?event.context),
            LogLevel::Info => tracing::info!(message = %event.message, context = ?event.context),
            LogLevel::Debug => tracing::debug!(message = %event.message, context = ?event.context),
            LogLevel::Trace => tracing::trace!(message = %event.message, context = ?event.context),
        }
    }
}
