//! Structured debug logging system

use lenspipe_core::{LensError, LensResult};
use tracing_subscriber::EnvFilter;

/// Debug logger for structured logging
#[derive(Debug, Clone)]
pub struct DebugLogger {
    default_directive: String,
}

impl DebugLogger {
    /// Create new debug logger with an `info` default level
    pub fn new() -> Self {
        Self {
            default_directive: "info".to_string(),
        }
    }

    /// Use `directive` when `RUST_LOG` is not set
    pub fn with_default_directive(mut self, directive: &str) -> Self {
        self.default_directive = directive.to_string();
        self
    }

    /// Build the filter: `RUST_LOG` when set, the default directive otherwise
    pub fn filter(&self) -> LensResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive).map_err(|e| {
                LensError::InvalidState {
                    message: format!("invalid log directive '{}': {}", self.default_directive, e),
                }
            }),
        }
    }

    /// Install the global subscriber.
    ///
    /// Returns `Ok(false)` if another subscriber was already installed.
    pub fn install(&self) -> LensResult<bool> {
        let installed = tracing_subscriber::fmt()
            .with_env_filter(self.filter()?)
            .with_thread_names(true)
            .try_init()
            .is_ok();
        Ok(installed)
    }

    /// Initialize logging system with defaults
    pub fn init_logging() -> LensResult<()> {
        Self::new().install()?;
        Ok(())
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
