//! # Context Configuration
//!
//! Settings of the main and worker contexts. Plain struct with sane
//! defaults; every field can be overridden from the environment.

use crate::error::ContextError;
use std::env;
use std::time::Duration;
use xc_cancellation::CancelTransport;

/// Configuration shared by the main context and the worker it spawns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Polls `addNumbersSlow` performs before answering.
    pub slow_iterations: u32,
    /// Pause between two polls of `addNumbersSlow`.
    pub slow_interval: Duration,
    /// How the main context hands cancellations to the relay.
    pub cancel_transport: CancelTransport,
    /// Delete a call's cancellation record once the call completes.
    pub cleanup_records: bool,
    /// Name of the worker context's thread.
    pub worker_thread_name: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            slow_iterations: 20,
            slow_interval: Duration::from_millis(100),
            cancel_transport: CancelTransport::Message,
            cleanup_records: true,
            worker_thread_name: "xc-worker".to_string(),
        }
    }
}

impl ContextConfig {
    /// Create configuration from environment variables.
    ///
    /// - `RELAY_SLOW_ITERATIONS` (default: 20)
    /// - `RELAY_SLOW_INTERVAL_MS` (default: 100)
    /// - `RELAY_CANCEL_TRANSPORT`: `message` or `post` (default: message)
    /// - `RELAY_CLEANUP_RECORDS` (default: true)
    pub fn from_env() -> Result<Self, ContextError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("RELAY_SLOW_ITERATIONS") {
            config.slow_iterations = value
                .trim()
                .parse()
                .map_err(|_| ContextError::Config(format!("RELAY_SLOW_ITERATIONS={value}")))?;
        }
        if let Ok(value) = env::var("RELAY_SLOW_INTERVAL_MS") {
            let millis: u64 = value
                .trim()
                .parse()
                .map_err(|_| ContextError::Config(format!("RELAY_SLOW_INTERVAL_MS={value}")))?;
            config.slow_interval = Duration::from_millis(millis);
        }
        if let Ok(value) = env::var("RELAY_CANCEL_TRANSPORT") {
            config.cancel_transport = value
                .parse()
                .map_err(|e: xc_cancellation::UnknownTransport| ContextError::Config(e.to_string()))?;
        }
        if let Ok(value) = env::var("RELAY_CLEANUP_RECORDS") {
            config.cleanup_records =
                matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on");
        }

        Ok(config)
    }

    /// Shorter slow calls, for tests.
    #[must_use]
    pub fn with_slow_call(mut self, iterations: u32, interval: Duration) -> Self {
        self.slow_iterations = iterations;
        self.slow_interval = interval;
        self
    }

    #[must_use]
    pub fn with_cancel_transport(mut self, transport: CancelTransport) -> Self {
        self.cancel_transport = transport;
        self
    }
}
