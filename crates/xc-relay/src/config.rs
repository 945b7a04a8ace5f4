//! Relay process configuration.

use std::env;

/// Configuration for [`crate::RelayProcess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Name of the OS thread the relay runs on
    pub thread_name: String,

    /// Echo every intercepted fetch to the requesting context as a log message
    pub client_log: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            thread_name: "xc-relay".to_string(),
            client_log: false,
        }
    }
}

impl RelayConfig {
    /// Create configuration from environment variables.
    ///
    /// - `RELAY_THREAD_NAME`: relay thread name (default: xc-relay)
    /// - `RELAY_CLIENT_LOG`: echo fetches to clients (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            thread_name: env::var("RELAY_THREAD_NAME").unwrap_or(defaults.thread_name),
            client_log: env::var("RELAY_CLIENT_LOG")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
                .unwrap_or(defaults.client_log),
        }
    }

    /// Builder-style toggle for the client log.
    #[must_use]
    pub fn with_client_log(mut self, enabled: bool) -> Self {
        self.client_log = enabled;
        self
    }
}
