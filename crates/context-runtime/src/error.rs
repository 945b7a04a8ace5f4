use crate::connection::ConnectionError;
use thiserror::Error;
use xc_relay::RelayError;

/// Errors starting, running or stopping a context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Failed to spawn context thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The worker thread panicked.
    #[error("Worker context panicked")]
    WorkerPanicked,
}
