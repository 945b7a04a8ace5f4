//! Relay error types.

use thiserror::Error;

/// Errors a context sees when talking to the relay process.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay process has stopped; its command queue or the reply channel
    /// of a pending call is gone.
    #[error("Relay process unavailable")]
    Unavailable,

    /// The relay thread or its runtime could not be started.
    #[error("Failed to spawn relay process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The relay answered with a status this call does not expect.
    #[error("Unexpected relay response status {status}")]
    UnexpectedResponse { status: u16 },

    /// A request or response body could not be (de)serialized.
    #[error("Invalid relay payload: {0}")]
    Payload(#[from] serde_json::Error),
}
