use shared_types::RpcError;
use thiserror::Error;

/// Errors from sending a request over a connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The other side went away before answering.
    #[error("Connection closed")]
    Closed,

    #[error("Connection disposed")]
    Disposed,

    /// The other side answered with an error.
    #[error("Request failed: {0}")]
    Rpc(#[from] RpcError),
}

impl ConnectionError {
    #[must_use]
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the request ended because it was cancelled.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.rpc_error().is_some_and(RpcError::is_cancellation)
    }
}
