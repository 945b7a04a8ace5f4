//! # Error Types
//!
//! Errors raised while interpreting cross-context values.

use thiserror::Error;

/// Errors from parsing a reserved relay address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The cancellation address carries no request id segment.
    #[error("Cancellation address has no request id segment: {path}")]
    MissingRequestId { path: String },

    /// The client segment is not a valid client id.
    #[error("Invalid client id segment {segment:?} in {path}")]
    InvalidClientId { path: String, segment: String },

    /// The request id segment is not a correlation id or is badly encoded.
    #[error("Invalid request id segment {segment:?} in {path}")]
    InvalidRequestId { path: String, segment: String },
}
