//! Minimal request/response connection between two contexts.
//!
//! Just enough to host pluggable cancellation: numeric request ids, a handler
//! table and the `$/cancelRequest` notification.

mod error;
mod handler;
mod message_connection;
mod wire;

pub use error::ConnectionError;
pub use handler::{handler_fn, HandlerFn, RequestHandler};
pub use message_connection::MessageConnection;
pub use wire::{WireMessage, CANCEL_REQUEST_METHOD};
