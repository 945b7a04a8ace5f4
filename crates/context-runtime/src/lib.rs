//! # Context Runtime
//!
//! Execution contexts of the cross-context relay.
//!
//! - `connection/` - Request/response connection with pluggable cancellation
//! - `rpc_relay` - Serves calls forwarded through the relay process
//! - `handlers/` - Demo methods
//! - `main_context` / `worker_context` - The two contexts and their wiring
//!
//! ## Cancellation Routing
//!
//! | Direction      | Receiver strategy         | Sender strategy            |
//! |----------------|---------------------------|----------------------------|
//! | main → worker  | relay-polled (worker)     | relay record (main)        |
//! | worker → main  | message (main)            | message (worker)           |
//!
//! The worker's handlers see cancellation by polling the relay's store with
//! the blocking query, so a handler that never yields to its runtime still
//! observes it at its next token check.

#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod main_context;
pub mod rpc_relay;
pub mod worker_context;

pub use config::ContextConfig;
pub use connection::{handler_fn, ConnectionError, MessageConnection, RequestHandler, WireMessage};
pub use error::ContextError;
pub use main_context::MainContext;
pub use rpc_relay::RelayDispatcher;
pub use worker_context::WorkerContext;
