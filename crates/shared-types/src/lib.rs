//! # Shared Types Crate
//!
//! Types that cross execution-context boundaries: identifiers, the
//! cancellation mutation message, RPC request/response bodies and the
//! reserved address scheme understood by the relay process.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-context type is defined here.
//! - **Envelope Identity**: the sender of a message is carried by the
//!   [`Envelope`], never by the payload.
//! - **Scoped Cancellation**: a [`CancellationId`] is only meaningful when
//!   paired with the [`ClientId`] that owns it.

pub mod address;
pub mod correlation;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod rpc;

pub use address::{RelayAddress, CANCELLATION_MARKER, RPC_MARKER};
pub use correlation::CorrelationId;
pub use envelope::{CancellationMessage, Envelope};
pub use errors::AddressError;
pub use ids::{CancellationId, ClientId};
pub use rpc::{codes, RpcError, RpcRequest, RpcResponse};
