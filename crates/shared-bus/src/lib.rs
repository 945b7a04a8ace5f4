//! # Shared Bus - Message Passing Between Execution Contexts
//!
//! Contexts never share memory. Everything they exchange goes through one of
//! the primitives in this crate:
//!
//! ```text
//! ┌──────────────┐   MessageChannel (duplex)   ┌──────────────┐
//! │ Main context │ ◀─────────────────────────▶ │    Worker    │
//! └──────────────┘                             └──────────────┘
//!        ▲                                            │
//!        │ Mailbox/Inbox                              │ relay commands
//!        │ (ContextMessage)                           ▼
//!        │                                   ┌─────────────────┐
//!        └────────────────────────────────── │  Relay process  │
//!                                            │ ClientDirectory │
//!                                            └─────────────────┘
//! ```
//!
//! - [`MessageChannel`]: duplex port pair between two contexts.
//! - [`Mailbox`] / [`Inbox`]: how the relay pushes messages to a context.
//! - [`ClientDirectory`]: the relay's table of registered contexts.
//! - [`ReplyChannel`]: one-shot reply path of a forwarded call.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod port;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ContextMessage, ReplyChannel};
pub use port::{MessageChannel, MessagePort, PortClosed, PortReader, PortWriter};
pub use publisher::{ClientDirectory, PostError};
pub use subscriber::{mailbox, Inbox, InboxStream, Mailbox};
