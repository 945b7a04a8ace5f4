//! # XC Cancellation
//!
//! Cancellation tokens for calls that cross execution contexts, and the
//! strategies a connection uses to deliver cancellation.
//!
//! ```text
//!   main context                relay process                worker
//! ┌────────────────┐ setCanceled ┌──────────┐  blocking GET ┌────────────────┐
//! │RelaySender     │ ──────────▶ │  store   │ ◀──────────── │RelayReceiver   │
//! │Strategy        │             └──────────┘               │Strategy (poll) │
//! │                │        $/cancelRequest                  │                │
//! │MessageReceiver │ ◀────────────────────────────────────── │MessageSender   │
//! └────────────────┘                                         └────────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod relay;
pub mod source;
pub mod strategy;
pub mod token;

pub use relay::{CancelTransport, RelayReceiverStrategy, RelaySenderStrategy, UnknownTransport};
pub use source::CancellationTokenSource;
pub use strategy::{
    CancellationChannel, CancellationReceiverStrategy, CancellationSenderStrategy,
    CancellationStrategy, MessageReceiverStrategy, MessageSenderStrategy,
};
pub use token::{CancellationCheck, CancellationSubscription, CancellationToken};
