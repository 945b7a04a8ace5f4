//! # Cancellation Strategies
//!
//! How a connection turns an incoming call id into a token (receiver side)
//! and how it tells the other side to stop an outgoing call (sender side).
//! The two directions are chosen independently per connection.

use crate::source::CancellationTokenSource;
use shared_bus::PortClosed;
use shared_types::CancellationId;
use std::sync::Arc;
use tracing::{debug, warn};

/// The connection's own message path, as seen by a sender strategy.
pub trait CancellationChannel: Send + Sync {
    /// Push a `$/cancelRequest` for `id` to the other side.
    fn send_cancel_request(&self, id: &CancellationId) -> Result<(), PortClosed>;
}

/// Builds the token source for an incoming call.
pub trait CancellationReceiverStrategy: Send + Sync {
    fn create_cancellation_token_source(&self, id: &CancellationId) -> CancellationTokenSource;
}

/// Transmits cancellation of an outgoing call.
pub trait CancellationSenderStrategy: Send + Sync {
    fn send_cancellation(&self, channel: &dyn CancellationChannel, id: &CancellationId);

    /// The call `id` completed on its own.
    fn cleanup(&self, _id: &CancellationId) {}

    /// The connection is going away.
    fn dispose(&self) {}
}

/// Tokens cancelled by `$/cancelRequest` on the connection itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageReceiverStrategy;

impl CancellationReceiverStrategy for MessageReceiverStrategy {
    fn create_cancellation_token_source(&self, _id: &CancellationId) -> CancellationTokenSource {
        CancellationTokenSource::new()
    }
}

/// Sends `$/cancelRequest` down the connection itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageSenderStrategy;

impl CancellationSenderStrategy for MessageSenderStrategy {
    fn send_cancellation(&self, channel: &dyn CancellationChannel, id: &CancellationId) {
        match channel.send_cancel_request(id) {
            Ok(()) => debug!(id = %id, "Sent cancel request"),
            Err(e) => warn!(id = %id, error = %e, "Cancel request not sent"),
        }
    }
}

/// Receiver and sender policies of one connection.
#[derive(Clone)]
pub struct CancellationStrategy {
    pub receiver: Arc<dyn CancellationReceiverStrategy>,
    pub sender: Arc<dyn CancellationSenderStrategy>,
}

impl CancellationStrategy {
    pub fn new(
        receiver: impl CancellationReceiverStrategy + 'static,
        sender: impl CancellationSenderStrategy + 'static,
    ) -> Self {
        Self {
            receiver: Arc::new(receiver),
            sender: Arc::new(sender),
        }
    }

    /// Both directions over the connection's own channel.
    #[must_use]
    pub fn message() -> Self {
        Self::new(MessageReceiverStrategy, MessageSenderStrategy)
    }
}

impl Default for CancellationStrategy {
    fn default() -> Self {
        Self::message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<CancellationId>>,
    }

    impl CancellationChannel for RecordingChannel {
        fn send_cancel_request(&self, id: &CancellationId) -> Result<(), PortClosed> {
            self.sent.lock().push(id.clone());
            Ok(())
        }
    }

    struct ClosedChannel;

    impl CancellationChannel for ClosedChannel {
        fn send_cancel_request(&self, _id: &CancellationId) -> Result<(), PortClosed> {
            Err(PortClosed)
        }
    }

    #[test]
    fn test_message_sender_uses_channel() {
        let channel = RecordingChannel::default();
        let strategy = CancellationStrategy::message();

        strategy.sender.send_cancellation(&channel, &CancellationId::from(3));

        assert_eq!(*channel.sent.lock(), vec![CancellationId::from(3)]);
    }

    #[test]
    fn test_message_sender_tolerates_closed_channel() {
        MessageSenderStrategy.send_cancellation(&ClosedChannel, &CancellationId::from(1));
    }

    #[test]
    fn test_message_receiver_builds_local_source() {
        let source = MessageReceiverStrategy.create_cancellation_token_source(&CancellationId::from(1));
        let token = source.token();
        assert!(!token.is_cancellation_requested());
        source.cancel();
        assert!(token.is_cancellation_requested());
    }
}
