//! # Context Messages
//!
//! Messages the relay process pushes into a context's inbox. The receiving
//! context demultiplexes on the variant.

use shared_types::{CorrelationId, RpcRequest, RpcResponse};
use tokio::sync::oneshot;

/// A message delivered to a registered context.
#[derive(Debug)]
pub enum ContextMessage {
    /// A call forwarded from another context. Exactly one reply is expected
    /// on `reply`.
    Rpc {
        request_id: CorrelationId,
        request: RpcRequest,
        reply: ReplyChannel,
    },

    /// Diagnostic line from the relay about a request this context made.
    Log { message: String },
}

impl ContextMessage {
    /// Discriminant name, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "rpc",
            Self::Log { .. } => "log",
        }
    }
}

/// One-shot reply path of a single forwarded call.
///
/// Created per call and consumed by [`ReplyChannel::reply`]; never reused.
#[derive(Debug)]
pub struct ReplyChannel(oneshot::Sender<RpcResponse>);

impl ReplyChannel {
    /// Create a reply channel and the receiver the relay awaits.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<RpcResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Send the single reply. Returns false if the caller stopped waiting.
    pub fn reply(self, response: RpcResponse) -> bool {
        self.0.send(response).is_ok()
    }

    /// Whether the waiting side has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reply_channel_delivers_once() {
        let (reply, rx) = ReplyChannel::new();
        assert!(reply.reply(RpcResponse::result(json!(1))));
        assert_eq!(rx.await.unwrap(), RpcResponse::result(json!(1)));
    }

    #[tokio::test]
    async fn test_reply_after_receiver_dropped() {
        let (reply, rx) = ReplyChannel::new();
        drop(rx);
        assert!(reply.is_closed());
        assert!(!reply.reply(RpcResponse::result(json!(null))));
    }

    #[test]
    fn test_message_kind() {
        let msg = ContextMessage::Log {
            message: "fetch GET ./x".into(),
        };
        assert_eq!(msg.kind(), "log");
    }
}
