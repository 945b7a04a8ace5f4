//! # Context Inbox
//!
//! The receiving side of a context's mailbox. The relay holds the
//! [`Mailbox`]; the context holds the [`Inbox`].

use crate::events::ContextMessage;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Create a connected mailbox / inbox pair.
#[must_use]
pub fn mailbox() -> (Mailbox, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Mailbox { sender: tx }, Inbox { receiver: rx })
}

/// Sending side of a context's inbox.
#[derive(Debug, Clone)]
pub struct Mailbox {
    sender: mpsc::UnboundedSender<ContextMessage>,
}

impl Mailbox {
    /// Push a message. On failure the message is handed back.
    pub fn deliver(&self, message: ContextMessage) -> Result<(), ContextMessage> {
        self.sender.send(message).map_err(|e| e.0)
    }

    /// Whether the owning context dropped its inbox.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving side of a context's inbox.
///
/// Dropping the inbox closes the mailbox; the relay treats the context as
/// gone from then on.
#[derive(Debug)]
pub struct Inbox {
    receiver: mpsc::UnboundedReceiver<ContextMessage>,
}

impl Inbox {
    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next message
    /// - `None` - Every mailbox was dropped
    pub async fn recv(&mut self) -> Option<ContextMessage> {
        self.receiver.recv().await
    }

    /// Turn the inbox into a stream of messages. Dispatchers drain it this
    /// way.
    #[must_use]
    pub fn into_stream(self) -> InboxStream {
        InboxStream { inbox: self }
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        debug!("Inbox dropped");
    }
}

/// A stream wrapper for an inbox.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct InboxStream {
    inbox: Inbox,
}

impl Stream for InboxStream {
    type Item = ContextMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbox.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn log(message: &str) -> ContextMessage {
        ContextMessage::Log {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_inbox_recv() {
        let (mailbox, mut inbox) = mailbox();
        mailbox.deliver(log("one")).unwrap();

        let received = timeout(Duration::from_millis(100), inbox.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert!(matches!(received, ContextMessage::Log { message } if message == "one"));
    }

    #[tokio::test]
    async fn test_deliver_after_inbox_dropped_returns_message() {
        let (mailbox, inbox) = mailbox();
        drop(inbox);

        assert!(mailbox.is_closed());
        let returned = mailbox.deliver(log("late")).unwrap_err();
        assert_eq!(returned.kind(), "log");
    }

    #[tokio::test]
    async fn test_inbox_stream() {
        let (mailbox, inbox) = mailbox();
        mailbox.deliver(log("a")).unwrap();
        mailbox.deliver(log("b")).unwrap();
        drop(mailbox);

        let kinds: Vec<_> = inbox.into_stream().map(|m| m.kind()).collect().await;
        assert_eq!(kinds, vec!["log", "log"]);
    }
}
