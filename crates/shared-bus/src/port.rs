//! # Message Ports
//!
//! A duplex channel between two contexts, the in-process counterpart of a
//! worker's `postMessage` pair. Each side gets a [`MessagePort`] that can be
//! split into a cloneable writer and a single reader.

use thiserror::Error;
use tokio::sync::mpsc;

/// The other end of the port is gone.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Message port closed")]
pub struct PortClosed;

/// Factory for connected port pairs.
pub struct MessageChannel;

impl MessageChannel {
    /// Create two connected ports: what one posts, the other receives.
    #[must_use]
    pub fn pair<T>() -> (MessagePort<T>, MessagePort<T>) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            MessagePort {
                writer: PortWriter { sender: a_tx },
                reader: PortReader { receiver: a_rx },
            },
            MessagePort {
                writer: PortWriter { sender: b_tx },
                reader: PortReader { receiver: b_rx },
            },
        )
    }
}

/// One end of a duplex channel.
pub struct MessagePort<T> {
    writer: PortWriter<T>,
    reader: PortReader<T>,
}

impl<T> MessagePort<T> {
    pub fn post_message(&self, message: T) -> Result<(), PortClosed> {
        self.writer.post_message(message)
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.reader.recv().await
    }

    /// Separate the sending and receiving halves.
    #[must_use]
    pub fn split(self) -> (PortWriter<T>, PortReader<T>) {
        (self.writer, self.reader)
    }
}

/// Sending half of a port.
#[derive(Debug)]
pub struct PortWriter<T> {
    sender: mpsc::UnboundedSender<T>,
}

impl<T> Clone for PortWriter<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> PortWriter<T> {
    pub fn post_message(&self, message: T) -> Result<(), PortClosed> {
        self.sender.send(message).map_err(|_| PortClosed)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving half of a port.
#[derive(Debug)]
pub struct PortReader<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> PortReader<T> {
    /// Next message, or `None` once every writer of the other end is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }
}
