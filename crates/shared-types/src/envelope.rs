//! # Message Envelope
//!
//! Wrapper for every message a context pushes to the relay process.
//!
//! ## Identity
//!
//! - The `sender` is stamped by the sending context's relay client when it
//!   registers, not chosen per message.
//! - The `sender` is the SOLE source of truth for who sent a message.
//!   Payloads never carry a client id, so one context cannot set or clear
//!   another context's cancellation records.

use crate::ids::{CancellationId, ClientId};
use serde::{Deserialize, Serialize};

/// A payload together with the identity of its sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// The registered client that sent the payload.
    pub sender: ClientId,

    /// The actual message payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    pub fn new(sender: ClientId, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sender,
            payload,
        }
    }

    /// Whether this envelope speaks a version the relay understands.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}

/// Asynchronous record mutation pushed to the relay.
///
/// Serializes as `{"type": "setCanceled", "id": …}` or
/// `{"type": "deleteCanceled", "id": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CancellationMessage {
    SetCanceled { id: CancellationId },
    DeleteCanceled { id: CancellationId },
}

impl CancellationMessage {
    #[must_use]
    pub fn id(&self) -> &CancellationId {
        match self {
            Self::SetCanceled { id } | Self::DeleteCanceled { id } => id,
        }
    }
}
