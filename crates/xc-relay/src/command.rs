//! Commands queued to the relay actor.
//!
//! Every interaction with the relay goes through one FIFO queue, so a query
//! observes every mutation enqueued before it.

use crate::fetch::{FetchRequest, FetchResponse};
use crate::process::RelayStatus;
use shared_bus::Mailbox;
use shared_types::{CancellationMessage, ClientId, Envelope};
use tokio::sync::oneshot;

pub(crate) enum Command {
    Register {
        client: ClientId,
        owner: Option<ClientId>,
        mailbox: Mailbox,
    },
    Unregister {
        client: ClientId,
    },
    /// Fire-and-forget record mutation.
    Message(Envelope<CancellationMessage>),
    Fetch {
        sender: ClientId,
        request: FetchRequest,
        reply: oneshot::Sender<FetchResponse>,
    },
    Reinstall {
        reply: oneshot::Sender<u64>,
    },
    Status {
        reply: oneshot::Sender<RelayStatus>,
    },
    Shutdown,
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::Message(_) => "message",
            Self::Fetch { .. } => "fetch",
            Self::Reinstall { .. } => "reinstall",
            Self::Status { .. } => "status",
            Self::Shutdown => "shutdown",
        }
    }
}
