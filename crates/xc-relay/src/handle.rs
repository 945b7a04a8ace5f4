//! Handles through which contexts reach the relay process.

use crate::command::Command;
use crate::error::RelayError;
use crate::fetch::{
    FetchRequest, FetchResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_NOT_CANCELED,
    STATUS_OK,
};
use crate::process::RelayStatus;
use parking_lot::Mutex;
use shared_bus::{mailbox, Inbox};
use shared_types::{
    CancellationId, CancellationMessage, ClientId, CorrelationId, Envelope, RelayAddress,
    RpcRequest, RpcResponse,
};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Cloneable handle to a running relay process.
///
/// Passed explicitly to every component that needs the relay.
#[derive(Clone)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<Command>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// A freshly registered context: its relay client and the inbox the relay
/// pushes forwarded calls and log lines into.
pub struct ClientPort {
    pub client: RelayClient,
    pub inbox: Inbox,
}

impl RelayHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>, thread: JoinHandle<()>) -> Self {
        Self {
            commands,
            thread: Arc::new(Mutex::new(Some(thread))),
        }
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), RelayError> {
        self.commands
            .send(command)
            .map_err(|_| RelayError::Unavailable)
    }

    /// Register a top-level (main) context.
    pub fn register_client(&self) -> Result<ClientPort, RelayError> {
        self.register(None)
    }

    /// Register a worker context owned by `owner`. Calls the worker forwards
    /// through the relay are served by the owner.
    pub fn register_worker(&self, owner: ClientId) -> Result<ClientPort, RelayError> {
        self.register(Some(owner))
    }

    fn register(&self, owner: Option<ClientId>) -> Result<ClientPort, RelayError> {
        let client = ClientId::new();
        let (mailbox, inbox) = mailbox();
        self.send(Command::Register {
            client,
            owner,
            mailbox,
        })?;
        debug!(client = %client, owner = ?owner, "Registered with relay");
        Ok(ClientPort {
            client: RelayClient {
                id: client,
                relay: self.clone(),
            },
            inbox,
        })
    }

    /// Run install and activate again as a new version. The store is purged.
    ///
    /// Returns the new version.
    pub async fn reinstall(&self) -> Result<u64, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reinstall { reply })?;
        rx.await.map_err(|_| RelayError::Unavailable)
    }

    pub async fn status(&self) -> Result<RelayStatus, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply })?;
        rx.await.map_err(|_| RelayError::Unavailable)
    }

    /// Whether the relay still accepts commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Stop the relay and wait for its thread to exit.
    ///
    /// Commands still queued are dropped; their callers get
    /// [`RelayError::Unavailable`].
    pub fn shutdown(&self) {
        if self.send(Command::Shutdown).is_err() {
            return;
        }
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                warn!("Relay thread panicked");
            }
        }
        info!("Relay process shut down");
    }
}

/// One registered context's view of the relay.
///
/// Every message it sends is stamped with its own [`ClientId`].
#[derive(Clone)]
pub struct RelayClient {
    id: ClientId,
    relay: RelayHandle,
}

impl RelayClient {
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    #[must_use]
    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    /// Fire-and-forget: mark `id` canceled in this client's scope.
    pub fn set_canceled(&self, id: &CancellationId) {
        self.post_message(CancellationMessage::SetCanceled { id: id.clone() });
    }

    /// Fire-and-forget: remove this client's record for `id`.
    pub fn delete_canceled(&self, id: &CancellationId) {
        self.post_message(CancellationMessage::DeleteCanceled { id: id.clone() });
    }

    fn post_message(&self, message: CancellationMessage) {
        let envelope = Envelope::new(self.id, message);
        if self.relay.send(Command::Message(envelope)).is_err() {
            warn!(client = %self.id, "Relay unavailable, cancellation message dropped");
        }
    }

    /// Blocking query of the record `(id, scope)`.
    pub fn query_canceled(&self, id: &CancellationId, scope: ClientId) -> Result<bool, RelayError> {
        let path = RelayAddress::cancellation(id, scope).to_path();
        let response = self.fetch(FetchRequest::get(path))?;
        match response.status {
            STATUS_OK => Ok(true),
            STATUS_NOT_CANCELED => Ok(false),
            status => Err(RelayError::UnexpectedResponse { status }),
        }
    }

    /// Blocking alternative to [`RelayClient::set_canceled`]: returns once the
    /// relay has written the record.
    pub fn post_canceled(&self, id: &CancellationId) -> Result<(), RelayError> {
        let path = RelayAddress::own_cancellation(id).to_path();
        let response = self.fetch(FetchRequest::post(path, None))?;
        if response.is_ok() {
            Ok(())
        } else {
            Err(RelayError::UnexpectedResponse {
                status: response.status,
            })
        }
    }

    /// Blocking fetch against the relay.
    ///
    /// Parks the calling thread until the relay answers. Must not be called
    /// from the thread that runs the context serving a forwarded call, or
    /// that call can never be answered.
    pub fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, RelayError> {
        let rx = self.enqueue_fetch(request)?;
        futures::executor::block_on(rx).map_err(|_| RelayError::Unavailable)
    }

    pub async fn fetch_async(&self, request: FetchRequest) -> Result<FetchResponse, RelayError> {
        let rx = self.enqueue_fetch(request)?;
        rx.await.map_err(|_| RelayError::Unavailable)
    }

    fn enqueue_fetch(
        &self,
        request: FetchRequest,
    ) -> Result<oneshot::Receiver<FetchResponse>, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.relay.send(Command::Fetch {
            sender: self.id,
            request,
            reply,
        })?;
        Ok(rx)
    }

    /// Forward a call to the context that owns this one.
    pub async fn forward_rpc(&self, request: RpcRequest) -> Result<RpcResponse, RelayError> {
        let fetch = rpc_fetch(&request)?;
        rpc_response(self.fetch_async(fetch).await?)
    }

    /// Blocking form of [`RelayClient::forward_rpc`].
    pub fn forward_rpc_blocking(&self, request: RpcRequest) -> Result<RpcResponse, RelayError> {
        let fetch = rpc_fetch(&request)?;
        rpc_response(self.fetch(fetch)?)
    }

    /// Remove this client from the relay's directory.
    pub fn unregister(&self) {
        if self.relay.send(Command::Unregister { client: self.id }).is_err() {
            debug!(client = %self.id, "Relay already stopped");
        }
    }
}

fn rpc_fetch(request: &RpcRequest) -> Result<FetchRequest, RelayError> {
    let path = RelayAddress::rpc(CorrelationId::new()).to_path();
    Ok(FetchRequest::post(path, Some(serde_json::to_value(request)?)))
}

fn rpc_response(response: FetchResponse) -> Result<RpcResponse, RelayError> {
    match response.status {
        STATUS_OK | STATUS_BAD_REQUEST | STATUS_INTERNAL_ERROR => response.json(),
        status => Err(RelayError::UnexpectedResponse { status }),
    }
}
