//! # Relay Process
//!
//! Singleton actor that owns the cancellation record store and the client
//! directory. It runs on its own OS thread with its own current-thread
//! runtime, so a context that blocks on a query never stalls the relay.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn ──▶ Installing ──▶ Active ──(reinstall)──▶ Installing ──▶ Active
//!                            │
//!                            └──(shutdown / all handles dropped)──▶ Stopped
//! ```
//!
//! Activation purges the store wholesale and claims every registered client.

use crate::command::Command;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::fetch::{
    FetchMethod, FetchRequest, FetchResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR,
    STATUS_NOT_CANCELED, STATUS_OK,
};
use crate::handle::RelayHandle;
use crate::store::CancellationStore;
use relay_telemetry::{
    metric_inc, time_histogram, CANCELLATION_QUERIES, RELAY_COMMANDS, RPC_FORWARDED,
    RPC_FORWARD_DURATION,
};
use serde::Serialize;
use serde_json::Value;
use shared_bus::{ClientDirectory, ContextMessage, ReplyChannel};
use shared_types::{
    CancellationId, CancellationMessage, ClientId, CorrelationId, Envelope, RelayAddress,
    RpcError, RpcRequest, RpcResponse,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    Installing,
    Active,
    Stopped,
}

/// Snapshot returned by [`RelayHandle::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub state: RelayState,
    /// Incremented by every install.
    pub version: u64,
    pub records: usize,
    pub clients: usize,
    pub commands_handled: u64,
    /// Messages delivered to context inboxes.
    pub messages_posted: u64,
}

pub struct RelayProcess {
    config: RelayConfig,
    store: CancellationStore,
    clients: ClientDirectory,
    state: RelayState,
    version: u64,
    commands_handled: u64,
}

impl RelayProcess {
    fn new(config: RelayConfig) -> Self {
        Self {
            config,
            store: CancellationStore::new(),
            clients: ClientDirectory::new(),
            state: RelayState::Installing,
            version: 0,
            commands_handled: 0,
        }
    }

    /// Start the relay on a dedicated thread and return its handle.
    pub fn spawn(config: RelayConfig) -> Result<RelayHandle, RelayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let process = Self::new(config.clone());

        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || runtime.block_on(process.run(commands_rx)))?;

        info!(thread = %config.thread_name, "Relay process spawned");
        Ok(RelayHandle::new(commands_tx, thread))
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.install();
        self.activate();

        while let Some(command) = commands.recv().await {
            self.commands_handled += 1;
            metric_inc!(RELAY_COMMANDS, &[command.name()]);

            match command {
                Command::Register {
                    client,
                    owner,
                    mailbox,
                } => {
                    self.clients.register(client, owner, mailbox);
                }
                Command::Unregister { client } => {
                    self.clients.unregister(&client);
                }
                Command::Message(envelope) => self.handle_message(envelope),
                Command::Fetch {
                    sender,
                    request,
                    reply,
                } => self.handle_fetch(sender, request, reply),
                Command::Reinstall { reply } => {
                    self.install();
                    self.activate();
                    let _ = reply.send(self.version);
                }
                Command::Status { reply } => {
                    let _ = reply.send(self.status());
                }
                Command::Shutdown => break,
            }
        }

        self.state = RelayState::Stopped;
        info!(
            version = self.version,
            commands_handled = self.commands_handled,
            "Relay process stopped"
        );
    }

    /// Supersede whatever instance ran before, without waiting on its clients.
    fn install(&mut self) {
        self.state = RelayState::Installing;
        self.version += 1;
        info!(version = self.version, "Relay process installing");
    }

    fn activate(&mut self) {
        let purged = self.store.purge();
        // Every registered context is served by this version from now on
        let claimed = self.clients.len();
        self.state = RelayState::Active;
        info!(version = self.version, purged, claimed, "Relay process active");
    }

    fn status(&self) -> RelayStatus {
        RelayStatus {
            state: self.state,
            version: self.version,
            records: self.store.len(),
            clients: self.clients.len(),
            commands_handled: self.commands_handled,
            messages_posted: self.clients.messages_posted(),
        }
    }

    /// Record mutations are fire-and-forget; nothing is reported back.
    fn handle_message(&mut self, envelope: Envelope<CancellationMessage>) {
        if !envelope.is_supported() {
            warn!(
                sender = %envelope.sender,
                version = envelope.version,
                "Dropping message with unsupported envelope version"
            );
            return;
        }

        let sender = envelope.sender;
        match envelope.payload {
            CancellationMessage::SetCanceled { id } => self.store.set(&id, sender),
            CancellationMessage::DeleteCanceled { id } => {
                self.store.delete(&id, sender);
            }
        }
    }

    fn handle_fetch(
        &mut self,
        sender: ClientId,
        request: FetchRequest,
        reply: oneshot::Sender<FetchResponse>,
    ) {
        let address = match RelayAddress::parse(&request.path) {
            Ok(Some(address)) => address,
            Ok(None) => {
                debug!(path = %request.path, "Fetch not intercepted");
                let _ = reply.send(FetchResponse::not_found());
                return;
            }
            Err(e) => {
                warn!(sender = %sender, error = %e, "Malformed relay address");
                let _ = reply.send(FetchResponse::rpc_error(
                    STATUS_BAD_REQUEST,
                    RpcError::invalid_request(e.to_string()),
                ));
                return;
            }
        };

        if self.config.client_log {
            self.client_log(sender, format!("fetch {} {}", request.method, request.path));
        }

        match address {
            RelayAddress::Cancellation { id, client } => {
                let scope = client.unwrap_or(sender);
                let response = self.handle_cancellation(request.method, &id, scope);
                let _ = reply.send(response);
            }
            RelayAddress::Rpc { request_id } => {
                self.forward_rpc(
                    sender,
                    request_id.unwrap_or_default(),
                    request.body,
                    reply,
                );
            }
        }
    }

    /// Answered from memory before the next command is taken.
    fn handle_cancellation(
        &mut self,
        method: FetchMethod,
        id: &CancellationId,
        scope: ClientId,
    ) -> FetchResponse {
        match method {
            FetchMethod::Get => {
                let canceled = self.store.is_canceled(id, scope);
                let outcome = if canceled { "canceled" } else { "not_canceled" };
                metric_inc!(CANCELLATION_QUERIES, &[outcome]);
                debug!(id = %id, client = %scope, canceled, "Cancellation queried");
                FetchResponse::empty(if canceled { STATUS_OK } else { STATUS_NOT_CANCELED })
            }
            FetchMethod::Post => {
                self.store.set(id, scope);
                FetchResponse::empty(STATUS_OK)
            }
            FetchMethod::Delete => {
                self.store.delete(id, scope);
                FetchResponse::empty(STATUS_OK)
            }
        }
    }

    /// Push the call to the owning context and answer once it replies.
    ///
    /// The reply is awaited on a spawned task so the actor keeps serving
    /// other commands while the owner works.
    fn forward_rpc(
        &mut self,
        sender: ClientId,
        request_id: CorrelationId,
        body: Option<Value>,
        reply: oneshot::Sender<FetchResponse>,
    ) {
        let request: RpcRequest = match body.map(serde_json::from_value) {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                metric_inc!(RPC_FORWARDED, &["invalid"]);
                let _ = reply.send(FetchResponse::rpc_error(
                    STATUS_BAD_REQUEST,
                    RpcError::invalid_request(e.to_string()),
                ));
                return;
            }
            None => {
                metric_inc!(RPC_FORWARDED, &["invalid"]);
                let _ = reply.send(FetchResponse::rpc_error(
                    STATUS_BAD_REQUEST,
                    RpcError::invalid_request("missing body"),
                ));
                return;
            }
        };

        let owner = self.clients.resolve_owner(&sender);
        let method = request.method.clone();
        let (reply_channel, response_rx) = ReplyChannel::new();
        let message = ContextMessage::Rpc {
            request_id,
            request,
            reply: reply_channel,
        };

        if let Err(e) = self.clients.post(&owner, message) {
            metric_inc!(RPC_FORWARDED, &["no_client"]);
            warn!(
                request_id = %request_id,
                sender = %sender,
                method = %method,
                error = %e,
                "No owning context for forwarded call"
            );
            let _ = reply.send(FetchResponse::rpc_error(
                STATUS_INTERNAL_ERROR,
                RpcError::no_client(e.to_string()),
            ));
            return;
        }

        debug!(
            request_id = %request_id,
            sender = %sender,
            owner = %owner,
            method = %method,
            "Forwarded call"
        );

        tokio::spawn(async move {
            let _timer = time_histogram!(RPC_FORWARD_DURATION);
            let response = match response_rx.await {
                Ok(response) => {
                    let outcome = match &response {
                        RpcResponse::Result { .. } => "ok",
                        RpcResponse::Error { .. } => "error",
                    };
                    metric_inc!(RPC_FORWARDED, &[outcome]);
                    FetchResponse::rpc(STATUS_OK, &response)
                }
                Err(_) => {
                    metric_inc!(RPC_FORWARDED, &["dropped"]);
                    warn!(request_id = %request_id, method = %method, "Owning context dropped the reply");
                    FetchResponse::rpc_error(
                        STATUS_INTERNAL_ERROR,
                        RpcError::internal("reply channel dropped"),
                    )
                }
            };
            if reply.send(response).is_err() {
                debug!(request_id = %request_id, "Caller stopped waiting for forwarded call");
            }
        });
    }

    fn client_log(&mut self, client: ClientId, message: String) {
        if let Err(e) = self.clients.post(&client, ContextMessage::Log { message }) {
            debug!(client = %client, error = %e, "Client log not delivered");
        }
    }
}
