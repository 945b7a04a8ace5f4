//! # Main Context
//!
//! The top-level context. It owns the worker, issues calls to it, and serves
//! the calls the worker forwards back through the relay.
//!
//! ```text
//! MainContext ──MessageConnection──▶ WorkerContext
//!     ▲   cancel: relay record ─────────▶ polled by worker tokens
//!     └── RelayDispatcher ◀── relay ◀── forward_rpc("hello")
//! ```

use crate::config::ContextConfig;
use crate::connection::{ConnectionError, MessageConnection};
use crate::error::ContextError;
use crate::handlers::{methods, PageHello};
use crate::rpc_relay::RelayDispatcher;
use crate::worker_context::WorkerContext;
use serde_json::Value;
use shared_bus::MessageChannel;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use xc_cancellation::{
    CancellationStrategy, CancellationToken, MessageReceiverStrategy, RelaySenderStrategy,
};
use xc_relay::{RelayClient, RelayHandle};

pub struct MainContext {
    client: RelayClient,
    connection: MessageConnection,
    worker: WorkerContext,
    listener: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
    dispatcher_shutdown: watch::Sender<bool>,
}

impl MainContext {
    /// Register with the relay, start the worker and connect to it.
    ///
    /// Must be called from within a tokio runtime; the connection and the
    /// dispatcher run on it.
    pub fn start(relay: &RelayHandle, config: ContextConfig) -> Result<Self, ContextError> {
        let registered = relay.register_client()?;
        let client = registered.client;

        let (local, remote) = MessageChannel::pair();
        let worker = match WorkerContext::spawn(relay, client.id(), remote, &config) {
            Ok(worker) => worker,
            Err(e) => {
                client.unregister();
                return Err(e);
            }
        };

        let (writer, reader) = local.split();
        let sender = RelaySenderStrategy::new(client.clone())
            .with_transport(config.cancel_transport)
            .with_cleanup(config.cleanup_records);
        let connection = MessageConnection::new(
            "main",
            writer,
            CancellationStrategy::new(MessageReceiverStrategy, sender),
        );
        let listener = connection.listen(reader);

        let mut dispatcher = RelayDispatcher::new();
        dispatcher.register(methods::HELLO, PageHello);
        let (dispatcher_shutdown, shutdown_rx) = watch::channel(false);
        let dispatcher = tokio::spawn(dispatcher.run(registered.inbox, shutdown_rx));

        info!(
            client = %client.id(),
            worker = %worker.client_id(),
            transport = %config.cancel_transport,
            "Main context started"
        );
        Ok(Self {
            client,
            connection,
            worker,
            listener,
            dispatcher,
            dispatcher_shutdown,
        })
    }

    #[must_use]
    pub fn client(&self) -> &RelayClient {
        &self.client
    }

    #[must_use]
    pub fn connection(&self) -> &MessageConnection {
        &self.connection
    }

    #[must_use]
    pub fn worker_id(&self) -> shared_types::ClientId {
        self.worker.client_id()
    }

    /// Call `method` on the worker. Cancelling `token` writes a relay record
    /// the worker's token observes on its next poll.
    pub async fn send_request(
        &self,
        method: &str,
        params: Value,
        token: &CancellationToken,
    ) -> Result<Value, ConnectionError> {
        self.connection.send_request(method, params, token).await
    }

    /// Stop the connection, the dispatcher and the worker, then leave the
    /// relay.
    pub async fn shutdown(self) -> Result<(), ContextError> {
        self.connection.dispose();
        self.dispatcher_shutdown.send_replace(true);
        if let Err(e) = self.listener.await {
            warn!(error = %e, "Main connection task failed");
        }
        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "Main dispatcher task failed");
        }

        let worker = self.worker;
        let joined = tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|_| ContextError::WorkerPanicked)?;
        self.client.unregister();
        info!(client = %self.client.id(), "Main context stopped");
        joined
    }
}
