//! # Worker Context
//!
//! A second execution context on its own OS thread and runtime. It serves
//! the demo methods over a [`MessageConnection`] and polls the relay for
//! cancellation of the calls it is serving.

use crate::config::ContextConfig;
use crate::connection::{MessageConnection, WireMessage};
use crate::error::ContextError;
use crate::handlers::{methods, AddNumbers, AddNumbersSlow, WorkerHello};
use crate::rpc_relay::RelayDispatcher;
use shared_bus::{Inbox, MessagePort};
use shared_types::ClientId;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{error, info};
use xc_cancellation::{CancellationStrategy, MessageSenderStrategy, RelayReceiverStrategy};
use xc_relay::{RelayClient, RelayHandle};

/// Handle to a running worker context.
pub struct WorkerContext {
    client_id: ClientId,
    thread: JoinHandle<()>,
}

impl WorkerContext {
    /// Register a worker owned by `owner` and start serving on `port`.
    ///
    /// The worker stops once the other end of `port` is dropped.
    pub fn spawn(
        relay: &RelayHandle,
        owner: ClientId,
        port: MessagePort<WireMessage>,
        config: &ContextConfig,
    ) -> Result<Self, ContextError> {
        let registered = relay.register_worker(owner)?;
        let client = registered.client;
        let inbox = registered.inbox;
        let client_id = client.id();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let config = config.clone();

        let thread = std::thread::Builder::new()
            .name(config.worker_thread_name.clone())
            .spawn(move || {
                runtime.block_on(serve(client.clone(), owner, port, inbox, config));
                client.unregister();
                info!(client = %client.id(), "Worker context stopped");
            })?;

        info!(client = %client_id, owner = %owner, "Worker context started");
        Ok(Self { client_id, thread })
    }

    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Wait for the worker thread to finish.
    pub fn join(self) -> Result<(), ContextError> {
        self.thread.join().map_err(|_| {
            error!(client = %self.client_id, "Worker context panicked");
            ContextError::WorkerPanicked
        })
    }
}

async fn serve(
    client: RelayClient,
    owner: ClientId,
    port: MessagePort<WireMessage>,
    inbox: Inbox,
    config: ContextConfig,
) {
    let (writer, reader) = port.split();
    let strategy = CancellationStrategy::new(
        RelayReceiverStrategy::new(client.clone(), owner),
        MessageSenderStrategy,
    );
    let connection = MessageConnection::new("worker", writer, strategy);
    connection.on_request(methods::ADD_NUMBERS, AddNumbers);
    connection.on_request(
        methods::ADD_NUMBERS_SLOW,
        AddNumbersSlow::new(config.slow_iterations, config.slow_interval),
    );
    connection.on_request(methods::HELLO, WorkerHello::new(client));

    // Nothing is forwarded to a worker; the inbox only carries log lines
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = tokio::spawn(RelayDispatcher::new().run(inbox, shutdown_rx));

    if let Err(e) = connection.listen(reader).await {
        error!(error = %e, "Worker connection task failed");
    }
    connection.dispose();
    shutdown_tx.send_replace(true);
    let _ = dispatcher.await;
}
