//! # Message Connection
//!
//! Request/response correlation over a duplex port, with pluggable
//! cancellation.
//!
//! ## Flow
//!
//! ```text
//! send_request ──Request{id}──────────────▶ receiver strategy builds a token
//!      │                                    source for `id`, handler runs
//!      │ token cancelled?                   with the token
//!      └─▶ sender strategy ─ ─ ─ ─ ─ ─ ─ ─▶ ($/cancelRequest or relay record)
//!                                                         │
//! pending[id] completed ◀───Response{id}─────────────────┘
//!      └─▶ sender strategy cleanup(id)      source disposed
//! ```

use crate::connection::error::ConnectionError;
use crate::connection::handler::RequestHandler;
use crate::connection::wire::WireMessage;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{PortClosed, PortReader, PortWriter};
use shared_types::{CancellationId, RpcError, RpcResponse};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xc_cancellation::{
    CancellationChannel, CancellationStrategy, CancellationSubscription, CancellationToken,
    CancellationTokenSource,
};

struct ConnectionInner {
    name: String,
    /// Taken on dispose so the other side's reader sees the end of stream.
    writer: Mutex<Option<PortWriter<WireMessage>>>,
    strategy: CancellationStrategy,
    handlers: DashMap<String, Arc<dyn RequestHandler>>,
    /// Outgoing requests awaiting a response.
    pending: DashMap<i64, oneshot::Sender<RpcResponse>>,
    /// Incoming requests being served, by cancellation key.
    inflight: DashMap<String, Arc<CancellationTokenSource>>,
    next_id: AtomicI64,
    shutdown_tx: watch::Sender<bool>,
    disposed: AtomicBool,
}

impl ConnectionInner {
    fn post(&self, message: WireMessage) -> Result<(), ConnectionError> {
        match self.writer.lock().as_ref() {
            Some(writer) => writer
                .post_message(message)
                .map_err(|_| ConnectionError::Closed),
            None => Err(ConnectionError::Disposed),
        }
    }
}

impl CancellationChannel for ConnectionInner {
    fn send_cancel_request(&self, id: &CancellationId) -> Result<(), PortClosed> {
        self.post(WireMessage::cancel_request(id))
            .map_err(|_| PortClosed)
    }
}

/// Bookkeeping of one outgoing request, released when the call finishes or
/// its future is dropped.
struct OutgoingCall {
    inner: Arc<ConnectionInner>,
    id: i64,
    cancellation_id: CancellationId,
    subscription: CancellationSubscription,
}

impl Drop for OutgoingCall {
    fn drop(&mut self) {
        self.subscription.dispose();
        if self.inner.pending.remove(&self.id).is_some() {
            debug!(connection = %self.inner.name, id = self.id, "Request abandoned by caller");
        }
        self.inner.strategy.sender.cleanup(&self.cancellation_id);
    }
}

/// One end of a request/response connection between two contexts.
#[derive(Clone)]
pub struct MessageConnection {
    inner: Arc<ConnectionInner>,
}

impl MessageConnection {
    pub fn new(
        name: impl Into<String>,
        writer: PortWriter<WireMessage>,
        strategy: CancellationStrategy,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ConnectionInner {
                name: name.into(),
                writer: Mutex::new(Some(writer)),
                strategy,
                handlers: DashMap::new(),
                pending: DashMap::new(),
                inflight: DashMap::new(),
                next_id: AtomicI64::new(0),
                shutdown_tx,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Serve `method` with `handler`, replacing any previous handler.
    pub fn on_request(&self, method: impl Into<String>, handler: impl RequestHandler + 'static) {
        self.inner.handlers.insert(method.into(), Arc::new(handler));
    }

    /// Start the read loop on the current runtime.
    ///
    /// The loop ends when the other side drops its writer or the connection
    /// is disposed. Requests still awaiting a response then fail with
    /// [`ConnectionError::Closed`].
    pub fn listen(&self, mut reader: PortReader<WireMessage>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.inner.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if *shutdown.borrow() {
                return;
            }
            info!(connection = %inner.name, "Connection listening");
            loop {
                tokio::select! {
                    message = reader.recv() => match message {
                        Some(message) => handle_message(&inner, message),
                        None => {
                            debug!(connection = %inner.name, "Peer closed the connection");
                            break;
                        }
                    },
                    _ = shutdown.changed() => break,
                }
            }
            inner.pending.clear();
            info!(connection = %inner.name, "Connection stopped");
        })
    }

    /// Send a request and wait for its response.
    ///
    /// Cancelling `token` hands the request id to the connection's sender
    /// strategy; the call still resolves with whatever the other side answers.
    /// Dropping the returned future abandons the call: later cancellation is
    /// not transmitted and the sender strategy is cleaned up.
    pub async fn send_request(
        &self,
        method: &str,
        params: Value,
        token: &CancellationToken,
    ) -> Result<Value, ConnectionError> {
        let inner = &self.inner;
        if inner.disposed.load(Ordering::Acquire) {
            return Err(ConnectionError::Disposed);
        }

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        inner.pending.insert(id, tx);

        if let Err(e) = inner.post(WireMessage::Request {
            id,
            method: method.to_string(),
            params,
        }) {
            inner.pending.remove(&id);
            return Err(e);
        }
        debug!(connection = %inner.name, id, method, "Request sent");

        let cancellation_id = CancellationId::from(id);
        let subscription = token.on_cancellation_requested({
            let inner = Arc::clone(inner);
            let cancellation_id = cancellation_id.clone();
            move || {
                debug!(connection = %inner.name, id = %cancellation_id, "Cancelling request");
                inner
                    .strategy
                    .sender
                    .send_cancellation(inner.as_ref(), &cancellation_id);
            }
        });

        let call = OutgoingCall {
            inner: Arc::clone(inner),
            id,
            cancellation_id,
            subscription,
        };
        let response = rx.await;
        drop(call);

        match response {
            Ok(response) => Ok(response.into_result()?),
            Err(_) => Err(ConnectionError::Closed),
        }
    }

    /// [`MessageConnection::send_request`] without cancellation.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ConnectionError> {
        self.send_request(method, params, &CancellationToken::none())
            .await
    }

    /// Stop the read loop, release the writer and dispose the sender strategy.
    /// Idempotent.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        inner.shutdown_tx.send_replace(true);
        inner.writer.lock().take();
        inner.pending.clear();
        inner.strategy.sender.dispose();
        info!(connection = %inner.name, "Connection disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

fn handle_message(inner: &Arc<ConnectionInner>, message: WireMessage) {
    if let Some(id) = message.as_cancel_request() {
        let source = inner
            .inflight
            .get(&id.record_key())
            .map(|entry| Arc::clone(entry.value()));
        match source {
            Some(source) => {
                debug!(connection = %inner.name, id = %id, "Cancel request received");
                source.cancel();
            }
            None => debug!(connection = %inner.name, id = %id, "Cancel request for finished call"),
        }
        return;
    }

    match message {
        WireMessage::Request { id, method, params } => handle_request(inner, id, method, params),
        WireMessage::Response { id, response } => match inner.pending.remove(&id) {
            Some((_, tx)) => {
                let _ = tx.send(response);
            }
            None => warn!(connection = %inner.name, id, "Response for unknown request"),
        },
        WireMessage::Notification { method, .. } => {
            debug!(connection = %inner.name, method = %method, "Unhandled notification");
        }
    }
}

fn handle_request(inner: &Arc<ConnectionInner>, id: i64, method: String, params: Value) {
    let handler = inner
        .handlers
        .get(&method)
        .map(|entry| Arc::clone(entry.value()));

    let Some(handler) = handler else {
        warn!(connection = %inner.name, id, method = %method, "No handler for request");
        let response = RpcResponse::error(RpcError::method_not_found(&method));
        if let Err(e) = inner.post(WireMessage::Response { id, response }) {
            debug!(connection = %inner.name, id, error = %e, "Response not delivered");
        }
        return;
    };

    let cancellation_id = CancellationId::from(id);
    let key = cancellation_id.record_key();
    let source = Arc::new(
        inner
            .strategy
            .receiver
            .create_cancellation_token_source(&cancellation_id),
    );
    inner.inflight.insert(key.clone(), Arc::clone(&source));

    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        debug!(connection = %inner.name, id, method = %method, "Serving request");
        let result = handler.handle(params, source.token()).await;

        inner.inflight.remove(&key);
        source.dispose();

        if let Err(e) = &result {
            debug!(connection = %inner.name, id, method = %method, error = %e, "Request failed");
        }
        if let Err(e) = inner.post(WireMessage::Response {
            id,
            response: result.into(),
        }) {
            debug!(connection = %inner.name, id, error = %e, "Response not delivered");
        }
    });
}
