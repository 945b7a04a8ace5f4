//! # RPC Relay Dispatcher
//!
//! Serves calls that other contexts forward through the relay process.
//!
//! One dispatcher per context drains the context's inbox, demultiplexes on
//! the message variant and answers each forwarded call exactly once on its
//! reply channel.

use crate::connection::RequestHandler;
use shared_bus::{ContextMessage, Inbox};
use shared_types::{RpcError, RpcResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use xc_cancellation::CancellationToken;

/// Handler table for forwarded calls.
#[derive(Default)]
pub struct RelayDispatcher {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
}

impl RelayDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: impl Into<String>, handler: impl RequestHandler + 'static) {
        self.handlers.insert(method.into(), Arc::new(handler));
    }

    /// Run until the inbox closes or `shutdown` flips to true.
    ///
    /// Each call is served on its own task so a slow handler never holds up
    /// the next message.
    pub async fn run(self, inbox: Inbox, mut shutdown: watch::Receiver<bool>) {
        info!(methods = self.handlers.len(), "RPC relay dispatcher started");
        let mut messages = inbox.into_stream();
        loop {
            tokio::select! {
                message = messages.next() => match message {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        info!("RPC relay dispatcher stopped");
    }

    fn dispatch(&self, message: ContextMessage) {
        match message {
            ContextMessage::Rpc {
                request_id,
                request,
                reply,
            } => {
                let handler = self.handlers.get(&request.method).cloned();
                tokio::spawn(async move {
                    let response = match handler {
                        Some(handler) => {
                            debug!(request_id = %request_id, method = %request.method, "Serving forwarded call");
                            // Forwarded calls carry no cancellation
                            RpcResponse::from(handler.handle(request.params, CancellationToken::none()).await)
                        }
                        None => {
                            warn!(request_id = %request_id, method = %request.method, "Forwarded call to unknown method");
                            RpcResponse::error(RpcError::method_not_found(&request.method))
                        }
                    };
                    if !reply.reply(response) {
                        debug!(request_id = %request_id, "Forwarded call abandoned by the relay");
                    }
                });
            }
            ContextMessage::Log { message } => {
                info!(target: "relay", "{message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::handler_fn;
    use serde_json::{json, Value};
    use shared_bus::{mailbox, ReplyChannel};
    use shared_types::{codes, CorrelationId, RpcRequest};

    async fn call(
        mailbox: &shared_bus::Mailbox,
        method: &str,
        params: Value,
    ) -> RpcResponse {
        let (reply, rx) = ReplyChannel::new();
        mailbox
            .deliver(ContextMessage::Rpc {
                request_id: CorrelationId::new(),
                request: RpcRequest::new(method, params),
                reply,
            })
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_by_method() {
        let mut dispatcher = RelayDispatcher::new();
        dispatcher.register(
            "echo",
            handler_fn(|params, _token| async move { Ok::<_, RpcError>(params) }),
        );
        let (mailbox, inbox) = mailbox();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(dispatcher.run(inbox, shutdown_rx));

        mailbox
            .deliver(ContextMessage::Log {
                message: "fetch GET ./x".into(),
            })
            .unwrap();
        assert_eq!(
            call(&mailbox, "echo", json!([1, 2])).await,
            RpcResponse::result(json!([1, 2]))
        );

        let unknown = call(&mailbox, "missing", Value::Null).await;
        assert_eq!(
            unknown.into_result().unwrap_err().code,
            codes::METHOD_NOT_FOUND
        );

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_inbox_closes() {
        let (mailbox, inbox) = mailbox();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(RelayDispatcher::new().run(inbox, shutdown_rx));

        drop(mailbox);
        task.await.unwrap();
    }
}
