//! The `hello` pair: the worker forwards to the main context, which answers.

use crate::connection::RequestHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{RpcError, RpcRequest};
use tracing::{debug, warn};
use xc_cancellation::CancellationToken;
use xc_relay::RelayClient;

#[derive(Deserialize)]
#[serde(untagged)]
enum Greetee {
    Name(String),
    Positional((String,)),
}

fn greetee(params: Value) -> Result<String, RpcError> {
    match serde_json::from_value(params) {
        Ok(Greetee::Name(name)) | Ok(Greetee::Positional((name,))) => Ok(name),
        Err(_) => Err(RpcError::invalid_params("expected a name")),
    }
}

/// Main-context side of `hello`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageHello;

#[async_trait]
impl RequestHandler for PageHello {
    async fn handle(&self, params: Value, _token: CancellationToken) -> Result<Value, RpcError> {
        let name = greetee(params)?;
        Ok(json!(format!("Hello from the page, {name}!")))
    }
}

/// Worker-context side of `hello`: a synchronous round trip through the
/// relay to whichever context owns this worker.
///
/// Blocks the serving thread until the owner answers, so it must not run
/// on the thread that drives the owner's dispatcher.
#[derive(Clone)]
pub struct WorkerHello {
    client: RelayClient,
}

impl WorkerHello {
    pub fn new(client: RelayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RequestHandler for WorkerHello {
    async fn handle(&self, params: Value, _token: CancellationToken) -> Result<Value, RpcError> {
        debug!(client = %self.client.id(), "Forwarding hello to the owner");
        let request = RpcRequest::new(super::methods::HELLO, params);
        match self.client.forward_rpc_blocking(request) {
            Ok(response) => response.into_result(),
            Err(e) => {
                warn!(error = %e, "hello not forwarded");
                Err(RpcError::internal(e.to_string()))
            }
        }
    }
}
