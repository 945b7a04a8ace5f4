//! Request handlers shared by the message connection and the relay
//! dispatcher.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::future::Future;
use xc_cancellation::CancellationToken;

/// Serves one method.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// `token` reports cancellation of this call; check it at safe points.
    async fn handle(&self, params: Value, token: CancellationToken) -> Result<Value, RpcError>;
}

/// Closure-backed handler, see [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`RequestHandler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for HandlerFn<F>
where
    F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    async fn handle(&self, params: Value, token: CancellationToken) -> Result<Value, RpcError> {
        (self.f)(params, token).await
    }
}
