//! Addition, fast and slow.

use crate::connection::RequestHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::RpcError;
use std::time::Duration;
use tracing::debug;
use xc_cancellation::CancellationToken;

/// Two addends, either positional `[a, b]` or named `{"a": .., "b": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Operands {
    Positional(f64, f64),
    Named { a: f64, b: f64 },
}

impl Operands {
    pub fn parse(params: Value) -> Result<Self, RpcError> {
        serde_json::from_value(params)
            .map_err(|_| RpcError::invalid_params("expected [a, b] or {\"a\": a, \"b\": b}"))
    }

    #[must_use]
    pub fn sum(self) -> f64 {
        match self {
            Self::Positional(a, b) | Self::Named { a, b } => a + b,
        }
    }
}

/// Integral sums stay integers on the wire. JSON has no encoding for an
/// overflowed sum, so it is rejected.
fn number(value: f64) -> Result<Value, RpcError> {
    if !value.is_finite() {
        return Err(RpcError::invalid_params("sum is not a finite number"));
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(json!(value as i64))
    } else {
        Ok(json!(value))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AddNumbers;

#[async_trait]
impl RequestHandler for AddNumbers {
    async fn handle(&self, params: Value, _token: CancellationToken) -> Result<Value, RpcError> {
        number(Operands::parse(params)?.sum())
    }
}

/// Sleeps `iterations` times `interval`, checking its token after every
/// step, then answers the sum.
#[derive(Debug, Clone, Copy)]
pub struct AddNumbersSlow {
    iterations: u32,
    interval: Duration,
}

impl AddNumbersSlow {
    #[must_use]
    pub fn new(iterations: u32, interval: Duration) -> Self {
        Self {
            iterations,
            interval,
        }
    }
}

impl Default for AddNumbersSlow {
    fn default() -> Self {
        Self::new(20, Duration::from_millis(100))
    }
}

#[async_trait]
impl RequestHandler for AddNumbersSlow {
    async fn handle(&self, params: Value, token: CancellationToken) -> Result<Value, RpcError> {
        let operands = Operands::parse(params)?;
        for step in 0..self.iterations {
            tokio::time::sleep(self.interval).await;
            if token.is_cancellation_requested() {
                debug!(step, "addNumbersSlow cancelled");
                return Err(RpcError::request_cancelled());
            }
        }
        number(operands.sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::codes;
    use xc_cancellation::CancellationTokenSource;

    #[test]
    fn test_operand_forms() {
        assert_eq!(Operands::parse(json!([1, 2])).unwrap().sum(), 3.0);
        assert_eq!(Operands::parse(json!({"a": 1.5, "b": 2})).unwrap().sum(), 3.5);
        assert_eq!(
            Operands::parse(json!("one")).unwrap_err().code,
            codes::INVALID_PARAMS
        );
    }

    #[tokio::test]
    async fn test_add_numbers() {
        let result = AddNumbers
            .handle(json!([1, 2]), CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(result, json!(3));

        let result = AddNumbers
            .handle(json!([0.5, 0.25]), CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(result, json!(0.75));
    }

    #[tokio::test]
    async fn test_overflowing_sum_is_invalid_params() {
        let error = AddNumbers
            .handle(json!([f64::MAX, f64::MAX]), CancellationToken::none())
            .await
            .unwrap_err();
        assert_eq!(error.code, codes::INVALID_PARAMS);

        let error = AddNumbersSlow::new(1, Duration::from_millis(1))
            .handle(json!({"a": f64::MAX, "b": f64::MAX}), CancellationToken::none())
            .await
            .unwrap_err();
        assert_eq!(error.code, codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_slow_add_completes() {
        let handler = AddNumbersSlow::new(3, Duration::from_millis(1));
        let result = handler
            .handle(json!([1, 2]), CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(result, json!(3));
    }

    #[tokio::test]
    async fn test_slow_add_observes_cancellation() {
        let handler = AddNumbersSlow::new(1_000, Duration::from_millis(5));
        let source = CancellationTokenSource::new();
        let token = source.token();

        let call = tokio::spawn(async move { handler.handle(json!([1, 2]), token).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.cancel();

        let error = call.await.unwrap().unwrap_err();
        assert_eq!(error.code, codes::REQUEST_CANCELLED);
        assert_eq!(error.message, "request cancelled");
    }
}
