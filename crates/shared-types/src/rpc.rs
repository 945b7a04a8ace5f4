//! # RPC Bodies
//!
//! Request and response bodies of calls forwarded through the relay, plus the
//! structured error shared by every context. Error codes follow JSON-RPC 2.0;
//! `-32800` is the LSP "request cancelled" convention.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON-RPC error codes used across contexts.
pub mod codes {
    // JSON-RPC 2.0 standard errors (-32700 to -32600)
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server errors (-32000 to -32099)
    pub const RESOURCE_UNAVAILABLE: i32 = -32002;

    /// A handler observed cancellation mid-execution.
    pub const REQUEST_CANCELLED: i32 = -32800;
}

/// A method call: name plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Structured error carried in an error response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The reserved response of a handler that found its token cancelled.
    #[must_use]
    pub fn request_cancelled() -> Self {
        Self::new(codes::REQUEST_CANCELLED, "request cancelled")
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            format!("Invalid params: {}", details.into()),
        )
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_REQUEST,
            format!("Invalid request: {}", details.into()),
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            codes::INTERNAL_ERROR,
            format!("Internal error: {}", details.into()),
        )
    }

    /// No context owns the forwarded call.
    pub fn no_client(details: impl Into<String>) -> Self {
        Self::new(
            codes::RESOURCE_UNAVAILABLE,
            format!("no client: {}", details.into()),
        )
    }

    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.code == codes::REQUEST_CANCELLED
    }
}

/// Either `{"result": …}` or `{"error": {"code": …, "message": …}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Error { error: RpcError },
    Result { result: serde_json::Value },
}

impl RpcResponse {
    pub fn result(value: serde_json::Value) -> Self {
        Self::Result { result: value }
    }

    pub fn error(error: RpcError) -> Self {
        Self::Error { error }
    }

    /// Convert into a `Result` for handler-style code.
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        match self {
            Self::Result { result } => Ok(result),
            Self::Error { error } => Err(error),
        }
    }
}

impl From<Result<serde_json::Value, RpcError>> for RpcResponse {
    fn from(result: Result<serde_json::Value, RpcError>) -> Self {
        match result {
            Ok(value) => Self::result(value),
            Err(error) => Self::error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_body_shape() {
        let body = serde_json::to_value(RpcResponse::result(json!("hi"))).unwrap();
        assert_eq!(body, json!({ "result": "hi" }));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(RpcResponse::error(RpcError::request_cancelled())).unwrap();
        assert_eq!(
            body,
            json!({ "error": { "code": -32800, "message": "request cancelled" } })
        );
    }

    #[test]
    fn test_error_body_is_not_mistaken_for_null_result() {
        let parsed: RpcResponse =
            serde_json::from_value(json!({ "error": { "code": -32601, "message": "nope" } }))
                .unwrap();
        assert!(matches!(parsed, RpcResponse::Error { .. }));

        let parsed: RpcResponse = serde_json::from_value(json!({ "result": null })).unwrap();
        assert_eq!(parsed, RpcResponse::result(serde_json::Value::Null));
    }

    #[test]
    fn test_request_params_default_to_null() {
        let parsed: RpcRequest = serde_json::from_value(json!({ "method": "ping" })).unwrap();
        assert_eq!(parsed.params, serde_json::Value::Null);
    }

    #[test]
    fn test_is_cancellation() {
        assert!(RpcError::request_cancelled().is_cancellation());
        assert!(!RpcError::method_not_found("x").is_cancellation());
    }
}
