//! Fetch-shaped requests the relay intercepts.
//!
//! Contexts talk to the relay's reserved addresses with a method, a path and
//! an optional JSON body, and get a status plus a JSON body back.

use crate::error::RelayError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use shared_types::{codes, RpcError, RpcResponse};
use std::fmt;

/// Record is canceled / mutation acknowledged / RPC answered.
pub const STATUS_OK: u16 = 200;
/// Record is absent (never set, deleted or purged).
pub const STATUS_NOT_CANCELED: u16 = 299;
/// Malformed address or body.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Path outside the reserved namespaces.
pub const STATUS_NOT_FOUND: u16 = 404;
/// No owning context, or it dropped the reply.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchMethod {
    Get,
    Post,
    Delete,
}

impl FetchMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub method: FetchMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: FetchMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: FetchMethod::Post,
            path: path.into(),
            body,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: FetchMethod::Delete,
            path: path.into(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl FetchResponse {
    /// Response with no body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::empty(STATUS_NOT_FOUND)
    }

    /// Response carrying a serialized [`RpcResponse`].
    #[must_use]
    pub fn rpc(status: u16, response: &RpcResponse) -> Self {
        let body = serde_json::to_value(response).unwrap_or_else(|e| {
            serde_json::json!({
                "error": { "code": codes::INTERNAL_ERROR, "message": e.to_string() }
            })
        });
        Self { status, body }
    }

    #[must_use]
    pub fn rpc_error(status: u16, error: RpcError) -> Self {
        Self::rpc(status, &RpcResponse::error(error))
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RelayError> {
        Ok(T::deserialize(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_wire_form() {
        assert_eq!(serde_json::to_value(FetchMethod::Delete).unwrap(), json!("DELETE"));
        assert_eq!(FetchMethod::Get.to_string(), "GET");
    }

    #[test]
    fn test_rpc_error_body_shape() {
        let response = FetchResponse::rpc_error(STATUS_INTERNAL_ERROR, RpcError::no_client("gone"));
        assert_eq!(response.body["error"]["code"], json!(codes::RESOURCE_UNAVAILABLE));

        let decoded: RpcResponse = response.json().unwrap();
        assert_eq!(
            decoded.into_result().unwrap_err().code,
            codes::RESOURCE_UNAVAILABLE
        );
    }
}
