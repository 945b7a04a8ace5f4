//! Messages exchanged over a [`super::MessageConnection`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{CancellationId, RpcResponse};

/// Notification asking the other side to cancel an in-flight request.
pub const CANCEL_REQUEST_METHOD: &str = "$/cancelRequest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireMessage {
    Request {
        id: i64,
        method: String,
        #[serde(default)]
        params: Value,
    },
    Response {
        id: i64,
        response: RpcResponse,
    },
    Notification {
        method: String,
        #[serde(default)]
        params: Value,
    },
}

impl WireMessage {
    #[must_use]
    pub fn cancel_request(id: &CancellationId) -> Self {
        Self::Notification {
            method: CANCEL_REQUEST_METHOD.to_string(),
            params: json!({ "id": id }),
        }
    }

    /// The id a `$/cancelRequest` notification targets.
    #[must_use]
    pub fn as_cancel_request(&self) -> Option<CancellationId> {
        match self {
            Self::Notification { method, params } if method == CANCEL_REQUEST_METHOD => {
                CancellationId::deserialize(params.get("id")?).ok()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_request_wire_form() {
        let message = WireMessage::cancel_request(&CancellationId::from(3));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"kind": "notification", "method": "$/cancelRequest", "params": {"id": 3}})
        );
        assert_eq!(message.as_cancel_request(), Some(CancellationId::from(3)));
    }

    #[test]
    fn test_other_notifications_are_not_cancel_requests() {
        let message = WireMessage::Notification {
            method: "$/progress".to_string(),
            params: json!({"id": 1}),
        };
        assert_eq!(message.as_cancel_request(), None);
    }
}
