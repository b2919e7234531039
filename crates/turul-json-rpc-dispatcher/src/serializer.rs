//! Response rendering with a guaranteed-parseable fallback

use tracing::{debug, warn};

use crate::error::JsonRpcError;
use crate::response::JsonRpcMessage;

/// Rendered when even the fallback error cannot be serialized
const LAST_RESORT: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal Error"}}"#;

/// Renders dispatch outcomes to the wire format
#[derive(Debug, Clone, Default)]
pub struct ResponseSerializer {
    log_payloads: bool,
}

impl ResponseSerializer {
    pub fn new(log_payloads: bool) -> Self {
        Self { log_payloads }
    }

    /// `None` renders as the empty string, meaning "no body".
    pub fn serialize(&self, message: Option<&JsonRpcMessage>) -> String {
        let Some(message) = message else {
            return String::new();
        };

        match serde_json::to_string(message) {
            Ok(body) => {
                if self.log_payloads {
                    debug!("Sending raw response: {}", body);
                }
                body
            }
            Err(err) => {
                warn!("Failed to serialize response: {}", err);
                let fallback =
                    JsonRpcError::internal_error(message.id().cloned(), Some(err.to_string()));
                serde_json::to_string(&fallback).unwrap_or_else(|_| LAST_RESORT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::{Value, json};

    #[test]
    fn test_none_is_empty() {
        assert_eq!(ResponseSerializer::default().serialize(None), "");
    }

    #[test]
    fn test_success_round_trip() {
        let result = json!({"items": [1, 2, 3], "total": 3, "nested": {"ok": true}});
        let message = JsonRpcMessage::success(RequestId::from("req-1"), result.clone());
        let body = ResponseSerializer::default().serialize(Some(&message));

        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["jsonrpc"], "2.0");
        assert_eq!(parsed["id"], "req-1");
        assert_eq!(parsed["result"], result);
    }

    #[test]
    fn test_last_resort_is_valid() {
        let parsed: Value = serde_json::from_str(LAST_RESORT).unwrap();
        assert_eq!(parsed["error"]["code"], -32603);
        assert_eq!(parsed["id"], Value::Null);
    }
}
