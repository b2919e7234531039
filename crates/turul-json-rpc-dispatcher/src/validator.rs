//! Request validation
//!
//! Turns an already-parsed JSON value into a [`JsonRpcRequest`], checking the
//! protocol fields in a fixed order and normalizing `params` exactly once.

use serde_json::Value;
use tracing::debug;

use crate::error::JsonRpcErrorObject;
use crate::request::{JsonRpcRequest, RequestParams};
use crate::response::JsonRpcMessage;
use crate::types::RequestId;

/// A request that failed somewhere in the pipeline before its handler ran.
///
/// Carries enough to decide whether a reply is owed: notifications are
/// silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub id: Option<RequestId>,
    pub notification: bool,
    pub error: JsonRpcErrorObject,
}

impl Rejection {
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            notification: id.is_none(),
            id,
            error,
        }
    }

    /// Rejection that always gets a reply with a null id, used when the id
    /// cannot be trusted.
    pub fn anonymous(error: JsonRpcErrorObject) -> Self {
        Self {
            id: None,
            notification: false,
            error,
        }
    }

    pub fn into_message(self) -> Option<JsonRpcMessage> {
        if self.notification {
            None
        } else {
            Some(JsonRpcMessage::error(self.id, self.error))
        }
    }
}

/// Validate a parsed request body.
///
/// Checks run in order: top-level shape, `id` type, `jsonrpc == "2.0"`,
/// `method` present and a string, `params` an array or an object.
pub fn validate_request(value: Value) -> Result<JsonRpcRequest, Rejection> {
    let Value::Object(mut object) = value else {
        debug!("Request payload is not a JSON object");
        return Err(Rejection::anonymous(JsonRpcErrorObject::invalid_request(
            "Request must be a JSON object",
        )));
    };

    let id = match RequestId::from_member(object.get("id")) {
        Ok(id) => id,
        Err(message) => {
            debug!("Rejecting request with unsupported `id` type");
            return Err(Rejection::anonymous(JsonRpcErrorObject::invalid_request(
                message,
            )));
        }
    };

    debug!("Dispatching request ID: {:?}", id);

    match object.get("jsonrpc") {
        None => {
            debug!("Missing `jsonrpc` key in request payload");
            return Err(Rejection::new(
                id,
                JsonRpcErrorObject::invalid_request("Missing `jsonrpc` key in request object"),
            ));
        }
        Some(Value::String(version)) if version == crate::JSONRPC_VERSION => {}
        Some(version) => {
            debug!("Requested unsupported JSON-RPC version: {}", version);
            return Err(Rejection::new(
                id,
                JsonRpcErrorObject::invalid_request(
                    "Server supports only version 2.0 of the JSON-RPC protocol",
                ),
            ));
        }
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => {
            debug!("Non-string `method` in request payload");
            return Err(Rejection::new(
                id,
                JsonRpcErrorObject::invalid_request("`method` must be a string"),
            ));
        }
        None => {
            debug!("Missing `method` key in request payload");
            return Err(Rejection::new(
                id,
                JsonRpcErrorObject::invalid_request("Missing `method` key in request object"),
            ));
        }
    };

    let Some(params) = RequestParams::from_member(object.remove("params")) else {
        debug!("Unsupported `params` shape for method `{}`", method);
        return Err(Rejection::new(
            id,
            JsonRpcErrorObject::invalid_request("`params` must be an array or an object"),
        ));
    };

    Ok(JsonRpcRequest::new(id, method, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(value: Value) -> Rejection {
        validate_request(value).unwrap_err()
    }

    #[test]
    fn test_valid_request() {
        let request =
            validate_request(json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 1}))
                .unwrap();
        assert_eq!(request.id, Some(RequestId::from(1)));
        assert_eq!(request.method, "add");
        assert_eq!(request.params, RequestParams::from(vec![json!(1), json!(2)]));
    }

    #[test]
    fn test_valid_notification() {
        let request = validate_request(json!({"jsonrpc": "2.0", "method": "ping"})).unwrap();
        assert!(request.is_notification());

        let request =
            validate_request(json!({"jsonrpc": "2.0", "method": "ping", "id": null})).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn test_missing_version() {
        let rejection = rejected(json!({"method": "ping", "id": 3}));
        assert_eq!(rejection.error.code, -32600);
        assert_eq!(rejection.id, Some(RequestId::from(3)));
        assert!(!rejection.notification);
        assert!(rejection.error.message.contains("jsonrpc"));
    }

    #[test]
    fn test_wrong_version() {
        for version in [json!("1.0"), json!(2.0), json!(null)] {
            let rejection = rejected(json!({"jsonrpc": version, "method": "ping", "id": 3}));
            assert_eq!(rejection.error.code, -32600);
            assert!(rejection.error.message.contains("version 2.0"));
        }
    }

    #[test]
    fn test_method_checks() {
        let rejection = rejected(json!({"jsonrpc": "2.0", "id": 1}));
        assert_eq!(rejection.error.message, "Missing `method` key in request object");

        let rejection = rejected(json!({"jsonrpc": "2.0", "method": 7, "id": 1}));
        assert_eq!(rejection.error.code, -32600);
    }

    #[test]
    fn test_version_checked_before_method() {
        let rejection = rejected(json!({"jsonrpc": "1.0", "id": 1}));
        assert!(rejection.error.message.contains("version 2.0"));
    }

    #[test]
    fn test_scalar_params_rejected() {
        let rejection = rejected(json!({"jsonrpc": "2.0", "method": "add", "params": 5, "id": 1}));
        assert_eq!(rejection.error.code, -32600);
        assert_eq!(rejection.id, Some(RequestId::from(1)));
    }

    #[test]
    fn test_notification_failures_are_silent() {
        let rejection = rejected(json!({"method": "ping"}));
        assert!(rejection.notification);
        assert!(rejection.into_message().is_none());
    }

    #[test]
    fn test_non_object_and_bad_id_always_reply() {
        for value in [json!([]), json!([{"jsonrpc": "2.0"}]), json!(5), json!("text")] {
            let message = rejected(value).into_message().unwrap();
            assert_eq!(message.error_code(), Some(-32600));
            assert_eq!(message.id(), None);
        }

        let message = rejected(json!({"jsonrpc": "2.0", "method": "ping", "id": [1]}))
            .into_message()
            .unwrap();
        assert_eq!(message.error_code(), Some(-32600));
        assert_eq!(message.id(), None);
    }
}
