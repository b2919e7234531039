use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request, normalized once during validation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestParams {
    /// Positional parameters as an array
    Positional(Vec<Value>),
    /// Named parameters as an object
    Named(Map<String, Value>),
    /// `params` absent, `null`, `[]` or `{}`
    #[default]
    Empty,
}

impl RequestParams {
    /// Normalize the raw `params` member. Returns `None` for shapes JSON-RPC
    /// does not allow (bare scalars).
    pub fn from_member(value: Option<Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => Some(RequestParams::Empty),
            Some(Value::Array(items)) if items.is_empty() => Some(RequestParams::Empty),
            Some(Value::Array(items)) => Some(RequestParams::Positional(items)),
            Some(Value::Object(map)) if map.is_empty() => Some(RequestParams::Empty),
            Some(Value::Object(map)) => Some(RequestParams::Named(map)),
            Some(_) => None,
        }
    }

    /// Get a parameter by name (named params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Named(map) => map.get(key),
            _ => None,
        }
    }

    /// Get a parameter by index (positional params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Positional(vec) => vec.get(index),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Positional(vec) => vec.len(),
            RequestParams::Named(map) => map.len(),
            RequestParams::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short label used in log lines
    pub fn shape(&self) -> &'static str {
        match self {
            RequestParams::Positional(_) => "positional",
            RequestParams::Named(_) => "named",
            RequestParams::Empty => "empty",
        }
    }

    pub fn to_value(&self) -> Option<Value> {
        match self {
            RequestParams::Positional(vec) => Some(Value::Array(vec.clone())),
            RequestParams::Named(map) => Some(Value::Object(map.clone())),
            RequestParams::Empty => None,
        }
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        if vec.is_empty() {
            RequestParams::Empty
        } else {
            RequestParams::Positional(vec)
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        if map.is_empty() {
            RequestParams::Empty
        } else {
            RequestParams::Named(map)
        }
    }
}

/// A validated JSON-RPC request
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub version: JsonRpcVersion,
    /// `None` marks a notification
    pub id: Option<RequestId>,
    pub method: String,
    pub params: RequestParams,
}

impl JsonRpcRequest {
    pub fn new(id: Option<RequestId>, method: impl Into<String>, params: RequestParams) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        }
    }

    /// A notification never receives a response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_normalization() {
        assert_eq!(RequestParams::from_member(None), Some(RequestParams::Empty));
        assert_eq!(
            RequestParams::from_member(Some(json!(null))),
            Some(RequestParams::Empty)
        );
        assert_eq!(
            RequestParams::from_member(Some(json!([]))),
            Some(RequestParams::Empty)
        );
        assert_eq!(
            RequestParams::from_member(Some(json!({}))),
            Some(RequestParams::Empty)
        );
        assert_eq!(
            RequestParams::from_member(Some(json!([1, 2]))),
            Some(RequestParams::Positional(vec![json!(1), json!(2)]))
        );
        assert!(matches!(
            RequestParams::from_member(Some(json!({"a": 1}))),
            Some(RequestParams::Named(_))
        ));
        assert_eq!(RequestParams::from_member(Some(json!(5))), None);
        assert_eq!(RequestParams::from_member(Some(json!("x"))), None);
        assert_eq!(RequestParams::from_member(Some(json!(true))), None);
    }

    #[test]
    fn test_params_accessors() {
        let positional = RequestParams::from(vec![json!("test"), json!(42)]);
        assert_eq!(positional.get_index(1), Some(&json!(42)));
        assert_eq!(positional.get("test"), None);
        assert_eq!(positional.len(), 2);

        let named = RequestParams::from_member(Some(json!({"name": "x"}))).unwrap();
        assert_eq!(named.get("name"), Some(&json!("x")));
        assert_eq!(named.get_index(0), None);
        assert_eq!(named.to_value(), Some(json!({"name": "x"})));

        assert!(RequestParams::Empty.is_empty());
        assert_eq!(RequestParams::Empty.to_value(), None);
    }

    #[test]
    fn test_notification_flag() {
        let call = JsonRpcRequest::new(Some(RequestId::from(1)), "ping", RequestParams::Empty);
        let notification = JsonRpcRequest::new(None, "ping", RequestParams::Empty);
        assert!(!call.is_notification());
        assert!(notification.is_notification());
    }
}
