use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::error_codes::{RESERVED_END, RESERVED_START};
use crate::types::{JsonRpcVersion, RequestId};

/// Codes reserved for protocol-level errors. Application errors must live
/// outside this band.
pub const RESERVED_CODES: RangeInclusive<i64> = RESERVED_START..=RESERVED_END;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// Handler-declared code outside [`RESERVED_CODES`]
    Application(i64),
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::Application(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid parameters number or format",
            JsonRpcErrorCode::InternalError => "Internal Error",
            JsonRpcErrorCode::Application(_) => "Application error",
        }
    }

    pub fn is_reserved(code: i64) -> bool {
        RESERVED_CODES.contains(&code)
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    /// The parser's own message is repeated as `data` so clients can show it
    /// without parsing the human readable message.
    pub fn parse_error(detail: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::ParseError,
            Some(format!("Server received invalid JSON: {}", detail)),
            Some(Value::String(detail.to_string())),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, Some(message.into()), None)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            Some(format!("Method not found `{}`", method)),
            None,
        )
    }

    pub fn invalid_params(message: Option<String>, data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidParams, message, data)
    }

    pub fn internal_error(message: Option<String>, data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, data)
    }

    pub fn is_reserved(&self) -> bool {
        JsonRpcErrorCode::is_reserved(self.code)
    }
}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: Option<RequestId>,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            error,
        }
    }

    pub fn parse_error(detail: &str) -> Self {
        Self::new(None, JsonRpcErrorObject::parse_error(detail))
    }

    pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request(message))
    }

    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::new(id, JsonRpcErrorObject::method_not_found(method))
    }

    pub fn internal_error(id: Option<RequestId>, message: Option<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::internal_error(message, None))
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Raised when an application error is constructed with a reserved code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Codes between -32768 and -32000 are reserved for internal use only (got {0})")]
pub struct ReservedCodeError(pub i64);

/// Error declared by handler code with a caller-chosen code.
///
/// The code is checked when the value is built, so a handler can never put a
/// protocol-reserved code on the wire.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code {code})")]
pub struct ApplicationError {
    code: i64,
    message: String,
    data: Option<Value>,
}

impl ApplicationError {
    pub fn new(code: i64, message: impl Into<String>) -> Result<Self, ReservedCodeError> {
        if JsonRpcErrorCode::is_reserved(code) {
            return Err(ReservedCodeError(code));
        }
        Ok(Self {
            code,
            message: message.into(),
            data: None,
        })
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

/// Failure reported by a method handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Declared application error, sent to the caller as-is
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Handler-side parameter validation failure (-32602)
    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        data: Option<Value>,
    },

    /// The handler's return value could not be rendered as JSON
    #[error("Failed to serialize result: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Anything else. Only a generic message reaches the caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        HandlerError::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    pub fn internal(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        HandlerError::Internal(anyhow::Error::msg(message))
    }

    /// Whether the error carries information meant for the caller.
    pub fn is_declared(&self) -> bool {
        matches!(
            self,
            HandlerError::Application(_) | HandlerError::InvalidParams { .. }
        )
    }
}

/// Trait for errors that can be converted to JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

impl ToJsonRpcError for ApplicationError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject {
            code: self.code,
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }
}

impl ToJsonRpcError for HandlerError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            HandlerError::Application(err) => err.to_error_object(),
            HandlerError::InvalidParams { message, data } => {
                JsonRpcErrorObject::invalid_params(Some(message.clone()), data.clone())
            }
            HandlerError::Serialization(err) => {
                JsonRpcErrorObject::internal_error(Some(err.to_string()), None)
            }
            HandlerError::Internal(_) => JsonRpcErrorObject::internal_error(None, None),
        }
    }
}

/// Errors raised while building the method registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Method `{0}` already registered.")]
    AlreadyRegistered(String),

    #[error("Invalid signature for method `{method}`: {reason}")]
    InvalidSignature { method: String, reason: String },

    #[error("Method `{0}` has no handler")]
    MissingHandler(String),
}
