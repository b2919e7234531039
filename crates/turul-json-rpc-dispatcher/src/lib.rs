//! # JSON-RPC 2.0 Dispatcher
//!
//! A transport-agnostic JSON-RPC 2.0 request dispatcher. Given a raw request
//! body it validates the protocol envelope, resolves the named method, checks
//! the supplied params against the method's declared signature, invokes it and
//! renders a success or error response. It has no knowledge of HTTP, sockets
//! or queues; adapters call [`JsonRpcDispatcher::dispatch`] and write back the
//! returned string.
//!
//! ## Features
//! - Strict notification semantics: no `id`, no response, even on error
//! - Dry-run parameter binding against an explicit [`Signature`]
//! - Handler-declared application errors with reserved-code checks
//! - Undeclared failures and panics mapped to `-32603` without leaking detail
//! - `#[rpc_method]` attribute macro (feature `derive`)
//!
//! ## Example
//!
//! ```rust
//! use turul_json_rpc_dispatcher::{JsonRpcDispatcher, MethodBuilder, MethodRegistry};
//!
//! let mut registry = MethodRegistry::new();
//! registry
//!     .add(
//!         MethodBuilder::new("add")
//!             .param("a")
//!             .param("b")
//!             .blocking_handler(|args, _| Ok(args.get_as::<i64>("a")? + args.get_as::<i64>("b")?))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let dispatcher = JsonRpcDispatcher::new(registry);
//! let body = dispatcher.dispatch_blocking(
//!     r#"{"jsonrpc":"2.0","method":"add","params":[1,2],"id":1}"#,
//!     None,
//! );
//! assert_eq!(body, r#"{"jsonrpc":"2.0","id":1,"result":3}"#);
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod serializer;
pub mod signature;
pub mod transport;
pub mod types;
pub mod validator;

// Re-export main types
pub use config::DispatcherConfig;
pub use context::RequestContext;
pub use dispatcher::JsonRpcDispatcher;
pub use error::{
    ApplicationError, HandlerError, JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject,
    RegistryError, ReservedCodeError, ToJsonRpcError,
};
pub use handler::{DynamicMethod, FnHandler, MethodBuilder, MethodHandler, RpcMethod};
pub use registry::{IntrospectionMethod, MethodDescriptor, MethodRegistry, MethodTarget};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use serializer::ResponseSerializer;
pub use signature::{BindError, BoundArguments, Parameter, ParameterKind, Signature};
pub use transport::{RawRequest, TransportRequest};
pub use types::{JsonRpcVersion, RequestId};

#[cfg(feature = "derive")]
pub use turul_json_rpc_derive::rpc_method;

// Used by `#[rpc_method]` expansions
#[doc(hidden)]
pub use async_trait::async_trait;
#[doc(hidden)]
pub use serde_json;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Whole band reserved for protocol use
    pub const RESERVED_START: i64 = -32768;
    pub const RESERVED_END: i64 = -32000;
}
