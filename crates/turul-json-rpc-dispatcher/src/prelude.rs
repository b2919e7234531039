//! # JSON-RPC Dispatcher Prelude
//!
//! Convenient re-exports of the types most embedding applications need.
//!
//! ```rust
//! use turul_json_rpc_dispatcher::prelude::*;
//! ```

pub use crate::config::DispatcherConfig;
pub use crate::context::RequestContext;
pub use crate::dispatcher::JsonRpcDispatcher;
pub use crate::error::{ApplicationError, HandlerError, RegistryError};
pub use crate::handler::{MethodBuilder, MethodHandler, RpcMethod};
pub use crate::registry::MethodRegistry;
pub use crate::response::JsonRpcMessage;
pub use crate::signature::{BoundArguments, Signature};
pub use crate::transport::{RawRequest, TransportRequest};
pub use crate::types::RequestId;

#[cfg(feature = "derive")]
pub use crate::rpc_method;

// Standard error codes
pub use crate::error_codes::*;
