//! The dispatch pipeline
//!
//! raw body -> parse -> validate -> lookup -> bind -> invoke -> serialize.
//! Every failure before invocation short-circuits into an error response (or
//! into silence for notifications); nothing escapes to the transport.

use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::DispatcherConfig;
use crate::context::RequestContext;
use crate::error::{HandlerError, JsonRpcError, JsonRpcErrorObject, ToJsonRpcError};
use crate::handler::MethodHandler;
use crate::registry::{MethodRegistry, MethodTarget};
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcMessage;
use crate::serializer::ResponseSerializer;
use crate::signature::BoundArguments;
use crate::transport::TransportRequest;
use crate::validator::{Rejection, validate_request};

/// Stateless JSON-RPC dispatcher over an immutable method registry
///
/// Cheap to clone and safe to share between tasks; every call keeps its
/// request data local.
#[derive(Debug, Clone)]
pub struct JsonRpcDispatcher {
    registry: Arc<MethodRegistry>,
    config: DispatcherConfig,
    serializer: ResponseSerializer,
}

impl JsonRpcDispatcher {
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_config(registry, DispatcherConfig::default())
    }

    pub fn with_config(registry: MethodRegistry, config: DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            serializer: ResponseSerializer::new(config.log_payloads),
            config,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch a raw request body and render the reply.
    ///
    /// Returns an empty string when no reply is owed (notifications).
    pub async fn dispatch(&self, body: &str, context: Option<RequestContext>) -> String {
        let message = self.handle_body(body, context).await;
        self.serializer.serialize(message.as_ref())
    }

    /// Like [`dispatch`](Self::dispatch) for bodies that have not been
    /// decoded as UTF-8 yet. Invalid UTF-8 is a parse error.
    pub async fn dispatch_bytes(&self, body: &[u8], context: Option<RequestContext>) -> String {
        let message = match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.dispatch_value(value, context).await,
            Err(err) => Some(Self::parse_failure(&err)),
        };
        self.serializer.serialize(message.as_ref())
    }

    /// Drive [`dispatch`](Self::dispatch) to completion on the current thread
    pub fn dispatch_blocking(&self, body: &str, context: Option<RequestContext>) -> String {
        futures::executor::block_on(self.dispatch(body, context))
    }

    /// Transport adapter entry point
    pub async fn handle_request<R>(&self, request: &R) -> String
    where
        R: TransportRequest + ?Sized,
    {
        self.dispatch(request.body(), request.context()).await
    }

    /// Transport adapter entry point returning the structured reply
    pub async fn handle_request_structured<R>(&self, request: &R) -> Option<JsonRpcMessage>
    where
        R: TransportRequest + ?Sized,
    {
        self.handle_body(request.body(), request.context()).await
    }

    /// Parse and dispatch a raw body, returning the reply unrendered
    pub async fn handle_body(
        &self,
        body: &str,
        context: Option<RequestContext>,
    ) -> Option<JsonRpcMessage> {
        if self.config.log_payloads {
            debug!("Got request raw body: {}", body);
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.dispatch_value(value, context).await,
            Err(err) => Some(Self::parse_failure(&err)),
        }
    }

    /// Dispatch an already-parsed request value
    pub async fn dispatch_value(
        &self,
        value: Value,
        context: Option<RequestContext>,
    ) -> Option<JsonRpcMessage> {
        match validate_request(value) {
            Ok(request) => self.dispatch_request(request, context).await,
            Err(rejection) => rejection.into_message(),
        }
    }

    /// Dispatch a validated request
    pub async fn dispatch_request(
        &self,
        request: JsonRpcRequest,
        context: Option<RequestContext>,
    ) -> Option<JsonRpcMessage> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let Some(descriptor) = self.registry.lookup(&method) else {
            debug!("Method not found: `{}`", method);
            return Rejection::new(id, JsonRpcErrorObject::method_not_found(&method)).into_message();
        };

        let args = if self.config.validate_params {
            match descriptor.signature().bind(&params) {
                Ok(args) => args,
                Err(err) => {
                    debug!("Invalid method parameters for `{}`: {}", method, err);
                    return Rejection::new(
                        id,
                        JsonRpcErrorObject::invalid_params(None, Some(Value::String(err.to_string()))),
                    )
                    .into_message();
                }
            }
        } else {
            descriptor.signature().bind_lenient(&params)
        };

        debug!("Calling method `{}` with {} params", method, params.shape());
        let context = if descriptor.takes_context() {
            context
        } else {
            None
        };
        let outcome = match descriptor.target() {
            MethodTarget::Introspection(which) => Ok(self.registry.introspect(*which)),
            MethodTarget::Handler(handler) => {
                self.invoke(&method, handler.as_ref(), args, context).await
            }
        };

        let Some(id) = id else {
            debug!("Notification `{}` handled, no response sent", method);
            return None;
        };
        Some(match outcome {
            Ok(result) => JsonRpcMessage::success(id, result),
            Err(error) => JsonRpcMessage::error(Some(id), error),
        })
    }

    async fn invoke(
        &self,
        method: &str,
        handler: &dyn MethodHandler,
        args: BoundArguments,
        context: Option<RequestContext>,
    ) -> Result<Value, JsonRpcErrorObject> {
        let outcome = AssertUnwindSafe(handler.call(args, context))
            .catch_unwind()
            .await;

        let err = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(method, panic = %detail, "Method handler panicked");
                return Err(self.internal_error(detail));
            }
        };

        if err.is_declared() {
            debug!("Method `{}` returned declared error: {}", method, err);
            return Err(err.to_error_object());
        }
        if let HandlerError::Serialization(_) = err {
            warn!("Result of `{}` could not be serialized: {}", method, err);
            return Err(err.to_error_object());
        }
        let detail = format!("{:#}", err);
        error!(method, error = %detail, "Method handler failed");
        Err(self.internal_error(detail))
    }

    fn internal_error(&self, detail: String) -> JsonRpcErrorObject {
        let data = self
            .config
            .expose_internal_errors
            .then_some(Value::String(detail));
        JsonRpcErrorObject::internal_error(None, data)
    }

    fn parse_failure(err: &serde_json::Error) -> JsonRpcMessage {
        debug!("Parse error: {}", err);
        JsonRpcMessage::Error(JsonRpcError::parse_error(&err.to_string()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
