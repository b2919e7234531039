//! Method handler traits and the runtime method builder

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

use crate::context::RequestContext;
use crate::error::{HandlerError, RegistryError};
use crate::signature::{BoundArguments, Signature};

/// Trait for handling a single JSON-RPC method
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Invoke the method with arguments that already passed binding.
    ///
    /// `context` is only populated for methods registered with context
    /// injection.
    async fn call(
        &self,
        args: BoundArguments,
        context: Option<RequestContext>,
    ) -> Result<Value, HandlerError>;
}

/// A handler that also knows how it wants to be registered
///
/// Implemented by `#[rpc_method]` expansions and by [`DynamicMethod`].
pub trait RpcMethod: MethodHandler {
    fn name(&self) -> &str;

    fn signature(&self) -> Signature;

    fn takes_context(&self) -> bool {
        false
    }

    fn description(&self) -> Option<&str> {
        None
    }
}

/// Type alias for a boxed method body
pub type BoxedMethodFn = Box<
    dyn Fn(BoundArguments, Option<RequestContext>) -> BoxFuture<'static, Result<Value, HandlerError>>
        + Send
        + Sync,
>;

/// Closure-backed handler
pub struct FnHandler {
    handler_fn: BoxedMethodFn,
}

impl FnHandler {
    /// Wrap an async closure. The closure's output is serialized with serde;
    /// a serialization failure is reported as [`HandlerError::Serialization`].
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(BoundArguments, Option<RequestContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: Serialize,
    {
        Self {
            handler_fn: Box::new(move |args: BoundArguments, context: Option<RequestContext>| {
                let fut = f(args, context);
                async move {
                    let result = fut.await?;
                    serde_json::to_value(result).map_err(HandlerError::Serialization)
                }
                .boxed()
            }),
        }
    }

    /// Wrap a synchronous closure.
    pub fn blocking<F, R>(f: F) -> Self
    where
        F: Fn(BoundArguments, Option<RequestContext>) -> Result<R, HandlerError>
            + Send
            + Sync
            + 'static,
        R: Serialize + Send + 'static,
    {
        Self::new(move |args, context| futures::future::ready(f(args, context)))
    }
}

#[async_trait]
impl MethodHandler for FnHandler {
    async fn call(
        &self,
        args: BoundArguments,
        context: Option<RequestContext>,
    ) -> Result<Value, HandlerError> {
        (self.handler_fn)(args, context).await
    }
}

/// Builder for creating methods at runtime without the attribute macro
pub struct MethodBuilder {
    name: String,
    description: Option<String>,
    signature: Signature,
    takes_context: bool,
    handler: Option<FnHandler>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            signature: Signature::new(),
            takes_context: false,
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.signature = self.signature.param(name);
        self
    }

    /// Add a parameter with a default value
    pub fn optional(mut self, name: impl Into<String>, default: Value) -> Self {
        self.signature = self.signature.optional(name, default);
        self
    }

    /// Add a parameter that can only be passed by name
    pub fn named_only(mut self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.signature = self.signature.named_only(name, default);
        self
    }

    pub fn rest(mut self, name: impl Into<String>) -> Self {
        self.signature = self.signature.rest(name);
        self
    }

    pub fn extra(mut self, name: impl Into<String>) -> Self {
        self.signature = self.signature.extra(name);
        self
    }

    /// Replace the whole signature
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Inject the ambient request context as the implicit first argument
    pub fn takes_context(mut self) -> Self {
        self.takes_context = true;
        self
    }

    /// Set the async method body
    pub fn handler<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(BoundArguments, Option<RequestContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: Serialize,
    {
        self.handler = Some(FnHandler::new(f));
        self
    }

    /// Set a synchronous method body
    pub fn blocking_handler<F, R>(mut self, f: F) -> Self
    where
        F: Fn(BoundArguments, Option<RequestContext>) -> Result<R, HandlerError>
            + Send
            + Sync
            + 'static,
        R: Serialize + Send + 'static,
    {
        self.handler = Some(FnHandler::blocking(f));
        self
    }

    pub fn build(self) -> Result<DynamicMethod, RegistryError> {
        let handler = self
            .handler
            .ok_or_else(|| RegistryError::MissingHandler(self.name.clone()))?;
        self.signature
            .validate()
            .map_err(|reason| RegistryError::InvalidSignature {
                method: self.name.clone(),
                reason,
            })?;

        Ok(DynamicMethod {
            name: self.name,
            description: self.description,
            signature: self.signature,
            takes_context: self.takes_context,
            handler,
        })
    }
}

/// Method created by [`MethodBuilder`]
pub struct DynamicMethod {
    name: String,
    description: Option<String>,
    signature: Signature,
    takes_context: bool,
    handler: FnHandler,
}

#[async_trait]
impl MethodHandler for DynamicMethod {
    async fn call(
        &self,
        args: BoundArguments,
        context: Option<RequestContext>,
    ) -> Result<Value, HandlerError> {
        self.handler.call(args, context).await
    }
}

impl RpcMethod for DynamicMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn takes_context(&self) -> bool {
        self.takes_context
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
