//! Method registry
//!
//! Built once at startup and read-only afterwards. The dispatcher takes
//! ownership of it, so no registration can race with request processing.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::RegistryError;
use crate::handler::{MethodHandler, RpcMethod};
use crate::signature::Signature;

/// Methods the registry installs on its own for client-side discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrospectionMethod {
    /// `trait_names`: public method names
    TraitNames,
    /// `_getAttributeNames`: always empty
    AttributeNames,
}

impl IntrospectionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            IntrospectionMethod::TraitNames => "trait_names",
            IntrospectionMethod::AttributeNames => "_getAttributeNames",
        }
    }
}

/// What a descriptor invokes
#[derive(Clone)]
pub enum MethodTarget {
    Handler(Arc<dyn MethodHandler>),
    Introspection(IntrospectionMethod),
}

/// A registered method. Immutable once stored.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    target: MethodTarget,
    takes_context: bool,
    signature: Signature,
    description: Option<String>,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &MethodTarget {
        &self.target
    }

    pub fn takes_context(&self) -> bool {
        self.takes_context
    }

    /// Signature cached at registration time
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_introspection(&self) -> bool {
        matches!(self.target, MethodTarget::Introspection(_))
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("takes_context", &self.takes_context)
            .field("signature", &self.signature.to_string())
            .field("introspection", &self.is_introspection())
            .finish()
    }
}

/// Append-only mapping from method name to descriptor
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodDescriptor>,
    private_prefix: String,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    /// Create a registry with the introspection methods pre-registered
    pub fn new() -> Self {
        let mut registry = Self::without_introspection();
        for method in [
            IntrospectionMethod::TraitNames,
            IntrospectionMethod::AttributeNames,
        ] {
            registry.methods.insert(
                method.name().to_string(),
                MethodDescriptor {
                    name: method.name().to_string(),
                    target: MethodTarget::Introspection(method),
                    takes_context: false,
                    signature: Signature::new(),
                    description: None,
                },
            );
        }
        registry
    }

    /// Create an empty registry
    pub fn without_introspection() -> Self {
        Self {
            methods: HashMap::new(),
            private_prefix: "_".to_string(),
        }
    }

    /// Names starting with this prefix are hidden from [`public_methods`](Self::public_methods)
    pub fn private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    /// Register a handler under `name`
    pub fn register<H>(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: MethodHandler + 'static,
    {
        self.insert(name.into(), signature, Arc::new(handler), false, None)
    }

    /// Register a handler that receives the ambient request context
    pub fn register_with_context<H>(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: MethodHandler + 'static,
    {
        self.insert(name.into(), signature, Arc::new(handler), true, None)
    }

    /// Register a self-describing method (`#[rpc_method]` or [`MethodBuilder`](crate::MethodBuilder))
    pub fn add<M>(&mut self, method: M) -> Result<(), RegistryError>
    where
        M: RpcMethod + 'static,
    {
        let name = method.name().to_string();
        let signature = method.signature();
        let takes_context = method.takes_context();
        let description = method.description().map(str::to_string);
        self.insert(name, signature, Arc::new(method), takes_context, description)
    }

    /// Builder-style [`add`](Self::add)
    pub fn with<M>(mut self, method: M) -> Result<Self, RegistryError>
    where
        M: RpcMethod + 'static,
    {
        self.add(method)?;
        Ok(self)
    }

    fn insert(
        &mut self,
        name: String,
        signature: Signature,
        handler: Arc<dyn MethodHandler>,
        takes_context: bool,
        description: Option<String>,
    ) -> Result<(), RegistryError> {
        if self.methods.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        signature
            .validate()
            .map_err(|reason| RegistryError::InvalidSignature {
                method: name.clone(),
                reason,
            })?;

        debug!("Registering method `{}` {}", name, signature);
        self.methods.insert(
            name.clone(),
            MethodDescriptor {
                name,
                target: MethodTarget::Handler(handler),
                takes_context,
                signature,
                description,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered methods that clients are meant to discover, sorted by name
    pub fn public_methods(&self) -> BTreeMap<&str, &MethodDescriptor> {
        self.methods
            .iter()
            .filter(|(name, descriptor)| {
                !descriptor.is_introspection()
                    && (self.private_prefix.is_empty() || !name.starts_with(&self.private_prefix))
            })
            .map(|(name, descriptor)| (name.as_str(), descriptor))
            .collect()
    }

    /// Public method names, sorted
    pub fn trait_names(&self) -> Vec<String> {
        self.public_methods().into_keys().map(str::to_string).collect()
    }

    pub(crate) fn introspect(&self, method: IntrospectionMethod) -> Value {
        match method {
            IntrospectionMethod::TraitNames => Value::from(self.trait_names()),
            IntrospectionMethod::AttributeNames => Value::Array(Vec::new()),
        }
    }
}
