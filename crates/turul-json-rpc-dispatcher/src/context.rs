use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Ambient per-call value handed to methods registered with context injection
///
/// Transport adapters fill this with whatever request metadata they want
/// handlers to see (headers, peer address, auth claims). The core never looks
/// inside it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Free-form request metadata
    pub metadata: HashMap<String, Value>,
    /// Optional transport-specific payload (e.g. the original HTTP request)
    pub extension: Option<Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_extension<T: Any + Send + Sync>(mut self, extension: T) -> Self {
        self.extension = Some(Arc::new(extension));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Typed access to the transport payload
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extension.as_deref()?.downcast_ref::<T>()
    }
}
