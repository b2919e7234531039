//! Boundary with transport adapters
//!
//! An adapter (HTTP handler, socket loop, queue consumer) hands the dispatcher
//! something that exposes the raw body and, optionally, a context to inject.
//! It writes back whatever string comes out, or nothing when it is empty.

use crate::context::RequestContext;

/// Request-like value supplied by a transport adapter
pub trait TransportRequest {
    /// Raw request body
    fn body(&self) -> &str;

    /// Ambient context for methods registered with context injection
    fn context(&self) -> Option<RequestContext> {
        None
    }
}

impl TransportRequest for str {
    fn body(&self) -> &str {
        self
    }
}

impl TransportRequest for String {
    fn body(&self) -> &str {
        self
    }
}

/// Owned body plus optional context, for adapters without a request type of their own
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    body: String,
    context: Option<RequestContext>,
}

impl RawRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl TransportRequest for RawRequest {
    fn body(&self) -> &str {
        &self.body
    }

    fn context(&self) -> Option<RequestContext> {
        self.context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_request() {
        let request = RawRequest::new("{}")
            .with_context(RequestContext::new().with_metadata("peer", json!("127.0.0.1")));
        assert_eq!(request.body(), "{}");
        assert_eq!(
            request.context().and_then(|c| c.get("peer").cloned()),
            Some(json!("127.0.0.1"))
        );
        assert!("{}".context().is_none());
    }
}
