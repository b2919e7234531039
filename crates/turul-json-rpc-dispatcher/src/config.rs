use serde::Deserialize;

/// Configuration for [`JsonRpcDispatcher`](crate::JsonRpcDispatcher)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Check params against the method signature before invoking it
    pub validate_params: bool,
    /// Attach the failure text as `data` on internal errors
    pub expose_internal_errors: bool,
    /// Log raw request and response bodies at debug level
    pub log_payloads: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            validate_params: true,
            expose_internal_errors: false,
            log_payloads: true,
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the dry-run binding check
    pub fn validate_params(mut self, enable: bool) -> Self {
        self.validate_params = enable;
        self
    }

    /// Enable or disable internal error detail on the wire (debugging only)
    pub fn expose_internal_errors(mut self, enable: bool) -> Self {
        self.expose_internal_errors = enable;
        self
    }

    pub fn log_payloads(mut self, enable: bool) -> Self {
        self.log_payloads = enable;
        self
    }
}
