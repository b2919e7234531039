//! # JSON-RPC Service Introspection
//!
//! Builds a serializable description of the public methods in a
//! [`MethodRegistry`]: names, descriptions, argument names and a rendered
//! invocation string. Useful for documentation endpoints and client
//! generators.
//!
//! ```rust
//! use turul_json_rpc_dispatcher::{MethodBuilder, MethodRegistry};
//! use turul_json_rpc_introspection::Introspector;
//!
//! let registry = MethodRegistry::new()
//!     .with(
//!         MethodBuilder::new("echo")
//!             .description("Echo the message back")
//!             .param("message")
//!             .blocking_handler(|args, _| args.get_as::<String>("message"))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let description = Introspector::new("EchoService")
//!     .url("http://localhost:8080/rpc")
//!     .describe(&registry);
//! assert_eq!(description.methods[0].invocation, "echo(message)");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use turul_json_rpc_dispatcher::{MethodDescriptor, MethodRegistry};

/// Service name used when none is given
pub const DEFAULT_SERVICE_NAME: &str = "Service";

/// Description of a whole service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub methods: Vec<MethodDescription>,
}

impl ServiceDescription {
    pub fn method(&self, name: &str) -> Option<&MethodDescription> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// Description of a single public method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescription {
    pub name: String,
    pub description: String,
    /// Names of the arguments that can be passed by position
    pub args: Vec<String>,
    /// Method name followed by its rendered signature, e.g. `add(a, b=1)`
    pub invocation: String,
}

impl MethodDescription {
    pub fn from_descriptor(descriptor: &MethodDescriptor) -> Self {
        let signature = descriptor.signature();
        Self {
            name: descriptor.name().to_string(),
            description: trim_description(descriptor.description()),
            args: signature
                .parameters()
                .iter()
                .filter(|parameter| parameter.kind.accepts_positional())
                .map(|parameter| parameter.name.clone())
                .collect(),
            invocation: format!("{}{}", descriptor.name(), signature),
        }
    }
}

/// Builder for [`ServiceDescription`]s
#[derive(Debug, Clone)]
pub struct Introspector {
    name: String,
    description: Option<String>,
    url: Option<String>,
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl Introspector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Where the service can be reached
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Describe every public method of `registry`, sorted by name
    pub fn describe(&self, registry: &MethodRegistry) -> ServiceDescription {
        let methods: Vec<MethodDescription> = registry
            .public_methods()
            .into_values()
            .map(MethodDescription::from_descriptor)
            .collect();
        debug!(
            "Describing service `{}` with {} public methods",
            self.name,
            methods.len()
        );

        ServiceDescription {
            name: self.name.clone(),
            description: trim_description(self.description.as_deref()),
            url: self.url.clone(),
            methods,
        }
    }
}

/// Remove the indentation shared by every non-blank line, plus surrounding
/// blank lines. Whitespace-only lines become empty. `None` yields `""`.
pub fn trim_description(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let mut margin: Option<&str> = None;
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    let dedented: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line).trim_end()
            }
        })
        .collect();

    dedented.join("\n").trim_matches('\n').to_string()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((index, x), _)| index + x.len_utf8())
        .unwrap_or(0);
    &a[..len]
}
