//! Method signatures and dry-run parameter binding
//!
//! Handlers declare the shape of their arguments up front. Binding checks a
//! request's params against that shape without running the handler, which is
//! how an arity mismatch is told apart from a failure inside the handler.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::error::HandlerError;
use crate::request::RequestParams;

/// How a parameter may be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrNamed,
    NamedOnly,
}

impl ParameterKind {
    pub fn accepts_positional(&self) -> bool {
        !matches!(self, ParameterKind::NamedOnly)
    }

    pub fn accepts_named(&self) -> bool {
        !matches!(self, ParameterKind::PositionalOnly)
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Value used when the caller omits the parameter. `None` means required.
    pub default: Option<Value>,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::PositionalOrNamed,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::PositionalOrNamed,
            default: Some(default),
        }
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Why a request's params do not fit a signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("too many positional arguments (expected at most {expected}, got {given})")]
    TooManyPositional { expected: usize, given: usize },

    #[error("missing a required argument: '{0}'")]
    MissingArgument(String),

    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedNamed(String),

    #[error("'{0}' parameter is positional only, but was passed as a keyword")]
    PositionalOnlyByName(String),
}

/// Declared parameter shape of a method
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
    rest: Option<String>,
    extra: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a list of required positional-or-named parameters
    pub fn positional<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::new(), |signature, name| signature.param(name))
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn param(self, name: impl Into<String>) -> Self {
        self.with_parameter(Parameter::required(name))
    }

    pub fn optional(self, name: impl Into<String>, default: Value) -> Self {
        self.with_parameter(Parameter::optional(name, default))
    }

    pub fn named_only(self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.with_parameter(Parameter {
            name: name.into(),
            kind: ParameterKind::NamedOnly,
            default,
        })
    }

    pub fn positional_only(self, name: impl Into<String>) -> Self {
        self.with_parameter(Parameter::required(name).with_kind(ParameterKind::PositionalOnly))
    }

    /// Collect surplus positional values under `name`
    pub fn rest(mut self, name: impl Into<String>) -> Self {
        self.rest = Some(name.into());
        self
    }

    /// Collect surplus named values under `name`
    pub fn extra(mut self, name: impl Into<String>) -> Self {
        self.extra = Some(name.into());
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn rest_name(&self) -> Option<&str> {
        self.rest.as_deref()
    }

    pub fn extra_name(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Declared argument names in order, excluding `rest`/`extra`
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Reject signatures that could never bind sensibly.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let all_names = self
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.rest.as_deref())
            .chain(self.extra.as_deref());
        for name in all_names {
            if name.is_empty() {
                return Err("parameter names must not be empty".to_string());
            }
            if !seen.insert(name) {
                return Err(format!("duplicate parameter name '{}'", name));
            }
        }

        let mut saw_default = false;
        let mut saw_named_only = false;
        for parameter in &self.parameters {
            if parameter.kind == ParameterKind::NamedOnly {
                saw_named_only = true;
                continue;
            }
            if saw_named_only {
                return Err(format!(
                    "positional parameter '{}' follows a named-only parameter",
                    parameter.name
                ));
            }
            if parameter.default.is_some() {
                saw_default = true;
            } else if saw_default {
                return Err(format!(
                    "required parameter '{}' follows a parameter with a default",
                    parameter.name
                ));
            }
        }
        Ok(())
    }

    /// Check `params` against this signature without invoking anything.
    pub fn bind(&self, params: &RequestParams) -> Result<BoundArguments, BindError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.parameters.len()];
        let mut rest = Vec::new();
        let mut extra = Map::new();

        match params {
            RequestParams::Empty => {}
            RequestParams::Positional(values) => {
                let capacity = self
                    .parameters
                    .iter()
                    .take_while(|p| p.kind.accepts_positional())
                    .count();
                if values.len() > capacity && self.rest.is_none() {
                    return Err(BindError::TooManyPositional {
                        expected: capacity,
                        given: values.len(),
                    });
                }
                for (index, value) in values.iter().enumerate() {
                    if index < capacity {
                        slots[index] = Some(value.clone());
                    } else {
                        rest.push(value.clone());
                    }
                }
            }
            RequestParams::Named(map) => {
                for (name, value) in map {
                    match self.parameters.iter().position(|p| &p.name == name) {
                        Some(index) if !self.parameters[index].kind.accepts_named() => {
                            if self.extra.is_none() {
                                return Err(BindError::PositionalOnlyByName(name.clone()));
                            }
                            extra.insert(name.clone(), value.clone());
                        }
                        Some(index) => slots[index] = Some(value.clone()),
                        None if self.extra.is_some() => {
                            extra.insert(name.clone(), value.clone());
                        }
                        None => return Err(BindError::UnexpectedNamed(name.clone())),
                    }
                }
            }
        }

        let mut values = Vec::with_capacity(self.parameters.len());
        for (parameter, slot) in self.parameters.iter().zip(slots) {
            let value = match (slot, &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => return Err(BindError::MissingArgument(parameter.name.clone())),
            };
            values.push((parameter.name.clone(), value));
        }

        Ok(BoundArguments {
            values,
            rest,
            extra,
        })
    }

    /// Bind without any arity checks: whatever lines up is passed through,
    /// surplus values land in `rest`/`extra` and missing ones stay absent.
    pub fn bind_lenient(&self, params: &RequestParams) -> BoundArguments {
        let mut values = Vec::new();
        let mut rest = Vec::new();
        let mut extra = Map::new();

        match params {
            RequestParams::Empty => {}
            RequestParams::Positional(items) => {
                let mut names = self
                    .parameters
                    .iter()
                    .filter(|p| p.kind.accepts_positional());
                for item in items {
                    match names.next() {
                        Some(parameter) => values.push((parameter.name.clone(), item.clone())),
                        None => rest.push(item.clone()),
                    }
                }
            }
            RequestParams::Named(map) => {
                for (name, value) in map {
                    if self.parameters.iter().any(|p| &p.name == name) {
                        values.push((name.clone(), value.clone()));
                    } else {
                        extra.insert(name.clone(), value.clone());
                    }
                }
            }
        }

        for parameter in &self.parameters {
            if let Some(default) = &parameter.default
                && !values.iter().any(|(name, _)| name == &parameter.name)
            {
                values.push((parameter.name.clone(), default.clone()));
            }
        }

        BoundArguments {
            values,
            rest,
            extra,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut marked_named_only = false;
        let mut positional_only = false;
        for parameter in &self.parameters {
            if parameter.kind == ParameterKind::PositionalOnly {
                positional_only = true;
            } else if positional_only {
                parts.push("/".to_string());
                positional_only = false;
            }
            if parameter.kind == ParameterKind::NamedOnly && !marked_named_only {
                marked_named_only = true;
                match &self.rest {
                    Some(rest) => parts.push(format!("*{}", rest)),
                    None => parts.push("*".to_string()),
                }
            }
            match &parameter.default {
                Some(default) => parts.push(format!("{}={}", parameter.name, default)),
                None => parts.push(parameter.name.clone()),
            }
        }
        if positional_only {
            parts.push("/".to_string());
        }
        if !marked_named_only && let Some(rest) = &self.rest {
            parts.push(format!("*{}", rest));
        }
        if let Some(extra) = &self.extra {
            parts.push(format!("**{}", extra));
        }
        write!(f, "({})", parts.join(", "))
    }
}

/// Arguments that passed binding, ready to hand to a handler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
    rest: Vec<Value>,
    extra: Map<String, Value>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    /// Deserialize a bound argument. A missing or ill-typed value is reported
    /// to the caller as invalid params.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, HandlerError> {
        let value = self
            .get(name)
            .ok_or_else(|| HandlerError::invalid_params(format!("missing argument '{}'", name)))?;
        serde_json::from_value(value.clone()).map_err(|err| HandlerError::InvalidParams {
            message: format!("invalid value for argument '{}'", name),
            data: Some(Value::String(err.to_string())),
        })
    }

    /// Like [`get_as`](Self::get_as) but absent and `null` both yield `None`.
    pub fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, HandlerError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_as(name).map(Some),
        }
    }

    /// Surplus positional values
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    /// Surplus named values
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Deserialize the surplus positional values as a whole, e.g. into `Vec<T>`
    pub fn rest_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Array(self.rest.clone())).map_err(|err| {
            HandlerError::InvalidParams {
                message: "invalid surplus positional arguments".to_string(),
                data: Some(Value::String(err.to_string())),
            }
        })
    }

    /// Deserialize the surplus named values as a whole, e.g. into a map or struct
    pub fn extra_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Object(self.extra.clone())).map_err(|err| {
            HandlerError::InvalidParams {
                message: "invalid surplus named arguments".to_string(),
                data: Some(Value::String(err.to_string())),
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.rest.is_empty() && self.extra.is_empty()
    }
}
