//! Step type definitions
//!
//! Step is the atomic unit of a route plan: either a tool call addressed
//! by a qualified `namespace.operation` name, or a synthesis marker that
//! collects earlier outputs for the final report.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Typed reference to a tool operation, parsed from the wire form
/// `"<namespace>.<operation>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolRef {
    pub namespace: String,
    pub operation: String,
}

/// Qualified tool name parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolRefError {
    #[error("tool name '{0}' is not of the form 'namespace.operation'")]
    Malformed(String),
}

impl ToolRef {
    /// Create a tool reference from already-split parts
    pub fn new(namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            operation: operation.into(),
        }
    }

    /// Parse a qualified name. Exactly one separator is accepted; both
    /// segments must be non-empty.
    pub fn parse(qualified: &str) -> Result<Self, ToolRefError> {
        let mut parts = qualified.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(operation), None)
                if !namespace.is_empty() && !operation.is_empty() =>
            {
                Ok(Self::new(namespace, operation))
            }
            _ => Err(ToolRefError::Malformed(qualified.to_string())),
        }
    }

    /// Render back to the wire form
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.namespace, self.operation)
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.operation)
    }
}

/// Reference to a field of an earlier step's output, parsed from the
/// placeholder form `{<context_key>.<attribute>}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Output key of the producing step
    pub key: String,
    /// Field to extract from the produced record
    pub field: String,
}

impl FieldRef {
    pub fn new(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
        }
    }

    /// Parse a placeholder. The accepted shape is a single brace pair
    /// wrapping exactly two non-empty dot-separated segments; anything
    /// else is not a placeholder and stays a literal.
    pub fn parse(raw: &str) -> Option<Self> {
        let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
        if inner.contains('{') || inner.contains('}') {
            return None;
        }
        let mut parts = inner.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(field), None) if !key.is_empty() && !field.is_empty() => {
                Some(Self::new(key, field))
            }
            _ => None,
        }
    }

    /// Render back to the placeholder wire form
    pub fn placeholder(&self) -> String {
        format!("{{{}.{}}}", self.key, self.field)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}.{}}}", self.key, self.field)
    }
}

/// A step argument: either a literal JSON value passed through unchanged,
/// or a typed reference into the execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Literal(Value),
    Ref(FieldRef),
}

impl ArgValue {
    /// Classify a wire value. Only strings of the exact placeholder shape
    /// become references; every other value (including almost-placeholders
    /// like `{a.b.c}` or `{x}`) is a literal.
    pub fn from_wire(value: Value) -> Self {
        if let Value::String(raw) = &value {
            if let Some(field_ref) = FieldRef::parse(raw) {
                return ArgValue::Ref(field_ref);
            }
        }
        ArgValue::Literal(value)
    }

    /// Convenience: build a literal argument
    pub fn literal(value: impl Into<Value>) -> Self {
        ArgValue::Literal(value.into())
    }

    /// Convenience: build a reference argument
    pub fn reference(key: impl Into<String>, field: impl Into<String>) -> Self {
        ArgValue::Ref(FieldRef::new(key, field))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, ArgValue::Ref(_))
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgValue::Literal(value) => value.serialize(serializer),
            ArgValue::Ref(field_ref) => serializer.serialize_str(&field_ref.placeholder()),
        }
    }
}

impl<'de> Deserialize<'de> for ArgValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(ArgValue::from_wire(value))
    }
}

/// A single step in a route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique integer identifier assigned by the planner
    #[serde(default)]
    pub step_id: u32,
    /// Human-readable objective for this step
    #[serde(default)]
    pub goal: String,
    /// Qualified `namespace.operation` name; `null` marks a synthesis step
    #[serde(default)]
    pub tool: Option<String>,
    /// Named arguments; strings in placeholder form become references
    #[serde(default)]
    pub args: Option<BTreeMap<String, ArgValue>>,
    /// Context key the result is stored under
    #[serde(default)]
    pub output_key: Option<String>,
    /// Keys a synthesis step wants collected; only meaningful when tool is absent
    #[serde(default)]
    pub input_keys: Option<Vec<String>>,
}

impl Step {
    /// Create a tool-call step
    pub fn tool_call(step_id: u32, goal: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            step_id,
            goal: goal.into(),
            tool: Some(tool.into()),
            args: None,
            output_key: None,
            input_keys: None,
        }
    }

    /// Create a synthesis step
    pub fn synthesis(step_id: u32, goal: impl Into<String>, input_keys: Vec<String>) -> Self {
        Self {
            step_id,
            goal: goal.into(),
            tool: None,
            args: None,
            output_key: None,
            input_keys: Some(input_keys),
        }
    }

    /// Attach arguments
    pub fn with_args(mut self, args: BTreeMap<String, ArgValue>) -> Self {
        self.args = Some(args);
        self
    }

    /// Attach a single argument
    pub fn with_arg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.args
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }

    /// Set the context key the result is stored under
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    /// A step without a tool is a synthesis marker
    pub fn is_synthesis(&self) -> bool {
        self.tool.is_none()
    }

    /// Parse the qualified tool name, if any
    pub fn tool_ref(&self) -> Option<Result<ToolRef, ToolRefError>> {
        self.tool.as_deref().map(ToolRef::parse)
    }
}
