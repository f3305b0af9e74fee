//! Tool abstraction module
//!
//! This module defines the Tool trait and related types:
//! - Tool: an adapter exposing a closed set of named operations
//! - ToolArgs: fully resolved, null-free named arguments
//! - ToolOutput: a structured record or a formatted text block
//! - ToolRegistry: namespace -> adapter lookup plus the planner catalog

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::ContextValue;
use crate::types::ToolRef;

/// Tool invocation errors. Adapters map transport and decoding failures
/// into these; the executor treats every variant as a per-step failure.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown operation '{operation}' on tool '{namespace}'")]
    UnknownOperation { namespace: String, operation: String },

    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("response error: {0}")]
    Response(String),
}

impl ToolError {
    pub fn unknown_operation(namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            namespace: namespace.into(),
            operation: operation.into(),
        }
    }

    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Named arguments for one invocation. Built by the executor after
/// placeholder resolution; never contains nulls.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Optional string argument
    pub fn str_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_str())
    }

    /// Required string argument
    pub fn str_required(&self, name: &str) -> Result<&str, ToolError> {
        self.str_opt(name)
            .ok_or_else(|| ToolError::MissingArgument(name.to_string()))
    }

    /// Required numeric argument. Numeric strings are accepted because
    /// planner-emitted literals are not reliably typed.
    pub fn f64_required(&self, name: &str) -> Result<f64, ToolError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ToolError::MissingArgument(name.to_string()))?;
        match value {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| ToolError::invalid_argument(name, "not representable as f64")),
            Value::String(text) => text
                .parse::<f64>()
                .map_err(|_| ToolError::invalid_argument(name, format!("'{}' is not a number", text))),
            other => Err(ToolError::invalid_argument(
                name,
                format!("expected a number, got {}", other),
            )),
        }
    }
}

impl FromIterator<(String, Value)> for ToolArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of a tool operation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Structured record with named fields
    Record(Map<String, Value>),
    /// Pre-formatted text block
    Text(String),
}

impl ToolOutput {
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl From<ToolOutput> for ContextValue {
    fn from(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Record(fields) => ContextValue::Record(fields),
            ToolOutput::Text(text) => ContextValue::Text(text),
        }
    }
}

/// Operation metadata for the planner catalog
#[derive(Debug, Clone)]
pub struct OperationMeta {
    /// Operation name within its namespace
    pub name: String,
    /// Description shown to the planner
    pub description: String,
    /// JSON-schema-shaped hint for the operation's arguments
    pub args_schema: Value,
}

impl OperationMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args_schema: Value::Null,
        }
    }

    /// Set the argument schema hint
    pub fn with_args_schema(mut self, schema: Value) -> Self {
        self.args_schema = schema;
        self
    }
}

/// Tool metadata: a namespace and its operations
#[derive(Debug, Clone)]
pub struct ToolMeta {
    pub namespace: String,
    pub description: String,
    pub operations: Vec<OperationMeta>,
}

/// Tool trait - an adapter around one external service
///
/// Adapters are black boxes to the executor. Each exposes a closed set of
/// named operations taking keyword-style primitive arguments and returning
/// a record or a text block; any failure must surface as a ToolError.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Namespace the adapter is addressed by (left half of a qualified name)
    fn namespace(&self) -> &str;

    /// Description shown to the planner
    fn description(&self) -> &str;

    /// The operations this adapter exposes
    fn operations(&self) -> Vec<OperationMeta>;

    /// Invoke a named operation
    async fn invoke(&self, operation: &str, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}

/// Registry mapping namespaces to tool adapters.
///
/// The (namespace, operation) catalog is closed once registration is done:
/// plan validation checks references against it up front, and the executor
/// consults it again at dispatch time for best-effort degradation.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its namespace
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.namespace().to_string(), tool);
    }

    /// Get an adapter by namespace
    pub fn get(&self, namespace: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(namespace).cloned()
    }

    /// Whether the adapter exists and exposes the operation
    pub fn contains(&self, tool_ref: &ToolRef) -> bool {
        self.tools
            .get(&tool_ref.namespace)
            .map(|tool| {
                tool.operations()
                    .iter()
                    .any(|op| op.name == tool_ref.operation)
            })
            .unwrap_or(false)
    }

    /// All registered namespaces
    pub fn namespaces(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Full catalog for plan validation and the planner prompt,
    /// sorted by namespace for deterministic prompts
    pub fn catalog(&self) -> Vec<ToolMeta> {
        let mut catalog: Vec<ToolMeta> = self
            .tools
            .values()
            .map(|tool| ToolMeta {
                namespace: tool.namespace().to_string(),
                description: tool.description().to_string(),
                operations: tool.operations(),
            })
            .collect();
        catalog.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ProbeTool;

    #[async_trait]
    impl Tool for ProbeTool {
        fn namespace(&self) -> &str {
            "probe"
        }

        fn description(&self) -> &str {
            "test probe"
        }

        fn operations(&self) -> Vec<OperationMeta> {
            vec![OperationMeta::new("ping", "responds with pong")]
        }

        async fn invoke(&self, operation: &str, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            match operation {
                "ping" => Ok(ToolOutput::text("pong")),
                other => Err(ToolError::unknown_operation("probe", other)),
            }
        }
    }

    #[test]
    fn test_registry_lookup_and_catalog() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ProbeTool));

        assert!(registry.get("probe").is_some());
        assert!(registry.get("missing").is_none());
        assert!(registry.contains(&ToolRef::new("probe", "ping")));
        assert!(!registry.contains(&ToolRef::new("probe", "teleport")));
        assert!(!registry.contains(&ToolRef::new("missing", "ping")));

        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].operations[0].name, "ping");
    }

    #[test]
    fn test_tool_args_typed_getters() {
        let args: ToolArgs = [
            ("city".to_string(), json!("Dhaka")),
            ("latitude".to_string(), json!(23.8103)),
            ("longitude".to_string(), json!("90.4125")),
        ]
        .into_iter()
        .collect();

        assert_eq!(args.str_required("city").unwrap(), "Dhaka");
        assert_eq!(args.f64_required("latitude").unwrap(), 23.8103);
        assert_eq!(args.f64_required("longitude").unwrap(), 90.4125);
        assert!(matches!(
            args.f64_required("altitude"),
            Err(ToolError::MissingArgument(_))
        ));
        assert!(matches!(
            args.f64_required("city"),
            Err(ToolError::InvalidArgument { .. })
        ));
    }
}
