//! ExecutionContext - per-run KV store for step outputs
//!
//! The context is owned by the caller and handed to the executor by
//! mutable reference, so independent plan runs never share state.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// A value produced by a completed step
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Structured record with named fields; the only shape field
    /// references can resolve against
    Record(Map<String, Value>),
    /// Pre-formatted text block
    Text(String),
    /// Synthesis-readiness marker written by a synthesis step
    Ready,
}

impl ContextValue {
    /// Build a record value from field pairs
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

    /// Build a text value
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(fields) => {
                write!(f, "{}", Value::Object(fields.clone()))
            }
            Self::Text(text) => f.write_str(text),
            Self::Ready => f.write_str("Ready for synthesis."),
        }
    }
}

/// Mapping from output keys to produced values for a single plan run.
/// Grows monotonically while the executor walks the plan; never shrinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    entries: BTreeMap<String, ContextValue>,
}

impl ExecutionContext {
    /// Create an empty context for a fresh run
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under an output key (last-write-wins)
    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in deterministic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
