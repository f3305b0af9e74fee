//! Plan executor module
//!
//! The executor walks a plan strictly in order, resolves argument
//! references against the growing execution context, dispatches tool
//! operations through the registry, and records a per-step outcome.
//!
//! Ordering is a correctness requirement, not a convenience: later steps
//! consume earlier outputs through field references, so no step may start
//! before the previous one reaches a terminal state.
//!
//! Failure policy is best-effort throughout. A malformed tool name, an
//! unknown namespace or operation, an unresolvable reference, or an
//! adapter error all degrade the affected step and nothing else; only a
//! plan with zero steps produces nothing at all.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::context::{ContextValue, ExecutionContext};
use crate::tool::{ToolArgs, ToolRegistry};
use crate::types::{ArgValue, Plan, Step, ToolRef};

/// Terminal outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Operation invoked and returned a value
    Succeeded { output_key: Option<String> },
    /// Operation invoked and the adapter reported an error
    Failed { error: String },
    /// Qualified name was not `namespace.operation`
    SkippedMalformedTool { tool: String },
    /// No adapter registered under the namespace
    SkippedUnknownTool { namespace: String },
    /// Adapter exists but does not expose the operation
    SkippedUnknownOperation {
        namespace: String,
        operation: String,
    },
    /// Synthesis marker; `ready` is true when a readiness sentinel was written
    Synthesis { ready: bool },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::SkippedMalformedTool { .. }
                | Self::SkippedUnknownTool { .. }
                | Self::SkippedUnknownOperation { .. }
        )
    }
}

/// Per-step record in the execution trace
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step_id: u32,
    pub goal: String,
    pub tool: Option<String>,
    /// Non-fatal diagnostics, currently reference-resolution warnings
    pub warnings: Vec<String>,
    pub outcome: StepOutcome,
}

/// Ordered record of one plan run
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    /// Distinguishes runs in logs
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<StepRecord>,
}

impl ExecutionTrace {
    pub fn record_for(&self, step_id: u32) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.step_id == step_id)
    }

    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_skip()).count()
    }
}

/// Arguments after reference resolution, before null filtering
#[derive(Debug, Clone, Default)]
pub struct ResolvedArgs {
    /// Resolved values; unresolvable references are explicit nulls
    pub values: BTreeMap<String, Value>,
    /// One message per reference that resolved to null
    pub warnings: Vec<String>,
}

impl ResolvedArgs {
    /// Drop every null before invocation; tools only ever receive
    /// fully present arguments.
    pub fn into_tool_args(self) -> ToolArgs {
        self.values
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()
    }
}

/// Resolve one step's arguments against the context.
///
/// Literals pass through unchanged. A reference resolves to the named
/// field iff the context holds a structured record under its key; a
/// missing field yields an explicit null, and a missing key or
/// non-record value yields null plus a warning. Never fails.
pub fn resolve_args(args: &BTreeMap<String, ArgValue>, context: &ExecutionContext) -> ResolvedArgs {
    let mut resolved = ResolvedArgs::default();
    for (name, value) in args {
        match value {
            ArgValue::Literal(literal) => {
                resolved.values.insert(name.clone(), literal.clone());
            }
            ArgValue::Ref(field_ref) => {
                match context.get(&field_ref.key).and_then(ContextValue::as_record) {
                    Some(record) => {
                        let field = record.get(&field_ref.field).cloned().unwrap_or(Value::Null);
                        resolved.values.insert(name.clone(), field);
                    }
                    None => {
                        resolved
                            .warnings
                            .push(format!("could not resolve placeholder '{}'", field_ref));
                        resolved.values.insert(name.clone(), Value::Null);
                    }
                }
            }
        }
    }
    resolved
}

/// The plan executor
pub struct PlanExecutor {
    registry: Arc<ToolRegistry>,
}

impl PlanExecutor {
    /// Create an executor owning its registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    /// Create an executor over a shared registry
    pub fn with_registry(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute every step in order, populating the caller's context.
    /// Returns the per-step trace; failed and skipped steps contribute
    /// nothing to the context.
    pub async fn execute(&self, plan: &Plan, context: &mut ExecutionContext) -> ExecutionTrace {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut records = Vec::with_capacity(plan.len());

        for (index, step) in plan.steps.iter().enumerate() {
            tracing::info!(
                run_id = %run_id,
                step_id = step.step_id,
                position = index + 1,
                total = plan.len(),
                goal = %step.goal,
                "step started"
            );
            let mut warnings = Vec::new();
            let outcome = self.execute_step(step, context, &mut warnings).await;
            for warning in &warnings {
                tracing::warn!(run_id = %run_id, step_id = step.step_id, "{}", warning);
            }
            match &outcome {
                StepOutcome::Succeeded { output_key } => tracing::info!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    output_key = output_key.as_deref().unwrap_or(""),
                    "step completed"
                ),
                StepOutcome::Failed { error } => tracing::warn!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    error = %error,
                    "step failed"
                ),
                StepOutcome::SkippedMalformedTool { tool } => tracing::warn!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    tool = %tool,
                    "step skipped: malformed tool name"
                ),
                StepOutcome::SkippedUnknownTool { namespace } => tracing::warn!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    namespace = %namespace,
                    "step skipped: unknown tool namespace"
                ),
                StepOutcome::SkippedUnknownOperation {
                    namespace,
                    operation,
                } => tracing::warn!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    namespace = %namespace,
                    operation = %operation,
                    "step skipped: unknown operation"
                ),
                StepOutcome::Synthesis { ready } => tracing::info!(
                    run_id = %run_id,
                    step_id = step.step_id,
                    ready = ready,
                    "synthesis step"
                ),
            }
            records.push(StepRecord {
                step_id: step.step_id,
                goal: step.goal.clone(),
                tool: step.tool.clone(),
                warnings,
                outcome,
            });
        }

        ExecutionTrace {
            run_id,
            started_at,
            finished_at: Utc::now(),
            records,
        }
    }

    async fn execute_step(
        &self,
        step: &Step,
        context: &mut ExecutionContext,
        warnings: &mut Vec<String>,
    ) -> StepOutcome {
        let Some(qualified) = &step.tool else {
            return self.mark_synthesis(step, context);
        };

        let tool_ref = match ToolRef::parse(qualified) {
            Ok(tool_ref) => tool_ref,
            Err(_) => {
                return StepOutcome::SkippedMalformedTool {
                    tool: qualified.clone(),
                }
            }
        };

        let Some(tool) = self.registry.get(&tool_ref.namespace) else {
            return StepOutcome::SkippedUnknownTool {
                namespace: tool_ref.namespace,
            };
        };

        if !tool
            .operations()
            .iter()
            .any(|op| op.name == tool_ref.operation)
        {
            return StepOutcome::SkippedUnknownOperation {
                namespace: tool_ref.namespace,
                operation: tool_ref.operation,
            };
        }

        let resolved = step
            .args
            .as_ref()
            .map(|args| resolve_args(args, context))
            .unwrap_or_default();
        warnings.extend(resolved.warnings.iter().cloned());

        match tool.invoke(&tool_ref.operation, resolved.into_tool_args()).await {
            Ok(output) => {
                if let Some(key) = &step.output_key {
                    context.insert(key.clone(), output.into());
                }
                StepOutcome::Succeeded {
                    output_key: step.output_key.clone(),
                }
            }
            Err(error) => StepOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    /// Synthesis steps never call out; they only mark readiness so the
    /// post-loop synthesis stage can find its inputs.
    fn mark_synthesis(&self, step: &Step, context: &mut ExecutionContext) -> StepOutcome {
        let has_inputs = step
            .input_keys
            .as_ref()
            .is_some_and(|keys| !keys.is_empty());
        match (&step.output_key, has_inputs) {
            (Some(key), true) => {
                context.insert(key.clone(), ContextValue::Ready);
                StepOutcome::Synthesis { ready: true }
            }
            _ => StepOutcome::Synthesis { ready: false },
        }
    }
}
