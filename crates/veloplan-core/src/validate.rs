//! Plan validation
//!
//! Checks a freshly parsed plan against the closed tool catalog before
//! execution: unknown namespaces/operations, malformed qualified names,
//! forward references, duplicate output keys, synthesis steps carrying
//! args. Issues are advisory - the executor degrades per step at runtime
//! either way - but surfacing them up front turns silent skips into
//! explicit diagnostics.

use std::collections::HashSet;

use thiserror::Error;

use crate::tool::ToolRegistry;
use crate::types::{ArgValue, Plan, ToolRef};

/// A structural problem found in a plan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("plan contains no steps")]
    EmptyPlan,

    #[error("step {step_id}: malformed tool name '{tool}'")]
    MalformedToolName { step_id: u32, tool: String },

    #[error("step {step_id}: unknown tool namespace '{namespace}'")]
    UnknownTool { step_id: u32, namespace: String },

    #[error("step {step_id}: unknown operation '{operation}' on tool '{namespace}'")]
    UnknownOperation {
        step_id: u32,
        namespace: String,
        operation: String,
    },

    #[error(
        "step {step_id}: argument '{arg}' references '{{{key}.{field}}}' before any step produces '{key}'"
    )]
    ForwardReference {
        step_id: u32,
        arg: String,
        key: String,
        field: String,
    },

    #[error("step {step_id}: duplicate output key '{key}'")]
    DuplicateOutputKey { step_id: u32, key: String },

    #[error("step {step_id}: synthesis step carries args")]
    SynthesisStepWithArgs { step_id: u32 },
}

/// Validator over a snapshot of the registry's (namespace, operation) catalog
pub struct PlanValidator {
    known: HashSet<(String, String)>,
    namespaces: HashSet<String>,
}

impl PlanValidator {
    /// Snapshot the registry catalog
    pub fn from_registry(registry: &ToolRegistry) -> Self {
        let mut known = HashSet::new();
        let mut namespaces = HashSet::new();
        for tool in registry.catalog() {
            namespaces.insert(tool.namespace.clone());
            for operation in &tool.operations {
                known.insert((tool.namespace.clone(), operation.name.clone()));
            }
        }
        Self { known, namespaces }
    }

    /// Walk the plan in execution order and collect every issue
    pub fn validate(&self, plan: &Plan) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if plan.is_empty() {
            issues.push(ValidationIssue::EmptyPlan);
            return issues;
        }

        let mut produced_keys: HashSet<&str> = HashSet::new();
        for step in &plan.steps {
            match &step.tool {
                Some(qualified) => match ToolRef::parse(qualified) {
                    Ok(tool_ref) => {
                        if !self.namespaces.contains(&tool_ref.namespace) {
                            issues.push(ValidationIssue::UnknownTool {
                                step_id: step.step_id,
                                namespace: tool_ref.namespace.clone(),
                            });
                        } else if !self
                            .known
                            .contains(&(tool_ref.namespace.clone(), tool_ref.operation.clone()))
                        {
                            issues.push(ValidationIssue::UnknownOperation {
                                step_id: step.step_id,
                                namespace: tool_ref.namespace,
                                operation: tool_ref.operation,
                            });
                        }
                    }
                    Err(_) => issues.push(ValidationIssue::MalformedToolName {
                        step_id: step.step_id,
                        tool: qualified.clone(),
                    }),
                },
                None => {
                    if step.args.as_ref().is_some_and(|args| !args.is_empty()) {
                        issues.push(ValidationIssue::SynthesisStepWithArgs {
                            step_id: step.step_id,
                        });
                    }
                }
            }

            if let Some(args) = &step.args {
                for (arg, value) in args {
                    if let ArgValue::Ref(field_ref) = value {
                        if !produced_keys.contains(field_ref.key.as_str()) {
                            issues.push(ValidationIssue::ForwardReference {
                                step_id: step.step_id,
                                arg: arg.clone(),
                                key: field_ref.key.clone(),
                                field: field_ref.field.clone(),
                            });
                        }
                    }
                }
            }

            if let Some(key) = &step.output_key {
                if !produced_keys.insert(key.as_str()) {
                    issues.push(ValidationIssue::DuplicateOutputKey {
                        step_id: step.step_id,
                        key: key.clone(),
                    });
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::tool::{OperationMeta, Tool, ToolArgs, ToolError, ToolOutput};
    use crate::types::{ArgValue, Step};

    struct GeoStub;

    #[async_trait]
    impl Tool for GeoStub {
        fn namespace(&self) -> &str {
            "geocoding"
        }

        fn description(&self) -> &str {
            "geocoding stub"
        }

        fn operations(&self) -> Vec<OperationMeta> {
            vec![OperationMeta::new("geocode_location", "geocode a place name")]
        }

        async fn invoke(&self, operation: &str, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Err(ToolError::unknown_operation("geocoding", operation))
        }
    }

    fn validator() -> PlanValidator {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(GeoStub));
        PlanValidator::from_registry(&registry)
    }

    #[test]
    fn test_empty_plan_is_reported() {
        assert_eq!(
            validator().validate(&Plan::empty()),
            vec![ValidationIssue::EmptyPlan]
        );
    }

    #[test]
    fn test_well_formed_plan_has_no_issues() {
        let plan = Plan::new(vec![
            Step::tool_call(1, "geocode", "geocoding.geocode_location")
                .with_arg("location_name", ArgValue::literal("Savar"))
                .with_output_key("o"),
            Step::tool_call(2, "reuse", "geocoding.geocode_location")
                .with_arg("location_name", ArgValue::reference("o", "display_name")),
            Step::synthesis(3, "wrap up", vec!["o".to_string()]).with_output_key("final"),
        ]);
        assert!(validator().validate(&plan).is_empty());
    }

    #[test]
    fn test_unknown_namespace_and_operation_are_distinct_issues() {
        let plan = Plan::new(vec![
            Step::tool_call(1, "weather", "weather.current_weather"),
            Step::tool_call(2, "teleport", "geocoding.teleport"),
        ]);
        let issues = validator().validate(&plan);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::UnknownTool {
                    step_id: 1,
                    namespace: "weather".to_string(),
                },
                ValidationIssue::UnknownOperation {
                    step_id: 2,
                    namespace: "geocoding".to_string(),
                    operation: "teleport".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_tool_name_is_reported() {
        let plan = Plan::new(vec![Step::tool_call(1, "bad", "geocoding")]);
        assert_eq!(
            validator().validate(&plan),
            vec![ValidationIssue::MalformedToolName {
                step_id: 1,
                tool: "geocoding".to_string(),
            }]
        );
    }

    #[test]
    fn test_forward_reference_is_detected() {
        let plan = Plan::new(vec![
            Step::tool_call(1, "route first", "geocoding.geocode_location")
                .with_arg("location_name", ArgValue::reference("o", "display_name")),
            Step::tool_call(2, "geocode later", "geocoding.geocode_location").with_output_key("o"),
        ]);
        assert_eq!(
            validator().validate(&plan),
            vec![ValidationIssue::ForwardReference {
                step_id: 1,
                arg: "location_name".to_string(),
                key: "o".to_string(),
                field: "display_name".to_string(),
            }]
        );
    }

    #[test]
    fn test_duplicate_output_key_and_synthesis_args_are_reported() {
        let plan = Plan::new(vec![
            Step::tool_call(1, "a", "geocoding.geocode_location").with_output_key("o"),
            Step::tool_call(2, "b", "geocoding.geocode_location").with_output_key("o"),
            Step::synthesis(3, "wrap up", vec!["o".to_string()])
                .with_arg("stray", ArgValue::literal(1)),
        ]);
        let issues = validator().validate(&plan);
        assert!(issues.contains(&ValidationIssue::DuplicateOutputKey {
            step_id: 2,
            key: "o".to_string(),
        }));
        assert!(issues.contains(&ValidationIssue::SynthesisStepWithArgs { step_id: 3 }));
    }
}
