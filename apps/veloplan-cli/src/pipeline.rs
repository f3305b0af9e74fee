//! End-to-end pipeline: plan -> validate -> execute -> synthesize.

use veloplan_core::context::ExecutionContext;
use veloplan_core::executor::{ExecutionTrace, PlanExecutor};
use veloplan_core::planner::Planner;
use veloplan_core::synthesizer::{DigestSynthesizer, SynthesisRequest, Synthesizer};
use veloplan_core::validate::PlanValidator;

/// What a pipeline run produced.
pub enum PipelineOutcome {
    /// The planner produced no usable steps.
    NoSteps,
    /// The plan ran; the report may cover a partial context.
    Completed {
        report: String,
        trace: ExecutionTrace,
    },
}

/// One wired pipeline instance. Each run gets a fresh context, so
/// instances can serve any number of independent queries.
pub struct Pipeline<P, S> {
    planner: P,
    executor: PlanExecutor,
    synthesizer: S,
}

impl<P: Planner, S: Synthesizer> Pipeline<P, S> {
    pub fn new(planner: P, executor: PlanExecutor, synthesizer: S) -> Self {
        Self {
            planner,
            executor,
            synthesizer,
        }
    }

    pub async fn run(&self, query: &str) -> anyhow::Result<PipelineOutcome> {
        let plan = self.planner.plan(query).await?;
        if plan.is_empty() {
            return Ok(PipelineOutcome::NoSteps);
        }
        tracing::info!(step_count = plan.len(), "plan generated");

        // Advisory: the executor degrades per step at runtime either way,
        // but surfacing issues up front beats silent skips.
        let validator = PlanValidator::from_registry(self.executor.registry());
        for issue in validator.validate(&plan) {
            tracing::warn!(%issue, "plan validation issue");
        }

        let mut context = ExecutionContext::new();
        let trace = self.executor.execute(&plan, &mut context).await;
        tracing::info!(
            succeeded = trace.succeeded(),
            failed = trace.failed(),
            skipped = trace.skipped(),
            context_keys = context.len(),
            "plan executed"
        );

        let request = SynthesisRequest::new(query, context);
        let report = match self.synthesizer.synthesize(request.clone()).await {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(%error, "synthesis backend failed, falling back to digest");
                DigestSynthesizer.synthesize(request).await?
            }
        };

        Ok(PipelineOutcome::Completed { report, trace })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use veloplan_core::planner::PlanError;
    use veloplan_core::synthesizer::SynthesisError;
    use veloplan_core::tool::{OperationMeta, Tool, ToolArgs, ToolError, ToolOutput, ToolRegistry};
    use veloplan_core::types::{ArgValue, Plan, Step};

    use super::*;

    struct ScriptedPlanner {
        plan: Plan,
    }

    #[async_trait]
    impl Planner for ScriptedPlanner {
        async fn plan(&self, _query: &str) -> Result<Plan, PlanError> {
            Ok(self.plan.clone())
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _request: SynthesisRequest) -> Result<String, SynthesisError> {
            Err(SynthesisError::Llm("backend down".to_string()))
        }
    }

    struct PlaceTool;

    #[async_trait]
    impl Tool for PlaceTool {
        fn namespace(&self) -> &str {
            "geocoding"
        }

        fn description(&self) -> &str {
            "canned geocoder"
        }

        fn operations(&self) -> Vec<OperationMeta> {
            vec![OperationMeta::new("geocode_location", "canned lookup")]
        }

        async fn invoke(&self, _operation: &str, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            args.str_required("location_name")?;
            Ok(ToolOutput::record([
                ("latitude", json!(23.84)),
                ("longitude", json!(90.26)),
            ]))
        }
    }

    fn executor() -> PlanExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PlaceTool));
        PlanExecutor::new(registry)
    }

    fn scripted_plan() -> Plan {
        Plan::new(vec![
            Step::tool_call(1, "geocode origin", "geocoding.geocode_location")
                .with_arg("location_name", ArgValue::literal("Savar"))
                .with_output_key("origin_geocode"),
            Step::synthesis(2, "wrap up", vec!["origin_geocode".to_string()])
                .with_output_key("final"),
        ])
    }

    #[test]
    fn test_pipeline_runs_plan_and_reports() {
        tokio_test::block_on(async {
            let pipeline = Pipeline::new(
                ScriptedPlanner {
                    plan: scripted_plan(),
                },
                executor(),
                DigestSynthesizer,
            );

            match pipeline.run("Savar to Dhanmondi").await.unwrap() {
                PipelineOutcome::Completed { report, trace } => {
                    assert!(report.contains("origin_geocode"));
                    assert_eq!(trace.succeeded(), 1);
                }
                PipelineOutcome::NoSteps => panic!("expected a completed run"),
            }
        });
    }

    #[test]
    fn test_empty_plan_short_circuits() {
        tokio_test::block_on(async {
            let pipeline = Pipeline::new(
                ScriptedPlanner { plan: Plan::empty() },
                executor(),
                DigestSynthesizer,
            );
            assert!(matches!(
                pipeline.run("query").await.unwrap(),
                PipelineOutcome::NoSteps
            ));
        });
    }

    #[test]
    fn test_synthesis_failure_falls_back_to_digest() {
        tokio_test::block_on(async {
            let pipeline = Pipeline::new(
                ScriptedPlanner {
                    plan: scripted_plan(),
                },
                executor(),
                FailingSynthesizer,
            );

            match pipeline.run("Savar").await.unwrap() {
                PipelineOutcome::Completed { report, .. } => {
                    assert!(report.contains("origin_geocode"));
                }
                PipelineOutcome::NoSteps => panic!("expected a completed run"),
            }
        });
    }
}
