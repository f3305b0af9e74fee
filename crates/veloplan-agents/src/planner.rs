//! LLM route planner.
//!
//! Prompts a chat-completion backend with the tool catalog and strict
//! sequential-planning rules, then parses the reply through the lenient
//! plan wire format (first `[` to last `]`, empty plan on garbage).

use std::fmt::Write;

use async_trait::async_trait;
use tracing::{debug, info};

use veloplan_core::planner::{PlanError, Planner};
use veloplan_core::tool::ToolMeta;
use veloplan_core::types::Plan;

use crate::llm::{truncate_for_log, LlmClient, LlmRequest};

const MAX_PROMPT_LOG_CHARS: usize = 4_000;
const MAX_LLM_OUTPUT_LOG_CHARS: usize = 8_000;

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct RoutePlannerConfig {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for RoutePlannerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            system_prompt: "You are a highly analytical and strategic planner agent. \
                            Break the user's request into explicit, sequential, executable steps."
                .to_string(),
        }
    }
}

/// LLM-backed planner over a fixed tool catalog.
pub struct LlmRoutePlanner<C: LlmClient> {
    client: C,
    config: RoutePlannerConfig,
    catalog: Vec<ToolMeta>,
}

impl<C: LlmClient> LlmRoutePlanner<C> {
    pub fn new(client: C, config: RoutePlannerConfig, catalog: Vec<ToolMeta>) -> Self {
        Self {
            client,
            config,
            catalog,
        }
    }

    fn build_prompt(&self, query: &str) -> (String, String) {
        let system = build_system_prompt(&self.config.system_prompt, &self.catalog);
        let user = format!(
            "Plan the following task: {}\n\nReturn ONLY the JSON array of step objects.\n",
            query
        );
        (system, user)
    }
}

fn build_system_prompt(base: &str, catalog: &[ToolMeta]) -> String {
    let mut system = String::new();
    system.push_str(base.trim());
    system.push_str("\n\nEach step object must carry:\n");
    system.push_str("- step_id: a unique integer, assigned in order.\n");
    system.push_str("- goal: a concise description of the step's objective.\n");
    system.push_str(
        "- tool: the qualified operation name from the Tool Catalog, e.g. \
         \"geocoding.geocode_location\"; null for the final synthesis step.\n",
    );
    system.push_str(
        "- args: named arguments for the operation, or null. When a value depends on an \
         earlier step's output, use a placeholder \"{output_key.attribute}\", e.g. \
         \"{origin_geocode.latitude}\".\n",
    );
    system.push_str(
        "- output_key: a unique key to store this step's result under, or null when no \
         later step needs it.\n",
    );
    system.push_str(
        "- input_keys: only on the synthesis step, the output_keys it will summarize.\n",
    );
    system.push_str("\nPlanning Rules:\n");
    system.push_str("1) Return ONLY one valid JSON array of step objects, no prose or fences.\n");
    system.push_str("2) Steps run strictly in order; never plan parallel tool execution.\n");
    system.push_str("3) Use only qualified operation names listed in the Tool Catalog.\n");
    system.push_str(
        "4) A placeholder may only reference the output_key of an earlier step that \
         produced a structured record.\n",
    );
    system.push_str(
        "5) The final step must be a synthesis step with tool null, collecting the \
         gathered output_keys via input_keys.\n",
    );
    system.push_str("6) Synthesis steps never carry args.\n");
    system.push_str("\nTool Catalog:\n");
    for tool in catalog {
        for operation in &tool.operations {
            let _ = writeln!(system, "- name: {}.{}", tool.namespace, operation.name);
            let _ = writeln!(system, "  description: {}", operation.description);
            if !operation.args_schema.is_null() {
                let _ = writeln!(system, "  args_schema: {}", operation.args_schema);
            }
        }
    }
    system
}

#[async_trait]
impl<C: LlmClient> Planner for LlmRoutePlanner<C> {
    async fn plan(&self, query: &str) -> Result<Plan, PlanError> {
        let (system, user) = self.build_prompt(query);
        info!(
            model = %self.config.model,
            temperature = self.config.temperature,
            query_len = query.len(),
            catalog_tools = self.catalog.len(),
            "planner request prepared"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                system_prompt = %truncate_for_log(&system, MAX_PROMPT_LOG_CHARS),
                user_prompt = %truncate_for_log(&user, MAX_PROMPT_LOG_CHARS),
                "planner prompts"
            );
        }

        let output = self
            .client
            .complete(LlmRequest {
                system,
                user,
                model: self.config.model.clone(),
                temperature: self.config.temperature,
            })
            .await
            .map_err(|e| PlanError::Llm(e.to_string()))?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                llm_output = %truncate_for_log(&output, MAX_LLM_OUTPUT_LOG_CHARS),
                "planner raw llm output"
            );
        }

        let plan = Plan::parse(&output);
        info!(step_count = plan.len(), "planner parsed plan");
        Ok(plan)
    }
}
