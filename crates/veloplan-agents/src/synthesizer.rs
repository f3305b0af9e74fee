//! LLM report synthesizer.
//!
//! Renders whatever the run gathered into a prompt and asks the backend
//! for the final cycling report. Absent keys are tolerated by design: a
//! degraded run still produces a partial answer.

use std::fmt::Write;

use async_trait::async_trait;
use tracing::{debug, info};

use veloplan_core::context::ContextValue;
use veloplan_core::synthesizer::{SynthesisError, SynthesisRequest, Synthesizer};

use crate::llm::{truncate_for_log, LlmClient, LlmRequest};

const MAX_PROMPT_LOG_CHARS: usize = 4_000;

/// Synthesizer configuration.
#[derive(Debug, Clone)]
pub struct ReportSynthesizerConfig {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for ReportSynthesizerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.4,
            system_prompt: "You are a smart and helpful cycling assistant. Synthesize the \
                            gathered information into a friendly, comprehensive route report \
                            with these sections: a short titled summary, Route Overview, \
                            Step-by-Step Directions, Weather Conditions, and Recommendations \
                            and Tips based on the weather and route. If a piece of \
                            information is marked unavailable, say so briefly instead of \
                            inventing it."
                .to_string(),
        }
    }
}

/// LLM-backed synthesizer.
pub struct LlmReportSynthesizer<C: LlmClient> {
    client: C,
    config: ReportSynthesizerConfig,
}

impl<C: LlmClient> LlmReportSynthesizer<C> {
    pub fn new(client: C, config: ReportSynthesizerConfig) -> Self {
        Self { client, config }
    }
}

fn build_user_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = format!(
        "The user asked: {}\n\nInformation gathered from executing the plan:\n",
        request.query
    );
    let mut rendered = 0;
    for (key, value) in request.context.iter() {
        match value {
            ContextValue::Record(fields) => {
                let _ = writeln!(
                    prompt,
                    "\n--- {} ---\n{}",
                    key,
                    serde_json::Value::Object(fields.clone())
                );
                rendered += 1;
            }
            ContextValue::Text(text) => {
                let _ = writeln!(prompt, "\n--- {} ---\n{}", key, text);
                rendered += 1;
            }
            // Readiness sentinels carry no information worth prompting with.
            ContextValue::Ready => {}
        }
    }
    if rendered == 0 {
        prompt.push_str("\n(no information could be gathered)\n");
    }
    prompt.push_str("\nPlease synthesize this into the route report.");
    prompt
}

#[async_trait]
impl<C: LlmClient> Synthesizer for LlmReportSynthesizer<C> {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String, SynthesisError> {
        let user = build_user_prompt(&request);
        info!(
            model = %self.config.model,
            context_keys = request.context.len(),
            "synthesis request prepared"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                user_prompt = %truncate_for_log(&user, MAX_PROMPT_LOG_CHARS),
                "synthesis prompt"
            );
        }

        self.client
            .complete(LlmRequest {
                system: self.config.system_prompt.clone(),
                user,
                model: self.config.model.clone(),
                temperature: self.config.temperature,
            })
            .await
            .map_err(|e| SynthesisError::Llm(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use veloplan_core::context::ExecutionContext;

    use super::*;
    use crate::llm::MockLlmClient;

    fn sample_request() -> SynthesisRequest {
        let mut context = ExecutionContext::new();
        context.insert("weather_report", ContextValue::text("31°C, broken clouds"));
        context.insert(
            "origin_geocode",
            ContextValue::record([("latitude", json!(23.84))]),
        );
        context.insert("final_response", ContextValue::Ready);
        SynthesisRequest::new("Savar to Dhanmondi", context)
    }

    #[test]
    fn test_user_prompt_renders_records_and_text_but_not_sentinels() {
        let prompt = build_user_prompt(&sample_request());

        assert!(prompt.contains("The user asked: Savar to Dhanmondi"));
        assert!(prompt.contains("--- weather_report ---\n31°C, broken clouds"));
        assert!(prompt.contains("--- origin_geocode ---"));
        assert!(prompt.contains("\"latitude\":23.84"));
        assert!(!prompt.contains("final_response"));
    }

    #[test]
    fn test_empty_context_is_stated_not_invented() {
        let request = SynthesisRequest::new("anything", ExecutionContext::new());
        let prompt = build_user_prompt(&request);
        assert!(prompt.contains("(no information could be gathered)"));
    }

    #[test]
    fn test_synthesize_returns_backend_reply() {
        tokio_test::block_on(async {
            let synthesizer = LlmReportSynthesizer::new(
                MockLlmClient::new("Your Cycling Route from Savar to Dhanmondi"),
                ReportSynthesizerConfig::default(),
            );
            let report = synthesizer.synthesize(sample_request()).await.unwrap();
            assert!(report.contains("Savar to Dhanmondi"));
        });
    }
}
