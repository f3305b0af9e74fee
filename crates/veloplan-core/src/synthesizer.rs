//! Synthesizer abstraction
//!
//! Converts the final execution context into the user-facing route
//! report. Implementations must tolerate absent keys: a partially
//! degraded run still deserves a useful partial answer.

use std::fmt::Write;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{ContextValue, ExecutionContext};

const TEXT_PREVIEW_CHARS: usize = 240;

/// Input for the synthesis stage: the original query plus a snapshot of
/// everything the run managed to gather.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub query: String,
    pub context: ExecutionContext,
}

impl SynthesisRequest {
    pub fn new(query: impl Into<String>, context: ExecutionContext) -> Self {
        Self {
            query: query.into(),
            context,
        }
    }
}

/// Synthesis errors
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("llm error: {0}")]
    Llm(String),
}

/// Synthesizer trait - renders the final report
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String, SynthesisError>;
}

/// Deterministic fallback synthesizer. Lists what the run gathered with
/// short previews; used when no LLM backend is configured and as the
/// degradation path when the backend is down.
pub struct DigestSynthesizer;

#[async_trait]
impl Synthesizer for DigestSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String, SynthesisError> {
        if request.context.is_empty() {
            return Ok("No route information could be gathered for this request.".to_string());
        }

        let mut report = String::new();
        let _ = writeln!(report, "Gathered results for: {}", request.query);
        for (key, value) in request.context.iter() {
            match value {
                ContextValue::Record(fields) => {
                    let _ = writeln!(
                        report,
                        "- {}: {}",
                        key,
                        serde_json::Value::Object(fields.clone())
                    );
                }
                ContextValue::Text(text) => {
                    let _ = writeln!(report, "- {}: {}", key, preview_text(text));
                }
                ContextValue::Ready => {}
            }
        }
        Ok(report.trim_end().to_string())
    }
}

fn preview_text(text: &str) -> String {
    let flattened = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" / ");
    let char_count = flattened.chars().count();
    if char_count <= TEXT_PREVIEW_CHARS {
        return flattened;
    }
    let mut preview: String = flattened.chars().take(TEXT_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_digest_reports_gathered_keys() {
        tokio_test::block_on(async {
            let mut context = ExecutionContext::new();
            context.insert("w", ContextValue::text("Temperature: 31°C\nHumidity: 70%"));
            context.insert(
                "o",
                ContextValue::record([("latitude", json!(23.84)), ("longitude", json!(90.26))]),
            );
            context.insert("final", ContextValue::Ready);

            let report = DigestSynthesizer
                .synthesize(SynthesisRequest::new("Savar to Dhanmondi", context))
                .await
                .unwrap();

            assert!(report.contains("Savar to Dhanmondi"));
            assert!(report.contains("- o:"));
            assert!(report.contains("Temperature: 31°C / Humidity: 70%"));
            assert!(!report.contains("final"));
        });
    }

    #[test]
    fn test_digest_handles_empty_context() {
        tokio_test::block_on(async {
            let report = DigestSynthesizer
                .synthesize(SynthesisRequest::new("anything", ExecutionContext::new()))
                .await
                .unwrap();
            assert!(report.contains("No route information"));
        });
    }

    #[test]
    fn test_long_text_is_truncated_in_preview() {
        let long = "x".repeat(1000);
        let preview = preview_text(&long);
        assert!(preview.chars().count() <= TEXT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
