//! # Veloplan Agents
//!
//! LLM-backed implementations of the core planning and synthesis seams:
//! - `LlmClient` abstraction with an OpenAI-compatible HTTP backend and a
//!   canned mock for tests
//! - `LlmRoutePlanner` - query + tool catalog -> Plan
//! - `LlmReportSynthesizer` - execution context -> formatted route report

mod llm;
mod planner;
mod synthesizer;

pub use llm::{HttpLlmClient, HttpLlmClientConfig, LlmClient, LlmError, LlmRequest, MockLlmClient};
pub use planner::{LlmRoutePlanner, RoutePlannerConfig};
pub use synthesizer::{LlmReportSynthesizer, ReportSynthesizerConfig};
