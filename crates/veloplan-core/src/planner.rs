//! Planner abstraction
//!
//! A Planner turns a free-form user query into a Plan. Implementations
//! decide how (an LLM backend, a canned script for tests); the executor
//! only ever sees the resulting step list. Planners do not validate -
//! that is the PlanValidator's job.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Plan;

/// Planning errors. An unparsable reply is not an error (it yields an
/// empty plan); only the backend call itself can fail.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("llm error: {0}")]
    Llm(String),
}

/// Planner trait - generates an execution plan from a user query
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, query: &str) -> Result<Plan, PlanError>;
}
