//! # Veloplan Core
//!
//! Core abstractions and deterministic logic for the Veloplan pipeline.
//!
//! This crate contains:
//! - Plan / Step / ArgValue / ToolRef definitions
//! - ExecutionContext and the strictly sequential PlanExecutor
//! - Tool trait, registry and plan validation
//! - Planner / Synthesizer seams for the LLM-backed services
//!
//! This crate does NOT care about:
//! - Which LLM backend produces plans or reports
//! - How tool adapters reach their upstream services
//! - How output is displayed

pub mod context;
pub mod executor;
pub mod planner;
pub mod synthesizer;
pub mod tool;
pub mod types;
pub mod validate;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::context::{ContextValue, ExecutionContext};
    pub use crate::executor::{
        resolve_args, ExecutionTrace, PlanExecutor, ResolvedArgs, StepOutcome, StepRecord,
    };
    pub use crate::planner::{PlanError, Planner};
    pub use crate::synthesizer::{
        DigestSynthesizer, SynthesisError, SynthesisRequest, Synthesizer,
    };
    pub use crate::tool::{
        OperationMeta, Tool, ToolArgs, ToolError, ToolMeta, ToolOutput, ToolRegistry,
    };
    pub use crate::types::{ArgValue, FieldRef, Plan, Step, ToolRef, ToolRefError};
    pub use crate::validate::{PlanValidator, ValidationIssue};
}

// Re-export key types at crate root
pub use context::{ContextValue, ExecutionContext};
pub use executor::{ExecutionTrace, PlanExecutor, StepOutcome};
pub use planner::{PlanError, Planner};
pub use synthesizer::{DigestSynthesizer, SynthesisRequest, Synthesizer};
pub use tool::{Tool, ToolArgs, ToolError, ToolOutput, ToolRegistry};
pub use types::{ArgValue, Plan, Step, ToolRef};
pub use validate::{PlanValidator, ValidationIssue};
