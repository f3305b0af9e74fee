//! Core type definitions for Veloplan
//!
//! This module contains the fundamental types used throughout the system:
//! - Plan: LLM-generated execution plan
//! - Step: individual tool call or synthesis marker
//! - ToolRef / FieldRef / ArgValue: typed references parsed from the wire

mod plan;
mod step;

pub use plan::Plan;
pub use step::{ArgValue, FieldRef, Step, ToolRef, ToolRefError};
