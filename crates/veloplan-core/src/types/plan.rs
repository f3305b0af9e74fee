//! Plan type definitions
//!
//! A Plan is an ordered list of steps; list order is execution order.
//! The planner LLM is expected to emit a bare JSON array of steps, but in
//! practice replies arrive wrapped in prose or code fences, so parsing is
//! deliberately lenient: no brackets or invalid JSON yields an empty plan
//! rather than an error.

use serde::{Deserialize, Serialize};

use super::Step;

/// Ordered, strictly sequential execution plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// Create a plan from steps
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Create a plan with no steps
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse planner output. The JSON array is located by slicing from the
    /// first `[` to the last `]`; a missing bracket pair or a parse failure
    /// of the slice produces an empty plan.
    pub fn parse(text: &str) -> Self {
        let Some(json_str) = extract_json_array(text) else {
            tracing::warn!("planner output did not contain a JSON array");
            return Self::empty();
        };
        match serde_json::from_str::<Vec<Step>>(json_str) {
            Ok(steps) => Self::new(steps),
            Err(error) => {
                tracing::warn!(%error, "planner output was not a valid step array");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Find a step by its planner-assigned id
    pub fn get_step(&self, step_id: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let plan = Plan::parse(
            r#"[{"step_id": 1, "goal": "weather", "tool": "weather.current_weather",
                "args": {"city": "Dhaka"}, "output_key": "w"}]"#,
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].output_key.as_deref(), Some("w"));
    }

    #[test]
    fn test_parse_strips_surrounding_prose_and_fences() {
        let plan = Plan::parse(
            "Here is the plan:\n```json\n[{\"step_id\": 1, \"goal\": \"g\", \"tool\": null}]\n```\nDone.",
        );
        assert_eq!(plan.len(), 1);
        assert!(plan.steps[0].is_synthesis());
    }

    #[test]
    fn test_parse_without_brackets_yields_empty_plan() {
        let plan = Plan::parse("I could not produce a plan for this request.");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_parse_invalid_json_yields_empty_plan() {
        let plan = Plan::parse("[{\"step_id\": oops]");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_parse_reversed_brackets_yields_empty_plan() {
        let plan = Plan::parse("] nothing here [");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_get_step_finds_by_planner_id() {
        let plan = Plan::new(vec![
            Step::tool_call(1, "first", "geocoding.geocode_location"),
            Step::synthesis(2, "wrap up", vec!["o".to_string()]),
        ]);
        assert!(plan.get_step(2).unwrap().is_synthesis());
        assert!(plan.get_step(9).is_none());
    }
}
