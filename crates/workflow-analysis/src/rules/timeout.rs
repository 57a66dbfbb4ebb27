//! Timeout Rule
//!
//! **Purpose**: Flag HTTP request steps that declare no timeout.
//!
//! A request without a timeout can hold a run open indefinitely when the
//! upstream never answers. Each offending step gets one `add_arg`
//! suggestion carrying the proposed value.

use super::{Suggestion, SuggestionOp, SuggestionRule};
use crate::types::WorkflowDefinition;

/// Timeout proposed for requests that declare none (seconds)
pub const DEFAULT_SUGGESTED_TIMEOUT_SECS: u64 = 30;

pub struct TimeoutRule {
    timeout_secs: u64,
}

impl TimeoutRule {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for TimeoutRule {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTED_TIMEOUT_SECS)
    }
}

impl SuggestionRule for TimeoutRule {
    fn check(&self, definition: &WorkflowDefinition, _prior: &[Suggestion]) -> Vec<Suggestion> {
        definition
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_http() && !step.has_arg("timeout"))
            .map(|(idx, _)| {
                Suggestion::new(
                    SuggestionOp::AddArg,
                    "Add a timeout so HTTP requests cannot block indefinitely.",
                )
                .at(idx)
                .with_arg("timeout", self.timeout_secs)
            })
            .collect()
    }

    fn id(&self) -> &str {
        "timeout"
    }

    fn description(&self) -> &str {
        "Proposes a timeout for HTTP request steps that declare none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;

    #[test]
    fn test_flags_each_request_without_timeout() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request").with_arg("url", "https://a"),
            Step::new("transform"),
            Step::new("HTTPS GET Request").with_arg("timeout", 5),
            Step::new("http-request"),
        ]);

        let suggestions = TimeoutRule::default().check(&definition, &[]);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].target_step_index, Some(0));
        assert_eq!(suggestions[1].target_step_index, Some(3));
        assert_eq!(suggestions[0].arg.as_ref().unwrap()["timeout"], 30);
    }

    #[test]
    fn test_custom_timeout() {
        let definition = WorkflowDefinition::new(vec![Step::new("http-request")]);
        let suggestions = TimeoutRule::new(12).check(&definition, &[]);
        assert_eq!(suggestions[0].arg.as_ref().unwrap()["timeout"], 12);
    }
}
