//! Parallel Hint Rule
//!
//! **Purpose**: Point out HTTP calls that could run concurrently.
//!
//! # Example
//!
//! **Before**:
//! ```text
//! fetch_users (HTTP) → fetch_posts (HTTP) → merge
//! Total: 2 sequential round trips
//! ```
//!
//! **After**:
//! ```text
//! [fetch_users | fetch_posts] → merge
//! Total: 1 round trip of wall time
//! ```
//!
//! # Detection Logic
//! - Workflow has at least `min_steps` steps
//! - At least `min_requests` of them are HTTP requests
//! - One `optimize` suggestion lists every candidate index

use super::{Suggestion, SuggestionOp, SuggestionRule};
use crate::types::WorkflowDefinition;

pub struct ParallelHintRule {
    min_steps: usize,
    min_requests: usize,
}

impl ParallelHintRule {
    pub fn new(min_steps: usize, min_requests: usize) -> Self {
        Self {
            min_steps,
            min_requests,
        }
    }
}

impl Default for ParallelHintRule {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl SuggestionRule for ParallelHintRule {
    fn check(&self, definition: &WorkflowDefinition, _prior: &[Suggestion]) -> Vec<Suggestion> {
        if definition.len() < self.min_steps {
            return vec![];
        }

        let candidates = definition.http_step_indices();
        if candidates.len() < self.min_requests {
            return vec![];
        }

        vec![Suggestion::new(
            SuggestionOp::Optimize,
            format!(
                "Consider running the {} HTTP requests in parallel to reduce total time.",
                candidates.len()
            ),
        )
        .with_detail("parallel_candidates", candidates)]
    }

    fn id(&self) -> &str {
        "parallel_hint"
    }

    fn description(&self) -> &str {
        "Suggests running independent HTTP requests in parallel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use serde_json::json;

    #[test]
    fn test_lists_candidates() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("http-request"),
            Step::new("transform"),
        ]);

        let suggestions = ParallelHintRule::default().check(&definition, &[]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].detail.as_ref().unwrap()["parallel_candidates"],
            json!([0, 1])
        );
    }

    #[test]
    fn test_too_few_steps() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("http-request"),
        ]);
        assert!(ParallelHintRule::default().check(&definition, &[]).is_empty());
    }
}
