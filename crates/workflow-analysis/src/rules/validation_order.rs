//! Validation Order Rule
//!
//! **Purpose**: Data should be validated before it is transformed.
//!
//! # Example
//!
//! **Before**:
//! ```text
//! transform → validate-csv → persist
//! ```
//!
//! **Suggested**:
//! ```text
//! validate-csv → transform → persist
//! ```
//!
//! Only the last validation and the last transform are compared; workflows
//! interleaving several of each get a single suggestion for that pair.

use super::{Suggestion, SuggestionOp, SuggestionRule};
use crate::types::WorkflowDefinition;

pub struct ValidationOrderRule;

impl SuggestionRule for ValidationOrderRule {
    fn check(&self, definition: &WorkflowDefinition, _prior: &[Suggestion]) -> Vec<Suggestion> {
        let Some((validate_idx, transform_idx)) = definition.misordered_validation() else {
            return vec![];
        };

        vec![Suggestion::new(
            SuggestionOp::Reorder,
            format!(
                "Move the validation step ({}) before the transform step ({}) so data is validated before it is transformed.",
                validate_idx, transform_idx
            ),
        )
        .at(validate_idx)
        .with_detail("move_step_from", validate_idx)
        .with_detail("move_step_to", transform_idx)]
    }

    fn id(&self) -> &str {
        "validation_order"
    }

    fn description(&self) -> &str {
        "Checks that validation steps run before transform steps"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;

    #[test]
    fn test_reorder_detail() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("Simple Transform"),
            Step::new("Validate CSV File"),
        ]);

        let suggestions = ValidationOrderRule.check(&definition, &[]);
        assert_eq!(suggestions.len(), 1);
        let detail = suggestions[0].detail.as_ref().unwrap();
        assert_eq!(detail["move_step_from"], 2);
        assert_eq!(detail["move_step_to"], 1);
    }

    #[test]
    fn test_correct_order_is_silent() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("validate-csv"),
            Step::new("transform"),
        ]);
        assert!(ValidationOrderRule.check(&definition, &[]).is_empty());
    }
}
