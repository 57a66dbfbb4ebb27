//! Reorder Validation
//!
//! **Purpose**: Move a validation step that runs after a transform to the
//! transform's position, so validation runs first.
//!
//! # Example
//!
//! **Before**:
//! ```text
//! transform → validate-csv → persist
//! ```
//!
//! **After**:
//! ```text
//! validate-csv → transform → persist
//! ```
//!
//! Handles one pair per run: the last validation and the last transform.
//! Workflows that interleave several of each may need more than one pass.

use super::FixCommand;
use crate::types::WorkflowDefinition;

pub struct ReorderValidationCommand;

impl FixCommand for ReorderValidationCommand {
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String> {
        let (validate_idx, transform_idx) = definition.misordered_validation()?;

        let step = definition.steps.remove(validate_idx);
        definition.steps.insert(transform_idx, step);

        Some(format!(
            "Moved validation step from index {} to {} so it runs before the transform.",
            validate_idx, transform_idx
        ))
    }

    fn id(&self) -> &str {
        "reorder_validation"
    }
}
