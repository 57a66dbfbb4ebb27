//! Add Output Step - Appends a terminal step when nothing persists or reports results

use super::FixCommand;
use crate::types::{Step, WorkflowDefinition};

pub struct AddOutputStepCommand {
    output_step: Step,
}

impl AddOutputStepCommand {
    pub fn new(output_step: Step) -> Self {
        Self { output_step }
    }
}

impl Default for AddOutputStepCommand {
    fn default() -> Self {
        Self::new(Step::default_output())
    }
}

impl FixCommand for AddOutputStepCommand {
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String> {
        if definition.has_terminal_step() {
            return None;
        }

        definition.steps.push(self.output_step.clone());
        Some(format!(
            "Appended output step ({}).",
            self.output_step.step_type
        ))
    }

    fn id(&self) -> &str {
        "add_output_step"
    }
}
