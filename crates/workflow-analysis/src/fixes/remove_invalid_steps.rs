//! Remove Invalid Steps - Drops steps whose kind is not in an allow-list

use super::FixCommand;
use crate::types::{StepKind, WorkflowDefinition};

pub struct RemoveInvalidStepsCommand {
    allowed: Vec<StepKind>,
}

impl RemoveInvalidStepsCommand {
    pub fn new(allowed: Vec<StepKind>) -> Self {
        Self { allowed }
    }
}

impl FixCommand for RemoveInvalidStepsCommand {
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String> {
        let before = definition.len();
        definition
            .steps
            .retain(|step| self.allowed.contains(&step.kind()));

        let removed = before - definition.len();
        (removed > 0).then(|| format!("Removed {} invalid step(s).", removed))
    }

    fn id(&self) -> &str {
        "remove_invalid_steps"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;

    #[test]
    fn test_allow_list() {
        let mut definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("transform"),
            Step::new("email"),
        ]);

        let command = RemoveInvalidStepsCommand::new(vec![StepKind::HttpRequest]);
        assert_eq!(
            command.execute(&mut definition).as_deref(),
            Some("Removed 2 invalid step(s).")
        );
        assert_eq!(definition.len(), 1);
    }
}
