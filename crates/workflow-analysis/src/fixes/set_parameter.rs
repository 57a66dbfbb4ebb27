//! Set Parameter - Fills a missing argument on every step of a given type

use serde_json::Value;

use super::FixCommand;
use crate::types::{Step, StepKind, WorkflowDefinition};

pub struct SetParameterCommand {
    step_type: String,
    kind: StepKind,
    param: String,
    value: Value,
}

impl SetParameterCommand {
    /// `step_type` matches by kind when it is a recognized tag, by exact text otherwise
    pub fn new(step_type: impl Into<String>, param: impl Into<String>, value: impl Into<Value>) -> Self {
        let step_type = step_type.into();
        Self {
            kind: StepKind::classify(&step_type),
            step_type,
            param: param.into(),
            value: value.into(),
        }
    }

    fn matches(&self, step: &Step) -> bool {
        match self.kind {
            StepKind::Other => step.step_type == self.step_type,
            kind => step.kind() == kind,
        }
    }
}

impl FixCommand for SetParameterCommand {
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String> {
        let mut changed = false;
        for step in definition.steps.iter_mut() {
            if self.matches(step) && !step.has_arg(&self.param) {
                step.args.insert(self.param.clone(), self.value.clone());
                changed = true;
            }
        }

        changed.then(|| format!("Set {}={} on {}.", self.param, self.value, self.step_type))
    }

    fn id(&self) -> &str {
        "set_parameter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_by_kind() {
        let mut definition = WorkflowDefinition::new(vec![
            Step::new("Save to Database"),
            Step::new("persist").with_arg("table", "keep"),
        ]);

        let command = SetParameterCommand::new("persist", "table", "results");
        let note = command.execute(&mut definition).unwrap();
        assert_eq!(note, "Set table=\"results\" on persist.");
        assert_eq!(definition.steps[0].args["table"], "results");
        assert_eq!(definition.steps[1].args["table"], "keep");
    }

    #[test]
    fn test_matches_unknown_type_exactly() {
        let mut definition = WorkflowDefinition::new(vec![Step::new("shell"), Step::new("Shell")]);
        SetParameterCommand::new("shell", "cwd", "/tmp").execute(&mut definition);
        assert!(definition.steps[0].has_arg("cwd"));
        assert!(!definition.steps[1].has_arg("cwd"));
    }
}
