//! Output Presence Rule - Proposes a terminal step when nothing persists or reports results

use super::{Suggestion, SuggestionOp, SuggestionRule};
use crate::types::{Step, WorkflowDefinition};

pub struct OutputPresenceRule {
    output_step: Step,
}

impl OutputPresenceRule {
    pub fn new(output_step: Step) -> Self {
        Self { output_step }
    }
}

impl Default for OutputPresenceRule {
    fn default() -> Self {
        Self::new(Step::default_output())
    }
}

impl SuggestionRule for OutputPresenceRule {
    fn check(&self, definition: &WorkflowDefinition, _prior: &[Suggestion]) -> Vec<Suggestion> {
        if definition.has_terminal_step() {
            return vec![];
        }

        vec![Suggestion::new(
            SuggestionOp::AppendStep,
            "Append an output step so workflow results are recorded.",
        )
        .with_step(self.output_step.clone())]
    }

    fn id(&self) -> &str {
        "output_presence"
    }

    fn description(&self) -> &str {
        "Proposes a notification step when no step persists or reports results"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_output() {
        let definition = WorkflowDefinition::new(vec![Step::new("http-request")]);
        let suggestions = OutputPresenceRule::default().check(&definition, &[]);

        assert_eq!(suggestions.len(), 1);
        let step = suggestions[0].step.as_ref().unwrap();
        assert!(step.is_terminal());
        assert_eq!(step.args["channel"], "log");
    }

    #[test]
    fn test_persist_counts_as_output() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("Save to Database"),
        ]);
        assert!(OutputPresenceRule::default().check(&definition, &[]).is_empty());
    }
}
