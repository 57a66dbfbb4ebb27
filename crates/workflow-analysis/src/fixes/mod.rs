//! Fix commands and the pipeline that applies them
//!
//! A fix command detects one problem and corrects it in place on the
//! pipeline's private copy of the definition. Commands hold no state
//! between runs: whether a command changed anything is its return value.
//! The caller's definition is never touched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{StepKind, WorkflowDefinition};

pub mod add_output_step;
pub mod add_timeout;
pub mod remove_invalid_steps;
pub mod reorder_validation;
pub mod set_parameter;

pub use add_output_step::AddOutputStepCommand;
pub use add_timeout::AddTimeoutCommand;
pub use remove_invalid_steps::RemoveInvalidStepsCommand;
pub use reorder_validation::ReorderValidationCommand;
pub use set_parameter::SetParameterCommand;

/// Result of a fix call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixResult {
    /// Independent copy with corrections applied
    pub patched_definition: WorkflowDefinition,

    /// One line per command that changed something
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Error logs handed to `fix`: a single string or a list of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixLogs {
    Text(String),
    Entries(Vec<Value>),
}

impl FixLogs {
    /// Non-empty log lines. Non-string entries are rendered as JSON.
    pub fn lines(&self) -> Vec<String> {
        match self {
            FixLogs::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            FixLogs::Entries(entries) => entries
                .iter()
                .map(|entry| match entry {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        }
    }
}

/// Normalize optional logs into a list of lines
pub fn normalize_logs(logs: Option<&FixLogs>) -> Vec<String> {
    logs.map(FixLogs::lines).unwrap_or_default()
}

/// Core trait that all fix commands implement
pub trait FixCommand: Send + Sync {
    /// Apply the correction in place.
    ///
    /// Returns a one-line description when something changed, `None` when
    /// the command did not apply.
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String>;

    /// Unique identifier for this command
    fn id(&self) -> &str;
}

/// Ordered list of fix commands
pub struct FixPipeline {
    commands: Vec<Box<dyn FixCommand>>,
}

impl FixPipeline {
    pub fn empty() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add timeout → reorder validation → add output step
    pub fn standard() -> Self {
        Self::empty()
            .with(AddTimeoutCommand::default())
            .with(ReorderValidationCommand)
            .with(AddOutputStepCommand::default())
    }

    /// Add timeout → add output step
    pub fn basic() -> Self {
        Self::empty()
            .with(AddTimeoutCommand::default())
            .with(AddOutputStepCommand::default())
    }

    /// Drop unrecognized step types, then the standard corrections
    pub fn validation() -> Self {
        Self::empty()
            .with(RemoveInvalidStepsCommand::new(StepKind::RECOGNIZED.to_vec()))
            .with(AddTimeoutCommand::default())
            .with(ReorderValidationCommand)
            .with(AddOutputStepCommand::default())
    }

    pub fn with(mut self, command: impl FixCommand + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn command_ids(&self) -> Vec<&str> {
        self.commands.iter().map(|command| command.id()).collect()
    }

    /// Run every command in order over one copy of the definition
    pub fn apply(&self, definition: &WorkflowDefinition) -> FixResult {
        let mut patched = definition.clone();
        let mut notes = Vec::new();

        for command in &self.commands {
            if let Some(note) = command.execute(&mut patched) {
                tracing::debug!(command = command.id(), note = %note, "Fix applied");
                notes.push(note);
            }
        }

        FixResult {
            patched_definition: patched,
            notes,
        }
    }
}

impl Default for FixPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn broken() -> WorkflowDefinition {
        WorkflowDefinition::named(
            "broken",
            vec![
                Step::new("http-request").with_arg("url", "https://x"),
                Step::new("transform"),
                Step::new("validate-csv"),
            ],
        )
    }

    #[test]
    fn test_standard_pipeline() {
        let original = broken();
        let result = FixPipeline::standard().apply(&original);

        let steps = &result.patched_definition.steps;
        assert_eq!(steps[0].args["timeout"], 10);
        assert!(steps[1].is_validation());
        assert!(steps[2].is_transform());
        assert!(steps.last().unwrap().is_terminal());
        assert_eq!(result.notes.len(), 3);

        // Input untouched
        assert_eq!(original, broken());
    }

    #[test]
    fn test_standard_pipeline_is_idempotent() {
        let once = FixPipeline::standard().apply(&broken());
        let twice = FixPipeline::standard().apply(&once.patched_definition);

        assert_eq!(twice.patched_definition, once.patched_definition);
        assert!(twice.notes.is_empty());
    }

    #[test]
    fn test_validation_pipeline_drops_unknown_steps() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("shell"),
            Step::new("persist"),
        ]);
        let result = FixPipeline::validation().apply(&definition);

        assert_eq!(result.patched_definition.steps, vec![Step::new("persist")]);
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_log_normalization() {
        assert!(normalize_logs(None).is_empty());

        let text = FixLogs::Text("timeout on step 0\n\nretrying".to_string());
        assert_eq!(normalize_logs(Some(&text)), vec!["timeout on step 0", "retrying"]);

        let entries: FixLogs = serde_json::from_value(json!(["a", {"code": 1}])).unwrap();
        assert_eq!(entries.lines(), vec!["a".to_string(), r#"{"code":1}"#.to_string()]);
    }
}
