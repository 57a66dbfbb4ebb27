//! Workflow definition types (mirrors the definition body the API receives)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::AnalysisError;

/// Identifier used for events when a definition carries no name
pub const UNNAMED_WORKFLOW: &str = "unknown";

/// A named, ordered sequence of steps
///
/// Step order is the only dependency information the analysis engine
/// reads unless an explicit adjacency policy is supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Optional workflow name, used as the workflow id in events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One unit of workflow behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Type tag: "http-request", "validate-csv", "transform", "persist", "notify", ...
    #[serde(rename = "type")]
    pub step_type: String,

    /// Type-specific arguments
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Canonical step kinds recognized by the analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    HttpRequest,
    Validation,
    Transform,
    Persist,
    Notification,
    Other,
}

impl StepKind {
    /// Every recognized kind, excluding `Other`
    pub const RECOGNIZED: [StepKind; 5] = [
        StepKind::HttpRequest,
        StepKind::Validation,
        StepKind::Transform,
        StepKind::Persist,
        StepKind::Notification,
    ];

    /// Classify a step type tag.
    ///
    /// Accepts the short tags ("http-request", "validate-csv", ...) as well as
    /// the catalog labels ("HTTPS GET Request", "Validate CSV File", ...).
    pub fn classify(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "http" | "http-request" | "https-request" | "http-get" | "https-get"
            | "https-get-request" | "http-get-request" => StepKind::HttpRequest,
            "validate" | "validation" | "validate-csv" | "validate-csv-file" => {
                StepKind::Validation
            }
            "transform" | "simple-transform" => StepKind::Transform,
            "persist" | "save" | "save-db" | "save-to-database" => StepKind::Persist,
            "notify" | "notification" | "mock-notification" => StepKind::Notification,
            _ => StepKind::Other,
        }
    }

    /// Canonical short tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            StepKind::HttpRequest => "http-request",
            StepKind::Validation => "validate-csv",
            StepKind::Transform => "transform",
            StepKind::Persist => "persist",
            StepKind::Notification => "notify",
            StepKind::Other => "other",
        }
    }

    /// Steps that persist or externally report results
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepKind::Persist | StepKind::Notification)
    }

    /// Steps that dominate runtime and cost (network and storage I/O)
    pub fn is_expensive(&self) -> bool {
        matches!(self, StepKind::HttpRequest | StepKind::Persist)
    }
}

impl Step {
    pub fn new(step_type: impl Into<String>) -> Self {
        Self {
            step_type: step_type.into(),
            args: Map::new(),
        }
    }

    /// Builder-style argument insertion
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> StepKind {
        StepKind::classify(&self.step_type)
    }

    pub fn is_http(&self) -> bool {
        self.kind() == StepKind::HttpRequest
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == StepKind::Validation
    }

    pub fn is_transform(&self) -> bool {
        self.kind() == StepKind::Transform
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn has_arg(&self, key: &str) -> bool {
        self.args.contains_key(key)
    }

    /// Numeric argument value, if present and numeric
    pub fn numeric_arg(&self, key: &str) -> Option<f64> {
        self.args.get(key).and_then(Value::as_f64)
    }

    /// Default terminal step appended when a workflow has no output
    pub fn default_output() -> Self {
        Step::new(StepKind::Notification.tag()).with_arg("channel", "log")
    }
}

impl WorkflowDefinition {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { name: None, steps }
    }

    pub fn named(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: Some(name.into()),
            steps,
        }
    }

    /// Workflow id used for events
    pub fn workflow_id(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_WORKFLOW)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether any step persists or reports results
    pub fn has_terminal_step(&self) -> bool {
        self.steps.iter().any(Step::is_terminal)
    }

    /// Indices of HTTP request steps
    pub fn http_step_indices(&self) -> Vec<usize> {
        self.indices_of(StepKind::HttpRequest)
    }

    /// Indices of every step of the given kind, in order
    pub fn indices_of(&self, kind: StepKind) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.kind() == kind)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Last validation index and last transform index, when validation
    /// comes after the transform it should guard
    pub fn misordered_validation(&self) -> Option<(usize, usize)> {
        let validate_idx = self.steps.iter().rposition(Step::is_validation)?;
        let transform_idx = self.steps.iter().rposition(Step::is_transform)?;
        (validate_idx > transform_idx).then_some((validate_idx, transform_idx))
    }

    /// Count steps by kind
    pub fn count_by_kind(&self) -> HashMap<StepKind, usize> {
        let mut counts = HashMap::new();
        for step in &self.steps {
            *counts.entry(step.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Reject malformed definitions before any engine runs
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (idx, step) in self.steps.iter().enumerate() {
            if step.step_type.trim().is_empty() {
                return Err(AnalysisError::Validation(format!(
                    "step {} has an empty type tag",
                    idx
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_parsing() {
        let json = r#"{
            "name": "etl",
            "steps": [
                {"type": "HTTPS GET Request", "args": {"url": "https://example.com/data.csv"}},
                {"type": "Validate CSV File", "args": {"delimiter": ","}},
                {"type": "Simple Transform"},
                {"type": "Save to Database", "args": {"table": "dest"}}
            ]
        }"#;

        let definition: WorkflowDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.len(), 4);
        assert_eq!(definition.workflow_id(), "etl");
        assert!(definition.steps[2].args.is_empty());
        assert!(definition.has_terminal_step());
        assert_eq!(definition.http_step_indices(), vec![0]);
    }

    #[test]
    fn test_step_kind_classification() {
        assert_eq!(StepKind::classify("http-request"), StepKind::HttpRequest);
        assert_eq!(StepKind::classify("HTTPS GET Request"), StepKind::HttpRequest);
        assert_eq!(StepKind::classify("validate-csv"), StepKind::Validation);
        assert_eq!(StepKind::classify("Simple Transform"), StepKind::Transform);
        assert_eq!(StepKind::classify("save"), StepKind::Persist);
        assert_eq!(StepKind::classify("Mock Notification"), StepKind::Notification);
        assert_eq!(StepKind::classify("shell"), StepKind::Other);
    }

    #[test]
    fn test_misordered_validation() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("transform"),
            Step::new("validate-csv"),
            Step::new("persist"),
        ]);
        assert_eq!(definition.misordered_validation(), Some((1, 0)));

        let ordered = WorkflowDefinition::new(vec![
            Step::new("validate-csv"),
            Step::new("transform"),
        ]);
        assert_eq!(ordered.misordered_validation(), None);
    }

    #[test]
    fn test_validate_rejects_empty_type() {
        let definition = WorkflowDefinition::new(vec![Step::new("  ")]);
        assert!(matches!(
            definition.validate(),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_unnamed_serialization_omits_name() {
        let definition = WorkflowDefinition::new(vec![Step::new("notify").with_arg("channel", "log")]);
        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(
            value,
            json!({"steps": [{"type": "notify", "args": {"channel": "log"}}]})
        );
    }
}
