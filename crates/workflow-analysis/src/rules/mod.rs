//! Suggestion rules and the engine that chains them
//!
//! Each rule inspects a definition for one structural concern and returns
//! the suggestions it wants to add. The engine folds the rules left to
//! right over an accumulator, so a rule can see what earlier rules
//! proposed but can only append.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Step, WorkflowDefinition};

pub mod output_presence;
pub mod parallel_hint;
pub mod timeout;
pub mod validation_order;

pub use output_presence::OutputPresenceRule;
pub use parallel_hint::ParallelHintRule;
pub use timeout::TimeoutRule;
pub use validation_order::ValidationOrderRule;

/// Confidence reported by the deterministic rule engine
pub const RULE_ENGINE_CONFIDENCE: f64 = 0.66;

/// Rationale reported by the deterministic rule engine
pub const RULE_ENGINE_RATIONALE: &str =
    "Rule-based suggestions for robustness (timeouts), observable output, step ordering and parallelism.";

/// Kind of change a suggestion proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionOp {
    AddArg,
    AppendStep,
    Reorder,
    Optimize,
}

/// A proposed, non-applied improvement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub op: SuggestionOp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_step_index: Option<usize>,

    /// Arguments to add (for `add_arg`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<Map<String, Value>>,

    /// Step to append (for `append_step`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,

    #[serde(default)]
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Map<String, Value>>,
}

impl Suggestion {
    pub fn new(op: SuggestionOp, reason: impl Into<String>) -> Self {
        Self {
            op,
            target_step_index: None,
            arg: None,
            step: None,
            reason: reason.into(),
            detail: None,
        }
    }

    pub fn at(mut self, step_index: usize) -> Self {
        self.target_step_index = Some(step_index);
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arg
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Aggregate result of a suggest call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub suggested_changes: Vec<Suggestion>,
    pub confidence: f64,
    pub rationale: String,
}

/// Core trait that all suggestion rules implement
pub trait SuggestionRule: Send + Sync {
    /// Inspect the definition and return suggestions to append.
    ///
    /// `prior` holds what earlier rules in the chain already proposed.
    fn check(&self, definition: &WorkflowDefinition, prior: &[Suggestion]) -> Vec<Suggestion>;

    /// Unique identifier for this rule
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;
}

/// Ordered chain of rules
pub struct RuleEngine {
    rules: Vec<Box<dyn SuggestionRule>>,
}

impl RuleEngine {
    /// Empty chain, for callers assembling their own
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Timeout → output presence → validation order → parallel hint
    pub fn default_chain() -> Self {
        Self::empty()
            .with(TimeoutRule::default())
            .with(OutputPresenceRule::default())
            .with(ValidationOrderRule)
            .with(ParallelHintRule::default())
    }

    /// Timeout → output presence
    pub fn basic_chain() -> Self {
        Self::empty()
            .with(TimeoutRule::default())
            .with(OutputPresenceRule::default())
    }

    /// Append a rule to the end of the chain
    pub fn with(mut self, rule: impl SuggestionRule + 'static) -> Self {
        self.register(Box::new(rule));
        self
    }

    pub fn register(&mut self, rule: Box<dyn SuggestionRule>) {
        self.rules.push(rule);
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn SuggestionRule> {
        self.rules
            .iter()
            .find(|rule| rule.id() == id)
            .map(|rule| rule.as_ref())
    }

    /// (id, description) for every rule, in chain order
    pub fn list_rules(&self) -> Vec<(String, String)> {
        self.rules
            .iter()
            .map(|rule| (rule.id().to_string(), rule.description().to_string()))
            .collect()
    }

    /// Run every rule in order over a shared accumulator
    pub fn evaluate(&self, definition: &WorkflowDefinition) -> Vec<Suggestion> {
        self.rules.iter().fold(Vec::new(), |mut acc, rule| {
            let added = rule.check(definition, &acc);
            if !added.is_empty() {
                tracing::debug!(rule = rule.id(), count = added.len(), "Rule produced suggestions");
            }
            acc.extend(added);
            acc
        })
    }

    /// Evaluate and wrap with the engine's fixed rationale and confidence
    pub fn suggest(&self, definition: &WorkflowDefinition) -> SuggestionResult {
        SuggestionResult {
            suggested_changes: self.evaluate(definition),
            confidence: RULE_ENGINE_CONFIDENCE,
            rationale: RULE_ENGINE_RATIONALE.to_string(),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::default_chain()
    }
}
