//! Deterministic provider built from the rule engine, fix pipeline and
//! cost estimator. Never fails on a valid definition.

use async_trait::async_trait;

use super::AnalysisProvider;
use crate::error::Result;
use crate::estimator::{CostEstimator, Estimate};
use crate::fixes::{normalize_logs, FixLogs, FixPipeline, FixResult};
use crate::rules::{RuleEngine, SuggestionResult};
use crate::types::WorkflowDefinition;

pub struct LocalProvider {
    rules: RuleEngine,
    fixes: FixPipeline,
    estimator: CostEstimator,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self {
            rules: RuleEngine::default_chain(),
            fixes: FixPipeline::standard(),
            estimator: CostEstimator::new(),
        }
    }

    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_fixes(mut self, fixes: FixPipeline) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_estimator(mut self, estimator: CostEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn suggest_sync(&self, definition: &WorkflowDefinition) -> SuggestionResult {
        self.rules.suggest(definition)
    }

    pub fn fix_sync(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> FixResult {
        let mut result = self.fixes.apply(definition);

        let lines = normalize_logs(logs);
        if !lines.is_empty() {
            tracing::debug!(lines = lines.len(), "Fix called with error logs");
            result
                .notes
                .push(format!("Processed {} log line(s).", lines.len()));
        }
        result
    }

    pub fn estimate_sync(&self, definition: &WorkflowDefinition) -> Estimate {
        self.estimator.estimate(definition)
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn suggest(&self, definition: &WorkflowDefinition) -> Result<SuggestionResult> {
        Ok(self.suggest_sync(definition))
    }

    async fn fix(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> Result<FixResult> {
        Ok(self.fix_sync(definition, logs))
    }

    async fn estimate(&self, definition: &WorkflowDefinition) -> Result<Estimate> {
        Ok(self.estimate_sync(definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SuggestionOp;
    use crate::types::Step;

    fn scenario() -> WorkflowDefinition {
        WorkflowDefinition::named(
            "scenario",
            vec![
                Step::new("http-request").with_arg("url", "https://x"),
                Step::new("transform"),
                Step::new("validate-csv"),
            ],
        )
    }

    #[tokio::test]
    async fn test_suggest_is_deterministic() {
        let provider = LocalProvider::new();
        let first = provider.suggest(&scenario()).await.unwrap();
        let second = provider.suggest(&scenario()).await.unwrap();
        assert_eq!(first, second);

        let ops: Vec<SuggestionOp> = first.suggested_changes.iter().map(|s| s.op).collect();
        assert_eq!(
            ops,
            vec![SuggestionOp::AddArg, SuggestionOp::AppendStep, SuggestionOp::Reorder]
        );
    }

    #[tokio::test]
    async fn test_fix_notes_log_lines() {
        let provider = LocalProvider::new();
        let logs = FixLogs::Text("step 0 timed out\nretry failed".to_string());
        let result = provider.fix(&scenario(), Some(&logs)).await.unwrap();
        assert_eq!(result.notes.last().unwrap(), "Processed 2 log line(s).");

        let result = provider.fix(&scenario(), None).await.unwrap();
        assert!(result.notes.iter().all(|note| !note.starts_with("Processed")));
    }

    #[tokio::test]
    async fn test_estimate_empty_definition() {
        let provider = LocalProvider::new();
        let estimate = provider.estimate(&WorkflowDefinition::default()).await.unwrap();
        assert!(estimate.breakdown.is_empty());
        assert_eq!(estimate.estimated_cost_usd, 0.0);
    }
}
