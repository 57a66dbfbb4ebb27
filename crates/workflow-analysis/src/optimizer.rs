//! Route optimizer
//!
//! Reorders a copy of the definition so every validation step runs ahead
//! of every transform step, and reports cost-related observations that do
//! not change the step list.
//!
//! # Example
//!
//! **Before**:
//! ```text
//! http-request → transform → validate-csv → persist
//! ```
//!
//! **After**:
//! ```text
//! http-request → validate-csv → transform → persist
//! ```
//!
//! Steps that are neither validation nor transform keep their positions.
//! The validation and transform slots are refilled with all validations
//! first, then all transforms, each group in its original relative order.

use serde::{Deserialize, Serialize};

use crate::types::{Step, StepKind, WorkflowDefinition};

/// HTTP request count above which a batching note is reported
pub const BATCHING_HINT_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub optimizations_count: usize,
    pub optimizations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub optimized_definition: WorkflowDefinition,
    pub optimization_report: OptimizationReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptimizer;

impl RouteOptimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn optimize(&self, definition: &WorkflowDefinition) -> OptimizationOutcome {
        let mut optimized = definition.clone();
        let mut notes = Vec::new();

        if let Some(note) = group_validations_first(&mut optimized.steps) {
            notes.push(note);
        }
        if let Some(note) = expensive_operations_note(&optimized) {
            notes.push(note);
        }
        if let Some(note) = batching_note(&optimized) {
            notes.push(note);
        }

        tracing::debug!(
            workflow_id = %definition.workflow_id(),
            optimizations = notes.len(),
            "Route optimization finished"
        );

        OptimizationOutcome {
            optimized_definition: optimized,
            optimization_report: OptimizationReport {
                optimizations_count: notes.len(),
                optimizations: notes,
            },
        }
    }
}

fn group_validations_first(steps: &mut [Step]) -> Option<String> {
    let slots: Vec<usize> = steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.is_validation() || step.is_transform())
        .map(|(idx, _)| idx)
        .collect();

    let validations: Vec<Step> = slots
        .iter()
        .map(|&idx| &steps[idx])
        .filter(|step| step.is_validation())
        .cloned()
        .collect();
    let transforms: Vec<Step> = slots
        .iter()
        .map(|&idx| &steps[idx])
        .filter(|step| step.is_transform())
        .cloned()
        .collect();

    let already_grouped = slots
        .iter()
        .take(validations.len())
        .all(|&idx| steps[idx].is_validation());
    if validations.is_empty() || transforms.is_empty() || already_grouped {
        return None;
    }

    let note = format!(
        "Grouped {} validation step(s) ahead of {} transform step(s).",
        validations.len(),
        transforms.len()
    );
    for (slot, step) in slots.into_iter().zip(validations.into_iter().chain(transforms)) {
        steps[slot] = step;
    }
    Some(note)
}

fn expensive_operations_note(definition: &WorkflowDefinition) -> Option<String> {
    let persists = definition.indices_of(StepKind::Persist);
    if persists.is_empty() || definition.len() < 2 {
        return None;
    }
    Some(format!(
        "Expensive storage operations at step(s) {:?} are best kept late in the workflow.",
        persists
    ))
}

fn batching_note(definition: &WorkflowDefinition) -> Option<String> {
    let requests = definition.http_step_indices().len();
    if requests <= BATCHING_HINT_THRESHOLD {
        return None;
    }
    Some(format!(
        "Detected {} HTTP request steps; consider batching them.",
        requests
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(definition: &WorkflowDefinition) -> Vec<&str> {
        definition
            .steps
            .iter()
            .map(|step| step.step_type.as_str())
            .collect()
    }

    #[test]
    fn test_groups_validations_and_keeps_others_in_place() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("transform").with_arg("id", 1),
            Step::new("validate-csv").with_arg("id", 2),
            Step::new("transform").with_arg("id", 3),
            Step::new("validate-csv").with_arg("id", 4),
            Step::new("notify"),
        ]);

        let outcome = RouteOptimizer::new().optimize(&definition);
        let optimized = &outcome.optimized_definition;

        assert_eq!(
            types(optimized),
            vec!["http-request", "validate-csv", "validate-csv", "transform", "transform", "notify"]
        );
        let ids: Vec<i64> = optimized.steps[1..5]
            .iter()
            .map(|step| step.args["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
        assert_eq!(outcome.optimization_report.optimizations_count, 1);
    }

    #[test]
    fn test_already_ordered_is_unchanged() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("validate-csv"),
            Step::new("transform"),
        ]);
        let outcome = RouteOptimizer::new().optimize(&definition);
        assert_eq!(outcome.optimized_definition, definition);
        assert_eq!(outcome.optimization_report, OptimizationReport::default());
    }

    #[test]
    fn test_cost_notes() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("http-request"),
            Step::new("http-request"),
            Step::new("persist"),
        ]);
        let report = RouteOptimizer::new().optimize(&definition).optimization_report;

        assert_eq!(report.optimizations_count, 2);
        assert!(report.optimizations[0].contains("[3]"));
        assert!(report.optimizations[1].starts_with("Detected 3 HTTP request steps"));
    }

    #[test]
    fn test_input_untouched() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("transform"),
            Step::new("validate-csv"),
        ]);
        let snapshot = definition.clone();
        let _ = RouteOptimizer::new().optimize(&definition);
        assert_eq!(definition, snapshot);
    }
}
