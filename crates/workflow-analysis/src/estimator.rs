//! Deterministic time, cost and complexity estimates
//!
//! Each step is priced from a per-kind base table, adjusted by position
//! (first-step warm-up, last-step overhead) and by declared parameters
//! (long timeouts cost more). Complexity blends step count, expensive
//! operations, critical-path depth and a cycle penalty, capped at 1.0.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::{AdjacencyPolicy, GraphAnalyzer, SequentialPolicy};
use crate::types::{Step, StepKind, WorkflowDefinition};

/// Confidence reported by the deterministic estimator
pub const ESTIMATOR_CONFIDENCE: f64 = 0.8;

/// Clamp to [0.0, 1.0]; NaN becomes 0.0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Per-step line of an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateItem {
    pub step_index: usize,

    #[serde(rename = "type")]
    pub step_type: String,

    /// Seconds
    pub time: f64,

    /// USD
    pub cost: f64,
}

/// Predicted time, cost and complexity profile of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub estimated_time_seconds: f64,
    pub estimated_cost_usd: f64,
    pub complexity_score: f64,
    pub breakdown: Vec<EstimateItem>,
    pub assumptions: Vec<String>,
    pub confidence: f64,
}

/// Base time and cost of one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostProfile {
    pub time_seconds: f64,
    pub cost_usd: f64,
}

impl CostProfile {
    pub const fn new(time_seconds: f64, cost_usd: f64) -> Self {
        Self {
            time_seconds,
            cost_usd,
        }
    }
}

/// Base values per step kind, with a fallback for unrecognized types
#[derive(Debug, Clone)]
pub struct CostTable {
    entries: HashMap<StepKind, CostProfile>,
    fallback: CostProfile,
}

impl CostTable {
    pub fn lookup(&self, kind: StepKind) -> CostProfile {
        self.entries.get(&kind).copied().unwrap_or(self.fallback)
    }

    pub fn set(&mut self, kind: StepKind, profile: CostProfile) {
        self.entries.insert(kind, profile);
    }
}

impl Default for CostTable {
    fn default() -> Self {
        let entries = HashMap::from([
            (StepKind::HttpRequest, CostProfile::new(3.0, 0.0005)),
            (StepKind::Validation, CostProfile::new(1.5, 0.0002)),
            (StepKind::Transform, CostProfile::new(2.0, 0.0003)),
            (StepKind::Persist, CostProfile::new(3.5, 0.0008)),
            (StepKind::Notification, CostProfile::new(0.1, 0.0)),
        ]);
        Self {
            entries,
            fallback: CostProfile::new(1.0, 0.0001),
        }
    }
}

/// Adjustment factors applied on top of base values
#[derive(Debug, Clone, Copy)]
pub struct Multipliers {
    /// Time factor for the first step (warm-up)
    pub first_step_time: f64,
    /// Time factor for the last step (accumulated overhead)
    pub last_step_time: f64,
    /// Timeouts above this many seconds raise the step's cost
    pub long_timeout_secs: f64,
    pub long_timeout_cost: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            first_step_time: 1.2,
            last_step_time: 1.1,
            long_timeout_secs: 30.0,
            long_timeout_cost: 1.3,
        }
    }
}

pub struct CostEstimator {
    table: CostTable,
    multipliers: Multipliers,
    policy: Box<dyn AdjacencyPolicy>,
}

impl CostEstimator {
    pub fn new() -> Self {
        Self {
            table: CostTable::default(),
            multipliers: Multipliers::default(),
            policy: Box::new(SequentialPolicy),
        }
    }

    pub fn with_table(mut self, table: CostTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_multipliers(mut self, multipliers: Multipliers) -> Self {
        self.multipliers = multipliers;
        self
    }

    pub fn with_policy(mut self, policy: impl AdjacencyPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    fn time_multiplier(&self, index: usize, total: usize) -> f64 {
        let mut multiplier = 1.0;
        if index == 0 {
            multiplier *= self.multipliers.first_step_time;
        }
        if index + 1 == total {
            multiplier *= self.multipliers.last_step_time;
        }
        multiplier
    }

    fn cost_multiplier(&self, step: &Step) -> f64 {
        match step.numeric_arg("timeout") {
            Some(timeout) if timeout > self.multipliers.long_timeout_secs => {
                self.multipliers.long_timeout_cost
            }
            _ => 1.0,
        }
    }

    pub fn estimate(&self, definition: &WorkflowDefinition) -> Estimate {
        let analyzer = GraphAnalyzer::with_policy(definition, self.policy.as_ref());
        let total_steps = definition.len();

        let mut total_time = 0.0;
        let mut total_cost = 0.0;
        let mut breakdown = Vec::with_capacity(total_steps);

        for (idx, step) in definition.steps.iter().enumerate() {
            let base = self.table.lookup(step.kind());
            let step_time = base.time_seconds * self.time_multiplier(idx, total_steps);
            let step_cost = base.cost_usd * self.cost_multiplier(step);

            total_time += step_time;
            total_cost += step_cost;

            breakdown.push(EstimateItem {
                step_index: idx,
                step_type: step.step_type.clone(),
                time: round_to(step_time, 2),
                cost: round_to(step_cost, 6),
            });
        }

        let complexity = complexity_score(definition, &analyzer);

        let groups = analyzer.parallel_groups().len();
        let timing_note = if groups < total_steps {
            total_time *= groups as f64 / total_steps.max(1) as f64;
            "Adjusted for potential parallel execution"
        } else {
            "Sequential execution"
        };

        Estimate {
            estimated_time_seconds: round_to(total_time, 2),
            estimated_cost_usd: round_to(total_cost, 6),
            complexity_score: clamp_unit(round_to(complexity, 2)),
            breakdown,
            assumptions: vec![
                timing_note.to_string(),
                "Costs based on standard per-step-type rates".to_string(),
                "Excludes variable network latency".to_string(),
            ],
            confidence: ESTIMATOR_CONFIDENCE,
        }
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Complexity in [0.0, 1.0].
///
/// - step count: 0.05 per step, up to 0.3
/// - expensive operations (HTTP, persist): 0.1 each, up to 0.3
/// - critical-path depth: 0.04 per step on the path, up to 0.2
/// - cycle present: +0.2
pub fn complexity_score(definition: &WorkflowDefinition, analyzer: &GraphAnalyzer) -> f64 {
    let step_factor = (definition.len() as f64 * 0.05).min(0.3);

    let expensive = definition
        .steps
        .iter()
        .filter(|step| step.kind().is_expensive())
        .count();
    let expensive_factor = (expensive as f64 * 0.1).min(0.3);

    let depth_factor = (analyzer.critical_path().len() as f64 * 0.04).min(0.2);

    let cycle_penalty = if analyzer.detect_cycles() { 0.2 } else { 0.0 };

    (step_factor + expensive_factor + depth_factor + cycle_penalty).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ExplicitEdges;

    fn scenario() -> WorkflowDefinition {
        WorkflowDefinition::new(vec![
            Step::new("http-request").with_arg("url", "https://x"),
            Step::new("transform"),
            Step::new("persist").with_arg("table", "t"),
        ])
    }

    #[test]
    fn test_breakdown_matches_steps() {
        let estimate = CostEstimator::new().estimate(&scenario());

        assert_eq!(estimate.breakdown.len(), 3);
        for (idx, item) in estimate.breakdown.iter().enumerate() {
            assert_eq!(item.step_index, idx);
        }
        assert_eq!(estimate.breakdown[0].step_type, "http-request");
        assert!(estimate.estimated_time_seconds > 0.0);
    }

    #[test]
    fn test_position_multipliers() {
        let estimate = CostEstimator::new().estimate(&scenario());

        // 3.0 * 1.2 + 2.0 + 3.5 * 1.1
        assert_eq!(estimate.breakdown[0].time, 3.6);
        assert_eq!(estimate.breakdown[1].time, 2.0);
        assert_eq!(estimate.breakdown[2].time, 3.85);
        assert_eq!(estimate.estimated_time_seconds, 9.45);
        assert_eq!(estimate.estimated_cost_usd, 0.0016);
    }

    #[test]
    fn test_long_timeout_raises_cost() {
        let definition = WorkflowDefinition::new(vec![
            Step::new("transform"),
            Step::new("http-request").with_arg("timeout", 60),
            Step::new("transform"),
        ]);
        let estimate = CostEstimator::new().estimate(&definition);
        assert_eq!(estimate.breakdown[1].cost, 0.00065);
    }

    #[test]
    fn test_unknown_type_uses_fallback() {
        let definition = WorkflowDefinition::new(vec![Step::new("shell"), Step::new("shell"), Step::new("shell")]);
        let estimate = CostEstimator::new().estimate(&definition);
        assert_eq!(estimate.breakdown[1].time, 1.0);
        assert_eq!(estimate.breakdown[1].cost, 0.0001);
    }

    #[test]
    fn test_empty_definition() {
        let estimate = CostEstimator::new().estimate(&WorkflowDefinition::default());
        assert!(estimate.breakdown.is_empty());
        assert_eq!(estimate.estimated_time_seconds, 0.0);
        assert_eq!(estimate.complexity_score, 0.0);
        assert_eq!(estimate.confidence, ESTIMATOR_CONFIDENCE);
    }

    #[test]
    fn test_complexity_is_capped() {
        let steps = (0..20).map(|_| Step::new("http-request")).collect();
        let estimate = CostEstimator::new().estimate(&WorkflowDefinition::new(steps));
        // 0.3 + 0.3 + 0.2
        assert_eq!(estimate.complexity_score, 0.8);
    }

    #[test]
    fn test_cycle_penalty_and_clamp() {
        let steps = (0..20).map(|_| Step::new("persist")).collect();
        let definition = WorkflowDefinition::new(steps);
        let estimator = CostEstimator::new().with_policy(ExplicitEdges::new(vec![(0, 1), (1, 0)]));

        let estimate = estimator.estimate(&definition);
        assert_eq!(estimate.complexity_score, 1.0);
    }

    #[test]
    fn test_parallel_adjustment() {
        // Two independent requests feeding a transform: 2 levels over 3 steps
        let definition = WorkflowDefinition::new(vec![
            Step::new("http-request"),
            Step::new("http-request"),
            Step::new("transform"),
        ]);
        let estimator = CostEstimator::new().with_policy(ExplicitEdges::new(vec![(0, 2), (1, 2)]));

        let estimate = estimator.estimate(&definition);
        assert_eq!(estimate.assumptions[0], "Adjusted for potential parallel execution");
        // (3.6 + 3.0 + 2.2) * 2 / 3
        assert_eq!(estimate.estimated_time_seconds, 5.87);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }
}
