use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use workflow_analysis::{
    Estimate, FixResult, GraphSummary, OptimizationOutcome, Suggestion, SuggestionResult,
    WorkflowDefinition,
};

use super::{load_definition, load_logs, Backend};
use crate::OutputFormat;

/// One analysis over a workflow file
pub enum Analysis {
    Suggest,
    Fix { logs: Option<PathBuf> },
    Estimate,
    Optimize,
    Graph,
}

pub async fn handle(
    backend: &Backend,
    file: PathBuf,
    analysis: Analysis,
    output: &OutputFormat,
) -> Result<()> {
    let definition = load_definition(&file)?;

    match analysis {
        Analysis::Suggest => {
            let result = backend.suggest(&definition).await?;
            emit(output, &result, || suggestion_lines(&result), || print_suggestions(&definition, &result))
        }
        Analysis::Fix { logs } => {
            let logs = logs.as_deref().map(load_logs).transpose()?;
            let result = backend.fix(&definition, logs.as_ref()).await?;
            emit(output, &result, || fix_lines(&result), || print_fix(&definition, &result))
        }
        Analysis::Estimate => {
            let result = backend.estimate(&definition).await?;
            emit(output, &result, || estimate_lines(&result), || print_estimate(&definition, &result))
        }
        Analysis::Optimize => {
            let result = backend.optimize(&definition).await?;
            emit(output, &result, || optimize_lines(&result), || print_optimize(&definition, &result))
        }
        Analysis::Graph => {
            let result = backend.graph(&definition).await?;
            emit(output, &result, || graph_lines(&result), || print_graph(&definition, &result))
        }
    }
}

fn emit<T: Serialize>(
    output: &OutputFormat,
    value: &T,
    compact: impl FnOnce() -> Vec<String>,
    pretty: impl FnOnce(),
) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Compact => {
            for line in compact() {
                println!("{}", line);
            }
        }
        OutputFormat::Pretty => pretty(),
    }
    Ok(())
}

fn op_name(suggestion: &Suggestion) -> String {
    serde_json::to_value(suggestion.op)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn target(index: Option<usize>) -> String {
    index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn suggestion_lines(result: &SuggestionResult) -> Vec<String> {
    result
        .suggested_changes
        .iter()
        .map(|s| format!("{}\t{}\t{}", op_name(s), target(s.target_step_index), s.reason))
        .collect()
}

pub(crate) fn fix_lines(result: &FixResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .patched_definition
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}\t{}", i, step.step_type))
        .collect();
    lines.extend(result.notes.iter().map(|note| format!("note\t{}", note)));
    lines
}

pub(crate) fn estimate_lines(result: &Estimate) -> Vec<String> {
    let mut lines = vec![format!(
        "total\t{:.2}s\t${:.4}\tcomplexity={:.2}",
        result.estimated_time_seconds, result.estimated_cost_usd, result.complexity_score
    )];
    lines.extend(result.breakdown.iter().map(|item| {
        format!("{}\t{}\t{:.2}s\t${:.4}", item.step_index, item.step_type, item.time, item.cost)
    }));
    lines
}

pub(crate) fn optimize_lines(result: &OptimizationOutcome) -> Vec<String> {
    let order = result
        .optimized_definition
        .steps
        .iter()
        .map(|step| step.step_type.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    let mut lines = vec![order];
    lines.extend(result.optimization_report.optimizations.iter().cloned());
    lines
}

pub(crate) fn graph_lines(result: &GraphSummary) -> Vec<String> {
    vec![
        format!("nodes\t{}", result.node_count),
        format!("edges\t{}", result.edge_count),
        format!("cycle\t{}", result.has_cycle),
        format!("order\t{:?}", result.topological_order),
        format!("critical\t{:?}", result.critical_path),
        format!("groups\t{:?}", result.parallel_groups),
    ]
}

fn header(title: &str, definition: &WorkflowDefinition) {
    println!(
        "{} {} ({} steps)",
        title.bold().cyan(),
        definition.workflow_id().bold(),
        definition.len()
    );
    println!();
}

fn print_suggestions(definition: &WorkflowDefinition, result: &SuggestionResult) {
    header("Suggestions for", definition);

    if result.suggested_changes.is_empty() {
        println!("{}", "No suggestions, workflow looks good".green());
    }
    for suggestion in &result.suggested_changes {
        println!(
            "{} {} {}",
            "•".blue(),
            op_name(suggestion).yellow().bold(),
            format!("step {}", target(suggestion.target_step_index)).bright_black()
        );
        println!("  {}", suggestion.reason);
        if let Some(arg) = &suggestion.arg {
            println!("  Arg: {}", serde_json::Value::Object(arg.clone()).to_string().bright_black());
        }
        if let Some(step) = &suggestion.step {
            println!("  Step: {}", step.step_type.bright_black());
        }
    }

    println!();
    println!("Confidence: {}", format!("{:.2}", result.confidence).green());
    println!("{}", result.rationale.bright_black());
}

fn print_fix(definition: &WorkflowDefinition, result: &FixResult) {
    header("Fixes for", definition);

    if result.notes.is_empty() {
        println!("{}", "Nothing to fix".green());
    }
    for note in &result.notes {
        println!("{} {}", "✓".green(), note);
    }

    println!();
    println!("{}", "Patched steps:".bold());
    for (i, step) in result.patched_definition.steps.iter().enumerate() {
        println!("  {} {}", format!("{:>2}.", i).bright_black(), step.step_type.cyan());
    }
}

fn print_estimate(definition: &WorkflowDefinition, result: &Estimate) {
    header("Estimate for", definition);

    println!("Time:       {}", format!("{:.2}s", result.estimated_time_seconds).green());
    println!("Cost:       {}", format!("${:.4}", result.estimated_cost_usd).green());
    println!("Complexity: {}", format!("{:.2}", result.complexity_score).yellow());
    println!("Confidence: {}", format!("{:.2}", result.confidence).yellow());

    if !result.breakdown.is_empty() {
        println!();
        println!("{}", "Breakdown:".bold());
        for item in &result.breakdown {
            println!(
                "  {} {:<16} {:>8} {:>10}",
                format!("{:>2}.", item.step_index).bright_black(),
                item.step_type.cyan(),
                format!("{:.2}s", item.time),
                format!("${:.4}", item.cost)
            );
        }
    }

    if !result.assumptions.is_empty() {
        println!();
        println!("{}", "Assumptions:".bold());
        for assumption in &result.assumptions {
            println!("  {} {}", "-".bright_black(), assumption.bright_black());
        }
    }
}

fn print_optimize(definition: &WorkflowDefinition, result: &OptimizationOutcome) {
    header("Optimization for", definition);

    let report = &result.optimization_report;
    if report.optimizations.is_empty() {
        println!("{}", "Route is already optimal".green());
    } else {
        println!("{} ({} total)", "Optimizations:".bold(), report.optimizations_count);
        for note in &report.optimizations {
            println!("  {} {}", "•".blue(), note);
        }
    }

    println!();
    println!("{}", optimize_lines(result)[0].cyan());
}

fn print_graph(definition: &WorkflowDefinition, result: &GraphSummary) {
    header("Graph of", definition);

    println!("Policy:   {}", result.policy.bright_black());
    println!("Nodes:    {}", result.node_count);
    println!("Edges:    {}", result.edge_count);
    if result.has_cycle {
        println!("Cycle:    {}", "yes".red().bold());
    } else {
        println!("Cycle:    {}", "no".green());
    }
    println!("Order:    {:?}", result.topological_order);
    println!("Critical: {}", format!("{:?}", result.critical_path).yellow());
    println!("Parallel: {:?}", result.parallel_groups);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workflow_analysis::{LocalProvider, Step};

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition::named(
            "orders",
            vec![
                Step::new("http-request").with_arg("url", "https://x"),
                Step::new("transform"),
                Step::new("validate-csv"),
            ],
        )
    }

    #[test]
    fn test_suggestion_lines() {
        let result = LocalProvider::new().suggest_sync(&definition());
        let lines = suggestion_lines(&result);
        assert_eq!(lines.len(), result.suggested_changes.len());
        assert!(lines[0].starts_with("add_arg\t0\t"));
    }

    #[test]
    fn test_fix_lines_list_patched_steps_then_notes() {
        let result = LocalProvider::new().fix_sync(&definition(), None);
        let lines = fix_lines(&result);
        assert_eq!(lines.len(), result.patched_definition.len() + result.notes.len());
        assert_eq!(lines[0], "0\thttp-request");
        assert!(lines.last().unwrap().starts_with("note\t"));
    }

    #[test]
    fn test_estimate_lines_start_with_total() {
        let result = LocalProvider::new().estimate_sync(&definition());
        let lines = estimate_lines(&result);
        assert!(lines[0].starts_with("total\t"));
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("1\ttransform\t"));
    }

    #[test]
    fn test_graph_lines() {
        let summary = workflow_analysis::GraphAnalyzer::new(&definition()).summary();
        let lines = graph_lines(&summary);
        assert_eq!(lines[0], "nodes\t3");
        assert_eq!(lines[2], "cycle\tfalse");
        assert_eq!(lines[4], "critical\t[0, 1, 2]");
    }
}
