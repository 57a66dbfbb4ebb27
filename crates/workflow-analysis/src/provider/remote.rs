//! Model-backed provider
//!
//! Serializes the definition into a prompt, calls a [`TextGenerator`] with
//! bounded retries and exponential backoff, pulls a JSON object out of the
//! reply and parses it into the shared result types.
//!
//! Required fields missing from the reply are a [`AnalysisError::ResponseParse`].
//! Optional fields are backfilled and numeric ranges clamped.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::gemini::TextGenerator;
use super::AnalysisProvider;
use crate::error::{AnalysisError, Result};
use crate::estimator::{clamp_unit, complexity_score, Estimate, EstimateItem};
use crate::fixes::{normalize_logs, FixLogs, FixResult};
use crate::graph::GraphAnalyzer;
use crate::rules::{Suggestion, SuggestionResult};
use crate::types::WorkflowDefinition;

/// Confidence used when the model omits one
pub const REMOTE_DEFAULT_CONFIDENCE: f64 = 0.5;

pub const REMOTE_DEFAULT_RATIONALE: &str = "Suggestions generated by the remote model.";

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n\s*```").expect("valid fenced JSON regex"));

static BARE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

/// Pull the JSON payload out of model text that may be wrapped in markdown
pub fn extract_json(text: &str) -> Result<&str> {
    if let Some(block) = FENCED_JSON.captures(text).and_then(|caps| caps.get(1)) {
        return Ok(block.as_str().trim());
    }
    if let Some(object) = BARE_OBJECT.find(text) {
        return Ok(object.as_str().trim());
    }
    Err(AnalysisError::ResponseParse(
        "response contains no JSON object".to_string(),
    ))
}

fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| AnalysisError::ResponseParse(e.to_string()))
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

// ============================================================================
// Reply shapes
// ============================================================================

#[derive(Deserialize)]
struct SuggestReply {
    suggested_changes: Vec<Suggestion>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Deserialize)]
struct FixReply {
    patched_definition: WorkflowDefinition,
    #[serde(default)]
    notes: Vec<String>,
}

#[derive(Deserialize)]
struct EstimateReply {
    estimated_time_seconds: f64,
    estimated_cost_usd: f64,
    #[serde(default)]
    complexity_score: Option<f64>,
    #[serde(default)]
    breakdown: Vec<BreakdownReply>,
    #[serde(default)]
    assumptions: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Deserialize)]
struct BreakdownReply {
    #[serde(default)]
    step_index: Option<usize>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
}

// ============================================================================
// Prompts
// ============================================================================

const SUGGEST_INSTRUCTIONS: &str = r#"You are an expert in workflow optimization and process orchestration.
Review the workflow definition and suggest improvements to efficiency, robustness, cost and the logical order of operations.

Always answer with JSON of this shape:
{
  "suggested_changes": [
    {
      "op": "add_arg|append_step|reorder|optimize",
      "target_step_index": <index of the affected step, if any>,
      "arg": <object of arguments when op=add_arg>,
      "step": <full step object when op=append_step>,
      "reason": "<why this change helps>"
    }
  ],
  "confidence": <number between 0 and 1>,
  "rationale": "<overall explanation>"
}"#;

const FIX_INSTRUCTIONS: &str = r#"You are an expert in debugging and correcting workflows.
Use the workflow definition and the error logs to produce a corrected definition.

Common corrections:
1. HTTP request steps need a timeout (10 to 30 seconds).
2. The workflow must end with an output step (persist or notify).
3. Validation must run before transform.
4. Required parameters must be present.

Always answer with JSON of this shape:
{
  "patched_definition": <complete corrected definition>,
  "notes": ["<change 1>", "<change 2>"]
}"#;

const ESTIMATE_INSTRUCTIONS: &str = r#"You are an expert in workflow performance estimation.
Consider the type and number of operations, dependencies between steps, expensive I/O and the shape of the execution graph.

Always answer with JSON of this shape:
{
  "estimated_time_seconds": <total seconds>,
  "estimated_cost_usd": <total USD>,
  "complexity_score": <number between 0 and 1>,
  "breakdown": [
    { "step_index": <index>, "type": "<step type>", "time": <seconds>, "cost": <USD> }
  ],
  "assumptions": ["<assumption>"],
  "confidence": <number between 0 and 1>
}

Reference rates:
- http-request: 2-5 s, ~$0.0005
- validate-csv: 1-2 s, ~$0.0002
- transform: 1-3 s, ~$0.0002
- persist: 2-4 s, ~$0.0005
- notify: ~0 s, ~$0"#;

fn render_definition(definition: &WorkflowDefinition) -> Result<String> {
    serde_json::to_string_pretty(definition)
        .map_err(|e| AnalysisError::Validation(format!("definition is not serializable: {}", e)))
}

pub struct RemoteProvider<G: TextGenerator> {
    generator: G,
    retry: RetryPolicy,
}

impl<G: TextGenerator> RemoteProvider<G> {
    pub fn new(generator: G, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Generate with retries. Only the generation call is retried.
    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generator.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Generation attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(attempts = attempt, error = %err, "Generation failed on every attempt");
                    return Err(AnalysisError::ProviderCall {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl<G: TextGenerator> AnalysisProvider for RemoteProvider<G> {
    fn name(&self) -> &str {
        "remote"
    }

    async fn suggest(&self, definition: &WorkflowDefinition) -> Result<SuggestionResult> {
        let prompt = format!(
            "{}\n\nReview this workflow and suggest improvements:\n\n{}",
            SUGGEST_INSTRUCTIONS,
            render_definition(definition)?
        );

        let text = self.generate_with_retry(&prompt).await?;
        let reply: SuggestReply = parse_reply(&text)?;

        Ok(SuggestionResult {
            suggested_changes: reply.suggested_changes,
            confidence: clamp_unit(reply.confidence.unwrap_or(REMOTE_DEFAULT_CONFIDENCE)),
            rationale: reply
                .rationale
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| REMOTE_DEFAULT_RATIONALE.to_string()),
        })
    }

    async fn fix(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> Result<FixResult> {
        let lines = normalize_logs(logs);
        let logs_text = if lines.is_empty() {
            "No error logs available.".to_string()
        } else {
            lines.join("\n")
        };

        let prompt = format!(
            "{}\n\nCorrect this workflow:\n\n{}\n\nError logs:\n{}",
            FIX_INSTRUCTIONS,
            render_definition(definition)?,
            logs_text
        );

        let text = self.generate_with_retry(&prompt).await?;
        let reply: FixReply = parse_reply(&text)?;
        reply
            .patched_definition
            .validate()
            .map_err(|e| AnalysisError::ResponseParse(format!("patched definition rejected: {}", e)))?;

        Ok(FixResult {
            patched_definition: reply.patched_definition,
            notes: reply.notes,
        })
    }

    async fn estimate(&self, definition: &WorkflowDefinition) -> Result<Estimate> {
        let prompt = format!(
            "{}\n\nEstimate the performance of this workflow:\n\n{}",
            ESTIMATE_INSTRUCTIONS,
            render_definition(definition)?
        );

        let text = self.generate_with_retry(&prompt).await?;
        let reply: EstimateReply = parse_reply(&text)?;

        let complexity = reply
            .complexity_score
            .unwrap_or_else(|| complexity_score(definition, &GraphAnalyzer::new(definition)));

        Ok(Estimate {
            estimated_time_seconds: non_negative(reply.estimated_time_seconds),
            estimated_cost_usd: non_negative(reply.estimated_cost_usd),
            complexity_score: clamp_unit(complexity),
            breakdown: realign_breakdown(definition, reply.breakdown),
            assumptions: reply.assumptions,
            confidence: clamp_unit(reply.confidence.unwrap_or(REMOTE_DEFAULT_CONFIDENCE)),
        })
    }
}

/// One item per input step, in input order. Items the model skipped are
/// zero-filled; items for steps that do not exist are dropped.
fn realign_breakdown(definition: &WorkflowDefinition, items: Vec<BreakdownReply>) -> Vec<EstimateItem> {
    let dropped = items
        .iter()
        .filter(|item| item.step_index.map_or(true, |idx| idx >= definition.len()))
        .count();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropping breakdown items that match no step");
    }

    definition
        .steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let reported = items.iter().find(|item| item.step_index == Some(idx));
            EstimateItem {
                step_index: idx,
                step_type: step.step_type.clone(),
                time: non_negative(reported.and_then(|item| item.time).unwrap_or(0.0)),
                cost: non_negative(reported.and_then(|item| item.cost).unwrap_or(0.0)),
            }
        })
        .collect()
}
