//! Workflow Analysis - core library
//!
//! Treats a workflow's ordered step list as a small dependency graph and
//! answers three questions about it: what could be improved (suggest),
//! what a corrected version looks like (fix), and what it will cost to run
//! (estimate). The answers come from an interchangeable provider: the
//! deterministic local engine or a remote text-generation model.
//!
//! # Example
//! ```no_run
//! use workflow_analysis::{AnalysisConfig, AnalysisService, Step, WorkflowDefinition};
//!
//! # async fn run() -> workflow_analysis::Result<()> {
//! let service = AnalysisService::from_config(AnalysisConfig::from_env())?;
//! let definition = WorkflowDefinition::new(vec![
//!     Step::new("http-request").with_arg("url", "https://example.com/data.csv"),
//!     Step::new("transform"),
//! ]);
//! let suggestions = service.suggest(&definition).await?;
//! println!("{} suggestion(s)", suggestions.suggested_changes.len());
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod estimator;
pub mod fixes;
pub mod graph;
pub mod observers;
pub mod optimizer;
pub mod provider;
pub mod rules;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use config::AnalysisConfig;
pub use error::{AnalysisError, GenerationError, Result};
pub use estimator::{CostEstimator, Estimate, EstimateItem};
pub use fixes::{FixCommand, FixLogs, FixPipeline, FixResult};
pub use graph::{AdjacencyPolicy, ExplicitEdges, GraphAnalyzer, GraphSummary, SequentialPolicy};
pub use observers::{AnalysisEvent, AnalysisObserver, EventBus, EventType};
pub use optimizer::{OptimizationOutcome, OptimizationReport, RouteOptimizer};
pub use provider::{AnalysisProvider, LocalProvider, ProviderFactory, ProviderKind, RemoteProvider};
pub use rules::{RuleEngine, Suggestion, SuggestionOp, SuggestionResult, SuggestionRule};
pub use service::AnalysisService;
pub use types::{Step, StepKind, WorkflowDefinition};
