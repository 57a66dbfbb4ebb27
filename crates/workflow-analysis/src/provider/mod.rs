//! Interchangeable analysis backends
//!
//! Every backend answers the same three questions about a definition and
//! returns the same result types, so callers never branch on which one is
//! active. [`factory::ProviderFactory`] picks the backend from configuration.

use async_trait::async_trait;

use crate::error::Result;
use crate::estimator::Estimate;
use crate::fixes::{FixLogs, FixResult};
use crate::rules::SuggestionResult;
use crate::types::WorkflowDefinition;

pub mod factory;
pub mod gemini;
pub mod local;
pub mod remote;

pub use factory::{ProviderFactory, ProviderKind};
pub use gemini::{GeminiClient, TextGenerator};
pub use local::LocalProvider;
pub use remote::{RemoteProvider, RetryPolicy};

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name, as listed by the factory
    fn name(&self) -> &str;

    async fn suggest(&self, definition: &WorkflowDefinition) -> Result<SuggestionResult>;

    async fn fix(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> Result<FixResult>;

    async fn estimate(&self, definition: &WorkflowDefinition) -> Result<Estimate>;
}
