//! Analysis service: the entry point the HTTP layer and CLI hold
//!
//! Owns one provider and the event bus with its standard observers. Every
//! call validates its input, races the provider against the caller's
//! cancellation token and the configured deadline, then publishes exactly
//! one event: the result on success, an error event otherwise.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::estimator::Estimate;
use crate::fixes::{FixLogs, FixResult};
use crate::graph::{GraphAnalyzer, GraphSummary};
use crate::observers::{
    Alert, AlertObserver, AnalysisEvent, AnalysisObserver, EventBus, LogObserver, MetricsObserver,
    MetricsSnapshot,
};
use crate::optimizer::{OptimizationOutcome, RouteOptimizer};
use crate::provider::{AnalysisProvider, ProviderFactory};
use crate::rules::SuggestionResult;
use crate::types::WorkflowDefinition;

pub struct AnalysisService {
    provider: Arc<dyn AnalysisProvider>,
    bus: EventBus,
    log: Arc<LogObserver>,
    metrics: Arc<MetricsObserver>,
    alerts: Arc<AlertObserver>,
    optimizer: RouteOptimizer,
    call_timeout: Duration,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn AnalysisProvider>, call_timeout: Duration, alert_threshold: u64) -> Self {
        let log = Arc::new(LogObserver::new(false));
        let metrics = Arc::new(MetricsObserver::new());
        let alerts = Arc::new(AlertObserver::new(alert_threshold));

        let bus = EventBus::new();
        bus.attach(log.clone());
        bus.attach(metrics.clone());
        bus.attach(alerts.clone());

        Self {
            provider,
            bus,
            log,
            metrics,
            alerts,
            optimizer: RouteOptimizer::new(),
            call_timeout,
        }
    }

    /// Validate the configuration and build the configured provider
    pub fn from_config(config: AnalysisConfig) -> Result<Self> {
        let config = config.validate()?;
        let provider = ProviderFactory::create(&config)?;
        Ok(Self::new(provider, config.call_timeout(), config.alert_threshold))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Attach an additional observer. Returns false if already attached.
    pub fn attach_observer(&self, observer: Arc<dyn AnalysisObserver>) -> bool {
        self.bus.attach(observer)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        definition: &WorkflowDefinition,
        token: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let outcome = match definition.validate() {
            Err(err) => Err(err),
            Ok(()) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(AnalysisError::Cancelled),
                    result = tokio::time::timeout(self.call_timeout, call) => match result {
                        Ok(inner) => inner,
                        Err(_) => Err(AnalysisError::DeadlineExceeded(self.call_timeout)),
                    },
                }
            }
        };

        match &outcome {
            Ok(_) => tracing::info!(
                operation,
                workflow_id = %definition.workflow_id(),
                provider = self.provider.name(),
                steps = definition.len(),
                "Analysis completed"
            ),
            Err(err) => {
                tracing::warn!(
                    operation,
                    workflow_id = %definition.workflow_id(),
                    provider = self.provider.name(),
                    kind = err.kind(),
                    error = %err,
                    "Analysis call failed"
                );
                self.bus
                    .notify_error(definition.workflow_id(), err.kind(), &err.to_string());
            }
        }
        outcome
    }

    pub async fn suggest(&self, definition: &WorkflowDefinition) -> Result<SuggestionResult> {
        self.suggest_cancellable(definition, &CancellationToken::new()).await
    }

    pub async fn suggest_cancellable(
        &self,
        definition: &WorkflowDefinition,
        token: &CancellationToken,
    ) -> Result<SuggestionResult> {
        let result = self
            .run("suggest", definition, token, self.provider.suggest(definition))
            .await?;
        self.bus
            .notify_suggestion(definition.workflow_id(), &result.suggested_changes);
        Ok(result)
    }

    pub async fn fix(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> Result<FixResult> {
        self.fix_cancellable(definition, logs, &CancellationToken::new()).await
    }

    pub async fn fix_cancellable(
        &self,
        definition: &WorkflowDefinition,
        logs: Option<&FixLogs>,
        token: &CancellationToken,
    ) -> Result<FixResult> {
        let result = self
            .run("fix", definition, token, self.provider.fix(definition, logs))
            .await?;
        self.bus.notify_fix(definition.workflow_id(), &result.notes);
        Ok(result)
    }

    pub async fn estimate(&self, definition: &WorkflowDefinition) -> Result<Estimate> {
        self.estimate_cancellable(definition, &CancellationToken::new()).await
    }

    pub async fn estimate_cancellable(
        &self,
        definition: &WorkflowDefinition,
        token: &CancellationToken,
    ) -> Result<Estimate> {
        let result = self
            .run("estimate", definition, token, self.provider.estimate(definition))
            .await?;
        self.bus.notify_estimate(definition.workflow_id(), &result);
        Ok(result)
    }

    /// Route optimization always runs locally, whatever the provider
    pub fn optimize(&self, definition: &WorkflowDefinition) -> Result<OptimizationOutcome> {
        definition.validate()?;
        Ok(self.optimizer.optimize(definition))
    }

    /// Structural summary under the sequential dependency policy
    pub fn graph(&self, definition: &WorkflowDefinition) -> Result<GraphSummary> {
        definition.validate()?;
        Ok(GraphAnalyzer::new(definition).summary())
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.get_metrics()
    }

    pub fn get_logs(&self) -> Vec<AnalysisEvent> {
        self.log.get_logs()
    }

    pub fn get_alerts(&self) -> Vec<Alert> {
        self.alerts.get_alerts()
    }
}
