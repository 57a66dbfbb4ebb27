//! Analysis events and the bus that fans them out to observers
//!
//! Every public analysis call produces one [`AnalysisEvent`]. The bus hands
//! it to each attached observer synchronously, in attachment order.
//!
//! A failing observer does not stop the broadcast: the failure is logged,
//! counted, and returned to the caller of `notify`, and the remaining
//! observers still receive the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::estimator::Estimate;
use crate::rules::Suggestion;

pub mod alert;
pub mod log;
pub mod metrics;

pub use alert::{Alert, AlertObserver, AlertSeverity, HIGH_COMPLEXITY_THRESHOLD};
pub use log::LogObserver;
pub use metrics::{MetricsObserver, MetricsSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Suggestion,
    Fix,
    Estimate,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Suggestion => "suggestion",
            EventType::Fix => "fix",
            EventType::Estimate => "estimate",
            EventType::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub event_type: EventType,
    pub workflow_id: String,
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisEvent {
    pub fn new(event_type: EventType, workflow_id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type,
            workflow_id: workflow_id.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Error, Debug)]
#[error("Observer '{observer}' failed: {message}")]
pub struct ObserverError {
    pub observer: String,
    pub message: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            message: message.into(),
        }
    }

    /// Failure caused by a poisoned accumulator lock
    pub(crate) fn poisoned(observer: &str) -> Self {
        Self::new(observer, "accumulator lock poisoned")
    }
}

/// Receives every analysis event
pub trait AnalysisObserver: Send + Sync {
    fn name(&self) -> &str;

    fn update(&self, event: &AnalysisEvent) -> Result<(), ObserverError>;
}

/// Ordered, duplicate-free set of observers
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn AnalysisObserver>>>,
    failures: AtomicU64,
}

fn same_observer(a: &Arc<dyn AnalysisObserver>, b: &Arc<dyn AnalysisObserver>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer. Returns false if it was already attached.
    pub fn attach(&self, observer: Arc<dyn AnalysisObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|existing| same_observer(existing, &observer)) {
            return false;
        }
        tracing::debug!(observer = observer.name(), "Observer attached");
        observers.push(observer);
        true
    }

    /// Detach an observer. Returns false if it was not attached.
    pub fn detach(&self, observer: &Arc<dyn AnalysisObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|existing| !same_observer(existing, observer));
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Observer failures seen since the bus was created
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Deliver an event to every observer in attachment order
    pub fn notify(&self, event: &AnalysisEvent) -> Vec<ObserverError> {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut failures = Vec::new();
        for observer in observers {
            if let Err(err) = observer.update(event) {
                tracing::error!(
                    observer = observer.name(),
                    event_type = %event.event_type,
                    workflow_id = %event.workflow_id,
                    error = %err,
                    "Observer failed"
                );
                self.failures.fetch_add(1, Ordering::Relaxed);
                failures.push(err);
            }
        }
        failures
    }

    pub fn notify_suggestion(&self, workflow_id: &str, suggestions: &[Suggestion]) -> Vec<ObserverError> {
        let data = json!({
            "suggestions_count": suggestions.len(),
            "suggestions": suggestions,
        });
        self.notify(&AnalysisEvent::new(EventType::Suggestion, workflow_id, to_map(data)))
    }

    pub fn notify_fix(&self, workflow_id: &str, changes: &[String]) -> Vec<ObserverError> {
        let data = json!({
            "changes_count": changes.len(),
            "changes": changes,
        });
        self.notify(&AnalysisEvent::new(EventType::Fix, workflow_id, to_map(data)))
    }

    pub fn notify_estimate(&self, workflow_id: &str, estimate: &Estimate) -> Vec<ObserverError> {
        let data = serde_json::to_value(estimate).unwrap_or(Value::Null);
        self.notify(&AnalysisEvent::new(EventType::Estimate, workflow_id, to_map(data)))
    }

    pub fn notify_error(&self, workflow_id: &str, kind: &str, message: &str) -> Vec<ObserverError> {
        let data = json!({
            "error": message,
            "kind": kind,
        });
        self.notify(&AnalysisEvent::new(EventType::Error, workflow_id, to_map(data)))
    }
}
