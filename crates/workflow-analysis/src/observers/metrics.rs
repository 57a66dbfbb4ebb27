//! Running counters over analysis events

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::{AnalysisEvent, AnalysisObserver, EventType, ObserverError};

/// Point-in-time view of the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_events: u64,
    pub events_by_type: BTreeMap<String, u64>,
    /// Distinct workflow ids seen
    pub workflows_processed: usize,
    pub suggestions_made: u64,
    pub fixes_applied: u64,
    pub estimates_requested: u64,
    pub errors_recorded: u64,
}

#[derive(Default)]
struct MetricsState {
    total_events: u64,
    events_by_type: BTreeMap<String, u64>,
    workflows: HashSet<String>,
    suggestions_made: u64,
    fixes_applied: u64,
    estimates_requested: u64,
    errors_recorded: u64,
}

#[derive(Default)]
pub struct MetricsObserver {
    state: Mutex<MetricsState>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        MetricsSnapshot {
            total_events: state.total_events,
            events_by_type: state.events_by_type.clone(),
            workflows_processed: state.workflows.len(),
            suggestions_made: state.suggestions_made,
            fixes_applied: state.fixes_applied,
            estimates_requested: state.estimates_requested,
            errors_recorded: state.errors_recorded,
        }
    }

    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = MetricsState::default();
        }
    }
}

impl AnalysisObserver for MetricsObserver {
    fn name(&self) -> &str {
        "metrics"
    }

    fn update(&self, event: &AnalysisEvent) -> Result<(), ObserverError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ObserverError::poisoned(self.name()))?;

        state.total_events += 1;
        *state
            .events_by_type
            .entry(event.event_type.to_string())
            .or_insert(0) += 1;
        state.workflows.insert(event.workflow_id.clone());

        match event.event_type {
            EventType::Suggestion => state.suggestions_made += 1,
            EventType::Fix => state.fixes_applied += 1,
            EventType::Estimate => state.estimates_requested += 1,
            EventType::Error => state.errors_recorded += 1,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn event(event_type: EventType, workflow_id: &str) -> AnalysisEvent {
        AnalysisEvent::new(event_type, workflow_id, Map::new())
    }

    #[test]
    fn test_counts_by_category() {
        let metrics = MetricsObserver::new();
        metrics.update(&event(EventType::Suggestion, "a")).unwrap();
        metrics.update(&event(EventType::Suggestion, "b")).unwrap();
        metrics.update(&event(EventType::Fix, "a")).unwrap();
        metrics.update(&event(EventType::Estimate, "c")).unwrap();

        let snapshot = metrics.get_metrics();
        assert_eq!(snapshot.total_events, 4);
        assert_eq!(snapshot.workflows_processed, 3);
        assert_eq!(snapshot.suggestions_made, 2);
        assert_eq!(snapshot.fixes_applied, 1);
        assert_eq!(snapshot.estimates_requested, 1);
        assert_eq!(snapshot.events_by_type["suggestion"], 2);
    }

    #[test]
    fn test_reset() {
        let metrics = MetricsObserver::new();
        metrics.update(&event(EventType::Error, "a")).unwrap();
        metrics.reset();
        assert_eq!(metrics.get_metrics(), MetricsSnapshot::default());
    }
}
