//! Raises alerts on repeated errors and on high-complexity estimates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::{AnalysisEvent, AnalysisObserver, EventType, ObserverError};

/// Estimates with a complexity score above this raise a medium alert
pub const HIGH_COMPLEXITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
    pub workflow_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct AlertState {
    error_count: u64,
    alerts: Vec<Alert>,
}

pub struct AlertObserver {
    threshold: u64,
    state: Mutex<AlertState>,
}

impl AlertObserver {
    /// `threshold` errors, counted since creation or the last `clear`, start raising high alerts
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            state: Mutex::new(AlertState::default()),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn get_alerts(&self) -> Vec<Alert> {
        match self.state.lock() {
            Ok(state) => state.alerts.clone(),
            Err(poisoned) => poisoned.into_inner().alerts.clone(),
        }
    }

    pub fn error_count(&self) -> u64 {
        self.state.lock().map(|state| state.error_count).unwrap_or(0)
    }

    /// Drop recorded alerts and restart the error count
    pub fn clear(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.alerts.clear();
        state.error_count = 0;
    }
}

impl Default for AlertObserver {
    fn default() -> Self {
        Self::new(5)
    }
}

fn is_error(event: &AnalysisEvent) -> bool {
    event.event_type == EventType::Error || event.data.contains_key("error")
}

impl AnalysisObserver for AlertObserver {
    fn name(&self) -> &str {
        "alert"
    }

    fn update(&self, event: &AnalysisEvent) -> Result<(), ObserverError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ObserverError::poisoned(self.name()))?;

        if is_error(event) {
            state.error_count += 1;
            if state.error_count >= self.threshold {
                let message = format!("High error rate detected: {} errors", state.error_count);
                tracing::warn!(workflow_id = %event.workflow_id, errors = state.error_count, "{}", message);
                state.alerts.push(Alert {
                    severity: AlertSeverity::High,
                    message,
                    workflow_id: event.workflow_id.clone(),
                    timestamp: Utc::now(),
                });
            }
        }

        if event.event_type == EventType::Estimate {
            let complexity = event
                .data
                .get("complexity_score")
                .and_then(|value| value.as_f64())
                .unwrap_or(0.0);
            if complexity > HIGH_COMPLEXITY_THRESHOLD {
                state.alerts.push(Alert {
                    severity: AlertSeverity::Medium,
                    message: format!("High complexity workflow detected: {:.2}", complexity),
                    workflow_id: event.workflow_id.clone(),
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn event(event_type: EventType, data: Value) -> AnalysisEvent {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        AnalysisEvent::new(event_type, "wf", data)
    }

    #[test]
    fn test_error_threshold() {
        let observer = AlertObserver::new(2);
        observer
            .update(&event(EventType::Error, json!({"error": "x"})))
            .unwrap();
        assert!(observer.get_alerts().is_empty());

        observer
            .update(&event(EventType::Error, json!({"error": "y"})))
            .unwrap();
        observer
            .update(&event(EventType::Error, json!({"error": "z"})))
            .unwrap();

        let alerts = observer.get_alerts();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.severity == AlertSeverity::High));
        assert_eq!(observer.error_count(), 3);
    }

    #[test]
    fn test_high_complexity_estimate() {
        let observer = AlertObserver::default();
        observer
            .update(&event(EventType::Estimate, json!({"complexity_score": 0.8})))
            .unwrap();
        assert!(observer.get_alerts().is_empty());

        observer
            .update(&event(EventType::Estimate, json!({"complexity_score": 0.95})))
            .unwrap();
        let alerts = observer.get_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);

        observer.clear();
        assert!(observer.get_alerts().is_empty());
    }

    #[test]
    fn test_non_error_events_do_not_count() {
        let observer = AlertObserver::new(1);
        observer
            .update(&event(EventType::Fix, json!({"changes_count": 1})))
            .unwrap();
        assert_eq!(observer.error_count(), 0);
        assert!(observer.get_alerts().is_empty());
    }

    #[test]
    fn test_clear_restarts_error_count() {
        let observer = AlertObserver::new(3);
        for _ in 0..2 {
            observer
                .update(&event(EventType::Error, json!({"error": "x"})))
                .unwrap();
        }
        assert_eq!(observer.error_count(), 2);

        observer.clear();
        assert_eq!(observer.error_count(), 0);

        observer
            .update(&event(EventType::Error, json!({"error": "y"})))
            .unwrap();
        assert_eq!(observer.error_count(), 1);
        assert!(observer.get_alerts().is_empty());
    }
}
