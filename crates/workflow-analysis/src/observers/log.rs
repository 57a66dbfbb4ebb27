//! Records every event in arrival order

use std::sync::Mutex;

use super::{AnalysisEvent, AnalysisObserver, ObserverError};

pub struct LogObserver {
    verbose: bool,
    entries: Mutex<Vec<AnalysisEvent>>,
}

impl LogObserver {
    /// With `verbose`, each event is also written to the tracing output at debug level
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of recorded events, oldest first
    pub fn get_logs(&self) -> Vec<AnalysisEvent> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AnalysisObserver for LogObserver {
    fn name(&self) -> &str {
        "log"
    }

    fn update(&self, event: &AnalysisEvent) -> Result<(), ObserverError> {
        if self.verbose {
            tracing::debug!(
                event_type = %event.event_type,
                workflow_id = %event.workflow_id,
                "Analysis event"
            );
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ObserverError::poisoned(self.name()))?;
        entries.push(event.clone());
        Ok(())
    }
}
