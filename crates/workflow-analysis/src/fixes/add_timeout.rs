//! Add Timeout - Sets a timeout on HTTP request steps that declare none

use super::FixCommand;
use crate::types::WorkflowDefinition;

/// Timeout written by the fix pipeline (seconds)
pub const DEFAULT_FIX_TIMEOUT_SECS: u64 = 10;

pub struct AddTimeoutCommand {
    timeout_secs: u64,
}

impl AddTimeoutCommand {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for AddTimeoutCommand {
    fn default() -> Self {
        Self::new(DEFAULT_FIX_TIMEOUT_SECS)
    }
}

impl FixCommand for AddTimeoutCommand {
    fn execute(&self, definition: &mut WorkflowDefinition) -> Option<String> {
        let mut patched = 0;
        for step in definition.steps.iter_mut() {
            if step.is_http() && !step.has_arg("timeout") {
                step.args.insert("timeout".to_string(), self.timeout_secs.into());
                patched += 1;
            }
        }

        (patched > 0).then(|| {
            format!(
                "Set timeout={} on {} HTTP request step(s).",
                self.timeout_secs, patched
            )
        })
    }

    fn id(&self) -> &str {
        "add_timeout"
    }
}
