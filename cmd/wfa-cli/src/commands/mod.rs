pub mod analyze;
pub mod metrics;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use workflow_analysis::{
    observers::MetricsSnapshot, AnalysisService, Estimate, FixLogs, FixResult, GraphSummary,
    OptimizationOutcome, SuggestionResult, WorkflowDefinition,
};

use crate::client::ApiClient;

/// Where analyses run: in this process or on the API service
pub enum Backend {
    Local(AnalysisService),
    Remote(ApiClient),
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    definition: &'a WorkflowDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<&'a FixLogs>,
}

impl Backend {
    pub fn describe(&self) -> String {
        match self {
            Backend::Local(service) => format!("local ({})", service.provider_name()),
            Backend::Remote(client) => client.base_url().to_string(),
        }
    }

    async fn post<R: serde::de::DeserializeOwned>(
        client: &ApiClient,
        path: &str,
        definition: &WorkflowDefinition,
        logs: Option<&FixLogs>,
    ) -> Result<R> {
        client.post(path, &AnalysisRequest { definition, logs }).await
    }

    pub async fn suggest(&self, definition: &WorkflowDefinition) -> Result<SuggestionResult> {
        match self {
            Backend::Local(service) => Ok(service.suggest(definition).await?),
            Backend::Remote(client) => Self::post(client, "/ia/suggestion", definition, None).await,
        }
    }

    pub async fn fix(&self, definition: &WorkflowDefinition, logs: Option<&FixLogs>) -> Result<FixResult> {
        match self {
            Backend::Local(service) => Ok(service.fix(definition, logs).await?),
            Backend::Remote(client) => Self::post(client, "/ia/fix", definition, logs).await,
        }
    }

    pub async fn estimate(&self, definition: &WorkflowDefinition) -> Result<Estimate> {
        match self {
            Backend::Local(service) => Ok(service.estimate(definition).await?),
            Backend::Remote(client) => Self::post(client, "/ia/estimate", definition, None).await,
        }
    }

    pub async fn optimize(&self, definition: &WorkflowDefinition) -> Result<OptimizationOutcome> {
        match self {
            Backend::Local(service) => Ok(service.optimize(definition)?),
            Backend::Remote(client) => Self::post(client, "/ia/optimize", definition, None).await,
        }
    }

    pub async fn graph(&self, definition: &WorkflowDefinition) -> Result<GraphSummary> {
        match self {
            Backend::Local(service) => Ok(service.graph(definition)?),
            Backend::Remote(client) => Self::post(client, "/ia/graph", definition, None).await,
        }
    }

    pub async fn metrics(&self) -> Result<MetricsSnapshot> {
        match self {
            Backend::Local(service) => Ok(service.get_metrics()),
            Backend::Remote(client) => client.get("/ia/metrics").await,
        }
    }
}

/// Read a workflow file. Accepts either a bare definition or a request
/// body of the form `{"name": ..., "definition": {...}}`.
pub fn load_definition(path: &Path) -> Result<WorkflowDefinition> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let (name, body) = match value {
        Value::Object(mut map) if map.contains_key("definition") => {
            let name = map.get("name").and_then(Value::as_str).map(str::to_string);
            (name, map.remove("definition").unwrap_or_default())
        }
        other => (None, other),
    };

    let mut definition: WorkflowDefinition = serde_json::from_value(body)
        .with_context(|| format!("{} is not a workflow definition", path.display()))?;
    if definition.name.is_none() {
        definition.name = name;
    }
    Ok(definition)
}

/// Read fix logs: a JSON array of entries, or plain text one line per entry
pub fn load_logs(path: &Path) -> Result<FixLogs> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(entries) => Ok(FixLogs::Entries(entries)),
        Err(_) => Ok(FixLogs::Text(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_bare_definition() {
        let file = write_temp(r#"{"name": "orders", "steps": [{"type": "transform"}]}"#);
        let definition = load_definition(file.path()).unwrap();
        assert_eq!(definition.name.as_deref(), Some("orders"));
        assert_eq!(definition.steps.len(), 1);
    }

    #[test]
    fn test_load_request_body() {
        let file = write_temp(
            r#"{"name": "etl", "definition": {"steps": [{"type": "persist", "args": {"table": "t"}}]}}"#,
        );
        let definition = load_definition(file.path()).unwrap();
        assert_eq!(definition.workflow_id(), "etl");
        assert_eq!(definition.steps[0].step_type, "persist");
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let file = write_temp("not json");
        let err = load_definition(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_load_logs_text_and_list() {
        let text = write_temp("validation failed\nrow 3 malformed\n");
        assert_eq!(load_logs(text.path()).unwrap().lines().len(), 2);

        let list = write_temp(r#"["timeout", {"code": 504}]"#);
        match load_logs(list.path()).unwrap() {
            FixLogs::Entries(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected entries, got {other:?}"),
        }
    }
}
