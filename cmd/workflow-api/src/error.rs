use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use workflow_analysis::AnalysisError;

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub AnalysisError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AnalysisError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::ProviderCall { .. } | AnalysisError::ResponseParse(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "Analysis request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use workflow_analysis::GenerationError;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AnalysisError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnalysisError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AnalysisError::ProviderCall {
                    attempts: 3,
                    source: GenerationError::EmptyResponse,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (AnalysisError::ResponseParse("x".into()), StatusCode::BAD_GATEWAY),
            (AnalysisError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (
                AnalysisError::DeadlineExceeded(Duration::from_secs(1)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
