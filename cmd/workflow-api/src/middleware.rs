use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::routes::AppState;

// Bearer token check for the analysis routes
pub async fn bearer_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if token.starts_with(state.token_prefix.as_ref()) => Ok(next.run(req).await),
        _ => {
            tracing::debug!(path = %req.uri().path(), "Rejected request without valid bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
