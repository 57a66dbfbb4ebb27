use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Thin client for the workflow analysis API
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: String,
}

/// Error body the API returns on every non-2xx response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    kind: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        // Remote analyses can take several model round-trips
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send(self.http.get(self.url(path))).await
    }

    pub async fn post<T: Serialize, R: DeserializeOwned>(&self, path: &str, body: &T) -> Result<R> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{}", describe_failure(status.as_u16(), &text));
        }

        response.json().await.context("Failed to parse response")
    }
}

fn describe_failure(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error, kind: Some(kind) }) => format!("API error ({}, {}): {}", status, kind, error),
        Ok(ErrorBody { error, kind: None }) => format!("API error ({}): {}", status, error),
        Err(_) if body.is_empty() => format!("API error ({})", status),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}
