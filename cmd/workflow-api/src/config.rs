use anyhow::{Context, Result};
use std::env;
use workflow_analysis::AnalysisConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    /// Bearer tokens must start with this prefix
    pub token_prefix: String,
    /// Requests handled at once across all routes
    pub max_concurrency: usize,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8090".to_string())
                .parse()
                .context("PORT must be a valid number")?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            token_prefix: env::var("API_TOKEN_PREFIX").unwrap_or_else(|_| "mock-".to_string()),

            max_concurrency: env::var("MAX_CONCURRENCY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .context("MAX_CONCURRENCY must be a valid number")?,

            analysis: AnalysisConfig::from_env()
                .validate()
                .context("Invalid analysis configuration")?,
        })
    }
}
