/// Configuration for the analysis engine
/// Loads from environment variables with validation and defaults

use std::env;
use std::time::Duration;

use crate::error::{AnalysisError, Result};

pub const DEFAULT_PROVIDER: &str = "local";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Environment Variable Helpers
// ============================================================================

fn get_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn get_u32(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn get_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    // Provider selection
    pub provider: String,

    // Remote provider
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub retry_base_ms: u64,

    // Service
    pub call_timeout_secs: u64,
    pub alert_threshold: u64,
}

impl AnalysisConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            provider: get_string(&lookup, "IA_PROVIDER", DEFAULT_PROVIDER),
            api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            model: get_string(&lookup, "GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            base_url: get_string(&lookup, "GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            max_retries: get_u32(&lookup, "IA_MAX_RETRIES", 3),
            retry_base_ms: get_u64(&lookup, "IA_RETRY_BASE_MS", 1000),
            call_timeout_secs: get_u64(&lookup, "IA_CALL_TIMEOUT_SECS", 60),
            alert_threshold: get_u64(&lookup, "IA_ALERT_THRESHOLD", 5),
        }
    }

    /// Create config with default values
    pub fn with_defaults() -> Self {
        Self::from_lookup(|_| None)
    }

    /// Validate configuration values
    pub fn validate(self) -> Result<Self> {
        if self.max_retries == 0 {
            return Err(AnalysisError::Configuration(
                "IA_MAX_RETRIES must be at least 1".to_string(),
            ));
        }

        if self.call_timeout_secs == 0 {
            return Err(AnalysisError::Configuration(
                "IA_CALL_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        if self.alert_threshold == 0 {
            return Err(AnalysisError::Configuration(
                "IA_ALERT_THRESHOLD must be at least 1".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}
