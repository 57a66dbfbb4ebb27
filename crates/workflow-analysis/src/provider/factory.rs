//! Resolve the active provider from configuration

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::gemini::GeminiClient;
use super::local::LocalProvider;
use super::remote::{RemoteProvider, RetryPolicy};
use super::AnalysisProvider;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Deterministic rules engine
    Local,
    /// Gemini-backed model
    Remote,
}

impl ProviderKind {
    /// Canonical name, equal to the built provider's `name()`
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Remote => "remote",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" | "mock" | "rules" => Ok(ProviderKind::Local),
            "gemini" | "remote" => Ok(ProviderKind::Remote),
            other => Err(AnalysisError::Configuration(format!(
                "Unknown provider type '{}'. Available: {}",
                other,
                ProviderFactory::available_providers().join(", ")
            ))),
        }
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    /// Names accepted by `IA_PROVIDER`
    pub fn available_providers() -> Vec<&'static str> {
        vec!["local", "mock", "rules", "gemini", "remote"]
    }

    pub fn create(config: &AnalysisConfig) -> Result<Arc<dyn AnalysisProvider>, AnalysisError> {
        let kind: ProviderKind = config.provider.parse()?;
        Self::create_kind(kind, config)
    }

    pub fn create_kind(
        kind: ProviderKind,
        config: &AnalysisConfig,
    ) -> Result<Arc<dyn AnalysisProvider>, AnalysisError> {
        let provider: Arc<dyn AnalysisProvider> = match kind {
            ProviderKind::Local => Arc::new(LocalProvider::new()),
            ProviderKind::Remote => {
                let client = GeminiClient::from_config(config)?;
                let retry = RetryPolicy::new(config.max_retries, config.retry_base_delay());
                Arc::new(RemoteProvider::new(client, retry))
            }
        };

        tracing::info!(provider = provider.name(), kind = %kind, "Analysis provider created");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("mock".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert_eq!("RULES".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert_eq!("".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert_eq!(" gemini ".parse::<ProviderKind>().unwrap(), ProviderKind::Remote);
        assert_eq!("remote".parse::<ProviderKind>().unwrap(), ProviderKind::Remote);
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let config = AnalysisConfig {
            provider: "openai".to_string(),
            ..AnalysisConfig::with_defaults()
        };
        match ProviderFactory::create(&config) {
            Err(AnalysisError::Configuration(message)) => assert!(message.contains("openai")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unknown provider accepted"),
        }
    }

    #[test]
    fn test_default_is_local() {
        let provider = ProviderFactory::create(&AnalysisConfig::with_defaults()).unwrap();
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn test_remote_requires_api_key() {
        let config = AnalysisConfig {
            provider: "gemini".to_string(),
            ..AnalysisConfig::with_defaults()
        };
        assert!(matches!(
            ProviderFactory::create(&config),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn test_remote_with_key() {
        let config = AnalysisConfig {
            provider: "gemini".to_string(),
            api_key: Some("key".to_string()),
            ..AnalysisConfig::with_defaults()
        };
        let provider = ProviderFactory::create(&config).unwrap();
        assert_eq!(provider.name(), "remote");
    }

    #[test]
    fn test_kind_name_matches_provider_name() {
        let config = AnalysisConfig {
            api_key: Some("key".to_string()),
            ..AnalysisConfig::with_defaults()
        };
        for kind in [ProviderKind::Local, ProviderKind::Remote] {
            let provider = ProviderFactory::create_kind(kind, &config).unwrap();
            assert_eq!(provider.name(), kind.as_str());
            assert_eq!(kind.to_string(), kind.as_str());
            assert!(ProviderFactory::available_providers().contains(&kind.as_str()));
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
    }
}
