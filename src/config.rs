//! Run configuration: which feeds to read and which phrases to look for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::TARGET_PIPELINE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub urls: Vec<String>,
    pub phrases: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("configuration unavailable from {location}: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("invalid configuration from {location}: {source}")]
    Invalid {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Configuration {
    /// Parse the JSON document `{"urls": [...], "phrases": [...]}`. Both fields
    /// are required; other fields are ignored.
    pub fn from_json(bytes: &[u8], location: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_slice(bytes).map_err(|source| ConfigurationError::Invalid {
            location: location.to_string(),
            source,
        })
    }
}

/// Where a run gets its configuration from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn load(&self) -> Result<Configuration, ConfigurationError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Configuration read from a JSON file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileConfig {
    path: PathBuf,
}

impl LocalFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for LocalFileConfig {
    async fn load(&self) -> Result<Configuration, ConfigurationError> {
        let location = self.describe();
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            ConfigurationError::Unavailable {
                location: location.clone(),
                reason: err.to_string(),
            }
        })?;

        let config = Configuration::from_json(&bytes, &location)?;
        info!(
            target: TARGET_PIPELINE,
            "Loaded configuration from {}: {} urls, {} phrases",
            location,
            config.urls.len(),
            config.phrases.len()
        );
        Ok(config)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed configuration, for callers that already have one in hand.
#[async_trait]
impl ConfigSource for Configuration {
    async fn load(&self) -> Result<Configuration, ConfigurationError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "in-memory configuration".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_configuration() {
        let config = Configuration::from_json(
            br#"{"urls": ["https://a.example/rss"], "phrases": ["Acquisition"], "comment": "ignored"}"#,
            "test",
        )
        .unwrap();
        assert_eq!(config.urls, vec!["https://a.example/rss"]);
        assert_eq!(config.phrases, vec!["Acquisition"]);
    }

    #[test]
    fn test_empty_lists_are_valid() {
        let config = Configuration::from_json(br#"{"urls": [], "phrases": []}"#, "test").unwrap();
        assert!(config.urls.is_empty());
        assert!(config.phrases.is_empty());
    }

    #[test]
    fn test_missing_or_malformed_fields_are_rejected() {
        for body in [
            r#"{"urls": []}"#,
            r#"{"phrases": []}"#,
            r#"{"urls": "https://a.example", "phrases": []}"#,
            r#"{"urls": [1, 2], "phrases": []}"#,
            r#"not json"#,
            "",
        ] {
            let err = Configuration::from_json(body.as_bytes(), "test").unwrap_err();
            assert!(matches!(err, ConfigurationError::Invalid { .. }), "{}", body);
        }
    }

    #[tokio::test]
    async fn test_local_file_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"urls": ["https://a.example/rss"], "phrases": ["X"]}}"#).unwrap();

        let config = LocalFileConfig::new(file.path()).load().await.unwrap();
        assert_eq!(config.urls.len(), 1);
        assert_eq!(config.phrases, vec!["X"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileConfig::new(dir.path().join("missing.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Unavailable { .. }));
    }
}
