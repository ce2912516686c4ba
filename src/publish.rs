//! Destinations for the rendered page.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::TARGET_STORAGE;

pub const PAGE_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to write {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to upload {location}: {reason}")]
    Upload { location: String, reason: String },
}

/// Somewhere the finished page can be made available.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Store the page, returning where it went.
    async fn publish(&self, page: &[u8]) -> Result<String, PublishError>;
}

/// Writes the page to a file on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    path: PathBuf,
}

impl LocalFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSink for LocalFileSink {
    async fn publish(&self, page: &[u8]) -> Result<String, PublishError> {
        let location = self.path.display().to_string();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PublishError::Io {
                    location: location.clone(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, page)
            .await
            .map_err(|source| PublishError::Io {
                location: location.clone(),
                source,
            })?;

        info!(target: TARGET_STORAGE, "Wrote {} bytes to {}", page.len(), location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_file_sink_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site").join("index.html");

        let location = LocalFileSink::new(&path).publish(b"<html></html>").await.unwrap();
        assert_eq!(location, path.display().to_string());
        assert_eq!(std::fs::read(&path).unwrap(), b"<html></html>");
    }

    #[tokio::test]
    async fn test_local_file_sink_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten with a file.
        let err = LocalFileSink::new(dir.path()).publish(b"x").await.unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }
}
