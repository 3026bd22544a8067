//! Local directory artifact store

use super::ArtifactStore;
use crate::domain::{Result, SweepError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Writes artifacts as files under one directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for LocalFileStore {
    async fn put(&self, name: &str, content: Vec<u8>, _content_type: &str) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(SweepError::Storage(format!("Invalid artifact name: {name:?}")));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            SweepError::Storage(format!(
                "Failed to create directory {}: {e}",
                self.root.display()
            ))
        })?;

        let path = self.root.join(name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    SweepError::Storage(format!("Artifact already exists: {}", path.display()))
                }
                _ => SweepError::Storage(format!("Failed to create {}: {e}", path.display())),
            })?;

        file.write_all(&content).await.map_err(|e| {
            SweepError::Storage(format!("Failed to write {}: {e}", path.display()))
        })?;
        file.flush().await.map_err(|e| {
            SweepError::Storage(format!("Failed to flush {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Artifact written");

        Ok(path.display().to_string())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
