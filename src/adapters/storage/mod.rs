//! Durable storage for export artifacts
//!
//! Both backends refuse to overwrite an existing artifact, so a name
//! collision surfaces as an error instead of silently replacing an earlier
//! run's export.

pub mod azure_blob;
pub mod local;

pub use azure_blob::AzureBlobStore;
pub use local::LocalFileStore;

use crate::adapters::auth::TokenSource;
use crate::config::{StorageBackend, StorageConfig};
use crate::domain::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Write-once artifact store
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `content` under `name` and return the artifact identifier
    /// (blob URL or file path).
    ///
    /// Fails with [`crate::domain::SweepError::Storage`] if the name is taken
    /// or the write fails.
    async fn put(&self, name: &str, content: Vec<u8>, content_type: &str) -> Result<String>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Create the store selected by `storage.backend`
pub fn create_artifact_store(
    config: &StorageConfig,
    tokens: Arc<dyn TokenSource>,
) -> Result<Arc<dyn ArtifactStore>> {
    let store: Arc<dyn ArtifactStore> = match config.backend {
        StorageBackend::AzureBlob => Arc::new(AzureBlobStore::from_config(config, tokens)?),
        StorageBackend::Local => Arc::new(LocalFileStore::new(
            std::path::Path::new(&config.target).join(&config.container),
        )),
    };

    tracing::info!(
        backend = ?config.backend,
        location = %store.describe(),
        "Artifact store initialized"
    );

    Ok(store)
}
