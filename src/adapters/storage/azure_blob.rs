//! Azure Blob Storage artifact store
//!
//! Uploads go through the Blob service REST API as a single `Put Blob`
//! request with `If-None-Match: *`, so an existing blob is never replaced.

use super::ArtifactStore;
use crate::adapters::auth::{TokenSource, STORAGE_SCOPE};
use crate::config::StorageConfig;
use crate::domain::{Result, SweepError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Blob service REST API version sent with every request
pub const BLOB_API_VERSION: &str = "2021-08-06";

/// How uploads are authorized
#[derive(Clone)]
pub enum BlobAuth {
    /// Azure AD bearer token for the storage scope
    Token(Arc<dyn TokenSource>),
    /// Shared access signature query string (without the leading `?`)
    Sas(String),
}

/// Writes artifacts as block blobs in one container
pub struct AzureBlobStore {
    endpoint: Url,
    container: String,
    auth: BlobAuth,
    http_client: reqwest::Client,
}

impl AzureBlobStore {
    /// Create a store for `endpoint` (`https://<account>.blob.core.windows.net`)
    pub fn new(endpoint: &str, container: &str, auth: BlobAuth) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint).map_err(|e| {
            SweepError::Configuration(format!("Invalid storage endpoint '{endpoint}': {e}"))
        })?;
        endpoint.set_query(None);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                SweepError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint,
            container: container.trim_matches('/').to_string(),
            auth,
            http_client,
        })
    }

    /// Create from the `[storage]` section.
    ///
    /// A SAS token, either configured explicitly or carried as the query
    /// string of `storage.target`, takes precedence over Azure AD.
    pub fn from_config(config: &StorageConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let target_sas = Url::parse(&config.target)
            .ok()
            .and_then(|url| url.query().map(str::to_string))
            .filter(|q| !q.is_empty());

        let auth = match (&config.sas_token, target_sas) {
            (Some(sas), _) => BlobAuth::Sas(
                sas.expose_secret()
                    .as_str()
                    .trim_start_matches('?')
                    .to_string(),
            ),
            (None, Some(sas)) => BlobAuth::Sas(sas),
            (None, None) => BlobAuth::Token(tokens),
        };

        Self::new(&config.target, &config.container, auth)
    }

    /// Blob URL for `name`, without any SAS query
    pub fn blob_url(&self, name: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SweepError::Configuration(format!(
                    "Storage endpoint cannot be a base URL: {}",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .push(&self.container)
            .push(name);
        Ok(url)
    }
}

#[async_trait]
impl ArtifactStore for AzureBlobStore {
    async fn put(&self, name: &str, content: Vec<u8>, content_type: &str) -> Result<String> {
        let blob_url = self.blob_url(name)?;
        let size = content.len();

        let mut request_url = blob_url.clone();
        let mut bearer = None;
        match &self.auth {
            BlobAuth::Sas(sas) => request_url.set_query(Some(sas)),
            BlobAuth::Token(tokens) => bearer = Some(tokens.token(STORAGE_SCOPE).await?),
        }

        let mut request = self
            .http_client
            .put(request_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", BLOB_API_VERSION)
            .header(
                "x-ms-date",
                Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            )
            .header("If-None-Match", "*")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SweepError::Storage(format!("Blob upload request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(blob = %blob_url, bytes = size, "Blob uploaded");
            return Ok(blob_url.to_string());
        }

        let body = response.text().await.unwrap_or_default();
        let message = match status {
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                format!("Artifact already exists: {blob_url}")
            }
            _ => format!("Blob upload failed with {status}: {body}"),
        };
        Err(SweepError::Storage(message))
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), self.container)
    }
}
