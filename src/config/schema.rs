//! Configuration schema types
//!
//! Every section has defaults so a deployment can run from environment
//! variables alone; `validate` enforces what must be supplied.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Durable storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Azure Blob Storage (REST, block blobs)
    #[default]
    AzureBlob,
    /// Local directory, for development and tests
    Local,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure_blob" | "azureblob" | "blob" => Ok(StorageBackend::AzureBlob),
            "local" => Ok(StorageBackend::Local),
            other => Err(format!(
                "Invalid storage backend '{other}'. Must be one of: azure_blob, local"
            )),
        }
    }
}

/// Root configuration
///
/// Loaded once per process and shared read-only behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SweepConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Client-credential identity used for every Azure AD token
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Dataverse Web API settings
    #[serde(default)]
    pub dataverse: DataverseConfig,

    /// Batching and concurrency
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Per-batch retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Export artifact destination
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP trigger
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SweepConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.identity.validate()?;
        self.dataverse.validate()?;
        self.processing.validate()?;
        self.retry.validate()?;
        self.storage.validate()?;
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Azure AD client-credential identity
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Azure AD tenant ID
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// App registration client ID
    #[serde(default)]
    pub client_id: Option<String>,

    /// App registration client secret
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// Pre-issued bearer token; replaces the client-credential exchange.
    /// Intended for local development against a stub upstream.
    #[serde(default)]
    pub static_token: Option<SecretString>,
}

impl IdentityConfig {
    /// Whether a fixed token is configured instead of client credentials
    pub fn uses_static_token(&self) -> bool {
        self.static_token.is_some()
    }

    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if let Some(token) = &self.static_token {
            if token.expose_secret().is_empty() {
                return Err("identity.static_token cannot be empty when set".to_string());
            }
            return Ok(());
        }

        if self.tenant_id.as_deref().map(str::is_empty).unwrap_or(true) {
            return Err("identity.tenant_id is required".to_string());
        }
        if self.client_id.as_deref().map(str::is_empty).unwrap_or(true) {
            return Err("identity.client_id is required".to_string());
        }
        if self
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret().is_empty())
            .unwrap_or(true)
        {
            return Err("identity.client_secret is required".to_string());
        }
        Ok(())
    }
}

/// Dataverse Web API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataverseConfig {
    /// Organization URL, e.g. `https://contoso.crm.dynamics.com`
    #[serde(default)]
    pub base_url: String,

    /// Web API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum records per ID page (`Prefer: odata.maxpagesize`)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Column holding the processed marker
    #[serde(default = "default_processed_field")]
    pub processed_field: String,

    /// Value written to the processed marker on write-back
    #[serde(default = "default_processed_value")]
    pub processed_value: String,

    /// Column exported as "Due Date"
    #[serde(default = "default_due_date_field")]
    pub due_date_field: String,

    /// OData filter selecting unprocessed accounts.
    /// Defaults to `<processed_field> eq null`.
    #[serde(default)]
    pub unprocessed_filter: Option<String>,
}

impl DataverseConfig {
    /// Effective filter for the ID query
    pub fn effective_filter(&self) -> String {
        self.unprocessed_filter
            .clone()
            .unwrap_or_else(|| format!("{} eq null", self.processed_field))
    }

    /// Web API root, e.g. `https://contoso.crm.dynamics.com/api/data/v9.2`
    pub fn api_root(&self) -> String {
        format!(
            "{}/api/data/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Token scope for the organization
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.base_url.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("dataverse.base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("dataverse.base_url must start with http:// or https://".to_string());
        }
        if self.page_size == 0 || self.page_size > 5000 {
            return Err(format!(
                "dataverse.page_size must be between 1 and 5000, got {}",
                self.page_size
            ));
        }
        if self.processed_field.trim().is_empty() {
            return Err("dataverse.processed_field cannot be empty".to_string());
        }
        if self.due_date_field.trim().is_empty() {
            return Err("dataverse.due_date_field cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for DataverseConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: default_api_version(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout_seconds(),
            processed_field: default_processed_field(),
            processed_value: default_processed_value(),
            due_date_field: default_due_date_field(),
            unprocessed_filter: None,
        }
    }
}

/// Batching and concurrency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Record IDs per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrency ceiling for batch units
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    /// Pause after each batch before its slot is released
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,
}

impl ProcessingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(format!(
                "processing.batch_size must be between 1 and 1000, got {}",
                self.batch_size
            ));
        }
        if self.max_concurrent_batches == 0 || self.max_concurrent_batches > 52 {
            return Err(format!(
                "processing.max_concurrent_batches must be between 1 and 52, got {}",
                self.max_concurrent_batches
            ));
        }
        Ok(())
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            pacing_delay_ms: default_pacing_delay_ms(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries beyond the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential backoff; the n-th retry waits `base^n` seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base: u32,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_base == 0 {
            return Err("retry.backoff_base must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
        }
    }
}

/// Export artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// Blob service endpoint (`https://<account>.blob.core.windows.net`)
    /// or, for the local backend, the root directory
    #[serde(default)]
    pub target: String,

    /// Blob container, or sub-directory for the local backend
    #[serde(default = "default_container")]
    pub container: String,

    /// Optional SAS token; when set, uploads skip Azure AD
    #[serde(default)]
    pub sas_token: Option<SecretString>,

    /// Artifact name prefix
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.target.is_empty() {
            return Err("storage.target cannot be empty".to_string());
        }
        if self.backend == StorageBackend::AzureBlob && !self.target.starts_with("https://") {
            return Err("storage.target must start with https:// for azure_blob".to_string());
        }
        if self.container.is_empty() {
            return Err("storage.container cannot be empty".to_string());
        }
        if self.artifact_prefix.is_empty()
            || self.artifact_prefix.contains(['/', '\\'])
        {
            return Err(format!(
                "storage.artifact_prefix must be a non-empty name without path separators, got '{}'",
                self.artifact_prefix
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            target: String::new(),
            container: default_container(),
            sas_token: None,
            artifact_prefix: default_artifact_prefix(),
        }
    }
}

/// HTTP trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl ServerConfig {
    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        self.bind_address
            .parse()
            .map_err(|e| format!("Invalid server.bind_address '{}': {e}", self.bind_address))
    }

    fn validate(&self) -> Result<(), String> {
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Send run telemetry to Azure Log Analytics
    #[serde(default)]
    pub azure_enabled: bool,

    /// Data Collection Endpoint (DCE) URL
    #[serde(default)]
    pub azure_dce_endpoint: Option<String>,

    /// Data Collection Rule (DCR) immutable ID
    #[serde(default)]
    pub azure_dcr_immutable_id: Option<String>,

    /// Stream name for custom logs (e.g., "Custom-AccountSweep_CL")
    #[serde(default)]
    pub azure_stream_name: Option<String>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.azure_enabled {
            if self.azure_dce_endpoint.is_none() {
                return Err("Azure logging enabled but azure_dce_endpoint not provided".to_string());
            }
            if self.azure_dcr_immutable_id.is_none() {
                return Err(
                    "Azure logging enabled but azure_dcr_immutable_id not provided".to_string(),
                );
            }
            if self.azure_stream_name.is_none() {
                return Err("Azure logging enabled but azure_stream_name not provided".to_string());
            }
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            azure_enabled: false,
            azure_dce_endpoint: None,
            azure_dcr_immutable_id: None,
            azure_stream_name: None,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_version() -> String {
    "v9.2".to_string()
}

fn default_page_size() -> u32 {
    5000
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_processed_field() -> String {
    "new_processed".to_string()
}

fn default_processed_value() -> String {
    "Processed".to_string()
}

fn default_due_date_field() -> String {
    "new_duedate".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_max_concurrent_batches() -> usize {
    5
}

fn default_pacing_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u32 {
    2
}

fn default_container() -> String {
    "account-exports".to_string()
}

fn default_artifact_prefix() -> String {
    "accounts".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
