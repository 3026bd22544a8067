//! Configuration management.
//!
//! Configuration comes from an optional TOML file plus `SWEEP_*` environment
//! variables, and is validated once at startup. The resulting
//! [`SweepConfig`] is shared behind an `Arc` and never mutated afterwards.
//!
//! # Example Configuration
//!
//! ```toml
//! [identity]
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "11111111-1111-1111-1111-111111111111"
//! client_secret = "${SWEEP_CLIENT_SECRET}"
//!
//! [dataverse]
//! base_url = "https://contoso.crm.dynamics.com"
//!
//! [processing]
//! batch_size = 100
//! max_concurrent_batches = 5
//! pacing_delay_ms = 1000
//!
//! [retry]
//! max_retries = 3
//! backoff_base = 2
//!
//! [storage]
//! backend = "azure_blob"
//! target = "https://contosoexports.blob.core.windows.net"
//! container = "account-exports"
//! ```
//!
//! # Environment Variables
//!
//! Every key can be overridden with `SWEEP_<SECTION>_<KEY>`:
//!
//! ```bash
//! export SWEEP_DATAVERSE_BASE_URL="https://contoso.crm.dynamics.com"
//! export SWEEP_IDENTITY_CLIENT_SECRET="..."
//! export SWEEP_PROCESSING_MAX_CONCURRENT_BATCHES=3
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{apply_env_overrides, load_config};
pub use schema::{
    ApplicationConfig, DataverseConfig, IdentityConfig, LoggingConfig, ProcessingConfig,
    RetryConfig, ServerConfig, StorageBackend, StorageConfig, SweepConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
