//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{StorageBackend, SweepConfig};
use super::secret::secret_string;
use crate::domain::errors::SweepError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "SWEEP_";

/// Loads configuration
///
/// This function:
/// 1. Reads the TOML file when `path` is given (a missing file is an error)
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Starts from defaults when no file is given
/// 4. Applies environment variable overrides (`SWEEP_*` prefix)
/// 5. Validates the configuration
///
/// # Examples
///
/// ```no_run
/// use account_sweep::config::load_config;
/// use std::path::Path;
///
/// // File plus environment
/// let config = load_config(Some(Path::new("account-sweep.toml")))?;
///
/// // Environment only
/// let config = load_config(None)?;
/// # Ok::<(), account_sweep::domain::SweepError>(())
/// ```
pub fn load_config(path: Option<&Path>) -> Result<SweepConfig> {
    let env = |name: &str| std::env::var(name).ok();

    let mut config = match path {
        Some(path) => parse_file(path, &env)?,
        None => {
            tracing::debug!("No configuration file given, using defaults and environment");
            SweepConfig::default()
        }
    };

    apply_env_overrides(&mut config, &env)?;

    config.validate().map_err(|e| {
        SweepError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn parse_file(path: &Path, env: &impl Fn(&str) -> Option<String>) -> Result<SweepConfig> {
    if !path.exists() {
        return Err(SweepError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SweepError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents, env)?;

    toml::from_str(&contents)
        .map_err(|e| SweepError::Configuration(format!("Failed to parse TOML: {e}")))
}

/// Substitutes `${VAR_NAME}` placeholders outside comment lines
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str, env: &impl Fn(&str) -> Option<String>) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SweepError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &regex::Captures| match env(&caps[1]) {
                Some(value) => value,
                None => {
                    if !missing_vars.iter().any(|v| v == &caps[1]) {
                        missing_vars.push(caps[1].to_string());
                    }
                    String::new()
                }
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(SweepError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parsed<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    match env(&name) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            SweepError::Configuration(format!("Invalid value '{raw}' for {name}: {e}"))
        }),
        None => Ok(None),
    }
}

fn text(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(&format!("{ENV_PREFIX}{key}"))
}

/// Applies `SWEEP_<SECTION>_<KEY>` overrides
///
/// For example: `SWEEP_DATAVERSE_BASE_URL`, `SWEEP_PROCESSING_BATCH_SIZE`.
/// Unparsable numeric or boolean values are configuration errors.
pub fn apply_env_overrides(
    config: &mut SweepConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = text(env, "APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Identity
    if let Some(val) = text(env, "IDENTITY_TENANT_ID") {
        config.identity.tenant_id = Some(val);
    }
    if let Some(val) = text(env, "IDENTITY_CLIENT_ID") {
        config.identity.client_id = Some(val);
    }
    if let Some(val) = text(env, "IDENTITY_CLIENT_SECRET") {
        config.identity.client_secret = Some(secret_string(val));
    }
    if let Some(val) = text(env, "IDENTITY_STATIC_TOKEN") {
        config.identity.static_token = Some(secret_string(val));
    }

    // Dataverse
    if let Some(val) = text(env, "DATAVERSE_BASE_URL") {
        config.dataverse.base_url = val;
    }
    if let Some(val) = text(env, "DATAVERSE_API_VERSION") {
        config.dataverse.api_version = val;
    }
    if let Some(val) = parsed(env, "DATAVERSE_PAGE_SIZE")? {
        config.dataverse.page_size = val;
    }
    if let Some(val) = parsed(env, "DATAVERSE_TIMEOUT_SECONDS")? {
        config.dataverse.timeout_seconds = val;
    }
    if let Some(val) = text(env, "DATAVERSE_PROCESSED_FIELD") {
        config.dataverse.processed_field = val;
    }
    if let Some(val) = text(env, "DATAVERSE_PROCESSED_VALUE") {
        config.dataverse.processed_value = val;
    }
    if let Some(val) = text(env, "DATAVERSE_DUE_DATE_FIELD") {
        config.dataverse.due_date_field = val;
    }
    if let Some(val) = text(env, "DATAVERSE_UNPROCESSED_FILTER") {
        config.dataverse.unprocessed_filter = Some(val);
    }

    // Processing
    if let Some(val) = parsed(env, "PROCESSING_BATCH_SIZE")? {
        config.processing.batch_size = val;
    }
    if let Some(val) = parsed(env, "PROCESSING_MAX_CONCURRENT_BATCHES")? {
        config.processing.max_concurrent_batches = val;
    }
    if let Some(val) = parsed(env, "PROCESSING_PACING_DELAY_MS")? {
        config.processing.pacing_delay_ms = val;
    }

    // Retry
    if let Some(val) = parsed(env, "RETRY_MAX_RETRIES")? {
        config.retry.max_retries = val;
    }
    if let Some(val) = parsed(env, "RETRY_BACKOFF_BASE")? {
        config.retry.backoff_base = val;
    }

    // Storage
    if let Some(val) = parsed::<StorageBackend>(env, "STORAGE_BACKEND")? {
        config.storage.backend = val;
    }
    if let Some(val) = text(env, "STORAGE_TARGET") {
        config.storage.target = val;
    }
    if let Some(val) = text(env, "STORAGE_CONTAINER") {
        config.storage.container = val;
    }
    if let Some(val) = text(env, "STORAGE_SAS_TOKEN") {
        config.storage.sas_token = Some(secret_string(val));
    }
    if let Some(val) = text(env, "STORAGE_ARTIFACT_PREFIX") {
        config.storage.artifact_prefix = val;
    }

    // Server
    if let Some(val) = text(env, "SERVER_BIND_ADDRESS") {
        config.server.bind_address = val;
    }

    // Logging
    if let Some(val) = parsed(env, "LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = text(env, "LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = parsed(env, "LOGGING_AZURE_ENABLED")? {
        config.logging.azure_enabled = val;
    }
    if let Some(val) = text(env, "LOGGING_AZURE_DCE_ENDPOINT") {
        config.logging.azure_dce_endpoint = Some(val);
    }
    if let Some(val) = text(env, "LOGGING_AZURE_DCR_IMMUTABLE_ID") {
        config.logging.azure_dcr_immutable_id = Some(val);
    }
    if let Some(val) = text(env, "LOGGING_AZURE_STREAM_NAME") {
        config.logging.azure_stream_name = Some(val);
    }

    Ok(())
}
