//! Dataverse Web API client
//!
//! Implements [`AccountSource`] over the `accounts` entity set. Every request
//! is authorized with a bearer token from the configured [`TokenSource`] and
//! failures are classified as transient or permanent before they leave this
//! module.

use super::batch_request::{build_mark_processed, inspect_response};
use super::classify::{classify_response, classify_transport};
use super::models::{DetailResponse, IdPageResponse};
use super::source::{AccountSource, IdPage};
use crate::adapters::auth::TokenSource;
use crate::config::DataverseConfig;
use crate::core::sweep::FieldMap;
use crate::domain::{RecordId, Result, SweepError, UpstreamError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const FORMATTED_VALUES_PREFERENCE: &str =
    "odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\"";

/// Dataverse `accounts` client
///
/// # Example
///
/// ```no_run
/// use account_sweep::adapters::auth::StaticTokenSource;
/// use account_sweep::adapters::dataverse::{AccountSource, DataverseClient};
/// use account_sweep::config::{secret_string, DataverseConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> account_sweep::domain::Result<()> {
/// let config = DataverseConfig {
///     base_url: "https://contoso.crm.dynamics.com".to_string(),
///     ..Default::default()
/// };
/// let tokens = Arc::new(StaticTokenSource::new(secret_string("token".to_string())));
/// let client = DataverseClient::new(&config, tokens)?;
///
/// let page = client.fetch_id_page(None).await?;
/// println!("{} unprocessed accounts on the first page", page.ids.len());
/// # Ok(())
/// # }
/// ```
pub struct DataverseClient {
    api_root: String,
    scope: String,
    page_size: u32,
    filter: String,
    processed_field: String,
    processed_value: String,
    fields: FieldMap,
    tokens: Arc<dyn TokenSource>,
    client: Client,
}

impl DataverseClient {
    /// Create a client from the `[dataverse]` section
    pub fn new(config: &DataverseConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SweepError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_root: config.api_root(),
            scope: config.token_scope(),
            page_size: config.page_size,
            filter: config.effective_filter(),
            processed_field: config.processed_field.clone(),
            processed_value: config.processed_value.clone(),
            fields: FieldMap::from_config(config),
            tokens,
            client,
        })
    }

    /// Web API root this client talks to
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Token scope requested for every call
    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn accounts_url(&self) -> Result<Url> {
        Url::parse(&format!("{}/accounts", self.api_root)).map_err(|e| {
            SweepError::Configuration(format!("Invalid Dataverse URL {}: {e}", self.api_root))
        })
    }

    /// Add the standard OData headers and a fresh bearer token, then send.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.token(&self.scope).await?;

        let response = request
            .bearer_auth(token)
            .header("OData-Version", "4.0")
            .header("OData-MaxVersion", "4.0")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SweepError::Upstream(classify_transport(&e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        if let Some(retry_after) = response.headers().get(reqwest::header::RETRY_AFTER) {
            tracing::debug!(
                status = %status,
                retry_after = ?retry_after,
                "Upstream suggested a retry delay"
            );
        }
        let body = response.text().await.unwrap_or_default();
        Err(SweepError::Upstream(classify_response(status, &body)))
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                SweepError::Upstream(classify_transport(&e))
            } else {
                SweepError::Upstream(UpstreamError::InvalidResponse(e.to_string()))
            }
        })
    }
}

/// Same scheme, host and port as `api_root`, with a path beneath it.
/// Hosts compare case-insensitively since `Url` lowercases them on parse.
fn within_api_root(api_root: &str, next: &Url) -> bool {
    let Ok(root) = Url::parse(api_root) else {
        return false;
    };
    let root_path = root.path().trim_end_matches('/');
    let path_ok = match next.path().strip_prefix(root_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    };

    root.scheme() == next.scheme()
        && root.host_str() == next.host_str()
        && root.port_or_known_default() == next.port_or_known_default()
        && path_ok
}

/// GUID literal for an OData filter; anything else could alter the query
fn guid_literal(id: &RecordId) -> Result<&str> {
    let raw = id.as_str();
    if raw.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        Ok(raw)
    } else {
        Err(SweepError::InvalidArgument(format!(
            "account id is not a GUID: {raw}"
        )))
    }
}

#[async_trait]
impl AccountSource for DataverseClient {
    async fn fetch_id_page(&self, cursor: Option<&str>) -> Result<IdPage> {
        let url = match cursor {
            Some(next) => {
                let url = Url::parse(next).map_err(|e| {
                    SweepError::Upstream(UpstreamError::InvalidResponse(format!(
                        "invalid next page link {next}: {e}"
                    )))
                })?;
                if !within_api_root(&self.api_root, &url) {
                    return Err(SweepError::Upstream(UpstreamError::InvalidResponse(format!(
                        "next page link points outside {}: {next}",
                        self.api_root
                    ))));
                }
                url
            }
            None => {
                let mut url = self.accounts_url()?;
                url.query_pairs_mut()
                    .append_pair("$select", "accountid")
                    .append_pair("$filter", &self.filter);
                url
            }
        };

        tracing::debug!(url = %url, "Fetching account ID page");

        let request = self
            .client
            .get(url)
            .header("Prefer", format!("odata.maxpagesize={}", self.page_size));
        let response = self.send(request).await?;
        let page: IdPageResponse = self.read_json(response).await?;

        let mut ids = Vec::with_capacity(page.value.len());
        for row in page.value {
            match row.accountid.map(RecordId::new) {
                Some(Ok(id)) => ids.push(id),
                _ => tracing::warn!("Skipping ID row without a usable accountid"),
            }
        }

        Ok(IdPage::new(ids, page.next_link))
    }

    async fn fetch_details(&self, ids: &[RecordId]) -> Result<Vec<Value>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = ids
            .iter()
            .map(|id| guid_literal(id).map(|guid| format!("accountid eq {guid}")))
            .collect::<Result<Vec<_>>>()?
            .join(" or ");

        let mut url = self.accounts_url()?;
        url.query_pairs_mut()
            .append_pair("$select", &self.fields.select_fields().join(","))
            .append_pair("$filter", &filter);

        let request = self
            .client
            .get(url)
            .header("Prefer", FORMATTED_VALUES_PREFERENCE);
        let response = self.send(request).await?;
        let details: DetailResponse = self.read_json(response).await?;

        tracing::debug!(
            requested = ids.len(),
            returned = details.value.len(),
            "Fetched account details"
        );

        Ok(details.value)
    }

    async fn mark_processed(&self, ids: &[RecordId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        for id in ids {
            guid_literal(id)?;
        }

        let boundary = Uuid::new_v4().simple().to_string();
        let batch = build_mark_processed(
            &self.api_root,
            ids,
            &self.processed_field,
            &self.processed_value,
            &boundary,
        );

        let request = self
            .client
            .post(format!("{}/$batch", self.api_root))
            .header(reqwest::header::CONTENT_TYPE, batch.content_type)
            .body(batch.body);
        let response = self.send(request).await?;

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SweepError::Upstream(classify_transport(&e))
            } else {
                SweepError::Upstream(UpstreamError::InvalidResponse(e.to_string()))
            }
        })?;
        inspect_response(&body, ids.len())?;

        tracing::debug!(count = ids.len(), "Marked accounts processed");
        Ok(())
    }

    fn describe(&self) -> String {
        self.api_root.clone()
    }
}
