//! In-memory upstream, token and storage doubles shared by the integration
//! tests

#![allow(dead_code)]

use account_sweep::adapters::auth::{StaticTokenSource, TokenSource};
use account_sweep::adapters::dataverse::{AccountSource, IdPage};
use account_sweep::adapters::storage::ArtifactStore;
use account_sweep::config::{secret_string, SweepConfig};
use account_sweep::core::sweep::SweepOrchestrator;
use account_sweep::domain::{RecordId, Result, SweepError, UpstreamError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PAGE_SIZE: usize = 100;

/// Deterministic GUID-shaped account IDs
pub fn account_ids(count: usize) -> Vec<RecordId> {
    (0..count)
        .map(|n| RecordId::new(format!("00000000-0000-0000-0000-{n:012}")).unwrap())
        .collect()
}

/// Scripted Dataverse stand-in
///
/// Failures are keyed by the first ID of the request, which identifies the
/// batch.
#[derive(Default)]
pub struct FakeAccountSource {
    ids: Vec<RecordId>,
    fail_id_fetch: bool,
    transient_details: Mutex<HashMap<RecordId, u32>>,
    rejected_writebacks: Vec<RecordId>,
    transient_writebacks: Mutex<HashMap<RecordId, u32>>,
    detail_latency: Duration,
    pub detail_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub marked: Mutex<Vec<RecordId>>,
}

impl FakeAccountSource {
    pub fn with_accounts(count: usize) -> Self {
        Self {
            ids: account_ids(count),
            ..Default::default()
        }
    }

    pub fn failing_id_fetch() -> Self {
        Self {
            fail_id_fetch: true,
            ..Default::default()
        }
    }

    /// The detail fetch of the batch starting at `first_index` answers 429
    /// `times` times before succeeding
    pub fn throttle_batch(self, first_index: usize, times: u32) -> Self {
        let key = self.ids[first_index].clone();
        self.transient_details
            .lock()
            .unwrap()
            .insert(key, times);
        self
    }

    /// The write-back of the batch starting at `first_index` is rejected
    pub fn reject_writeback(mut self, first_index: usize) -> Self {
        let key = self.ids[first_index].clone();
        self.rejected_writebacks.push(key);
        self
    }

    /// The write-back of the batch starting at `first_index` reports a
    /// throttled changeset `times` times before committing
    pub fn throttle_writeback(self, first_index: usize, times: u32) -> Self {
        let key = self.ids[first_index].clone();
        self.transient_writebacks
            .lock()
            .unwrap()
            .insert(key, times);
        self
    }

    pub fn with_detail_latency(mut self, latency: Duration) -> Self {
        self.detail_latency = latency;
        self
    }

    pub fn marked_count(&self) -> usize {
        self.marked.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountSource for FakeAccountSource {
    async fn fetch_id_page(&self, cursor: Option<&str>) -> Result<IdPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_id_fetch {
            return Err(UpstreamError::ServerError {
                status: 500,
                message: "Internal Server Error".to_string(),
            }
            .into());
        }

        let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (start + PAGE_SIZE).min(self.ids.len());
        let next = (end < self.ids.len()).then(|| end.to_string());
        Ok(IdPage::new(self.ids[start..end].to_vec(), next))
    }

    async fn fetch_details(&self, ids: &[RecordId]) -> Result<Vec<Value>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.detail_latency.is_zero() {
            tokio::time::sleep(self.detail_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(first) = ids.first() {
            let mut throttled = self.transient_details.lock().unwrap();
            if let Some(remaining) = throttled.get_mut(first) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(UpstreamError::Transient {
                        signature: "429".to_string(),
                        message: "Too Many Requests".to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(ids
            .iter()
            .map(|id| {
                json!({
                    "accountid": id.as_str(),
                    "name": format!("Account {id}"),
                    "revenue": 1000.5,
                    "numberofemployees": 12,
                    "new_processed": null,
                })
            })
            .collect())
    }

    async fn mark_processed(&self, ids: &[RecordId]) -> Result<()> {
        if let Some(first) = ids.first() {
            if self.rejected_writebacks.contains(first) {
                return Err(UpstreamError::WriteBackRejected(
                    "HTTP/1.1 404 Not Found".to_string(),
                )
                .into());
            }
            let mut throttled = self.transient_writebacks.lock().unwrap();
            if let Some(remaining) = throttled.get_mut(first) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(UpstreamError::Transient {
                        signature: "429".to_string(),
                        message: "changeset part: HTTP/1.1 429 Too Many Requests".to_string(),
                    }
                    .into());
                }
            }
        }
        self.marked.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    fn describe(&self) -> String {
        "fake accounts".to_string()
    }
}

/// Token source that always refuses
pub struct RefusingTokens;

#[async_trait]
impl TokenSource for RefusingTokens {
    async fn token(&self, _scope: &str) -> Result<String> {
        Err(SweepError::Authentication(
            "AADSTS7000215: Invalid client secret provided".to_string(),
        ))
    }
}

pub fn static_tokens() -> Arc<dyn TokenSource> {
    Arc::new(StaticTokenSource::new(secret_string("test-token".to_string())))
}

/// Artifact store that keeps artifacts in memory
#[derive(Default)]
pub struct MemoryStore {
    refuse: bool,
    pub artifacts: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }

    pub fn only_artifact(&self) -> (String, String) {
        let artifacts = self.artifacts.lock().unwrap();
        assert_eq!(artifacts.len(), 1, "expected exactly one artifact");
        let (name, bytes) = &artifacts[0];
        (name.clone(), String::from_utf8(bytes.clone()).unwrap())
    }

    pub fn count(&self) -> usize {
        self.artifacts.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, name: &str, content: Vec<u8>, _content_type: &str) -> Result<String> {
        if self.refuse {
            return Err(SweepError::Storage(
                "Blob upload failed: 403 AuthorizationFailure".to_string(),
            ));
        }
        self.artifacts
            .lock()
            .unwrap()
            .push((name.to_string(), content));
        Ok(format!("memory://{name}"))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Defaults: batches of 100, five in flight, 1s pacing, three retries with
/// base-2 backoff
pub fn test_config() -> SweepConfig {
    let mut config = SweepConfig::default();
    config.dataverse.base_url = "https://contoso.crm.dynamics.com".to_string();
    config
}

pub fn orchestrator(
    config: &SweepConfig,
    tokens: Arc<dyn TokenSource>,
    source: Arc<FakeAccountSource>,
    store: Arc<MemoryStore>,
) -> SweepOrchestrator {
    SweepOrchestrator::new(config, tokens, source, store).unwrap()
}
