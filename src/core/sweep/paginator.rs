//! Cursor-following fetch of the complete unprocessed ID set

use crate::adapters::dataverse::AccountSource;
use crate::domain::{RecordId, Result, SweepError, UpstreamError};
use std::collections::HashSet;

/// Fetch every unprocessed ID by following page cursors until none remains.
///
/// No page is retried here; the first failing page fails the whole fetch.
/// Zero results is an empty vector, not an error. An ID repeated on a later
/// page (rows shifting while paging) is kept only at its first position, so
/// each ID lands in exactly one batch.
pub async fn fetch_all_ids(source: &dyn AccountSource) -> Result<Vec<RecordId>> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_id_page(cursor.as_deref()).await?;
        pages += 1;

        let page_len = page.ids.len();
        for id in page.ids {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        tracing::debug!(
            page = pages,
            page_len = page_len,
            total = ids.len(),
            has_next = page.next_cursor.is_some(),
            "Fetched ID page"
        );

        match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Err(SweepError::Upstream(UpstreamError::InvalidResponse(
                    format!("page cursor did not advance: {next}"),
                )));
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::info!(
        source = %source.describe(),
        pages = pages,
        count = ids.len(),
        "Fetched unprocessed account IDs"
    );

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dataverse::IdPage;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Serves pre-built pages keyed by cursor
    struct PagedSource {
        pages: Vec<(Option<&'static str>, Result<IdPage>)>,
        requested: Mutex<Vec<Option<String>>>,
    }

    impl PagedSource {
        fn new(pages: Vec<(Option<&'static str>, Result<IdPage>)>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AccountSource for PagedSource {
        async fn fetch_id_page(&self, cursor: Option<&str>) -> Result<IdPage> {
            self.requested
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            let (_, page) = self
                .pages
                .iter()
                .find(|(c, _)| *c == cursor)
                .expect("unexpected cursor");
            match page {
                Ok(page) => Ok(page.clone()),
                Err(e) => Err(SweepError::Upstream(UpstreamError::RequestFailed(
                    e.to_string(),
                ))),
            }
        }

        async fn fetch_details(&self, _ids: &[RecordId]) -> Result<Vec<Value>> {
            unreachable!()
        }

        async fn mark_processed(&self, _ids: &[RecordId]) -> Result<()> {
            unreachable!()
        }

        fn describe(&self) -> String {
            "paged-test-source".to_string()
        }
    }

    fn ids(names: &[&str]) -> Vec<RecordId> {
        names.iter().map(|n| RecordId::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_follows_cursor_until_absent() {
        let source = PagedSource::new(vec![
            (None, Ok(IdPage::new(ids(&["a", "b"]), Some("p2".to_string())))),
            (Some("p2"), Ok(IdPage::new(ids(&["c"]), Some("p3".to_string())))),
            (Some("p3"), Ok(IdPage::new(ids(&["d"]), None))),
        ]);

        let all = fetch_all_ids(&source).await.unwrap();
        assert_eq!(all, ids(&["a", "b", "c", "d"]));
        assert_eq!(source.requested.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_results_is_empty_not_error() {
        let source = PagedSource::new(vec![(None, Ok(IdPage::default()))]);
        assert!(fetch_all_ids(&source).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_page_fails_fetch() {
        let source = PagedSource::new(vec![
            (None, Ok(IdPage::new(ids(&["a"]), Some("p2".to_string())))),
            (
                Some("p2"),
                Err(SweepError::Upstream(UpstreamError::ServerError {
                    status: 500,
                    message: "boom".to_string(),
                })),
            ),
        ]);
        assert!(fetch_all_ids(&source).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_pages_kept_once() {
        let source = PagedSource::new(vec![
            (None, Ok(IdPage::new(ids(&["a", "b"]), Some("p2".to_string())))),
            (Some("p2"), Ok(IdPage::new(ids(&["b", "c"]), None))),
        ]);
        assert_eq!(fetch_all_ids(&source).await.unwrap(), ids(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_stuck_cursor_is_invalid_response() {
        let source = PagedSource::new(vec![
            (None, Ok(IdPage::new(ids(&["a"]), Some("p2".to_string())))),
            (Some("p2"), Ok(IdPage::new(ids(&["b"]), Some("p2".to_string())))),
        ]);
        let err = fetch_all_ids(&source).await.unwrap_err();
        assert!(err.to_string().contains("did not advance"));
    }
}
