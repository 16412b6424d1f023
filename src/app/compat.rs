//! Community compatibility lookup
//!
//! Queries the emulator's games-list issue tracker for compatibility labels.
//! The search endpoint sits behind a strict unauthenticated quota, so
//! lookups are memoized for the lifetime of the service and a failed lookup
//! is never memoized (the next call retries). A search by identifier that
//! comes back empty falls back to searching by the resolved display name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::app::catalog::TitleCatalog;
use crate::app::client::CdnClient;
use crate::app::models::{
    CompatibilityRecord, GithubLabel, IssueSearchResults, ResolutionMode, TitleId,
};
use crate::errors::DownloadResult;

/// Issue-search backend, factored out so lookup logic is testable offline
#[allow(async_fn_in_trait)]
pub trait IssueSearch {
    async fn search_issues(&self, term: &str) -> DownloadResult<IssueSearchResults>;
}

impl IssueSearch for CdnClient {
    async fn search_issues(&self, term: &str) -> DownloadResult<IssueSearchResults> {
        self.search_compat_issues(term).await
    }
}

impl<T: IssueSearch> IssueSearch for Arc<T> {
    async fn search_issues(&self, term: &str) -> DownloadResult<IssueSearchResults> {
        (**self).search_issues(term).await
    }
}

/// Memoizing compatibility lookup service
pub struct CompatibilityService<C = Arc<CdnClient>> {
    client: C,
    catalog: Arc<TitleCatalog>,
    memo: Mutex<HashMap<String, CompatibilityRecord>>,
}

impl<C: IssueSearch> CompatibilityService<C> {
    pub fn new(client: C, catalog: Arc<TitleCatalog>) -> Self {
        Self {
            client,
            catalog,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Look up compatibility labels for one title
    ///
    /// Returns `None` when the tracker could not be reached; that outcome is
    /// not memoized. An empty result is a valid answer (no reports filed)
    /// and is memoized like any other.
    pub async fn get_compatibility(&self, id: &TitleId) -> Option<CompatibilityRecord> {
        let key = id.as_str().to_string();
        if let Some(record) = self.memo.lock().await.get(&key) {
            tracing::debug!("compatibility cache hit for {}", key);
            return Some(record.clone());
        }

        let record = self.lookup(id).await?;
        self.memo.lock().await.insert(key, record.clone());
        Some(record)
    }

    async fn lookup(&self, id: &TitleId) -> Option<CompatibilityRecord> {
        let by_id = match self.client.search_issues(id.as_str()).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("compatibility search failed for {}: {}", id, e);
                return None;
            }
        };

        if !by_id.items.is_empty() {
            return Some(CompatibilityRecord {
                title_id: id.clone(),
                labels: collect_labels(&by_id),
                mode: ResolutionMode::Id,
            });
        }

        // No issue mentions the raw identifier; try the display name. The
        // resolver is total, so an uncataloged title searches for itself
        // again and simply stays empty.
        let name = self.catalog.meta(id).await.name;
        match self.client.search_issues(&name).await {
            Ok(by_name) if !by_name.items.is_empty() => Some(CompatibilityRecord {
                title_id: id.clone(),
                labels: collect_labels(&by_name),
                mode: ResolutionMode::Name,
            }),
            Ok(_) => Some(CompatibilityRecord {
                title_id: id.clone(),
                labels: Vec::new(),
                mode: ResolutionMode::Id,
            }),
            Err(e) => {
                tracing::warn!("compatibility name search failed for {}: {}", name, e);
                Some(CompatibilityRecord {
                    title_id: id.clone(),
                    labels: Vec::new(),
                    mode: ResolutionMode::Id,
                })
            }
        }
    }
}

/// Flatten issue labels, deduplicated by name and keeping first occurrence
fn collect_labels(results: &IssueSearchResults) -> Vec<GithubLabel> {
    let mut seen = std::collections::HashSet::new();
    results
        .items
        .iter()
        .flat_map(|item| item.labels.iter())
        .filter(|label| seen.insert(label.name.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::fs;

    use crate::constants::catalog as catalog_consts;
    use crate::errors::DownloadError;

    struct FakeSearch {
        responses: HashMap<String, Vec<&'static str>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeSearch {
        fn new(responses: HashMap<String, Vec<&'static str>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                responses: HashMap::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IssueSearch for FakeSearch {
        async fn search_issues(&self, term: &str) -> DownloadResult<IssueSearchResults> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DownloadError::MaxRetriesExceeded { retries: 0 });
            }
            let labels = self.responses.get(term).cloned().unwrap_or_default();
            Ok(IssueSearchResults {
                items: labels
                    .into_iter()
                    .map(|name| {
                        serde_json::from_str(&format!(
                            r#"{{"state": "open", "labels": [{{"name": "{name}"}}]}}"#
                        ))
                        .unwrap()
                    })
                    .collect(),
            })
        }
    }

    async fn seeded_catalog(json: &str) -> (tempfile::TempDir, Arc<TitleCatalog>) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(catalog_consts::CACHE_FILE_NAME), json)
            .await
            .unwrap();
        fs::write(
            dir.path().join(catalog_consts::STAMP_FILE_NAME),
            chrono::Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();
        let catalog = Arc::new(TitleCatalog::new(
            dir.path().to_path_buf(),
            Arc::new(CdnClient::new().unwrap()),
        ));
        (dir, catalog)
    }

    #[tokio::test]
    async fn test_id_hit_is_memoized() {
        let (_dir, catalog) = seeded_catalog("{}").await;
        let fake = FakeSearch::new(HashMap::from([(
            "0100ABCD00000000".to_string(),
            vec!["status-playable"],
        )]));
        let service = CompatibilityService::new(fake, catalog);

        let id = TitleId::parse("0100ABCD00000000").unwrap();
        let first = service.get_compatibility(&id).await.unwrap();
        assert_eq!(first.mode, ResolutionMode::Id);
        assert_eq!(first.labels[0].name, "status-playable");

        let second = service.get_compatibility(&id).await.unwrap();
        assert_eq!(second.labels.len(), 1);
        assert_eq!(service.client.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_id_search_falls_back_to_name() {
        let (_dir, catalog) =
            seeded_catalog(r#"{"0100ABCD00000000": {"name": "Some Game"}}"#).await;
        let fake = FakeSearch::new(HashMap::from([(
            "Some Game".to_string(),
            vec!["status-ingame"],
        )]));
        let service = CompatibilityService::new(fake, catalog);

        let id = TitleId::parse("0100ABCD00000000").unwrap();
        let record = service.get_compatibility(&id).await.unwrap();
        assert_eq!(record.mode, ResolutionMode::Name);
        assert_eq!(record.labels[0].name, "status-ingame");
        assert_eq!(service.client.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_memoized() {
        let (_dir, catalog) = seeded_catalog("{}").await;
        let service = CompatibilityService::new(FakeSearch::failing(), catalog);

        let id = TitleId::parse("0100ABCD00000000").unwrap();
        assert!(service.get_compatibility(&id).await.is_none());
        assert!(service.get_compatibility(&id).await.is_none());
        // Each call retried the backend instead of serving a cached miss
        assert_eq!(service.client.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_everywhere_is_memoized_as_empty() {
        let (_dir, catalog) = seeded_catalog("{}").await;
        let service = CompatibilityService::new(FakeSearch::new(HashMap::new()), catalog);

        let id = TitleId::parse("0100ABCD00000000").unwrap();
        let record = service.get_compatibility(&id).await.unwrap();
        assert!(record.labels.is_empty());
        assert_eq!(record.mode, ResolutionMode::Id);

        service.get_compatibility(&id).await.unwrap();
        // id search + name fallback once, then the memo answers
        assert_eq!(service.client.calls(), 2);
    }

    #[test]
    fn test_collect_labels_dedups_by_name() {
        let results: IssueSearchResults = serde_json::from_str(
            r#"{"items": [
                {"labels": [{"name": "a"}, {"name": "b"}]},
                {"labels": [{"name": "a"}, {"name": "c"}]}
            ]}"#,
        )
        .unwrap();
        let labels = collect_labels(&results);
        let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
