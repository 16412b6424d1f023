//! Title metadata resolution with layered fallback
//!
//! The resolver answers "what is this title called and what does it look
//! like" for any identifier, consulting (in order) a bundled curated
//! override table, the remote catalog cached on disk, and finally the
//! identifier itself. Resolution is total: an unknown identifier resolves
//! to itself with an empty icon.
//!
//! The catalog is loaded lazily exactly once per session behind a mutex;
//! refreshes are throttled to once per 24 hours via a timestamp file, and a
//! failed refresh silently retains the previous catalog. Disk writes are
//! whole-file replace (temp file + rename) so a concurrent reader always
//! sees either the old or the fully new catalog.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;

use crate::app::client::CdnClient;
use crate::app::models::{CatalogEntry, TitleId, TitleMeta};
use crate::constants::{catalog as catalog_consts, files};
use crate::errors::{CatalogResult, ConfigError, ConfigResult};

/// Curated overrides for titles whose catalog entries are missing or wrong
const CUSTOM_META_JSON: &str = include_str!("../../assets/custom_meta.json");

type TitleTable = HashMap<String, CatalogEntry>;

/// Lazily loaded, periodically refreshed title catalog
pub struct TitleCatalog {
    client: Arc<CdnClient>,
    data_file: PathBuf,
    stamp_file: PathBuf,
    titles: Mutex<Option<Arc<TitleTable>>>,
    overrides: TitleTable,
}

impl TitleCatalog {
    /// Catalog rooted at the given cache directory
    pub fn new(cache_dir: PathBuf, client: Arc<CdnClient>) -> Self {
        let overrides: TitleTable = serde_json::from_str(CUSTOM_META_JSON)
            .expect("bundled override table should be valid JSON");

        Self {
            client,
            data_file: cache_dir.join(catalog_consts::CACHE_FILE_NAME),
            stamp_file: cache_dir.join(catalog_consts::STAMP_FILE_NAME),
            titles: Mutex::new(None),
            overrides,
        }
    }

    /// Default per-user cache directory for the catalog
    pub fn default_cache_dir() -> ConfigResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(env!("CARGO_PKG_NAME")))
    }

    /// Resolve metadata for a title identifier
    ///
    /// Resolution order: override table, remote catalog, identity fallback.
    /// Never fails; missing name or icon inside a hit fall back the same way.
    pub async fn meta(&self, id: &TitleId) -> TitleMeta {
        let titles = self.get_or_load().await;
        let key = id.as_str();
        let entry = self.overrides.get(key).or_else(|| titles.get(key));

        TitleMeta {
            id: key.to_string(),
            name: entry
                .and_then(|e| e.name.clone())
                .unwrap_or_else(|| key.to_string()),
            icon_url: entry.and_then(|e| e.icon_url.clone()).unwrap_or_default(),
        }
    }

    /// Load the catalog, reading disk or network at most once per session
    ///
    /// Concurrent callers during the initial load wait on the mutex and
    /// reuse the single loader's result. A failed load resolves to an empty
    /// table but is not memoized, so the next caller retries the fetch.
    pub async fn get_or_load(&self) -> Arc<TitleTable> {
        let mut guard = self.titles.lock().await;
        if let Some(titles) = guard.as_ref() {
            return Arc::clone(titles);
        }

        let loaded = match self.read_disk_cache().await {
            Some(table) => table,
            None => match self.fetch_and_persist().await {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!("catalog unavailable, resolving from overrides only: {}", e);
                    return Arc::new(TitleTable::new());
                }
            },
        };

        let titles = Arc::new(loaded);
        *guard = Some(Arc::clone(&titles));
        titles
    }

    /// Force a catalog refresh from the network
    pub async fn refresh(&self) -> CatalogResult<()> {
        let table = self.fetch_and_persist().await?;
        *self.titles.lock().await = Some(Arc::new(table));
        Ok(())
    }

    /// Refresh the catalog when the last refresh is older than the interval
    ///
    /// Returns whether a refresh ran. Refresh failure is non-fatal: the
    /// previous catalog (memory and disk) stays in place.
    pub async fn refresh_if_stale(&self) -> bool {
        if !self.is_stale().await {
            return false;
        }
        match self.refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("catalog refresh failed, keeping previous data: {}", e);
                false
            }
        }
    }

    /// Whether the last successful refresh is older than the refresh interval
    pub async fn is_stale(&self) -> bool {
        let Ok(raw) = fs::read_to_string(&self.stamp_file).await else {
            return true;
        };
        let Ok(stamp) = raw.trim().parse::<DateTime<Utc>>() else {
            return true;
        };
        let age = Utc::now().signed_duration_since(stamp);
        age.to_std()
            .map(|age| age >= catalog_consts::REFRESH_INTERVAL)
            .unwrap_or(false)
    }

    async fn read_disk_cache(&self) -> Option<TitleTable> {
        let raw = match fs::read_to_string(&self.data_file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("catalog cache unreadable: {}", e);
                return None;
            }
        };
        match parse_catalog(&raw) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!("catalog cache corrupt, refetching: {}", e);
                None
            }
        }
    }

    async fn fetch_and_persist(&self) -> CatalogResult<TitleTable> {
        let raw = self.client.download_catalog_text().await?;
        let table = parse_catalog(&raw)?;

        if let Some(parent) = self.data_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Whole-file replace: a concurrent reader sees old or new, never half
        let temp_path = self.data_file.with_extension(format!(
            "json{}",
            files::TEMP_FILE_SUFFIX
        ));
        fs::write(&temp_path, &raw).await?;
        fs::rename(&temp_path, &self.data_file).await?;

        fs::write(&self.stamp_file, Utc::now().to_rfc3339()).await?;
        tracing::info!("title catalog refreshed ({} entries)", table.len());
        Ok(table)
    }
}

/// Parse the raw catalog JSON, tolerating null rows
fn parse_catalog(raw: &str) -> serde_json::Result<TitleTable> {
    let parsed: HashMap<String, Option<CatalogEntry>> = serde_json::from_str(raw)?;
    Ok(parsed
        .into_iter()
        .filter_map(|(id, entry)| entry.map(|e| (id.to_ascii_uppercase(), e)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn catalog_in(dir: &std::path::Path) -> TitleCatalog {
        let client = Arc::new(CdnClient::new().unwrap());
        TitleCatalog::new(dir.to_path_buf(), client)
    }

    async fn seed_catalog(dir: &std::path::Path, json: &str) {
        fs::write(dir.join(catalog_consts::CACHE_FILE_NAME), json)
            .await
            .unwrap();
        fs::write(
            dir.join(catalog_consts::STAMP_FILE_NAME),
            Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup_with_canonical_output() {
        let dir = tempdir().unwrap();
        seed_catalog(
            dir.path(),
            r#"{"010000000000BEEF": {"name": "Foo", "iconUrl": "http://x/i.png"}}"#,
        )
        .await;
        let catalog = catalog_in(dir.path());

        let id = TitleId::parse("010000000000beef").unwrap();
        let meta = catalog.meta(&id).await;
        assert_eq!(meta.id, "010000000000BEEF");
        assert_eq!(meta.name, "Foo");
        assert_eq!(meta.icon_url, "http://x/i.png");
    }

    #[tokio::test]
    async fn test_unknown_title_resolves_to_identity_fallback() {
        let dir = tempdir().unwrap();
        seed_catalog(dir.path(), "{}").await;
        let catalog = catalog_in(dir.path());

        let id = TitleId::parse("0100dead0000beef").unwrap();
        let meta = catalog.meta(&id).await;
        assert_eq!(meta.id, "0100DEAD0000BEEF");
        assert_eq!(meta.name, "0100DEAD0000BEEF");
        assert_eq!(meta.icon_url, "");
    }

    #[tokio::test]
    async fn test_override_table_wins_over_catalog() {
        let dir = tempdir().unwrap();
        seed_catalog(
            dir.path(),
            r#"{"0100000000010000": {"name": "Wrong Name", "iconUrl": ""}}"#,
        )
        .await;
        let catalog = catalog_in(dir.path());

        let id = TitleId::parse("0100000000010000").unwrap();
        let meta = catalog.meta(&id).await;
        assert_eq!(meta.name, "Super Mario Odyssey");
    }

    #[tokio::test]
    async fn test_partial_entry_falls_back_per_field() {
        let dir = tempdir().unwrap();
        seed_catalog(dir.path(), r#"{"0100ABCD00000000": {"iconUrl": "http://x/a.png"}}"#).await;
        let catalog = catalog_in(dir.path());

        let id = TitleId::parse("0100ABCD00000000").unwrap();
        let meta = catalog.meta(&id).await;
        assert_eq!(meta.name, "0100ABCD00000000");
        assert_eq!(meta.icon_url, "http://x/a.png");
    }

    #[tokio::test]
    async fn test_null_catalog_rows_are_tolerated() {
        let table =
            parse_catalog(r#"{"0100ABCD00000000": null, "0100ABCD00000001": {"name": "A"}}"#)
                .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_load() {
        let dir = tempdir().unwrap();
        seed_catalog(dir.path(), r#"{"010000000000BEEF": {"name": "Foo"}}"#).await;
        let catalog = Arc::new(catalog_in(dir.path()));

        let id = TitleId::parse("010000000000BEEF").unwrap();
        let (a, b) = tokio::join!(catalog.meta(&id), catalog.meta(&id));
        assert_eq!(a.name, "Foo");
        assert_eq!(b.name, "Foo");

        // Both lookups resolved against the same loaded table
        let first = catalog.get_or_load().await;
        let second = catalog.get_or_load().await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_is_not_memoized() {
        use crate::app::client::ClientConfig;

        // Closed local port so the network fetch fails fast
        let closed_port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ClientConfig {
            proxy: Some(format!("http://127.0.0.1:{closed_port}")),
            ..Default::default()
        };
        let client = Arc::new(CdnClient::with_config(config).unwrap());

        let dir = tempdir().unwrap();
        let catalog = TitleCatalog::new(dir.path().to_path_buf(), client);

        // Resolution still degrades to the identity fallback
        let id = TitleId::parse("0100ABCD00000000").unwrap();
        let meta = catalog.meta(&id).await;
        assert_eq!(meta.name, "0100ABCD00000000");

        // The failed load must not pin an empty table for the session
        assert!(catalog.titles.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_staleness_from_stamp_file() {
        let dir = tempdir().unwrap();
        let catalog = catalog_in(dir.path());

        // No stamp at all: stale
        assert!(catalog.is_stale().await);

        fs::write(
            dir.path().join(catalog_consts::STAMP_FILE_NAME),
            Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();
        assert!(!catalog.is_stale().await);

        let two_days_ago = Utc::now() - chrono::Duration::hours(48);
        fs::write(
            dir.path().join(catalog_consts::STAMP_FILE_NAME),
            two_days_ago.to_rfc3339(),
        )
        .await
        .unwrap();
        assert!(catalog.is_stale().await);
    }
}
