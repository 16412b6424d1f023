//! HTTP client implementation for the mirror CDN and GitHub endpoints
//!
//! This module provides the outbound HTTP surface of the sync core with
//! retry, rate limiting and streaming download support. It is organized
//! into specialized components:
//! - `config`: HTTP client configuration and building (incl. proxy routing)
//! - `http`: core HTTP operations with resilience patterns
//! - `download`: progress-tracked streaming downloads with cancellation
//!
//! [`CdnClient`] is the facade the rest of the application talks to: one
//! typed method per remote endpoint, so path templates and response shapes
//! live in exactly one place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::app::models::{DirListing, IssueSearchResults, ReleaseInfo};
use crate::constants::{catalog, cdn, github, keys, limits, shader};
use crate::errors::{ConfigResult, DownloadError, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::{DownloadHandle, DownloadProgress};

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client for the mirror CDN and the rate-limited GitHub endpoints
///
/// All CDN calls go through the retrying, rate-limited path. The release
/// check and the compatibility search use the raw single-attempt path
/// because GitHub enforces its own quota.
#[derive(Debug)]
pub struct CdnClient {
    http_handler: HttpHandler,
}

impl CdnClient {
    /// Creates a client with default configuration (no proxy)
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> ConfigResult<Self> {
        let client = config.build_http_client()?;
        let base_url = Url::parse(cdn::BASE_URL).expect("CDN base URL should be valid");
        let http_handler = HttpHandler::new(client, base_url, config.rate_limit_rps)?;

        tracing::debug!(proxy = config.proxy.as_deref(), "created CDN client");

        Ok(Self { http_handler })
    }

    /// Streams a mirror path to disk with progress reporting
    ///
    /// See [`DownloadHandler::download_with_progress`] for the failure and
    /// cancellation contract.
    pub async fn download_with_progress(
        &self,
        path: &str,
        destination: &Path,
        handle: &DownloadHandle,
    ) -> Option<PathBuf> {
        DownloadHandler::new(&self.http_handler)
            .download_with_progress(path, destination, handle)
            .await
    }

    /// Firmware directory listing
    pub async fn firmware_listing(&self) -> DownloadResult<DirListing> {
        self.http_handler
            .get_json(cdn::FIRMWARE_LIST, limits::MAX_RETRIES)
            .await
    }

    /// Latest available firmware version
    ///
    /// Firmware archives embed the version in their file name; the listing
    /// is ordered, so the latest is the last `file` entry.
    pub async fn latest_firmware_version(&self) -> DownloadResult<String> {
        let listing = self.firmware_listing().await?;
        listing
            .iter()
            .filter(|entry| entry.is_file())
            .next_back()
            .and_then(|entry| parse_firmware_version(&entry.name))
            .map(str::to_string)
            .ok_or_else(|| DownloadError::MalformedBody {
                reason: "firmware listing contains no versioned archive".to_string(),
            })
    }

    /// Save-game directory listing
    pub async fn save_listing(&self) -> DownloadResult<DirListing> {
        let path = format!("{}?format=json", cdn::SAVES_PATH);
        self.http_handler.get_json(&path, limits::MAX_RETRIES).await
    }

    /// Raw save-game file contents
    pub async fn download_save_bytes(&self, file_name: &str) -> DownloadResult<Vec<u8>> {
        let url = self.saves_url(file_name)?;
        let response = self
            .http_handler
            .get_with_retries(&url, limits::MAX_RETRIES)
            .await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Top-level mods listing (one directory entry per title)
    pub async fn mods_title_listing(&self) -> DownloadResult<DirListing> {
        self.http_handler
            .get_json(cdn::MODS_TITLE_LIST, limits::MAX_RETRIES)
            .await
    }

    /// Game versions that have mods available for one title
    pub async fn mod_versions(&self, title_id: &str) -> DownloadResult<DirListing> {
        let path = cdn::MODS_VERSION_LIST.replace("{title_id}", title_id);
        self.http_handler.get_json(&path, limits::MAX_RETRIES).await
    }

    /// Mods available for one title and game version
    pub async fn mods_for_version(
        &self,
        title_id: &str,
        version: &str,
    ) -> DownloadResult<DirListing> {
        let url = self.mods_url(&[title_id, version])?;
        self.get_json_at(&url).await
    }

    /// Resolve the downloadable file of one mod
    ///
    /// A mod directory holds a single archive; returns its name and full
    /// URL, or `None` when the directory is empty.
    pub async fn mod_download_url(
        &self,
        title_id: &str,
        version: &str,
        name: &str,
    ) -> DownloadResult<Option<(String, Url)>> {
        let listing_url = self.mods_url(&[title_id, version, name])?;
        let listing: DirListing = self.get_json_at(&listing_url).await?;

        let Some(first) = listing.first() else {
            return Ok(None);
        };

        let mut file_url = listing_url;
        file_url.set_query(None);
        append_segment(&mut file_url, &first.name)?;

        Ok(Some((first.name.clone(), file_url)))
    }

    /// Per-title shader counts published by the mirror
    pub async fn shader_count_table(&self) -> DownloadResult<HashMap<String, u64>> {
        self.http_handler
            .get_json(cdn::SHADERS_LIST, limits::MAX_RETRIES)
            .await
    }

    /// Shader-count threshold; falls back to a fixed default when the
    /// endpoint is unreachable
    pub async fn compat_threshold(&self) -> u64 {
        match self.http_handler.get_text(cdn::THRESHOLD, limits::MAX_RETRIES).await {
            Ok(text) => text.trim().parse().unwrap_or(shader::DEFAULT_THRESHOLD),
            Err(e) => {
                tracing::warn!("threshold fetch failed, using default: {}", e);
                shader::DEFAULT_THRESHOLD
            }
        }
    }

    /// Production key file contents
    pub async fn download_keys(&self) -> DownloadResult<String> {
        self.http_handler
            .get_text(keys::PROD_KEYS_URL, limits::MAX_RETRIES)
            .await
    }

    /// Full title catalog JSON (large; retried more generously)
    pub async fn download_catalog_text(&self) -> DownloadResult<String> {
        self.http_handler
            .get_text(catalog::CATALOG_URL, limits::CATALOG_RETRIES)
            .await
    }

    /// Latest published application version
    ///
    /// Uses the raw path (GitHub quota). On any failure the current version
    /// is returned so an unreachable API never reports a pending update.
    pub async fn latest_release_version(&self) -> String {
        let current = env!("CARGO_PKG_VERSION").to_string();
        let Ok(url) = Url::parse(github::RELEASE_INFO) else {
            return current;
        };
        match self.http_handler.get_raw(&url).await {
            Ok(response) => match response.json::<ReleaseInfo>().await {
                Ok(info) => info.tag_name.trim_start_matches('v').to_string(),
                Err(e) => {
                    tracing::warn!("release info parse failed: {}", e);
                    current
                }
            },
            Err(e) => {
                tracing::warn!("release check failed: {}", e);
                current
            }
        }
    }

    /// Compatibility issue search (raw path, never retried)
    pub async fn search_compat_issues(&self, term: &str) -> DownloadResult<IssueSearchResults> {
        let query = format!("{} {}", term, github::COMPAT_REPO);
        let url = Url::parse_with_params(github::ISSUE_SEARCH, &[("q", query.as_str())]).map_err(
            |source| DownloadError::InvalidUrl {
                url: github::ISSUE_SEARCH.to_string(),
                source,
            },
        )?;
        let response = self.http_handler.get_raw(&url).await?;
        let results = response.json::<IssueSearchResults>().await?;
        Ok(results)
    }

    async fn get_json_at<T: serde::de::DeserializeOwned>(&self, url: &Url) -> DownloadResult<T> {
        let response = self
            .http_handler
            .get_with_retries(url, limits::MAX_RETRIES)
            .await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// Build a mods listing URL with percent-encoded path segments
    fn mods_url(&self, segments: &[&str]) -> DownloadResult<Url> {
        let mut url = self.http_handler.resolve(cdn::MODS_ROOT)?;
        for segment in segments {
            append_segment(&mut url, segment)?;
        }
        // Trailing slash marks a directory on the mirror
        append_segment(&mut url, "")?;
        url.set_query(Some("format=json"));
        Ok(url)
    }

    fn saves_url(&self, file_name: &str) -> DownloadResult<Url> {
        let mut url = self.http_handler.resolve(cdn::SAVES_PATH)?;
        append_segment(&mut url, file_name)?;
        Ok(url)
    }
}

/// Push one percent-encoded segment onto a URL path
fn append_segment(url: &mut Url, segment: &str) -> DownloadResult<()> {
    let display = url.to_string();
    url.path_segments_mut()
        .map_err(|_| DownloadError::MalformedBody {
            reason: format!("cannot-be-a-base URL: {display}"),
        })?
        .pop_if_empty()
        .push(segment);
    Ok(())
}

/// Extract the firmware version embedded in an archive file name
fn parse_firmware_version(file_name: &str) -> Option<&str> {
    file_name.strip_prefix("Firmware ")?.strip_suffix(".zip")
}
