//! Core HTTP operations with rate limiting and retry logic
//!
//! This module provides the fundamental HTTP request operations with
//! built-in resilience patterns. Connection-level failures (DNS, reset,
//! timeout) are retried with exponential backoff; a response status >= 400
//! aborts immediately because the mirror answers 4xx/5xx for missing
//! content, not for transient conditions. A separate raw path exists for
//! the GitHub endpoints, which are rate limited upstream and must never be
//! amplified by retries.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::constants::limits;
use crate::errors::{ConfigError, ConfigResult, DownloadError, DownloadResult};

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    base_url: Url,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client, CDN base and rate limit
    pub fn new(client: Client, base_url: Url, rate_limit_rps: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            base_url,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ConfigResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "rate_limit_rps".to_string(),
                reason: "rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    /// Resolve a path against the CDN base URL
    ///
    /// Absolute URLs pass through unchanged, so the same entry point serves
    /// both mirror paths and fully qualified endpoints.
    pub fn resolve(&self, path: &str) -> DownloadResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| DownloadError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    /// Fetches a response with rate limiting and bounded retries
    ///
    /// Retries target connection-level failures only. Any response carrying
    /// a status >= 400 is a non-retryable abort (verifiable: attempt count
    /// stays at 1 for a 404).
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Status` on remote rejection, or
    /// `DownloadError::MaxRetriesExceeded` once the attempt budget is spent.
    pub async fn get_with_retries(
        &self,
        url: &Url,
        retries: u32,
    ) -> DownloadResult<reqwest::Response> {
        // Apply rate limiting with jitter to avoid thundering herd
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut attempt = 0;
        loop {
            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.as_u16() >= 400 {
                        tracing::debug!("non-retryable status {} for {}", status, url);
                        return Err(DownloadError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    tracing::debug!("successfully fetched response: {}", url);
                    return Ok(response);
                }
                Err(e) if attempt < retries => {
                    attempt += 1;
                    let delay =
                        Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(attempt));
                    tracing::warn!(
                        "request failed (attempt {}/{}): {}. Retrying in {}ms",
                        attempt,
                        retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("request failed after {} retries: {}", retries, e);
                    return Err(DownloadError::MaxRetriesExceeded { retries });
                }
            }
        }
    }

    /// Fetches a mirror path and decodes the body as JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        retries: u32,
    ) -> DownloadResult<T> {
        let url = self.resolve(path)?;
        let response = self.get_with_retries(&url, retries).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// Fetches a mirror path as raw text
    pub async fn get_text(&self, path: &str, retries: u32) -> DownloadResult<String> {
        let url = self.resolve(path)?;
        let response = self.get_with_retries(&url, retries).await?;
        let text = response.text().await?;
        Ok(text)
    }

    /// Single-attempt fetch bypassing the limiter and the retry loop
    ///
    /// Reserved for endpoints with a provider-side quota (release check,
    /// compatibility search); retrying those would worsen the quota
    /// situation.
    pub async fn get_raw(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}
