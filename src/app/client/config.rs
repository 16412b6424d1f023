//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of HTTP clients
//! used against the mirror CDN and the rate-limited GitHub endpoints.

use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the outbound HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Client-side rate limit for CDN requests (requests per second)
    pub rate_limit_rps: u32,
    /// Optional proxy URL routing both HTTP and HTTPS traffic
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::CDN_RATE_LIMIT_RPS,
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        let mut builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle_timeout);
        }

        // A single proxy covers both schemes, matching the one-URL proxy file
        if let Some(proxy_url) = &self.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|_| ConfigError::InvalidProxy {
                url: proxy_url.clone(),
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(ConfigError::ClientBuild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert!(config.proxy.is_none());
        assert_eq!(config.rate_limit_rps, limits::CDN_RATE_LIMIT_RPS);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig::default();
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_http_client_with_proxy() {
        let config = ClientConfig {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = ClientConfig {
            proxy: Some("not a url".to_string()),
            ..Default::default()
        };
        match config.build_http_client() {
            Err(ConfigError::InvalidProxy { url }) => assert_eq!(url, "not a url"),
            other => panic!("expected InvalidProxy, got {:?}", other.map(|_| ())),
        }
    }
}
