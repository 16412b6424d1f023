//! Persisted proxy configuration
//!
//! The proxy setting is a single plaintext URL stored in the application's
//! configuration directory; an absent file means the proxy is disabled.
//! Reads happen at client construction time, writes when the user changes
//! the setting.

use std::path::PathBuf;

use tokio::fs;
use url::Url;

use crate::constants::files;
use crate::errors::{ConfigError, ConfigResult};

/// Plaintext proxy URL store
#[derive(Debug, Clone)]
pub struct ProxyStore {
    file: PathBuf,
}

impl ProxyStore {
    /// Store rooted at the given configuration directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            file: config_dir.join(files::PROXY_FILE_NAME),
        }
    }

    /// Store rooted at the default per-user configuration directory
    pub fn default_location() -> ConfigResult<Self> {
        let dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(env!("CARGO_PKG_NAME"));
        Ok(Self::new(dir))
    }

    /// Currently configured proxy URL, or `None` when disabled
    pub async fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.file).await.ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Persist a new proxy URL, or remove the setting with `None`
    ///
    /// The URL is validated before it is written so a broken value can never
    /// poison client construction on the next launch.
    pub async fn set(&self, proxy: Option<&str>) -> ConfigResult<()> {
        match proxy {
            Some(url) => {
                Url::parse(url).map_err(|_| ConfigError::InvalidProxy {
                    url: url.to_string(),
                })?;
                if let Some(parent) = self.file.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|source| ConfigError::Io {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
                fs::write(&self.file, url)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: self.file.clone(),
                        source,
                    })
            }
            None => match fs::remove_file(&self.file).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(ConfigError::Io {
                    path: self.file.clone(),
                    source,
                }),
            },
        }
    }
}
