//! Error types for ryusync
//!
//! This module defines error types for all components of the application.
//! The taxonomy follows the failure model of the sync core: transient network
//! failures are retried at the HTTP layer and surface as a generic failure
//! once retries are exhausted; remote rejections (HTTP >= 400) abort
//! immediately; cancellation and local cleanup failures are handled at the
//! call site and never reach these types.

use std::path::PathBuf;

use thiserror::Error;

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server rejected the request; never retried (content not found,
    /// not a degraded network)
    #[error("server rejected request: HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Maximum retries exceeded for a connection-level failure
    #[error("request failed after {retries} retries")]
    MaxRetriesExceeded { retries: u32 },

    /// Invalid URL provided or constructed
    #[error("invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// I/O error during file operations
    #[error("file I/O error")]
    Io(#[from] std::io::Error),

    /// A progress-tracked download resolved to nothing (failed or cancelled)
    #[error("download failed or was cancelled: {path}")]
    Aborted { path: PathBuf },

    /// Response body did not match the expected shape
    #[error("malformed response body: {reason}")]
    MalformedBody { reason: String },
}

/// Title catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// I/O error reading or writing the local catalog cache
    #[error("catalog cache I/O error")]
    Io(#[from] std::io::Error),

    /// Catalog JSON could not be parsed
    #[error("catalog JSON parsing error")]
    JsonParse(#[from] serde_json::Error),

    /// Catalog download failed
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error opening the archive or writing extracted files
    #[error("archive I/O error")]
    Io(#[from] std::io::Error),

    /// Archive is corrupt or uses an unsupported format
    #[error("archive extraction failed")]
    Zip(#[from] zip::result::ZipError),

    /// Background extraction task terminated abnormally
    #[error("archive extraction task failed")]
    TaskFailed,
}

/// Shader cache inspection and installation errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// I/O error reading the index file or preparing the cache directory
    #[error("shader cache I/O error")]
    Io(#[from] std::io::Error),

    /// Shader archive could not be extracted
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file I/O error
    #[error("configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configured proxy URL is not a valid URL
    #[error("invalid proxy URL: {url}")]
    InvalidProxy { url: String },

    /// HTTP client could not be constructed from the configuration
    #[error("HTTP client construction failed")]
    ClientBuild(#[source] reqwest::Error),

    /// No usable configuration directory on this system
    #[error("no configuration directory available")]
    NoConfigDir,

    /// Invalid configuration value
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Shader error
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Title identifier parsing error
    #[error(transparent)]
    TitleId(#[from] crate::app::models::TitleIdError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Download(DownloadError::Http(_))
                | AppError::Download(DownloadError::MaxRetriesExceeded { .. })
                | AppError::Catalog(CatalogError::Download(_))
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Catalog(_) => "catalog",
            AppError::Shader(_) => "shader",
            AppError::Archive(_) => "archive",
            AppError::Config(_) => "config",
            AppError::TitleId(_) => "title-id",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Shader result type alias
pub type ShaderResult<T> = std::result::Result<T, ShaderError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
