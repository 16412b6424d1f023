//! ryusync library
//!
//! Sync core for mirroring remote Ryujinx resources (firmware, shader
//! caches, keys, saves, mods) into a local installation, with resilient
//! retrying downloads, progress tracking and community compatibility lookup.

pub mod app;
pub mod cli;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(MAX_RETRIES, 3);
        assert_eq!(SENTINEL_TITLE_ID, "0000000000000000");
        assert!(USER_AGENT.starts_with("ryusync/"));
    }

    #[test]
    fn test_error_types() {
        let download_error = errors::DownloadError::MaxRetriesExceeded { retries: 3 };
        let app_error = AppError::Download(download_error);

        assert_eq!(app_error.category(), "download");
        assert!(app_error.is_recoverable());
    }
}
