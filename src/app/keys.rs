//! Production key installation
//!
//! The emulator refuses to decrypt firmware or game content without
//! `prod.keys` in its `system` directory. Key files are small, so the
//! download is plain text with the standard retry policy rather than a
//! progress-tracked stream.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::app::client::CdnClient;
use crate::constants::keys;
use crate::errors::Result;

/// Download and install `prod.keys` into the emulator data directory
///
/// Returns the path of the installed key file.
pub async fn install_keys(data_path: &Path, client: &CdnClient) -> Result<PathBuf> {
    let contents = client.download_keys().await?;
    let path = write_keys(data_path, &contents).await?;
    tracing::info!("installed keys at {}", path.display());
    Ok(path)
}

pub(crate) async fn write_keys(data_path: &Path, contents: &str) -> std::io::Result<PathBuf> {
    let system_dir = data_path.join("system");
    fs::create_dir_all(&system_dir).await?;
    let path = system_dir.join(keys::PROD_KEYS_FILE_NAME);
    fs::write(&path, contents).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_keys_creates_system_dir() {
        let dir = tempdir().unwrap();
        let path = write_keys(dir.path(), "header_key = 00\n").await.unwrap();

        assert_eq!(path, dir.path().join("system").join(keys::PROD_KEYS_FILE_NAME));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "header_key = 00\n");
    }

    #[tokio::test]
    async fn test_write_keys_overwrites_existing() {
        let dir = tempdir().unwrap();
        write_keys(dir.path(), "old").await.unwrap();
        let path = write_keys(dir.path(), "new").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "new");
    }
}
