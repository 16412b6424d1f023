//! Save-game listing and retrieval
//!
//! The mirror publishes community save files as a flat directory. Saves are
//! small archives, so retrieval buffers the whole body instead of streaming;
//! the file lands wherever the user can find it (desktop, then downloads),
//! never inside the emulator data directory.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::app::client::CdnClient;
use crate::app::models::DirEntry;
use crate::errors::{AppError, Result};

/// List the save files available on the mirror
pub async fn list_saves(client: &CdnClient) -> Result<Vec<DirEntry>> {
    let listing = client.save_listing().await?;
    Ok(listing.into_iter().filter(|e| e.is_file()).collect())
}

/// Download one save file into a destination directory
///
/// The file name comes straight from a remote listing, so it is rejected if
/// it would escape the destination directory.
pub async fn download_save(
    file_name: &str,
    client: &CdnClient,
    dest_dir: &Path,
) -> Result<PathBuf> {
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.contains("..") {
        return Err(AppError::generic(format!(
            "refusing unsafe save file name: {file_name}"
        )));
    }

    let bytes = client.download_save_bytes(file_name).await?;
    fs::create_dir_all(dest_dir).await?;
    let dest = dest_dir.join(file_name);
    fs::write(&dest, &bytes).await?;
    tracing::info!("saved {} ({} bytes)", dest.display(), bytes.len());
    Ok(dest)
}

/// Directory save downloads land in by default
pub fn default_save_dir() -> Option<PathBuf> {
    dirs::desktop_dir().or_else(dirs::download_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_unsafe_file_names_are_rejected() {
        let client = CdnClient::new().unwrap();
        let dir = tempdir().unwrap();

        for name in ["../prod.keys", "a/b.zip", "a\\b.zip", ""] {
            let result = download_save(name, &client, dir.path()).await;
            assert!(result.is_err(), "expected rejection of {name:?}");
        }
    }
}
