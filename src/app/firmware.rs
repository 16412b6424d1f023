//! Firmware installation
//!
//! Downloads a firmware archive from the mirror, replaces the emulator's
//! registered-contents directory with its contents, and rearranges the
//! extracted files into the layout Ryujinx expects: each content file moves
//! into a directory named after it (minus any `.cnmt` marker) as `00`.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::app::archive;
use crate::app::client::{CdnClient, DownloadHandle};
use crate::constants::{cdn, files};
use crate::errors::{DownloadError, Result};

/// Download and install a firmware version into the emulator data directory
///
/// Returns the registered-contents path on success. A failed or cancelled
/// download surfaces as `DownloadError::Aborted` so the caller can report
/// "fetch failed" without inspecting partial state.
pub async fn install_firmware(
    data_path: &Path,
    version: &str,
    client: &CdnClient,
    handle: &DownloadHandle,
) -> Result<PathBuf> {
    let archive_dest = std::env::temp_dir().join(files::FIRMWARE_ARCHIVE_NAME);
    let remote_path = cdn::FIRMWARE_ZIP.replace("{fw_version}", version);

    let Some(archive_path) = client
        .download_with_progress(&remote_path, &archive_dest, handle)
        .await
    else {
        return Err(DownloadError::Aborted { path: archive_dest }.into());
    };

    let registered = data_path
        .join("bis")
        .join("system")
        .join("Contents")
        .join("registered");

    archive::recreate_dir(&registered).await?;
    archive::extract(archive_path.clone(), registered.clone()).await?;
    let _ = fs::remove_file(&archive_path).await;

    layout_registered_contents(&registered).await?;
    Ok(registered)
}

/// Rearrange extracted firmware files into per-content directories
///
/// Runs strictly sequentially: concurrent renames trip permission errors on
/// Windows.
async fn layout_registered_contents(registered: &Path) -> std::io::Result<()> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(registered).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    for name in names {
        let staged = registered.join("00");
        fs::rename(registered.join(&name), &staged).await?;

        let content_dir = registered.join(name.replace(".cnmt", ""));
        fs::create_dir_all(&content_dir).await?;
        fs::rename(&staged, content_dir.join("00")).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_layout_moves_files_into_content_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("abc123.nca"), b"content-a").await.unwrap();
        fs::write(dir.path().join("def456.cnmt.nca"), b"content-b").await.unwrap();

        layout_registered_contents(dir.path()).await.unwrap();

        assert_eq!(
            fs::read(dir.path().join("abc123.nca").join("00")).await.unwrap(),
            b"content-a"
        );
        // The .cnmt marker is dropped from the directory name
        assert_eq!(
            fs::read(dir.path().join("def456.nca").join("00")).await.unwrap(),
            b"content-b"
        );
        assert!(!dir.path().join("def456.cnmt.nca").exists());
    }

    #[tokio::test]
    async fn test_layout_of_empty_dir_is_noop() {
        let dir = tempdir().unwrap();
        layout_registered_contents(dir.path()).await.unwrap();
        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
