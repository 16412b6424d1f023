//! Shader cache inspection and installation
//!
//! The per-title shader cache lives under
//! `<data_path>/games/<title_id>/cache/shader/`. Its index file carries a
//! version tag at a fixed offset; caches older than the minimum accepted
//! version would be rejected by the emulator, so they are reported as empty
//! rather than surfacing a stale count. Installation replaces the whole
//! cache directory to avoid mixing incompatible cache generations.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use crate::app::archive;
use crate::app::client::{CdnClient, DownloadHandle};
use crate::app::models::TitleId;
use crate::constants::{cdn, shader};
use crate::errors::ShaderResult;

/// Shader cache directory for one title
pub fn shader_dir(data_path: &Path, title_id: &TitleId) -> PathBuf {
    data_path
        .join("games")
        .join(title_id.dir_name())
        .join("cache")
        .join("shader")
}

/// Count locally compiled shaders for one title
///
/// Returns 0 for a missing index, and 0 for caches below the minimum
/// accepted version regardless of file size. Otherwise the count is
/// `(size - header) / entry_size`, exact by construction of the format.
pub async fn count_shaders(title_id: &TitleId, data_path: &Path) -> ShaderResult<u64> {
    let toc_path = shader_dir(data_path, title_id).join(shader::TOC_FILE_NAME);

    let mut file = match File::open(&toc_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut version_bytes = [0u8; shader::VERSION_FIELD_LEN];
    file.seek(SeekFrom::Start(shader::VERSION_OFFSET)).await?;
    if file.read_exact(&mut version_bytes).await.is_err() {
        // Too short to carry a header; nothing usable
        return Ok(0);
    }
    let cache_version = u64::from_le_bytes(version_bytes);

    if cache_version < shader::MIN_ACCEPTED_VERSION {
        tracing::debug!(
            "shader cache for {} is version {}, below accepted minimum",
            title_id,
            cache_version
        );
        return Ok(0);
    }

    let size = file.metadata().await?.len();
    Ok(size.saturating_sub(shader::HEADER_SIZE) / shader::ENTRY_SIZE)
}

/// Replace the local shader cache for one title with the mirror's archive
///
/// Destructive: the existing cache directory is emptied before the download
/// so incompatible generations never mix. Returns `Ok(false)` when the
/// download failed or was cancelled (the caller retries), `Ok(true)` on
/// success.
pub async fn install_shaders(
    title_id: &TitleId,
    data_path: &Path,
    client: &CdnClient,
    handle: &DownloadHandle,
) -> ShaderResult<bool> {
    let cache_dir = shader_dir(data_path, title_id);
    archive::recreate_dir(&cache_dir).await?;

    let archive_dest = cache_dir.join(shader::ARCHIVE_NAME);
    let remote_path = cdn::SHADER_ZIP.replace("{title_id}", title_id.as_str());

    let Some(archive_path) = client
        .download_with_progress(&remote_path, &archive_dest, handle)
        .await
    else {
        return Ok(false);
    };

    archive::extract(archive_path.clone(), cache_dir).await?;

    // Temp archive cleanup is best effort
    let _ = fs::remove_file(&archive_path).await;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TITLE: &str = "0100ABCD00000000";

    /// Build an index file: 32-byte header with the version at offset 4,
    /// followed by `entries` 8-byte records.
    fn toc_bytes(version: u64, entries: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; shader::HEADER_SIZE as usize];
        bytes[4..12].copy_from_slice(&version.to_le_bytes());
        bytes.extend(std::iter::repeat(0u8).take(entries * shader::ENTRY_SIZE as usize));
        bytes
    }

    async fn write_toc(data_path: &Path, bytes: &[u8]) {
        let id = TitleId::parse(TITLE).unwrap();
        let dir = shader_dir(data_path, &id);
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join(shader::TOC_FILE_NAME), bytes).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_matches_entry_arithmetic() {
        let dir = tempdir().unwrap();
        let id = TitleId::parse(TITLE).unwrap();
        write_toc(dir.path(), &toc_bytes(shader::MIN_ACCEPTED_VERSION, 1234)).await;

        let count = count_shaders(&id, dir.path()).await.unwrap();
        assert_eq!(count, 1234);
    }

    #[tokio::test]
    async fn test_header_only_cache_counts_zero() {
        let dir = tempdir().unwrap();
        let id = TitleId::parse(TITLE).unwrap();
        write_toc(dir.path(), &toc_bytes(shader::MIN_ACCEPTED_VERSION, 0)).await;

        assert_eq!(count_shaders(&id, dir.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_old_cache_version_is_rejected() {
        let dir = tempdir().unwrap();
        let id = TitleId::parse(TITLE).unwrap();
        write_toc(
            dir.path(),
            &toc_bytes(shader::MIN_ACCEPTED_VERSION - 1, 500),
        )
        .await;

        assert_eq!(count_shaders(&id, dir.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_index_counts_zero() {
        let dir = tempdir().unwrap();
        let id = TitleId::parse(TITLE).unwrap();
        assert_eq!(count_shaders(&id, dir.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_truncated_index_counts_zero() {
        let dir = tempdir().unwrap();
        let id = TitleId::parse(TITLE).unwrap();
        write_toc(dir.path(), &[0u8; 6]).await;

        assert_eq!(count_shaders(&id, dir.path()).await.unwrap(), 0);
    }
}
