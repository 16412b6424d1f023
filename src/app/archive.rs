//! Archive extraction helpers
//!
//! Zip extraction is synchronous in the `zip` crate, so it runs on the
//! blocking pool. Shader and firmware installs both follow the same
//! "clean directory, extract archive into it" shape; the directory reset
//! lives here alongside extraction.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::task;

use crate::errors::{ArchiveError, ArchiveResult};

/// Extract a zip archive into a directory, overwriting existing files
pub async fn extract(archive: PathBuf, dest: PathBuf) -> ArchiveResult<()> {
    task::spawn_blocking(move || -> ArchiveResult<()> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        zip.extract(&dest)?;
        Ok(())
    })
    .await
    .map_err(|_| ArchiveError::TaskFailed)?
}

/// Remove a directory's contents and recreate it empty
pub async fn recreate_dir(dir: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir).await
}
