//! Local game-library reconciliation
//!
//! Scans the emulator's data directory for installed-title folders and joins
//! them against the metadata resolver to produce the displayed library.
//! Folder names that are not title identifiers and the reserved homebrew
//! placeholder are skipped; a missing `games` directory is an empty library,
//! not an error.

use std::path::Path;

use futures::future::join_all;
use tokio::fs;

use crate::app::catalog::TitleCatalog;
use crate::app::models::{TitleId, TitleMeta};

/// Enumerate installed titles under `data_path/games`
pub async fn scan_games(data_path: &Path) -> Vec<TitleId> {
    let games_dir = data_path.join("games");
    let mut entries = match fs::read_dir(&games_dir).await {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut titles = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        match TitleId::parse(name) {
            Ok(id) if id.is_sentinel() => {
                tracing::debug!("skipping homebrew placeholder entry");
            }
            Ok(id) => titles.push(id),
            Err(_) => {
                tracing::debug!("skipping non-title directory: {}", name);
            }
        }
    }
    titles
}

/// Scan and resolve the full library, resolving titles concurrently
pub async fn build_library(data_path: &Path, catalog: &TitleCatalog) -> Vec<TitleMeta> {
    let titles = scan_games(data_path).await;
    join_all(titles.iter().map(|id| catalog.meta(id))).await
}

/// Remove a title's entire subtree
///
/// Best effort: a locked file should not block the user, so failures are
/// logged and swallowed.
pub async fn delete_game(title_id: &TitleId, data_path: &Path) {
    let game_dir = data_path.join("games").join(title_id.dir_name());
    if let Err(e) = fs::remove_dir_all(&game_dir).await {
        tracing::warn!("failed to delete {}: {}", game_dir.display(), e);
    }
}
