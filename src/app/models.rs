//! Core data types shared across the sync components
//!
//! Defines the canonical title identifier, the tagged directory-listing
//! entity reused by every mirror listing endpoint, resolved title metadata,
//! and the compatibility record shape returned by the issue-tracker lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::titles;

/// Error produced when a string is not a valid title identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid title id: {input:?} ({reason})")]
pub struct TitleIdError {
    pub input: String,
    pub reason: &'static str,
}

/// A 16-hex-character Switch title identifier
///
/// Input is case-insensitive; the canonical form is uppercase. Filesystem
/// path segments use the lowercase form (`dir_name`), matching the layout
/// Ryujinx writes under its data directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TitleId(String);

impl TitleId {
    /// Parse and normalize a title identifier
    pub fn parse(input: &str) -> Result<Self, TitleIdError> {
        let trimmed = input.trim();
        if trimmed.len() != titles::TITLE_ID_LEN {
            return Err(TitleIdError {
                input: input.to_string(),
                reason: "expected 16 characters",
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TitleIdError {
                input: input.to_string(),
                reason: "expected hexadecimal characters",
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Canonical uppercase form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used as a filesystem path segment
    pub fn dir_name(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Whether this is the reserved all-zero homebrew placeholder
    pub fn is_sentinel(&self) -> bool {
        self.0 == titles::SENTINEL_TITLE_ID
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TitleId {
    type Err = TitleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TitleId {
    type Error = TitleIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TitleId> for String {
    fn from(id: TitleId) -> Self {
        id.0
    }
}

/// Entry kind inside a mirror directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry of a mirror directory listing
///
/// The same shape is served for firmware, mods and save listings, so it is
/// modeled once here instead of ad hoc per endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub mtime: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl DirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Ordered mirror directory listing
pub type DirListing = Vec<DirEntry>;

/// One raw catalog record (remote catalog or bundled override table)
///
/// Name and icon are optional in the wire format; resolution fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "iconUrl")]
    pub icon_url: Option<String>,
}

/// Fully resolved title metadata
///
/// Produced by the metadata resolver; every field is populated. An unknown
/// identifier resolves to itself with an empty icon, so construction is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMeta {
    pub id: String,
    pub name: String,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
}

/// Label attached to a compatibility issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One issue returned by the compatibility search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueItem {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
}

/// Raw issue-search response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSearchResults {
    #[serde(default)]
    pub items: Vec<IssueItem>,
}

/// How a compatibility record was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Matched by exact title identifier
    Id,
    /// Matched by resolved display name
    Name,
}

/// Community-reported compatibility status for one title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityRecord {
    pub title_id: TitleId,
    pub labels: Vec<GithubLabel>,
    pub mode: ResolutionMode,
}

/// Latest-release response body used by the update check
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_id_normalizes_to_uppercase() {
        let id = TitleId::parse("010000000000beef").unwrap();
        assert_eq!(id.as_str(), "010000000000BEEF");
        assert_eq!(id.dir_name(), "010000000000beef");
    }

    #[test]
    fn test_title_id_rejects_bad_input() {
        assert!(TitleId::parse("nope").is_err());
        assert!(TitleId::parse("01000000_0000BEEF").is_err());
        assert!(TitleId::parse("010000000000BEEF00").is_err());
    }

    #[test]
    fn test_sentinel_detection() {
        let id = TitleId::parse("0000000000000000").unwrap();
        assert!(id.is_sentinel());
        let id = TitleId::parse("0100ABCD00000000").unwrap();
        assert!(!id.is_sentinel());
    }

    #[test]
    fn test_dir_listing_parses_mirror_json() {
        let json = r#"[
            {"name": "Firmware 16.0.3.zip", "type": "file", "mtime": "Tue, 02 May 2023 12:00:00 GMT", "size": 420000000},
            {"name": "old", "type": "dir", "mtime": "Mon, 01 May 2023 12:00:00 GMT"}
        ]"#;
        let listing: DirListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing[0].is_file());
        assert!(listing[1].is_dir());
        assert_eq!(listing[0].size, Some(420000000));
    }

    #[test]
    fn test_unknown_entry_kind_is_tolerated() {
        let json = r#"[{"name": "link", "type": "symlink"}]"#;
        let listing: DirListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing[0].kind, EntryKind::Other);
    }

    #[test]
    fn test_issue_search_defaults() {
        let results: IssueSearchResults = serde_json::from_str("{}").unwrap();
        assert!(results.items.is_empty());
    }
}
