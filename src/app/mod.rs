//! Core synchronization components
//!
//! Everything the binary (or an embedding application) needs to mirror
//! remote emulator resources locally: the resilient HTTP client, the title
//! catalog, library reconciliation, shader/firmware/key/save installation,
//! and the compatibility lookup.

pub mod archive;
pub mod catalog;
pub mod client;
pub mod compat;
pub mod firmware;
pub mod keys;
pub mod library;
pub mod models;
pub mod proxy;
pub mod saves;
pub mod shaders;

pub use catalog::TitleCatalog;
pub use client::{CdnClient, ClientConfig, DownloadHandle, DownloadProgress};
pub use compat::{CompatibilityService, IssueSearch};
pub use models::{CompatibilityRecord, DirEntry, TitleId, TitleMeta};
pub use proxy::ProxyStore;
