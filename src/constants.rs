//! Application constants for ryusync
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// CDN mirror base URL and path templates
///
/// Paths containing `{placeholder}` segments are filled in by the client
/// before the request is issued. Directory listings are requested with the
/// `?format=json` suffix.
pub mod cdn {
    /// Base URL for the file mirror hosting firmware, shaders, saves and mods
    pub const BASE_URL: &str = "https://mirror.lewd.wtf";

    /// Firmware directory listing
    pub const FIRMWARE_LIST: &str = "/archive/nintendo/switch/firmware/?format=json";

    /// Firmware archive for a specific version
    pub const FIRMWARE_ZIP: &str = "/archive/nintendo/switch/firmware/Firmware {fw_version}.zip";

    /// Root of the mods tree; deeper listings append encoded segments
    pub const MODS_ROOT: &str = "/archive/nintendo/switch/mods/";

    /// Top-level mods directory listing (one entry per title)
    pub const MODS_TITLE_LIST: &str = "/archive/nintendo/switch/mods/?format=json";

    /// Game-version listing for one title's mods
    pub const MODS_VERSION_LIST: &str = "/archive/nintendo/switch/mods/{title_id}/?format=json";

    /// Save-game directory
    pub const SAVES_PATH: &str = "/archive/nintendo/switch/savegames/";

    /// Per-title shader counts published by the mirror
    pub const SHADERS_LIST: &str = "/archive/nintendo/switch/ryusak/shader_count.json";

    /// OpenGL shader cache archive for one title
    pub const SHADER_ZIP: &str = "/archive/nintendo/switch/shaders/ogl/{title_id}.zip";

    /// Minimum shader count threshold advertised by the mirror
    pub const THRESHOLD: &str = "/archive/nintendo/switch/ryusak/threshold.txt";
}

/// GitHub endpoints (rate limited upstream; 10 requests/minute unauthenticated)
pub mod github {
    /// Latest release metadata, used for the update check
    pub const RELEASE_INFO: &str = "https://api.github.com/repos/Ecks1337/RyuSAK/releases/latest";

    /// Issue search endpoint prefix; the query term is appended
    pub const ISSUE_SEARCH: &str = "https://api.github.com/search/issues";

    /// Repository qualifier for compatibility issue searches
    pub const COMPAT_REPO: &str = "repo:Ryujinx/Ryujinx-Games-List";
}

/// Remote title catalog configuration
pub mod catalog {
    use super::Duration;

    /// Full title catalog (id -> name/icon) for the US/English locale
    pub const CATALOG_URL: &str =
        "https://raw.githubusercontent.com/blawar/titledb/master/US.en.json";

    /// Local catalog cache file name, keyed by locale
    pub const CACHE_FILE_NAME: &str = "titles.US.en.json";

    /// File storing the timestamp of the last successful catalog refresh
    pub const STAMP_FILE_NAME: &str = "titles.US.en.updated";

    /// Minimum interval between catalog refreshes
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Decryption key endpoint
pub mod keys {
    /// Production key file matching the latest firmware
    pub const PROD_KEYS_URL: &str = "http://emusak.coveforme.com/firmware/prod.keys";

    /// File name written under the emulator's `system` directory
    pub const PROD_KEYS_FILE_NAME: &str = "prod.keys";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("ryusync/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Retry and rate limiting configuration
pub mod limits {
    /// Default retry attempts for CDN requests
    pub const MAX_RETRIES: u32 = 3;

    /// Retry attempts for the full catalog download (less critical metadata)
    pub const CATALOG_RETRIES: u32 = 5;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Client-side rate limit for CDN requests (requests per second)
    pub const CDN_RATE_LIMIT_RPS: u32 = 10;
}

/// Shader cache index binary contract
///
/// The index file (`shared.toc`) carries a 32-byte header followed by one
/// 8-byte record per compiled shader. The version field is a 64-bit
/// little-endian integer at byte offset 4; caches older than
/// `MIN_ACCEPTED_VERSION` are rejected by current Ryujinx builds and are
/// reported as empty.
pub mod shader {
    /// Byte offset of the version field inside the index header
    pub const VERSION_OFFSET: u64 = 4;

    /// Width of the version field in bytes
    pub const VERSION_FIELD_LEN: usize = 8;

    /// Oldest cache version current Ryujinx builds still load
    pub const MIN_ACCEPTED_VERSION: u64 = 65537;

    /// Fixed header size preceding the index entries
    pub const HEADER_SIZE: u64 = 32;

    /// Size of one index entry
    pub const ENTRY_SIZE: u64 = 8;

    /// Index file name inside a title's shader cache directory
    pub const TOC_FILE_NAME: &str = "shared.toc";

    /// Temporary archive name used during shader installation
    pub const ARCHIVE_NAME: &str = "cache.zip";

    /// Fallback threshold when the mirror's threshold endpoint is unreachable
    pub const DEFAULT_THRESHOLD: u64 = 10_000_000;
}

/// Progress reporting
pub mod progress {
    use super::Duration;

    /// Minimum wall-clock interval between progress events for one download
    pub const EMIT_INTERVAL: Duration = Duration::from_millis(200);
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Plaintext proxy configuration file name (absent = proxy disabled)
    pub const PROXY_FILE_NAME: &str = "proxy.txt";

    /// Temporary firmware archive name
    pub const FIRMWARE_ARCHIVE_NAME: &str = "firmware.zip";
}

/// Title identifier constants
pub mod titles {
    /// Reserved identifier used by homebrew; never a real catalog title
    pub const SENTINEL_TITLE_ID: &str = "0000000000000000";

    /// Length of a title identifier in hexadecimal characters
    pub const TITLE_ID_LEN: usize = 16;
}

// Re-export commonly used constants for convenience
pub use cdn::BASE_URL as CDN_BASE_URL;
pub use http::USER_AGENT;
pub use limits::{MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use titles::SENTINEL_TITLE_ID;
