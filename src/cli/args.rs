//! Command-line argument parsing
//!
//! Defines the CLI structure using clap derive macros. Every command maps
//! onto one operation of the sync core; commands that touch the emulator
//! data directory take it from `--data-dir` or fall back to the platform
//! default Ryujinx location.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ryusync - Sync firmware, shaders, saves and mods for Ryujinx
#[derive(Parser, Debug)]
#[command(
    name = "ryusync",
    version,
    about = "Download and install Ryujinx firmware, shader caches, keys, saves and mods",
    long_about = "Companion tool for the Ryujinx emulator. Mirrors community-hosted firmware,
shader caches, save files and mods into a local Ryujinx installation, with retrying
downloads, progress display and cancellation."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Ryujinx data directory (defaults to the platform configuration dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed title identifiers
    Scan,

    /// Show the installed library with resolved names
    Library,

    /// Resolve metadata for one title identifier
    Meta {
        /// 16-hex-character title identifier
        title_id: String,
    },

    /// Firmware operations
    Firmware(FirmwareArgs),

    /// Download and install production keys
    Keys,

    /// Shader cache operations
    Shaders(ShaderArgs),

    /// Save-game operations
    Saves(SaveArgs),

    /// Mod browsing operations
    Mods(ModArgs),

    /// Look up community compatibility reports for a title
    Compat {
        /// 16-hex-character title identifier
        title_id: String,
    },

    /// Delete a title's local data (cache, saves metadata)
    DeleteGame {
        /// 16-hex-character title identifier
        title_id: String,
    },

    /// Manage the HTTP proxy configuration
    Proxy(ProxyArgs),

    /// Check whether a newer release is available
    CheckUpdate,
}

/// Arguments for firmware operations
#[derive(Args, Debug)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub action: FirmwareAction,
}

/// Firmware actions
#[derive(Subcommand, Debug)]
pub enum FirmwareAction {
    /// List firmware versions available on the mirror
    List,

    /// Download and install a firmware version
    Install {
        /// Firmware version (defaults to the latest available)
        #[arg(value_name = "VERSION")]
        version: Option<String>,
    },
}

/// Arguments for shader cache operations
#[derive(Args, Debug)]
pub struct ShaderArgs {
    #[command(subcommand)]
    pub action: ShaderAction,
}

/// Shader cache actions
#[derive(Subcommand, Debug)]
pub enum ShaderAction {
    /// Count locally compiled shaders against the mirror's count
    Count {
        /// 16-hex-character title identifier
        title_id: String,
    },

    /// Replace the local shader cache with the mirror's archive
    Install {
        /// 16-hex-character title identifier
        title_id: String,
    },
}

/// Arguments for save-game operations
#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(subcommand)]
    pub action: SaveAction,
}

/// Save-game actions
#[derive(Subcommand, Debug)]
pub enum SaveAction {
    /// List save files available on the mirror
    List,

    /// Download one save file
    Get {
        /// File name exactly as shown by `saves list`
        file_name: String,

        /// Destination directory (defaults to desktop, then downloads)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
    },
}

/// Arguments for mod browsing
#[derive(Args, Debug)]
pub struct ModArgs {
    #[command(subcommand)]
    pub action: ModAction,
}

/// Mod browsing actions
#[derive(Subcommand, Debug)]
pub enum ModAction {
    /// List titles that have mods available
    Titles,

    /// List game versions with mods for one title
    Versions {
        /// 16-hex-character title identifier
        title_id: String,
    },

    /// List mods for one title and game version
    List {
        /// 16-hex-character title identifier
        title_id: String,

        /// Game version as shown by `mods versions`
        version: String,
    },

    /// Resolve the download URL of one mod
    Url {
        /// 16-hex-character title identifier
        title_id: String,

        /// Game version as shown by `mods versions`
        version: String,

        /// Mod name as shown by `mods list`
        name: String,
    },
}

/// Arguments for proxy management
#[derive(Args, Debug)]
pub struct ProxyArgs {
    #[command(subcommand)]
    pub action: ProxyAction,
}

/// Proxy management actions
#[derive(Subcommand, Debug)]
pub enum ProxyAction {
    /// Set the proxy URL used for all HTTP traffic
    Set {
        /// Proxy URL, e.g. http://127.0.0.1:8080
        url: String,
    },

    /// Remove the proxy configuration
    Clear,

    /// Show the current proxy configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
