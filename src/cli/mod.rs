//! Command-line interface components
//!
//! CLI-specific code: argument parsing, command handlers and the terminal
//! progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, GlobalArgs};
pub use commands::{
    handle_check_update, handle_compat, handle_delete_game, handle_firmware, handle_keys,
    handle_library, handle_meta, handle_mods, handle_proxy, handle_saves, handle_scan,
    handle_shaders, Context,
};
pub use progress::attach_progress_bar;
