//! ryusync CLI application
//!
//! Command-line companion for the Ryujinx emulator: downloads and installs
//! firmware, shader caches, keys and saves from community mirrors, with
//! progress display and cancellation.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ryusync::cli::{self, Cli, Commands, Context};
use ryusync::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(&cli);

    info!("ryusync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        // Proxy management works without a client; everything else builds one
        Commands::Proxy(args) => cli::handle_proxy(args.action).await,
        command => {
            let ctx = Context::build(&cli.global).await?;
            match command {
                Commands::Scan => cli::handle_scan(&ctx).await,
                Commands::Library => cli::handle_library(&ctx).await,
                Commands::Meta { title_id } => cli::handle_meta(&ctx, &title_id).await,
                Commands::Firmware(args) => cli::handle_firmware(&ctx, args.action).await,
                Commands::Keys => cli::handle_keys(&ctx).await,
                Commands::Shaders(args) => cli::handle_shaders(&ctx, args.action).await,
                Commands::Saves(args) => cli::handle_saves(&ctx, args.action).await,
                Commands::Mods(args) => cli::handle_mods(&ctx, args.action).await,
                Commands::Compat { title_id } => cli::handle_compat(&ctx, &title_id).await,
                Commands::DeleteGame { title_id } => {
                    cli::handle_delete_game(&ctx, &title_id).await
                }
                Commands::CheckUpdate => cli::handle_check_update(&ctx).await,
                Commands::Proxy(_) => unreachable!("handled before client construction"),
            }
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("ryusync={}", log_level).parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
