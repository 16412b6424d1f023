//! Command handlers
//!
//! Each handler wires CLI arguments to one operation of the sync core. The
//! shared [`Context`] builds the HTTP client from the persisted proxy
//! setting and lazily opens the title catalog; download commands attach a
//! progress bar and a Ctrl-C listener to their download handle.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::client::{CdnClient, ClientConfig, DownloadHandle};
use crate::app::{
    catalog::TitleCatalog,
    compat::CompatibilityService,
    firmware, keys, library,
    models::TitleId,
    proxy::ProxyStore,
    saves, shaders,
};
use crate::cli::args::{
    FirmwareAction, GlobalArgs, ModAction, ProxyAction, SaveAction, ShaderAction,
};
use crate::cli::progress::attach_progress_bar;
use crate::errors::{AppError, Result};

/// Shared state behind every command
pub struct Context {
    pub client: Arc<CdnClient>,
    pub catalog: Arc<TitleCatalog>,
    pub data_dir: PathBuf,
}

impl Context {
    /// Build the context from global arguments and persisted configuration
    pub async fn build(global: &GlobalArgs) -> Result<Self> {
        let proxy = ProxyStore::default_location()?.load().await;
        let config = ClientConfig {
            proxy,
            ..ClientConfig::default()
        };
        let client = Arc::new(CdnClient::with_config(config)?);
        let catalog = Arc::new(TitleCatalog::new(
            TitleCatalog::default_cache_dir()?,
            Arc::clone(&client),
        ));

        let data_dir = match &global.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        Ok(Self {
            client,
            catalog,
            data_dir,
        })
    }
}

/// Default Ryujinx data directory for this platform
fn default_data_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(crate::errors::ConfigError::NoConfigDir)?
        .join("Ryujinx"))
}

/// Create a download handle wired to a progress bar and Ctrl-C cancellation
fn downloading_handle() -> (DownloadHandle, tokio::task::JoinHandle<()>) {
    let (handle, progress_rx) = DownloadHandle::new();
    let bar_task = attach_progress_bar(progress_rx);

    let cancel_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ncancelling...");
            cancel_handle.cancel();
        }
    });

    (handle, bar_task)
}

fn parse_title(input: &str) -> Result<TitleId> {
    Ok(TitleId::parse(input)?)
}

/// List installed title identifiers
pub async fn handle_scan(ctx: &Context) -> Result<()> {
    let titles = library::scan_games(&ctx.data_dir).await;
    if titles.is_empty() {
        println!("No installed titles found under {}", ctx.data_dir.display());
        return Ok(());
    }
    for id in titles {
        println!("{id}");
    }
    Ok(())
}

/// Show the installed library with resolved names
pub async fn handle_library(ctx: &Context) -> Result<()> {
    if ctx.catalog.refresh_if_stale().await {
        info!("title catalog refreshed");
    }
    let entries = library::build_library(&ctx.data_dir, &ctx.catalog).await;
    if entries.is_empty() {
        println!("No installed titles found under {}", ctx.data_dir.display());
        return Ok(());
    }
    for meta in entries {
        println!("{}  {}", meta.id, meta.name);
    }
    Ok(())
}

/// Resolve metadata for one title
pub async fn handle_meta(ctx: &Context, title_id: &str) -> Result<()> {
    let id = parse_title(title_id)?;
    let meta = ctx.catalog.meta(&id).await;
    println!("id:   {}", meta.id);
    println!("name: {}", meta.name);
    println!("icon: {}", meta.icon_url);
    Ok(())
}

/// Firmware subcommands
pub async fn handle_firmware(ctx: &Context, action: FirmwareAction) -> Result<()> {
    match action {
        FirmwareAction::List => {
            let listing = ctx.client.firmware_listing().await.map_err(AppError::from)?;
            for entry in listing.iter().filter(|e| e.is_file()) {
                println!("{}", entry.name);
            }
            Ok(())
        }
        FirmwareAction::Install { version } => {
            let version = match version {
                Some(v) => v,
                None => ctx
                    .client
                    .latest_firmware_version()
                    .await
                    .map_err(AppError::from)?,
            };
            println!("Installing firmware {version}...");

            let (handle, bar_task) = downloading_handle();
            let installed =
                firmware::install_firmware(&ctx.data_dir, &version, &ctx.client, &handle).await;
            let _ = bar_task.await;

            let registered = installed?;
            println!("Firmware {version} installed at {}", registered.display());
            Ok(())
        }
    }
}

/// Download and install production keys
pub async fn handle_keys(ctx: &Context) -> Result<()> {
    let path = keys::install_keys(&ctx.data_dir, &ctx.client).await?;
    println!("Keys installed at {}", path.display());
    Ok(())
}

/// Shader cache subcommands
pub async fn handle_shaders(ctx: &Context, action: ShaderAction) -> Result<()> {
    match action {
        ShaderAction::Count { title_id } => {
            let id = parse_title(&title_id)?;
            let local = shaders::count_shaders(&id, &ctx.data_dir)
                .await
                .map_err(AppError::from)?;
            println!("local:  {local}");

            match ctx.client.shader_count_table().await {
                Ok(table) => {
                    let remote = table.get(id.as_str()).copied().unwrap_or(0);
                    println!("mirror: {remote}");
                    if local > remote && local >= ctx.client.compat_threshold().await {
                        println!("local cache is ahead of the mirror");
                    }
                }
                Err(e) => {
                    tracing::warn!("mirror shader counts unavailable: {}", e);
                    println!("mirror: unavailable");
                }
            }
            Ok(())
        }
        ShaderAction::Install { title_id } => {
            let id = parse_title(&title_id)?;
            println!("Installing shaders for {id}...");

            let (handle, bar_task) = downloading_handle();
            let outcome = shaders::install_shaders(&id, &ctx.data_dir, &ctx.client, &handle).await;
            let _ = bar_task.await;

            if outcome.map_err(AppError::from)? {
                println!("Shader cache installed");
                Ok(())
            } else {
                Err(AppError::generic("shader download failed or was cancelled"))
            }
        }
    }
}

/// Save-game subcommands
pub async fn handle_saves(ctx: &Context, action: SaveAction) -> Result<()> {
    match action {
        SaveAction::List => {
            for entry in saves::list_saves(&ctx.client).await? {
                println!("{}", entry.name);
            }
            Ok(())
        }
        SaveAction::Get { file_name, dest } => {
            let dest_dir = match dest {
                Some(dir) => dir,
                None => saves::default_save_dir()
                    .ok_or_else(|| AppError::generic("no desktop or downloads directory found"))?,
            };
            let path = saves::download_save(&file_name, &ctx.client, &dest_dir).await?;
            println!("Saved {}", path.display());
            Ok(())
        }
    }
}

/// Mod browsing subcommands
pub async fn handle_mods(ctx: &Context, action: ModAction) -> Result<()> {
    match action {
        ModAction::Titles => {
            let listing = ctx
                .client
                .mods_title_listing()
                .await
                .map_err(AppError::from)?;
            for entry in listing.iter().filter(|e| e.is_dir()) {
                println!("{}", entry.name);
            }
            Ok(())
        }
        ModAction::Versions { title_id } => {
            let id = parse_title(&title_id)?;
            let listing = ctx
                .client
                .mod_versions(id.as_str())
                .await
                .map_err(AppError::from)?;
            for entry in listing.iter().filter(|e| e.is_dir()) {
                println!("{}", entry.name);
            }
            Ok(())
        }
        ModAction::List { title_id, version } => {
            let id = parse_title(&title_id)?;
            let listing = ctx
                .client
                .mods_for_version(id.as_str(), &version)
                .await
                .map_err(AppError::from)?;
            for entry in listing {
                println!("{}", entry.name);
            }
            Ok(())
        }
        ModAction::Url {
            title_id,
            version,
            name,
        } => {
            let id = parse_title(&title_id)?;
            match ctx
                .client
                .mod_download_url(id.as_str(), &version, &name)
                .await
                .map_err(AppError::from)?
            {
                Some((file_name, url)) => {
                    println!("{file_name}");
                    println!("{url}");
                    Ok(())
                }
                None => Err(AppError::generic(format!("mod {name} has no files"))),
            }
        }
    }
}

/// Look up community compatibility reports
pub async fn handle_compat(ctx: &Context, title_id: &str) -> Result<()> {
    let id = parse_title(title_id)?;
    let service = CompatibilityService::new(Arc::clone(&ctx.client), Arc::clone(&ctx.catalog));

    match service.get_compatibility(&id).await {
        Some(record) if record.labels.is_empty() => {
            println!("No compatibility reports for {id}");
            Ok(())
        }
        Some(record) => {
            println!("Compatibility for {} (matched by {:?}):", id, record.mode);
            for label in record.labels {
                println!("  {}", label.name);
            }
            Ok(())
        }
        None => Err(AppError::generic("compatibility lookup failed")),
    }
}

/// Delete a title's local data
pub async fn handle_delete_game(ctx: &Context, title_id: &str) -> Result<()> {
    let id = parse_title(title_id)?;
    library::delete_game(&id, &ctx.data_dir).await;
    println!("Deleted local data for {id}");
    Ok(())
}

/// Proxy management subcommands
pub async fn handle_proxy(action: ProxyAction) -> Result<()> {
    let store = ProxyStore::default_location()?;
    match action {
        ProxyAction::Set { url } => {
            store.set(Some(&url)).await?;
            println!("Proxy set to {url}");
            Ok(())
        }
        ProxyAction::Clear => {
            store.set(None).await?;
            println!("Proxy cleared");
            Ok(())
        }
        ProxyAction::Show => {
            match store.load().await {
                Some(url) => println!("{url}"),
                None => println!("No proxy configured"),
            }
            Ok(())
        }
    }
}

/// Check whether a newer release is available
pub async fn handle_check_update(ctx: &Context) -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    let latest = ctx.client.latest_release_version().await;
    if latest == current {
        println!("ryusync {current} is up to date");
    } else {
        println!("ryusync {current} -> {latest} available");
    }
    Ok(())
}
