use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use wikistore::assets::PAGE;
use wikistore::config::Config;
use wikistore::render::render_page;
use wikistore::store::SqliteAssetStore;
use wikistore::AssetService;

/// Wikistore - typed wiki assets backed by SQLite with an in-memory cache
#[derive(Parser, Debug)]
#[command(name = "wikistore")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override database.path from the configuration
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct AssetRef {
    /// Asset type, e.g. "page" or "file"
    asset_type: String,
    /// Asset path
    path: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an asset's content
    Get {
        #[command(flatten)]
        asset: AssetRef,
        /// Render a page's markdown to HTML
        #[arg(short, long)]
        render: bool,
    },
    /// Print an asset's stored row as JSON
    Show(AssetRef),
    /// Create or replace an asset
    Save {
        #[command(flatten)]
        asset: AssetRef,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Update an existing asset's stored content
    Update {
        #[command(flatten)]
        asset: AssetRef,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete an asset
    Delete(AssetRef),
    /// Print cache statistics after warm-up as JSON
    Stats,
}

fn read_content(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("failed to read content from stdin")?;
            Ok(content)
        }
    }
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let store = SqliteAssetStore::from_config(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    let service = AssetService::new(Arc::new(store), &config.cache).await?;

    let result = execute(&service, args.command).await;
    service.close().await;
    result
}

async fn execute(service: &AssetService, command: Command) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Get { asset, render } => {
            if render && asset.asset_type != PAGE {
                anyhow::bail!("--render only applies to {PAGE} assets");
            }
            let content = service.get_asset(&asset.asset_type, &asset.path).await?;
            if render {
                let page = render_page(&asset.path, content);
                stdout.write_all(page.body.as_bytes())?;
            } else {
                stdout.write_all(content.as_bytes())?;
            }
        }
        Command::Show(asset) => {
            let record = service.asset_record(&asset.asset_type, &asset.path).await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&record)?)?;
        }
        Command::Save { asset, file } => {
            let content = read_content(file.as_ref())?;
            service
                .save_asset(&asset.asset_type, &asset.path, &content)
                .await?;
        }
        Command::Update { asset, file } => {
            let content = read_content(file.as_ref())?;
            service
                .update_asset(&asset.asset_type, &asset.path, &content)
                .await?;
        }
        Command::Delete(asset) => {
            service.delete_asset(&asset.asset_type, &asset.path).await?;
        }
        Command::Stats => {
            let output = serde_json::json!({
                "warmup": service.warmup_report(),
                "cache": service.cache_stats(),
            });
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }),
        None => Config::default(),
    };
    if let Some(database) = &args.database {
        config.database.path = database.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = wikistore::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        cpus = std::thread::available_parallelism().map_or(1, |n| n.get()),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "starting wikistore"
    );

    if let Err(e) = run(args, config).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
