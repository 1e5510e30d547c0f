mod config;
mod disk_store;
mod server;

use clap::{Parser, Subcommand};
use config::Config;
use dust_core::{ContentFile, DistributedStorage, Storage};
use server::run_server;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "dust")]
#[command(about = "Blob storage replicated across plain HTTP hosts")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "dust.yaml")]
    config: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a media host serving the configured data directory
    Serve,
    /// Upload a file to every host, under a free name derived from NAME
    Put { name: String, file: PathBuf },
    /// Download an object
    Get {
        name: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete an object from every host
    Rm { name: String },
    /// Check whether any host has an object
    Exists { name: String },
    /// Print the size of an object
    Size { name: String },
    /// Print the public URL of an object
    Url { name: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dust=info,dust_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, cfg).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cfg: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve => {
            tracing::info!("Starting media host with config: {}", cli.config);
            run_server(cfg.host).await
        }
        command => {
            let storage = DistributedStorage::new(&cfg.storage)?;
            run_client(&storage, command, cli.json).await
        }
    }
}

async fn run_client(
    storage: &DistributedStorage,
    command: Commands,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve => anyhow::bail!("serve is not a client command"),
        Commands::Put { name, file } => {
            let content = ContentFile::from_path(&file).await?;
            let size = content.size();
            let saved = storage.save(&name, content).await?;
            tracing::info!(
                "Saved {} ({} bytes) to {} hosts",
                saved,
                size,
                storage.hosts().len()
            );
            print_value(json, "name", serde_json::Value::from(saved));
        }
        Commands::Get { name, output } => {
            let file = storage.open(&name).await?;
            match output {
                Some(path) => tokio::fs::write(&path, file.read()).await?,
                None => std::io::stdout().write_all(file.read())?,
            }
        }
        Commands::Rm { name } => {
            storage.delete(&name).await?;
            tracing::info!("Deleted {} from {} hosts", name, storage.hosts().len());
        }
        Commands::Exists { name } => {
            let exists = storage.exists(&name).await?;
            print_value(json, "exists", serde_json::Value::from(exists));
        }
        Commands::Size { name } => {
            let size = storage.size(&name).await?;
            print_value(json, "size", serde_json::Value::from(size));
        }
        Commands::Url { name } => {
            print_value(json, "url", serde_json::Value::from(storage.url(&name)));
        }
    }

    Ok(())
}

fn print_value(json: bool, key: &str, value: serde_json::Value) {
    if json {
        println!("{}", serde_json::json!({ key: value }));
    } else {
        match value {
            serde_json::Value::String(text) => println!("{}", text),
            other => println!("{}", other),
        }
    }
}
