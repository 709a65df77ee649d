//! Shot record ingester service.
//!
//! Accepts parsed shot files over HTTP, validates them against the channel
//! manifest and stores accepted channels in the record catalog and object
//! storage.

mod config;
mod server;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::IngesterConfig;
use ingestion::{
    ChannelManifest, InMemoryRecordStore, Ingester, ManifestFile, PayloadStore, RecordStore,
};
use server::ServerState;
use storage::{ObjectStorage, RecordCatalog};

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Shot record ingester")]
struct Args {
    /// Configuration file path (environment variables are used when absent)
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Channel manifest JSON file
    #[arg(short, long)]
    manifest: Option<String>,

    /// Keep records and payloads in memory (no database or S3 needed)
    #[arg(long)]
    in_memory: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shot record ingester");

    let mut config = IngesterConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(manifest) = args.manifest {
        config.manifest_path = manifest;
    }
    config.in_memory |= args.in_memory;

    let manifest: Arc<dyn ChannelManifest> =
        Arc::new(ManifestFile::from_path(&config.manifest_path)?);

    let (records, payloads): (Arc<dyn RecordStore>, Arc<dyn PayloadStore>) = if config.in_memory
    {
        info!("Using in-memory record and payload storage");
        (
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(ObjectStorage::in_memory(&config.storage.bucket)),
        )
    } else {
        let catalog =
            RecordCatalog::connect(&config.database_url, config.database_max_connections).await?;
        catalog.migrate().await?;
        info!(bucket = %config.storage.bucket, "Connected to record catalog");
        (
            Arc::new(catalog),
            Arc::new(ObjectStorage::new(&config.storage)?),
        )
    };

    let ingester = Ingester::new(manifest, records, payloads, config.ingest.clone());
    let state = Arc::new(ServerState { ingester });

    server::start_server(state, config.port).await
}
