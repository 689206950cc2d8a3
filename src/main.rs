use clap::Parser;
use metallo_api::RestApi;
use metallo_core::MetalloConfig;
use metallo_storage::StorageManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Distance engine for topic-weighted passages
#[derive(Parser, Debug)]
#[command(name = "metallo")]
#[command(about = "Nearest passages, topic rankings and pairwise divergence export", long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// (Re-)build the database from the configured source before serving
    #[arg(long)]
    load_db: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Metallo v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(MetalloConfig::load(&args.config)?);
    info!("Configuration: {:?}", args.config);
    info!("Source: {} (local: {})", config.csv_source, config.local);
    info!("Retrieval metric: {}", config.metric());
    info!("Divergence metric: {}", config.divergence_metric());

    let storage = Arc::new(StorageManager::open(&config, args.load_db).await?);
    info!("Storage initialized with {} records", storage.store().len()?);

    let storage_http = storage.clone();
    let config_http = config.clone();
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", config_http.host, config_http.port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(storage_http, config_http).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("Metallo started successfully");
    info!("HTTP API: http://{}:{}/", config.host, config.port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
