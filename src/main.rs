use clap::{Parser, Subcommand};
use letterbox::cache::CacheManager;
use letterbox::config::{self, Config, StoreBackend};
use letterbox::fetch::SourceFetcher;
use letterbox::imaging::{ImageBackend, RustBackend};
use letterbox::remote::{self, MemoryObjectStore, ObjectStore, S3ObjectStore};
use letterbox::server;
use letterbox::transform::Transformer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "letterbox")]
#[command(about = "On-demand thumbnail server")]
#[command(long_about = "\
On-demand thumbnail server

Serves JPEG thumbnails of remote images at exactly the requested size:

  GET /thumbnail?url=<image url>&width=<w>&height=<h>

Larger sources are scaled down. When the requested box is larger than the
source on an axis, the image keeps its native size on that axis and is
centered on a solid background instead of being upsampled.

Results are cached in memory and persisted to an S3 bucket, so repeated
requests never refetch the source.

Run 'letterbox gen-config' to generate a documented letterbox.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listening IP address
        #[arg(short = 'H', long, value_name = "IP")]
        host: Option<String>,
        /// Listening port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Produce one thumbnail and write it to a file
    Transform {
        /// Image URL or local path
        source: String,
        width: i64,
        height: i64,
        /// Output file
        #[arg(short, long, default_value = "thumbnail.jpeg")]
        output: PathBuf,
        /// Persist the result to the configured object store
        #[arg(long)]
        persist: bool,
    },
    /// Print a stock letterbox.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_filter = format!(
        "letterbox={level},tower_http={level}",
        level = cli.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Starting letterbox v{}", env!("CARGO_PKG_VERSION"));

            let store = open_store(&config).await?;
            let transformer = Arc::new(build_transformer(&config, store)?);
            let listener =
                tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
                    .await?;
            server::serve(listener, transformer).await?;
        }
        Command::Transform {
            source,
            width,
            height,
            output,
            persist,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            // Paths are the normal input on the command line.
            config.fetch.allow_local_files = true;
            let store: Arc<dyn ObjectStore> = if persist {
                open_store(&config).await?
            } else {
                Arc::new(MemoryObjectStore::new())
            };
            let transformer = build_transformer(&config, store)?;
            let bytes = transformer.transform(&source, width, height).await?;
            tokio::fs::write(&output, &bytes).await?;
            println!(
                "{} ({}x{}, {} bytes)",
                output.display(),
                width,
                height,
                bytes.len()
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let config = config::load_config(path)?;
    if let Some(path) = path {
        info!("Configuration loaded from: {}", path.display());
    }
    Ok(config)
}

/// Connect to the configured object store and make sure its bucket exists.
async fn open_store(config: &Config) -> Result<Arc<dyn ObjectStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn ObjectStore> = match config.store.backend {
        StoreBackend::S3 => Arc::new(
            S3ObjectStore::new(
                config.store.bucket.clone(),
                config.store.region.clone(),
                config.store.endpoint.clone(),
                config.store.credentials(),
            )
            .await,
        ),
        StoreBackend::Memory => Arc::new(MemoryObjectStore::new()),
    };
    remote::ensure_bucket(store.as_ref(), &config.store.bucket).await?;
    info!(
        backend = ?config.store.backend,
        bucket = %config.store.bucket,
        "object store ready"
    );
    Ok(store)
}

fn build_transformer(
    config: &Config,
    store: Arc<dyn ObjectStore>,
) -> Result<Transformer, Box<dyn std::error::Error>> {
    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
    let fetcher = Arc::new(SourceFetcher::new(&config.fetch)?);
    let cache = Arc::new(CacheManager::new(
        config.cache.capacity,
        store,
        Arc::clone(&backend),
    ));
    Ok(Transformer::new(fetcher, backend, cache)
        .with_background(config.output.background())
        .with_quality(config.output.quality())
        .with_max_pixels(config.output.max_pixels))
}
