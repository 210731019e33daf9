//! Syndicate CLI
//!
//! Runs any one of the services as its own process, or performs a one-shot
//! feed operation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use syndicate::{
    api,
    crawler::{FeedCrawler, HttpFeedParser, run_scheduler},
    error::Result,
    feed::FeedService,
    models::Config,
    rss::RssPublisher,
    search::SearchEngine,
    storage::{HttpStorageClient, MemoryStorage, StorageClient},
};
use tokio::sync::watch;

/// Syndicate - feed ingestion, search and RSS publishing
#[derive(Parser, Debug)]
#[command(
    name = "syndicate",
    version,
    about = "Content syndication services for a federated blog platform"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "syndicate.toml")]
    config: PathBuf,

    /// Use an in-memory store instead of the storage service
    #[arg(long)]
    memory: bool,

    /// JSON snapshot to seed the in-memory store with (implies --memory)
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one service until Ctrl+C / SIGTERM
    Serve {
        #[arg(value_enum)]
        service: Service,
    },

    /// Poll every registered feed once
    Poll,

    /// Register a new external feed
    Register {
        /// RSS or Atom URL
        url: String,
    },

    /// Validate configuration
    Validate,

    /// Show configuration and index info
    Info,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Service {
    Search,
    Rss,
    Crawler,
    Feed,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn open_storage(cli: &Cli, config: &Config) -> Result<Arc<dyn StorageClient>> {
    if let Some(path) = &cli.seed_file {
        return Ok(Arc::new(MemoryStorage::load(path).await?));
    }
    if cli.memory {
        log::warn!("Using an empty in-memory store; nothing will be persisted");
        return Ok(Arc::new(MemoryStorage::new()));
    }
    log::info!("Using storage service at {}", config.storage.base_url);
    Ok(Arc::new(HttpStorageClient::new(&config.storage)?))
}

fn feed_crawler(db: Arc<dyn StorageClient>, config: &Config) -> Result<Arc<FeedCrawler>> {
    let parser = HttpFeedParser::new(&config.crawler)?;
    Ok(Arc::new(FeedCrawler::new(
        db,
        Arc::new(parser),
        config.crawler.clone(),
    )))
}

/// Flip the returned receiver on Ctrl+C / SIGTERM.
fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        api::shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

async fn serve(service: Service, db: Arc<dyn StorageClient>, config: &Config) -> Result<()> {
    let shutdown = shutdown_channel();
    let server = &config.server;

    match service {
        Service::Search => {
            let engine = Arc::new(SearchEngine::new(&config.search).await?);
            // Refuse to start on a partial index.
            let added = engine.initialize(db.as_ref()).await?;
            log::info!("Search index ready ({} new documents)", added);

            let app = api::search_router(Arc::clone(&engine), db);
            api::serve(&server.search_addr, app, shutdown).await?;
            engine.persist().await?;
        }

        Service::Rss => {
            let publisher = Arc::new(RssPublisher::new(db, config.rss.clone()));
            api::serve(&server.rss_addr, api::rss_router(publisher), shutdown).await?;
        }

        Service::Crawler => {
            let crawler = feed_crawler(db, config)?;
            let scheduler = tokio::spawn(run_scheduler(
                Arc::clone(&crawler),
                config.crawler.poll_interval(),
                shutdown.clone(),
            ));

            api::serve(&server.crawler_addr, api::crawler_router(crawler), shutdown).await?;
            if let Err(e) = scheduler.await {
                log::error!("Feed scheduler task failed: {}", e);
            }
        }

        Service::Feed => {
            let service = Arc::new(FeedService::new(db));
            api::serve(&server.feed_addr, api::feed_router(service), shutdown).await?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    config.apply_env()?;

    init_logging(if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    });

    match &loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    match &cli.command {
        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }

        Command::Info => {
            log::info!("Storage service: {}", config.storage.base_url);
            log::info!("RSS hostname: {}", config.rss.hostname);
            log::info!(
                "Poll interval: {}s, {} feeds at once",
                config.crawler.poll_interval_secs,
                config.crawler.max_concurrent
            );
            match &config.search.index_path {
                Some(path) if path.exists() => {
                    let stats = SearchEngine::new(&config.search).await?.stats().await;
                    log::info!(
                        "Index at {}: {} documents ({} in text index)",
                        path.display(),
                        stats.documents,
                        stats.indexed
                    );
                }
                Some(path) => log::info!("Index at {} not built yet", path.display()),
                None => log::info!("Index is memory only"),
            }
        }

        Command::Serve { service } => {
            config.validate()?;
            let db = open_storage(&cli, &config).await?;
            serve(*service, db, &config).await?;
        }

        Command::Poll => {
            config.validate()?;
            let db = open_storage(&cli, &config).await?;
            let stats = feed_crawler(db, &config)?.poll_all().await?;
            log::info!(
                "Polled {} feeds ({} failed): {} items submitted, {} skipped",
                stats.sources,
                stats.source_failures,
                stats.items_submitted,
                stats.items_failed
            );
        }

        Command::Register { url } => {
            config.validate()?;
            let db = open_storage(&cli, &config).await?;
            let global_id = feed_crawler(db, &config)?.register_feed(url).await?;
            log::info!("Registered {} as user {}", url, global_id);
        }
    }

    log::info!("Done!");
    Ok(())
}
