use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use en_core::{config, ArticleStorage, DatabaseConfig, ServerConfig};
use en_scrapers::fetcher::{
    BrowserFetcher, BrowserOptions, HttpFetcher, PageFetcher, DEFAULT_NAV_TIMEOUT,
};
use en_scrapers::logging::{init_logging, Logger};
use en_scrapers::{handle_command, Pipeline, ScraperArgs, ScraperCommands, ScraperManager};
use en_storage::StorageKind;
use tracing::{debug, error, info, warn};

mod duration;

use duration::HumanDuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FetcherKind {
    /// Headless Chromium; renders client-side pages
    Browser,
    /// Plain HTTP GET
    Http,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Japanese economic news scraper", long_about = None)]
struct Cli {
    #[arg(long, value_enum, default_value_t = StorageKind::Postgres, global = true)]
    storage: StorageKind,

    /// Database file for the sqlite backend
    #[arg(long, default_value = "articles.db", global = true)]
    sqlite_path: PathBuf,

    #[arg(long, env = "POSTGRES_USER", default_value = config::DEFAULT_DB_USER, global = true)]
    db_user: String,

    #[arg(
        long,
        env = "POSTGRES_PASSWORD",
        default_value = config::DEFAULT_DB_PASSWORD,
        hide_env_values = true,
        global = true
    )]
    db_password: String,

    #[arg(long, env = "POSTGRES_DB", default_value = config::DEFAULT_DB_NAME, global = true)]
    db_name: String,

    #[arg(long, env = "DB_HOST", default_value = config::DEFAULT_DB_HOST, global = true)]
    db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = config::DEFAULT_DB_PORT, global = true)]
    db_port: u16,

    #[arg(long, value_enum, default_value_t = FetcherKind::Browser, global = true)]
    fetcher: FetcherKind,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    headed: bool,

    /// Launch Chromium without its sandbox (needed in most containers)
    #[arg(long, global = true)]
    no_sandbox: bool,

    /// Upper bound on a single listing page load (e.g. 60s, 2m)
    #[arg(long, global = true, value_parser = duration::parse_nonzero)]
    nav_timeout: Option<HumanDuration>,

    /// Used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the news sources into storage
    Scrape {
        #[command(flatten)]
        args: ScraperArgs,
        /// Repeat the run forever with this pause between cycles (e.g. 1h, 30m)
        #[arg(long, value_parser = duration::parse_nonzero)]
        interval: Option<HumanDuration>,
    },
    /// Serve stored articles over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
        /// Require this value in the X-API-Key header on /news
        #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

impl Cli {
    fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            name: self.db_name.clone(),
            host: self.db_host.clone(),
            port: self.db_port,
        }
    }

    fn fetcher(&self) -> anyhow::Result<Arc<dyn PageFetcher>> {
        Ok(match self.fetcher {
            FetcherKind::Browser => Arc::new(BrowserFetcher::new(BrowserOptions {
                headed: self.headed,
                sandbox: !self.no_sandbox,
            })),
            FetcherKind::Http => Arc::new(HttpFetcher::new()?),
        })
    }
}

/// Everything a scrape cycle needs to open its own storage and scrapers.
struct ScrapeContext {
    kind: StorageKind,
    database: DatabaseConfig,
    sqlite_path: PathBuf,
    fetcher: Arc<dyn PageFetcher>,
    nav_timeout: Duration,
    logger: Logger,
    /// Memory backend shared by every cycle; it owns the rows
    resident: Option<Arc<dyn ArticleStorage>>,
}

impl ScrapeContext {
    async fn new(cli: &Cli, logger: Logger) -> anyhow::Result<Self> {
        let resident = match cli.storage {
            StorageKind::Memory => {
                Some(open_storage(cli.storage, &cli.database_config(), &cli.sqlite_path).await?)
            }
            _ => None,
        };
        Ok(Self {
            kind: cli.storage,
            database: cli.database_config(),
            sqlite_path: cli.sqlite_path.clone(),
            fetcher: cli.fetcher()?,
            nav_timeout: cli.nav_timeout.map_or(DEFAULT_NAV_TIMEOUT, |d| d.0),
            logger,
            resident,
        })
    }

    /// Opens storage, runs `command` and closes the storage again.
    async fn run_cycle(&self, command: ScraperCommands) -> anyhow::Result<()> {
        let storage = match &self.resident {
            Some(storage) => storage.clone(),
            None => open_storage(self.kind, &self.database, &self.sqlite_path).await?,
        };

        let manager = ScraperManager::new(self.fetcher.clone())
            .with_nav_timeout(self.nav_timeout)
            .with_logger(self.logger.clone());
        let pipeline = Pipeline::new(storage.clone(), manager);
        let result = handle_command(command, &pipeline).await;

        if self.resident.is_none() {
            storage.close().await;
        }
        Ok(result?)
    }
}

async fn open_storage(
    kind: StorageKind,
    database: &DatabaseConfig,
    sqlite_path: &Path,
) -> anyhow::Result<Arc<dyn ArticleStorage>> {
    debug!(storage = ?kind, database = ?database, "Opening storage");
    en_storage::create_storage(kind, database, sqlite_path)
        .await
        .context("failed to open storage")
}

async fn run_scrape(
    context: &ScrapeContext,
    command: ScraperCommands,
    interval: Option<HumanDuration>,
) -> anyhow::Result<()> {
    let Some(interval) = interval else {
        return context.run_cycle(command).await;
    };

    info!("Running in periodic mode every {}", interval);
    loop {
        info!("Starting scrape cycle");
        if let Err(e) = context.run_cycle(command.clone()).await {
            error!("Scrape cycle failed: {:#}", e);
        }
        info!("Next cycle in {}", interval);
        tokio::select! {
            _ = tokio::time::sleep(interval.0) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping periodic mode");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = init_logging(&cli.log_level);

    match &cli.command {
        Commands::Scrape { args, interval } => {
            let context = ScrapeContext::new(&cli, logger).await?;
            info!(
                storage = ?context.kind,
                fetcher = context.fetcher.name(),
                nav_timeout = ?context.nav_timeout,
                "Scrapers ready"
            );
            let command = args.command.clone().unwrap_or_default();
            run_scrape(&context, command, *interval).await
        }
        Commands::Serve { addr, api_key } => {
            let storage =
                open_storage(cli.storage, &cli.database_config(), &cli.sqlite_path).await?;
            if let Err(e) = storage.ensure_schema().await {
                warn!("Could not prepare schema before serving: {}", e);
            }
            let config = ServerConfig {
                addr: *addr,
                api_key: api_key.clone().filter(|k| !k.is_empty()),
            };
            let result = en_web::serve(config, storage.clone())
                .await
                .context("server stopped");
            storage.close().await;
            result
        }
    }
}
