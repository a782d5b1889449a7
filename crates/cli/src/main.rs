//! jobharvest CLI - crawl job sites into SQLite and summarize the results
//!
//! Composition root: wires the SQLite store and the HTTP page accessor into
//! the core services.
//!
//! # Environment Variables
//!
//! - `JOBHARVEST_DB_PATH`: database file (default: `~/.jobharvest/jobs.db`)
//! - `JOBHARVEST_USER_AGENT`: user agent sent to job sites
//! - `JOBHARVEST_LOG_DIR`: directory for daily-rotated JSON logs
//! - `JOBHARVEST_LOG_FORMAT`: `pretty` (default) or `json`

mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use jobharvest_core::application::sources::{ComputrabajoConfig, GetManfredConfig};
use jobharvest_core::application::{
    cancel_channel, AggregationField, CancelToken, CrawlConfig, CrawlOrchestrator, HarvestService,
    SourceRegistry,
};
use jobharvest_core::domain::{PublicationWindow, SourceKind};
use jobharvest_core::port::{PostingStore, SystemTimeProvider, UuidProvider};
use jobharvest_infra_http::{HttpAccessorConfig, HttpAccessorFactory, DEFAULT_USER_AGENT};
use jobharvest_infra_sqlite::{create_pool, run_migrations, SqlitePostingStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_DB_PATH: &str = "~/.jobharvest/jobs.db";
const DEFAULT_KEYWORD: &str = "web developer";

#[derive(Parser)]
#[command(name = "jobharvest")]
#[command(about = "Job posting harvester", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file (`:memory:` for a throwaway run)
    #[arg(long, env = "JOBHARVEST_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    /// User agent sent to job sites
    #[arg(long, env = "JOBHARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Also write JSON logs to this directory (rotated daily)
    #[arg(long, env = "JOBHARVEST_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl job sites and store what they publish
    Crawl {
        /// Sources to crawl (repeatable; default: all)
        #[arg(short, long = "source")]
        sources: Vec<SourceKind>,

        /// Computrabajo search keyword
        #[arg(short, long, default_value = DEFAULT_KEYWORD)]
        keyword: String,

        /// Computrabajo publication window (urgent, today, 3d, 7d, 15d, 30d)
        #[arg(short, long, default_value = "today")]
        window: PublicationWindow,

        /// Maximum "next page" advances per source
        #[arg(long)]
        max_pages: Option<usize>,

        /// Crawl sources concurrently
        #[arg(long)]
        concurrent: bool,

        /// Skip the pause between detail pages
        #[arg(long)]
        no_politeness: bool,
    },

    /// List the detail links a source publishes, without storing anything
    Discover {
        source: SourceKind,

        #[arg(short, long, default_value = DEFAULT_KEYWORD)]
        keyword: String,

        #[arg(short, long, default_value = "today")]
        window: PublicationWindow,
    },

    /// Read one detail page
    Fetch {
        source: SourceKind,

        link: String,

        /// Store the normalized record
        #[arg(long, conflicts_with = "raw")]
        save: bool,

        /// Show the record as extracted, before normalization
        #[arg(long)]
        raw: bool,
    },

    /// Count stored postings by field value
    Aggregate {
        /// company, location, salary, keyword, education, language, skill or experience
        field: String,
    },

    /// Show stored postings
    List,
}

/// Everything a command needs, built once
struct App {
    store: Arc<SqlitePostingStore>,
    service: HarvestService,
    registry: SourceRegistry,
    accessors: Arc<HttpAccessorFactory>,
    config: CrawlConfig,
}

impl App {
    async fn build(cli: &Cli, config: CrawlConfig, computrabajo: ComputrabajoConfig) -> Result<Self> {
        let db_path = resolve_db_path(&cli.db_path)?;
        info!(db_path = %db_path, "Opening database");

        let pool = create_pool(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path))?;
        run_migrations(&pool).await.context("Failed to run migrations")?;

        let store = Arc::new(SqlitePostingStore::new(pool, Arc::new(SystemTimeProvider)));

        let accessors = Arc::new(
            HttpAccessorFactory::new(&HttpAccessorConfig {
                user_agent: cli.user_agent.clone(),
                ..Default::default()
            })
            .context("Failed to build HTTP client")?,
        );

        let registry = SourceRegistry::from_configs(&config, computrabajo, GetManfredConfig::default())
            .context("Invalid source configuration")?;

        let service = HarvestService::new(
            registry.clone(),
            accessors.clone(),
            store.clone(),
            &config,
        );

        Ok(Self {
            store,
            service,
            registry,
            accessors,
            config,
        })
    }

    fn orchestrator(&self) -> CrawlOrchestrator {
        CrawlOrchestrator::new(
            self.registry.clone(),
            self.accessors.clone(),
            self.store.clone(),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            self.config.clone(),
        )
    }
}

/// Expand `~` and create the parent directory of a file database
fn resolve_db_path(raw: &str) -> Result<String> {
    if raw.contains(":memory:") {
        return Ok(raw.to_string());
    }
    let path = shellexpand::tilde(raw).into_owned();
    if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(path)
}

/// Cancel token tripped by Ctrl+C
fn interrupt_token() -> CancelToken {
    let (sender, token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            sender.cancel();
        }
    });
    token
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to encode output")?);
    Ok(())
}

fn computrabajo_config(keyword: String, window: PublicationWindow) -> ComputrabajoConfig {
    ComputrabajoConfig {
        keyword,
        window,
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_dir.as_deref())?;

    match &cli.command {
        Commands::Crawl {
            sources,
            keyword,
            window,
            max_pages,
            concurrent,
            no_politeness,
        } => {
            let mut config = CrawlConfig {
                concurrent_sources: *concurrent,
                politeness_enabled: !no_politeness,
                ..Default::default()
            };
            if let Some(max_pages) = max_pages {
                config.max_page_advances = *max_pages;
            }

            let app = App::build(&cli, config, computrabajo_config(keyword.clone(), *window)).await?;
            let report = app
                .orchestrator()
                .crawl(sources, interrupt_token())
                .await
                .context("Crawl aborted")?;

            if cli.json {
                print_json(&report)?;
            } else {
                output::print_crawl_report(&report);
            }
        }

        Commands::Discover {
            source,
            keyword,
            window,
        } => {
            let app = App::build(
                &cli,
                CrawlConfig::default(),
                computrabajo_config(keyword.clone(), *window),
            )
            .await?;
            let discovery = app.service.discover(*source, &interrupt_token()).await?;

            if cli.json {
                print_json(&discovery.links)?;
            } else {
                output::print_links(&discovery.links);
                println!(
                    "{} pages visited, stopped: {}",
                    discovery.pages_visited,
                    discovery.stop_reason.to_string().cyan()
                );
            }
        }

        Commands::Fetch {
            source,
            link,
            save,
            raw,
        } => {
            let app = App::build(&cli, CrawlConfig::default(), ComputrabajoConfig::default()).await?;

            if *raw {
                let Some(record) = app.service.fetch_raw(*source, link).await? else {
                    println!("{}", format!("✗ Could not load {}", link).red().bold());
                    return Ok(());
                };
                if cli.json {
                    print_json(&record)?;
                } else {
                    output::print_raw_posting(&record);
                }
                return Ok(());
            }

            let posting = app
                .service
                .fetch_detail(*source, link)
                .await
                .context("Record cannot be normalized")?;
            let Some(posting) = posting else {
                println!("{}", format!("✗ Could not load {}", link).red().bold());
                return Ok(());
            };

            if cli.json {
                print_json(&posting)?;
            } else {
                output::print_posting(&posting);
            }

            if *save {
                let outcome = app.service.reconcile(&posting).await?;
                println!("{}", format!("✓ {} ({})", posting.title, outcome).green().bold());
            }
        }

        Commands::Aggregate { field } => {
            let app = App::build(&cli, CrawlConfig::default(), ComputrabajoConfig::default()).await?;

            if field.trim().eq_ignore_ascii_case("experience") {
                let counts = app.service.aggregate_experience().await?;
                if cli.json {
                    print_json(&counts)?;
                } else {
                    output::print_experience_counts(&counts);
                }
            } else {
                let field: AggregationField = field.parse()?;
                let counts = app.service.aggregate(field).await?;
                if cli.json {
                    print_json(&counts)?;
                } else {
                    output::print_group_counts(field.as_str(), &counts);
                }
            }
        }

        Commands::List => {
            let app = App::build(&cli, CrawlConfig::default(), ComputrabajoConfig::default()).await?;

            if cli.json {
                print_json(&app.service.list_postings().await?)?;
            } else {
                let stored = app.store.list_with_timestamps().await?;
                output::print_postings(&stored);
                info!(total = app.store.count().await?, "Listed postings");
            }
        }
    }

    Ok(())
}
