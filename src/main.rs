//! Domain-mapper main entry point
//!
//! This is the command-line interface for the domain graph crawler: the
//! worker process itself plus the provisioning, maintenance and reporting
//! commands that operate on the shared database.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use domain_mapper::config::{default_config, load_config_with_hash, Config};
use domain_mapper::crawler::{enqueue_seed, run_worker};
use domain_mapper::output::{load_ranking, load_statistics, print_ranking, print_statistics};
use domain_mapper::storage::{DomainMapping, Maintenance, SettingsStore, SqliteStorage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Domain-mapper: maps hyperlink relationships between Internet domains
///
/// Workers claim URLs from a shared queue, respect robots.txt, and record
/// which domains link to which. Run as many workers against one database as
/// you like.
#[derive(Parser, Debug)]
#[command(name = "domain-mapper")]
#[command(version = "1.0.0")]
#[command(about = "A domain graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a worker until the queue is empty (default)
    Run,

    /// Create the schema and seed the queue
    Setup {
        /// First URL to crawl
        #[arg(long)]
        seed: String,

        /// Per-domain link limit (0 = unlimited)
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Set the per-domain link limit (0 = unlimited)
    SetLimit {
        limit: u64,
    },

    /// Add a static domain mapping used by the ranking
    MapDomain {
        /// Domain name, or glob pattern with --wildcard
        old_domain: String,

        /// Name to count it as
        new_domain: String,

        /// Treat OLD_DOMAIN as a `*`/`?` pattern
        #[arg(long)]
        wildcard: bool,
    },

    /// Reset stuck entries to pending and delete finished ones
    Cleanup,

    /// Drop every table
    Reset,

    /// Show queue and graph statistics
    Stats,

    /// Rank domains by number of distinct linking domains
    Ranking {
        /// Number of entries to show
        #[arg(long, default_value_t = 50)]
        top: usize,

        /// Show the rank of a single domain
        #[arg(long, value_name = "DOMAIN")]
        search: Option<String>,

        /// Rank stored domain names without aggregation
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_ref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => handle_run(&config).await,
        Command::Setup { seed, limit } => handle_setup(&config, &seed, limit),
        Command::SetLimit { limit } => handle_set_limit(&config, limit),
        Command::MapDomain {
            old_domain,
            new_domain,
            wildcard,
        } => handle_map_domain(&config, old_domain, new_domain, wildcard),
        Command::Cleanup => handle_cleanup(&config),
        Command::Reset => handle_reset(&config),
        Command::Stats => handle_stats(&config),
        Command::Ranking { top, search, raw } => handle_ranking(&config, top, search, raw),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("domain_mapper=info,warn"),
            1 => EnvFilter::new("domain_mapper=debug,info"),
            2 => EnvFilter::new("domain_mapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => default_config().context("Default configuration is invalid"),
    }
}

fn open_storage(config: &Config) -> Result<SqliteStorage> {
    tracing::debug!("Opening database {}", config.store.database_path);
    SqliteStorage::from_config(&config.store)
        .with_context(|| format!("Failed to open database {}", config.store.database_path))
}

/// Runs one worker against the configured database
async fn handle_run(config: &Config) -> Result<()> {
    let processed = run_worker(config).await.context("Worker failed to start")?;
    tracing::info!("Worker exited, {} entries processed", processed);
    Ok(())
}

fn handle_setup(config: &Config, seed: &str, limit: Option<u64>) -> Result<()> {
    let mut storage = open_storage(config)?;

    let (seed, created) =
        enqueue_seed(&mut storage, seed).with_context(|| format!("Invalid seed URL {}", seed))?;
    if created {
        println!("Queued seed {}", seed);
    } else {
        println!("Seed {} is already known", seed);
    }

    if let Some(limit) = limit {
        storage.set_domain_link_limit(limit)?;
        println!("Domain link limit set to {}", limit);
    }

    println!("Database ready: {}", config.store.database_path);
    Ok(())
}

fn handle_set_limit(config: &Config, limit: u64) -> Result<()> {
    let mut storage = open_storage(config)?;
    storage.set_domain_link_limit(limit)?;
    println!("Domain link limit set to {}", limit);
    Ok(())
}

fn handle_map_domain(
    config: &Config,
    old_domain: String,
    new_domain: String,
    wildcard: bool,
) -> Result<()> {
    let mut storage = open_storage(config)?;
    let mapping = DomainMapping {
        old_domain: old_domain.to_lowercase(),
        new_domain: new_domain.to_lowercase(),
        wildcard,
    };
    storage.add_domain_mapping(&mapping)?;
    println!(
        "Mapped {} -> {}{}",
        mapping.old_domain,
        mapping.new_domain,
        if wildcard { " (wildcard)" } else { "" }
    );
    Ok(())
}

fn handle_cleanup(config: &Config) -> Result<()> {
    let mut storage = open_storage(config)?;
    let reset = storage.reset_stuck()?;
    let purged = storage.purge_done()?;
    println!("Reset {} processing entries to pending", reset);
    println!("Deleted {} done entries", purged);
    Ok(())
}

fn handle_reset(config: &Config) -> Result<()> {
    let mut storage = open_storage(config)?;
    storage.drop_all()?;
    println!("Dropped all tables in {}", config.store.database_path);
    Ok(())
}

/// Shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.store.database_path);
    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);
    Ok(())
}

fn handle_ranking(config: &Config, top: usize, search: Option<String>, raw: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let ranking = load_ranking(&storage, raw)?;

    match search {
        Some(domain) => match ranking.find(&domain) {
            Some(entry) => println!(
                "{} is ranked #{} of {} with {} linking domains",
                entry.domain,
                entry.rank,
                ranking.len(),
                entry.parents
            ),
            None => println!("{} has no inbound links from other domains", domain),
        },
        None => print_ranking(ranking.entries(), top),
    }

    Ok(())
}
