//! Herdbook CLI - command-line interface for the horse sync engine.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "herdbook")]
#[command(version)]
#[command(about = "Multi-registry horse profile synchronization")]
#[command(
    long_about = "Herdbook ingests horse data from external registries and marketplaces \
(FEI, HorseTelex, ehorses), merges it into a local database, and keeps the \
merge fresh on a recurring schedule."
)]
#[command(after_long_help = r#"EXAMPLES
    Apply migrations and sync one horse:
        $ herdbook migrate up
        $ herdbook sync horse 6d9f0a63-6f3b-4b43-9d2e-df9f86a6e2f4

    Run a batch pass over everything due:
        $ herdbook sync batch

    Run the scheduler in the foreground:
        $ herdbook run

    Inspect and drain the job queue:
        $ herdbook jobs list
        $ herdbook jobs drain

CONFIGURATION
    Herdbook reads configuration from:
      1. ~/.config/herdbook/config.toml (or $XDG_CONFIG_HOME/herdbook/config.toml)
      2. ./herdbook.toml
      3. Environment variables (HERDBOOK_* prefix)

ENVIRONMENT VARIABLES
    HERDBOOK_DATABASE_URL       Database connection string (default: ~/.local/state/herdbook/herdbook.db)
    HERDBOOK_FEI_TOKEN          FEI data API bearer token
    HERDBOOK_HORSETELEX_TOKEN   HorseTelex API bearer token
    HERDBOOK_EHORSES_HOST       Marketplace host override
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Sync horses from their external sources
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Run the background scheduler in the foreground
    Run,
    /// Inspect and drain the scraping job queue
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// Fetch-cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Subcommand)]
enum SyncAction {
    /// Sync a single horse by its id
    Horse {
        /// The horse's UUID
        id: Uuid,
    },
    /// Sync every horse that is due (pending, never synced, or stale)
    Batch,
}

#[derive(Subcommand)]
enum JobsAction {
    /// Show recent jobs
    List {
        /// Maximum jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
    /// Execute due pending jobs now
    Drain {
        /// Maximum jobs to pick up
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete cache entries expired longer than the retention horizon
    Cleanup {
        /// Retention horizon in days
        #[arg(short, long, default_value_t = 30)]
        max_age_days: i64,
    },
    /// Delete cache entries for one external identifier
    Invalidate {
        /// Source name (fei, horsetelex, ehorses)
        source: String,
        /// The external identifier
        source_id: String,
        /// Restrict to one data type (profile, pedigree, competitions,
        /// indices, sale_listings, live_results)
        #[arg(short, long)]
        data_type: Option<String>,
    },
    /// Delete all cache entries tied to one horse
    InvalidateHorse {
        /// The horse's UUID
        id: Uuid,
    },
    /// List stale or expired entries, oldest-fetched first
    Stale {
        /// Restrict to one source
        #[arg(short, long)]
        source: Option<String>,
        /// Maximum entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let result = match cli.command {
        Commands::Migrate { action } => commands::migrate::handle_migrate(action, &config).await,
        Commands::Sync { action } => match action {
            SyncAction::Horse { id } => commands::sync::handle_sync_horse(&config, id).await,
            SyncAction::Batch => commands::sync::handle_sync_batch(&config).await,
        },
        Commands::Run => commands::run::handle_run(&config).await,
        Commands::Jobs { action } => match action {
            JobsAction::List { limit } => commands::jobs::handle_jobs_list(&config, limit).await,
            JobsAction::Drain { limit } => commands::jobs::handle_jobs_drain(&config, limit).await,
        },
        Commands::Cache { action } => match action {
            CacheAction::Cleanup { max_age_days } => {
                commands::cache::handle_cache_cleanup(&config, max_age_days).await
            }
            CacheAction::Invalidate {
                source,
                source_id,
                data_type,
            } => {
                commands::cache::handle_cache_invalidate(
                    &config,
                    &source,
                    &source_id,
                    data_type.as_deref(),
                )
                .await
            }
            CacheAction::InvalidateHorse { id } => {
                commands::cache::handle_cache_invalidate_horse(&config, id).await
            }
            CacheAction::Stale { source, limit } => {
                commands::cache::handle_cache_stale(&config, source.as_deref(), limit).await
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
