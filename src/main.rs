// ABOUTME: CLI entry point for strapi-postgres-migrator
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Args, Parser, Subcommand};
use strapi_postgres_migrator::migration::RowErrorPolicy;
use strapi_postgres_migrator::{commands, config};

#[derive(Parser)]
#[command(name = "strapi-postgres-migrator")]
#[command(about = "Migrate the Strapi website-builder dataset from SQLite to PostgreSQL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Path to the source SQLite database file
    #[arg(long, env = "MIGRATOR_SQLITE_PATH")]
    source_db: Option<String>,
    /// PostgreSQL connection URL for the destination
    #[arg(long, env = "MIGRATOR_POSTGRES_URL")]
    target_url: Option<String>,
    /// TOML config file providing [source] path and [target] url
    #[arg(long)]
    config: Option<String>,
}

impl ConnectionArgs {
    fn resolve(self) -> anyhow::Result<config::MigrationConfig> {
        config::resolve(self.source_db, self.target_url, self.config.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that source and destination are ready, without writing anything
    Validate {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Copy all tables in dependency order
    Migrate {
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Abort a table on its first failed row instead of skipping and reporting
        #[arg(long)]
        strict: bool,
        /// Truncate the destination tables before copying
        #[arg(long)]
        truncate: bool,
        /// Skip the truncate confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Compare per-table row counts between source and destination
    Verify {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { connection } => {
            let config = connection.resolve()?;
            commands::validate(&config).await
        }
        Commands::Migrate {
            connection,
            strict,
            truncate,
            yes,
        } => {
            let config = connection.resolve()?;
            let policy = if strict {
                RowErrorPolicy::Abort
            } else {
                RowErrorPolicy::SkipAndReport
            };
            commands::migrate(&config, policy, truncate, yes).await
        }
        Commands::Verify { connection } => {
            let config = connection.resolve()?;
            commands::verify(&config).await
        }
    }
}
