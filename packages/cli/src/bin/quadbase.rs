// ABOUTME: Entry point for the `quadbase` command line
// ABOUTME: Dispatches to the HTTP server, schema migration, and moderation subcommands

use clap::{Parser, Subcommand};
use colored::*;
use quadbase_catalog::ComponentKind;
use quadbase_cli::{moderation, Config};
use quadbase_storage::{Database, StorageConfig};
use std::net::IpAddr;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quadbase")]
#[command(about = "Quadbase - community drone component catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override QUADBASE_PORT
        #[arg(long)]
        port: Option<u16>,
        /// Override QUADBASE_HOST
        #[arg(long)]
        host: Option<IpAddr>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Moderate submitted suggestions
    #[command(subcommand)]
    Suggestions(SuggestionCommands),
}

#[derive(Subcommand)]
enum SuggestionCommands {
    /// Accept a suggestion and promote it into the catalog
    Accept {
        /// Component family, e.g. antenna or flight_controller
        kind: ComponentKind,
        /// Suggestion id
        id: String,
    },
    /// Deny a suggestion
    Deny {
        kind: ComponentKind,
        id: String,
        /// Reason shown to the submitter
        #[arg(long)]
        comment: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;

    match command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            quadbase_cli::run_server(config).await
        }
        Commands::Migrate => {
            let database = Database::connect(&StorageConfig::with_path(&config.database_path)).await?;
            database.migrate().await?;
            database.close().await;
            println!(
                "{} Schema is up to date ({})",
                "✓".green(),
                config.database_path.display()
            );
            Ok(())
        }
        Commands::Suggestions(command) => {
            let database = quadbase_cli::open_database(&config).await?;
            let result = handle_suggestions(database.pool(), command).await;
            database.close().await;
            result
        }
    }
}

async fn handle_suggestions(
    pool: &sqlx::SqlitePool,
    command: SuggestionCommands,
) -> anyhow::Result<()> {
    match command {
        SuggestionCommands::Accept { kind, id } => {
            let promotion = moderation::accept(pool, kind, &id).await?;
            let verb = if promotion.created { "created" } else { "updated" };
            println!(
                "{} Accepted {} suggestion {}: {} {} {}",
                "✓".green(),
                kind,
                id.bold(),
                verb,
                kind,
                promotion.component_id.cyan()
            );
            println!(
                "  details created: {}, details updated: {}, attachments moved: {}",
                promotion.details_created, promotion.details_updated, promotion.attachments_moved
            );
        }
        SuggestionCommands::Deny { kind, id, comment } => {
            let meta = moderation::deny(pool, kind, &id, comment.as_deref()).await?;
            println!("{} Denied {} suggestion {}", "✓".green(), kind, id.bold());
            if let Some(comment) = meta.admin_comment {
                println!("  comment: {}", comment);
            }
        }
    }
    Ok(())
}
