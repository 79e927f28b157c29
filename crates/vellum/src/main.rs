//! Vellum CLI binary.
//!
//! Command-line access to the asset lifecycle:
//! - create and inspect records
//! - replace and clear slots
//! - add, remove and reorder collection entries
//! - sweep orphaned blobs

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vellum::{AssetContext, VellumConfig};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, LogFormat, handle_collection_command, handle_reconcile,
        handle_record_command, handle_slot_command,
    };

    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    let config = match &cli.config {
        Some(path) => VellumConfig::from_file(path)?,
        None => VellumConfig::load()?,
    };
    let context = AssetContext::open(config)?;

    match cli.command {
        Commands::Record(cmd) => handle_record_command(&context, cmd).await?,
        Commands::Slot(cmd) => handle_slot_command(&context, cmd).await?,
        Commands::Collection(cmd) => handle_collection_command(&context, cmd).await?,
        Commands::Reconcile { owner, dry_run } => {
            handle_reconcile(&context, &owner, dry_run).await?
        }
    }

    Ok(())
}
