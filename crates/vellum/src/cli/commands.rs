//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vellum - upload, replace and retire record-attached assets
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(about = "Upload, replace and retire record-attached assets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to bundled, ~/.config/vellum and ./vellum.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record metadata commands
    #[command(subcommand)]
    Record(RecordCommands),

    /// Single-reference slot commands
    #[command(subcommand)]
    Slot(SlotCommands),

    /// Ordered collection commands
    #[command(subcommand)]
    Collection(CollectionCommands),

    /// Delete old unreferenced blobs in one owner's namespace
    Reconcile {
        /// Owner whose namespace to sweep
        owner: String,

        /// Report orphans without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Record subcommands
#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Create an empty record
    Create {
        /// Record id
        id: String,

        /// Owning tenant
        #[arg(long)]
        owner: String,

        /// Initial fields as a JSON object
        #[arg(long, default_value = "{}")]
        fields: String,
    },

    /// Print a record as JSON
    Show {
        /// Record id
        id: String,
    },
}

/// Slot subcommands
#[derive(Subcommand, Debug)]
pub enum SlotCommands {
    /// Upload a file into a slot, retiring the previous blob
    Replace {
        /// Record id
        record: String,

        /// Slot name (e.g. logo)
        slot: String,

        /// File to upload
        file: PathBuf,

        /// MIME type (inferred from the file extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Clear a slot and delete its blob
    Remove {
        /// Record id
        record: String,

        /// Slot name
        slot: String,
    },
}

/// Collection subcommands
#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// Upload files and append them to a collection
    Add {
        /// Record id
        record: String,

        /// Collection field (e.g. gallery)
        collection: String,

        /// Files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Detach one entry and delete its blob
    Remove {
        /// Record id
        record: String,

        /// Collection field
        collection: String,

        /// Key of the entry to remove
        key: String,
    },

    /// Store a new order for a collection
    Reorder {
        /// Record id
        record: String,

        /// Collection field
        collection: String,

        /// Every key of the collection in the desired order
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Log output formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
