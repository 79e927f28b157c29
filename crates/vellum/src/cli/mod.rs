//! Command-line interface module.

mod commands;
mod handlers;

pub use commands::{Cli, CollectionCommands, Commands, LogFormat, RecordCommands, SlotCommands};
pub use handlers::{
    handle_collection_command, handle_reconcile, handle_record_command, handle_slot_command,
};
