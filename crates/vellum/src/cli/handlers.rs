//! Command handlers.
//!
//! Handlers read the live references from the metadata store and pass them
//! to the managers as the caller's view of the record.

use super::commands::{CollectionCommands, RecordCommands, SlotCommands};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use vellum::{
    AssetContext, AssetError, AssetFile, AssetReference, CleanupWarning, ImageFormat,
    MetadataError, MetadataErrorKind, VellumResult,
};

fn to_json<T: Serialize>(value: &T) -> VellumResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| MetadataError::new(MetadataErrorKind::Serialization(e.to_string())).into())
}

fn report_warning(warning: Option<&CleanupWarning>) {
    if let Some(warning) = warning {
        eprintln!("warning: {}", warning);
    }
}

async fn read_upload(path: &Path, content_type: Option<&str>) -> VellumResult<AssetFile> {
    let content_type = match content_type {
        Some(content_type) => content_type.to_string(),
        None => path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .map(|format| format.content_type().to_string())
            .ok_or_else(|| {
                AssetError::validation(format!(
                    "cannot infer content type of {}; pass --content-type",
                    path.display()
                ))
            })?,
    };
    let data = tokio::fs::read(path).await.map_err(|e| {
        AssetError::validation(format!("cannot read {}: {}", path.display(), e))
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(AssetFile::new(filename, content_type, data))
}

/// Handle record metadata commands.
pub async fn handle_record_command(context: &AssetContext, cmd: RecordCommands) -> VellumResult<()> {
    match cmd {
        RecordCommands::Create { id, owner, fields } => {
            let value: Value = serde_json::from_str(&fields)
                .map_err(|e| MetadataError::new(MetadataErrorKind::Serialization(e.to_string())))?;
            let Value::Object(fields) = value else {
                return Err(AssetError::validation("--fields must be a JSON object").into());
            };
            let entity = context.records().create_entity(&id, &owner, fields).await?;
            println!("{}", to_json(&entity)?);
        }
        RecordCommands::Show { id } => {
            let entity = context.records().get_entity(&id).await?;
            println!("{}", to_json(&entity)?);
        }
    }
    Ok(())
}

/// Handle slot commands.
pub async fn handle_slot_command(context: &AssetContext, cmd: SlotCommands) -> VellumResult<()> {
    let slots = context.slots();
    match cmd {
        SlotCommands::Replace {
            record,
            slot,
            file,
            content_type,
        } => {
            let entity = context.records().get_entity(&record).await?;
            let current = slots.current(&record, &slot).await?;
            let upload = read_upload(&file, content_type.as_deref()).await?;

            let outcome = slots
                .replace(
                    entity.owner_id(),
                    &record,
                    &slot,
                    upload.data(),
                    upload.content_type(),
                    current.as_ref(),
                )
                .await?;
            report_warning(outcome.warning.as_ref());
            println!("{}", to_json(&outcome.reference)?);
        }
        SlotCommands::Remove { record, slot } => {
            let entity = context.records().get_entity(&record).await?;
            let current = slots.current(&record, &slot).await?;
            let outcome = slots
                .remove(entity.owner_id(), &record, &slot, current.as_ref())
                .await?;
            report_warning(outcome.warning.as_ref());
        }
    }
    Ok(())
}

/// Handle collection commands.
pub async fn handle_collection_command(
    context: &AssetContext,
    cmd: CollectionCommands,
) -> VellumResult<()> {
    let collections = context.collections();
    match cmd {
        CollectionCommands::Add {
            record,
            collection,
            files,
        } => {
            let entity = context.records().get_entity(&record).await?;
            let current = collections.current(&record, &collection).await?;

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload(path, None).await?);
            }

            let outcome = collections
                .add(entity.owner_id(), &record, &collection, uploads, &current)
                .await?;
            for failed in &outcome.failed {
                eprintln!("error: {} was not added: {}", failed.filename, failed.error);
            }
            println!("{}", to_json(&outcome.list)?);
        }
        CollectionCommands::Remove {
            record,
            collection,
            key,
        } => {
            let entity = context.records().get_entity(&record).await?;
            let current = collections.current(&record, &collection).await?;
            let target = current
                .iter()
                .find(|reference| reference.key() == &key)
                .cloned()
                .unwrap_or_else(|| AssetReference::new(key.as_str(), context.blobs().public_url(&key)));

            let outcome = collections
                .remove(entity.owner_id(), &record, &collection, &target, &current)
                .await?;
            if outcome.removed.is_none() {
                eprintln!("{} is not in {}", key, collection);
            }
            report_warning(outcome.warning.as_ref());
            println!("{}", to_json(&outcome.list)?);
        }
        CollectionCommands::Reorder {
            record,
            collection,
            keys,
        } => {
            let entity = context.records().get_entity(&record).await?;
            let current = collections.current(&record, &collection).await?;
            let list = collections
                .reorder(entity.owner_id(), &record, &collection, &keys, &current)
                .await?;
            println!("{}", to_json(&list)?);
        }
    }
    Ok(())
}

/// Sweep one owner's namespace for orphans.
pub async fn handle_reconcile(context: &AssetContext, owner: &str, dry_run: bool) -> VellumResult<()> {
    let mut reconciler = context.reconciler();
    if dry_run {
        reconciler = reconciler.with_dry_run(true);
    }
    let report = reconciler.reconcile_owner(owner, chrono::Utc::now()).await?;
    println!("{}", to_json(&report)?);
    if report.is_blocked() {
        eprintln!(
            "warning: nothing deleted, unreadable references in {}",
            report.blocked_by().join(", ")
        );
    }
    Ok(())
}
