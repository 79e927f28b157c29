//! Reading and writing asset references in record fields.

use crate::{AssetReference, LegacyKeyParser};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use vellum_records::Fields;

/// Field names backing a slot: `(<slot>_key, <slot>_url)`.
pub fn slot_fields(slot: &str) -> (String, String) {
    (format!("{}_key", slot), format!("{}_url", slot))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Read the live reference held by a slot.
///
/// A slot with a key but no URL gets its URL from `url_for`; a slot with
/// only a URL gets its key recovered by `legacy`.
pub fn slot_reference(
    fields: &Fields,
    slot: &str,
    legacy: &LegacyKeyParser,
    url_for: &dyn Fn(&str) -> String,
) -> Option<AssetReference> {
    let (key_field, url_field) = slot_fields(slot);
    let key = non_empty_str(fields.get(&key_field));
    let url = non_empty_str(fields.get(&url_field));

    match (key, url) {
        (Some(key), Some(url)) => Some(AssetReference::new(key, url)),
        (Some(key), None) => Some(AssetReference::new(key, url_for(key))),
        (None, Some(url)) => {
            let recovered = legacy.recover(url);
            if recovered.is_none() {
                tracing::warn!(slot, url, "Slot holds a URL whose key cannot be recovered");
            }
            recovered.map(|key| AssetReference::new(key, url))
        }
        (None, None) => None,
    }
}

/// A collection field split into readable references and entries kept as
/// stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionEntries {
    /// Readable references in stored order, unique by key
    pub references: Vec<AssetReference>,
    /// Entries no key could be read from, with their stored position
    pub unreadable: Vec<(usize, Value)>,
}

impl CollectionEntries {
    /// Encode `list` for storage with every unreadable entry put back at
    /// its stored position (or at the end when the list got shorter).
    pub fn value_with(&self, list: &[AssetReference]) -> Value {
        let mut entries = match collection_value(list) {
            Value::Array(entries) => entries,
            other => vec![other],
        };
        for (position, raw) in &self.unreadable {
            let at = (*position).min(entries.len());
            entries.insert(at, raw.clone());
        }
        Value::Array(entries)
    }
}

/// Read a collection field, keeping entries whose key cannot be recovered.
///
/// Entries are `{key, url}` objects; bare URL strings from older records
/// are read when `legacy` can recover their key. Duplicate keys keep their
/// first position and are dropped.
pub fn collection_entries(
    fields: &Fields,
    collection: &str,
    legacy: &LegacyKeyParser,
    url_for: &dyn Fn(&str) -> String,
) -> CollectionEntries {
    let Some(stored) = fields.get(collection).and_then(Value::as_array) else {
        return CollectionEntries::default();
    };

    let mut seen = BTreeSet::new();
    let mut entries = CollectionEntries {
        references: Vec::with_capacity(stored.len()),
        unreadable: Vec::new(),
    };

    for (position, entry) in stored.iter().enumerate() {
        let reference = match entry {
            Value::Object(object) => {
                let url = non_empty_str(object.get("url"));
                match (non_empty_str(object.get("key")), url) {
                    (Some(key), Some(url)) => Some(AssetReference::new(key, url)),
                    (Some(key), None) => Some(AssetReference::new(key, url_for(key))),
                    (None, Some(url)) => legacy.recover(url).map(|key| AssetReference::new(key, url)),
                    (None, None) => None,
                }
            }
            Value::String(url) => legacy.recover(url).map(|key| AssetReference::new(key, url.as_str())),
            _ => None,
        };

        match reference {
            Some(reference) if seen.insert(reference.key().clone()) => {
                entries.references.push(reference)
            }
            Some(_) => {}
            None => {
                tracing::warn!(collection, entry = %entry, "Collection entry has no readable key, keeping it as stored");
                entries.unreadable.push((position, entry.clone()));
            }
        }
    }

    entries
}

/// Read the ordered references held by a collection field.
///
/// Entries without a readable key are left out; see [`collection_entries`].
pub fn collection_references(
    fields: &Fields,
    collection: &str,
    legacy: &LegacyKeyParser,
    url_for: &dyn Fn(&str) -> String,
) -> Vec<AssetReference> {
    collection_entries(fields, collection, legacy, url_for).references
}

/// Encode a collection for storage.
pub fn collection_value(list: &[AssetReference]) -> Value {
    Value::Array(
        list.iter()
            .map(|r| json!({ "key": r.key(), "url": r.url() }))
            .collect(),
    )
}

/// Blob keys referenced by one record, plus the references whose key could
/// not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceScan {
    /// Keys referenced by slots and collections
    pub keys: BTreeSet<String>,
    /// Raw slot URLs and collection entries with no readable key
    pub unreadable: Vec<String>,
}

impl ReferenceScan {
    /// True when every reference yielded a key.
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty()
    }
}

/// Which record fields hold asset references.
///
/// # Example
///
/// ```toml
/// [schema]
/// slots = ["logo", "after_photo", "avatar"]
/// collections = ["gallery"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct AssetSchema {
    /// Slot names (each backed by `<name>_key` / `<name>_url`)
    #[serde(default)]
    slots: Vec<String>,
    /// Collection field names
    #[serde(default)]
    collections: Vec<String>,
}

impl Default for AssetSchema {
    fn default() -> Self {
        Self {
            slots: vec!["logo".into(), "after_photo".into(), "avatar".into()],
            collections: vec!["gallery".into()],
        }
    }
}

impl AssetSchema {
    /// Create a schema from slot and collection names.
    pub fn new(slots: Vec<String>, collections: Vec<String>) -> Self {
        Self { slots, collections }
    }

    /// Every blob key referenced by `fields` under this schema.
    pub fn referenced_keys(&self, fields: &Fields, legacy: &LegacyKeyParser) -> BTreeSet<String> {
        self.scan(fields, legacy).keys
    }

    /// Referenced keys together with every reference whose key is unknown.
    pub fn scan(&self, fields: &Fields, legacy: &LegacyKeyParser) -> ReferenceScan {
        let no_url = |_: &str| String::new();
        let mut scan = ReferenceScan::default();

        for slot in &self.slots {
            match slot_reference(fields, slot, legacy, &no_url) {
                Some(reference) => {
                    scan.keys.insert(reference.key().clone());
                }
                None => {
                    let (_, url_field) = slot_fields(slot);
                    if let Some(url) = non_empty_str(fields.get(&url_field)) {
                        scan.unreadable.push(url.to_string());
                    }
                }
            }
        }

        for collection in &self.collections {
            let entries = collection_entries(fields, collection, legacy, &no_url);
            scan.keys
                .extend(entries.references.iter().map(|r| r.key().clone()));
            scan.unreadable
                .extend(entries.unreadable.iter().map(|(_, raw)| raw.to_string()));
        }

        scan
    }
}
