//! Record entities and patch semantics shared by every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vellum_error::{MetadataError, MetadataErrorKind, MetadataResult};

/// Field document of a record.
pub type Fields = Map<String, Value>;

/// Convert a JSON object literal into [`Fields`].
///
/// Non-object values produce an empty document.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Apply a partial update: every key overwrites, `null` removes the field.
pub fn apply_patch(target: &mut Fields, patch: Fields) {
    for (name, value) in patch {
        if value.is_null() {
            target.remove(&name);
        } else {
            target.insert(name, value);
        }
    }
}

/// One metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Entity {
    /// Record id (primary key)
    id: String,
    /// Tenant that owns the record
    owner_id: String,
    /// Starts at 1, bumped by every update
    version: u64,
    /// Field document
    fields: Fields,
    /// Time of the last write
    updated_at: DateTime<Utc>,
}

impl Entity {
    /// A freshly created record at version 1.
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            version: 1,
            fields,
            updated_at: Utc::now(),
        }
    }

    /// Rebuild an entity from stored parts.
    pub fn from_parts(
        id: String,
        owner_id: String,
        version: u64,
        fields: Fields,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            version,
            fields,
            updated_at,
        }
    }

    /// Read one field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Apply `patch` in place, enforcing `expected_version` when given.
    ///
    /// # Errors
    ///
    /// Returns `MetadataErrorKind::Conflict` if the stored version differs
    /// from `expected_version`; the entity is left untouched.
    pub fn apply(&mut self, patch: Fields, expected_version: Option<u64>) -> MetadataResult<()> {
        match expected_version {
            Some(expected) if expected != self.version => {
                return Err(MetadataError::new(MetadataErrorKind::Conflict {
                    expected,
                    actual: self.version,
                }));
            }
            _ => {}
        }

        apply_patch(&mut self.fields, patch);
        self.version += 1;
        self.updated_at = Utc::now();
        Ok(())
    }
}
