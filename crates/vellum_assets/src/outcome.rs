//! Results of asset operations.

use crate::AssetReference;
use vellum_error::AssetError;

/// Old blobs that could not be deleted after a successful commit.
///
/// The record already points at valid content, so this never fails the
/// operation. The keys are orphans until the reconciler removes them.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Record {} updated, but {:?} could not be removed: {}", record_id, keys, reason)]
pub struct CleanupWarning {
    /// Record whose update succeeded
    pub record_id: String,
    /// Blobs left behind
    pub keys: Vec<String>,
    /// Why they were left behind
    pub reason: String,
}

/// Result of a successful slot replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOutcome {
    /// Reference now stored in the slot
    pub reference: AssetReference,
    /// Set when the previous blob could not be deleted
    pub warning: Option<CleanupWarning>,
}

/// Result of a successful slot removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRemoveOutcome {
    /// Set when the detached blob could not be deleted
    pub warning: Option<CleanupWarning>,
}

/// A file from a collection batch whose upload failed.
#[derive(Debug, Clone)]
pub struct FailedUpload {
    /// Client-supplied file name
    pub filename: String,
    /// The upload error
    pub error: AssetError,
}

/// Result of a collection add that committed at least one file.
#[derive(Debug, Clone)]
pub struct CollectionAddOutcome {
    /// Collection as committed
    pub list: Vec<AssetReference>,
    /// References added by this call, in submission order
    pub added: Vec<AssetReference>,
    /// Files that failed to upload and are not referenced
    pub failed: Vec<FailedUpload>,
}

impl CollectionAddOutcome {
    /// True when every submitted file was added.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a successful collection removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRemoveOutcome {
    /// Collection after the call
    pub list: Vec<AssetReference>,
    /// The detached reference, or `None` when the target was already absent
    pub removed: Option<AssetReference>,
    /// Set when the detached blob could not be deleted
    pub warning: Option<CleanupWarning>,
}
