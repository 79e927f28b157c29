//! Shared fixtures: in-memory stores wrapped with fault injection and an
//! operation log that records the order of store calls.

#![allow(dead_code)]

use serde_json::json;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use vellum_error::{
    MetadataError, MetadataErrorKind, MetadataResult, StorageError, StorageErrorKind,
    StorageResult,
};
use vellum_records::{Entity, Fields, MemoryMetadataStore, MetadataStore, fields};
use vellum_storage::{BlobInfo, BlobStore, MemoryBlobStore, RemoveReport, StoredBlob};

pub const OWNER: &str = "acme";
pub const RECORD: &str = "site-1";
pub const BASE_URL: &str = "https://cdn.test";

/// Ordered log of mutating store calls, e.g. `put:acme/site-1/logo.png`.
pub type OpLog = Arc<Mutex<Vec<String>>>;

pub fn ops(log: &OpLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn position(log: &OpLog, op: &str) -> usize {
    ops(log)
        .iter()
        .position(|entry| entry == op)
        .unwrap_or_else(|| panic!("{op} not in {:?}", ops(log)))
}

/// Memory blob store with switchable failures.
pub struct FlakyBlobStore {
    pub inner: MemoryBlobStore,
    pub log: OpLog,
    fail_puts: Mutex<BTreeSet<String>>,
    fail_all_puts: AtomicBool,
    fail_removes: AtomicBool,
}

impl FlakyBlobStore {
    pub fn new(log: OpLog) -> Self {
        Self {
            inner: MemoryBlobStore::new(BASE_URL),
            log,
            fail_puts: Mutex::new(BTreeSet::new()),
            fail_all_puts: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
        }
    }

    /// Fail puts whose key contains `fragment`.
    pub fn fail_put_matching(&self, fragment: &str) {
        self.fail_puts.lock().unwrap().insert(fragment.to_string());
    }

    pub fn fail_all_puts(&self, fail: bool) {
        self.fail_all_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl BlobStore for FlakyBlobStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<StoredBlob> {
        let matched = self
            .fail_puts
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| key.contains(fragment.as_str()));
        if matched || self.fail_all_puts.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::Unavailable(format!(
                "injected put failure for {key}"
            ))));
        }
        self.log.lock().unwrap().push(format!("put:{key}"));
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn remove(&self, keys: &[String]) -> RemoveReport {
        if self.fail_removes.load(Ordering::SeqCst) {
            return RemoveReport {
                removed: Vec::new(),
                failed_keys: keys.to_vec(),
            };
        }
        for key in keys {
            self.log.lock().unwrap().push(format!("remove:{key}"));
        }
        self.inner.remove(keys).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobInfo>> {
        self.inner.list(prefix).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}

/// Memory metadata store with switchable update failures.
pub struct FlakyMetadataStore {
    pub inner: MemoryMetadataStore,
    pub log: OpLog,
    fail_updates: AtomicBool,
    /// Number of upcoming conditional updates to reject as conflicts
    conflicts: AtomicU32,
}

impl FlakyMetadataStore {
    pub fn new(log: OpLog) -> Self {
        Self {
            inner: MemoryMetadataStore::new(),
            log,
            fail_updates: AtomicBool::new(false),
            conflicts: AtomicU32::new(0),
        }
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts.store(count, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl MetadataStore for FlakyMetadataStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn create_entity(
        &self,
        id: &str,
        owner_id: &str,
        fields: Fields,
    ) -> MetadataResult<Entity> {
        self.inner.create_entity(id, owner_id, fields).await
    }

    async fn get_entity(&self, id: &str) -> MetadataResult<Entity> {
        self.inner.get_entity(id).await
    }

    async fn update_entity(
        &self,
        id: &str,
        patch: Fields,
        expected_version: Option<u64>,
    ) -> MetadataResult<Entity> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(MetadataError::new(MetadataErrorKind::Connection(
                "injected update failure".to_string(),
            )));
        }
        if let Some(expected) = expected_version {
            let pending = self.conflicts.load(Ordering::SeqCst);
            if pending > 0 {
                self.conflicts.store(pending - 1, Ordering::SeqCst);
                return Err(MetadataError::new(MetadataErrorKind::Conflict {
                    expected,
                    actual: expected + 1,
                }));
            }
        }
        self.log.lock().unwrap().push(format!("update:{id}"));
        self.inner.update_entity(id, patch, expected_version).await
    }

    async fn list_entities(&self, owner_id: &str) -> MetadataResult<Vec<Entity>> {
        self.inner.list_entities(owner_id).await
    }
}

pub struct Harness {
    pub log: OpLog,
    pub blobs: Arc<FlakyBlobStore>,
    pub records: Arc<FlakyMetadataStore>,
}

impl Harness {
    /// Stores with one empty record `RECORD` owned by `OWNER`.
    pub async fn new() -> Self {
        let log: OpLog = Arc::new(Mutex::new(Vec::new()));
        let blobs = Arc::new(FlakyBlobStore::new(log.clone()));
        let records = Arc::new(FlakyMetadataStore::new(log.clone()));
        records
            .create_entity(RECORD, OWNER, fields(json!({"name": "Acme"})))
            .await
            .unwrap();
        Self {
            log,
            blobs,
            records,
        }
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub async fn entity(&self) -> Entity {
        self.records.get_entity(RECORD).await.unwrap()
    }
}
