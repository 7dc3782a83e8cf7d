//! Shared helpers for integration tests.
//!
//! `TestStore` owns a temporary directory holding an on-disk database so
//! tests can close, "crash" and reopen the store against the same file.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use upload_records::{StoreConfig, UploadRecordStore};

pub struct TestStore {
    temp_dir: TempDir,
    pub db_path: PathBuf,
    recover_on_open: bool,
}

impl TestStore {
    /// New harness using the default configuration: records are reopened
    /// exactly as persisted.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("records.db");
        Self {
            temp_dir,
            db_path,
            recover_on_open: false,
        }
    }

    /// New harness whose store marks `uploading` records as `failed` on open.
    pub fn with_recovery() -> Self {
        Self {
            recover_on_open: true,
            ..Self::new()
        }
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            recover_interrupted_on_open: self.recover_on_open,
            busy_timeout_ms: 1000,
            ..StoreConfig::with_database_path(&self.db_path)
        }
    }

    pub fn open(&self) -> UploadRecordStore {
        UploadRecordStore::open(&self.config()).expect("Failed to open store")
    }

    /// Abandons the store without closing it, as a killed process would.
    ///
    /// The process and its OS page cache survive, so this shows that a
    /// committed write is visible to a fresh connection without `close`.
    /// It does not exercise fsync or power loss.
    pub fn crash(&self, store: UploadRecordStore) {
        std::mem::forget(store);
    }
}

/// Deterministic timestamp `secs` seconds after 2026-01-01T00:00:00Z.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

pub fn ids(records: &[upload_records::UploadRecord]) -> Vec<&str> {
    records.iter().map(|r| r.local_identifier.as_str()).collect()
}
