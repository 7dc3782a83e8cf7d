//! Durable local store tracking the upload lifecycle of media assets.
//!
//! An [`UploadRecordStore`] maps an asset's local identifier to its
//! [`UploadRecord`]. Records move through
//! `pending → uploading → {uploaded, failed}` with `failed → uploading`
//! as the retry edge; every mutation is committed to SQLite before the
//! call returns.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod logging;
pub mod record;
pub mod store;

pub use config::{load_config, load_config_from_str, StoreConfig};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, Result, StoreError, UploadRecordsError};
pub use events::{RecordEvent, RecordEventBroadcaster};
pub use logging::{init_logging, LogFormat};
pub use record::{MediaType, StatusSummary, UploadRecord, UploadStatus};
pub use store::UploadRecordStore;
