use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::record::UploadStatus;

#[derive(Error, Debug)]
pub enum UploadRecordsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Upload record '{0}' already exists")]
    DuplicateKey(String),

    #[error("Upload record '{0}' not found")]
    NotFound(String),

    #[error("Invalid status transition for '{id}': {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: UploadStatus,
        to: UploadStatus,
    },

    #[error("Local identifier must not be empty")]
    InvalidIdentifier,

    #[error("Creation date {0} is outside the years 0000-9999")]
    InvalidCreationDate(DateTime<Utc>),

    #[error("Unknown upload status '{0}'")]
    InvalidStatus(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

pub type Result<T> = std::result::Result<T, UploadRecordsError>;
