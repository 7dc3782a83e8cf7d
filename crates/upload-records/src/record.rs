//! Upload record model: status state machine and media type codes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;

/// Lifecycle stage of an upload record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Uploaded,
    Failed,
}

impl UploadStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [UploadStatus; 4] = [
        UploadStatus::Pending,
        UploadStatus::Uploading,
        UploadStatus::Uploaded,
        UploadStatus::Failed,
    ];

    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Uploaded => "uploaded",
            UploadStatus::Failed => "failed",
        }
    }

    /// Whether a record in this status may move to `next`.
    ///
    /// The only edges are pending → uploading, uploading → uploaded,
    /// uploading → failed and failed → uploading.
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Pending, UploadStatus::Uploading)
                | (UploadStatus::Uploading, UploadStatus::Uploaded)
                | (UploadStatus::Uploading, UploadStatus::Failed)
                | (UploadStatus::Failed, UploadStatus::Uploading)
        )
    }

    /// Whether no further transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        UploadStatus::ALL
            .iter()
            .all(|next| !self.can_transition_to(*next))
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "uploading" => Ok(UploadStatus::Uploading),
            "uploaded" => Ok(UploadStatus::Uploaded),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// Kind of asset, stored as the photo library's integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Unknown,
    Image,
    Video,
    Audio,
    /// A code outside the well-known set, kept verbatim.
    Other(i64),
}

impl MediaType {
    pub fn code(&self) -> i64 {
        match self {
            MediaType::Unknown => 0,
            MediaType::Image => 1,
            MediaType::Video => 2,
            MediaType::Audio => 3,
            MediaType::Other(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => MediaType::Unknown,
            1 => MediaType::Image,
            2 => MediaType::Video,
            3 => MediaType::Audio,
            other => MediaType::Other(other),
        }
    }
}

impl From<i64> for MediaType {
    fn from(code: i64) -> Self {
        MediaType::from_code(code)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(MediaType::from_code)
    }
}

/// Persisted tracking entry for one asset's upload lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Stable identifier of the source asset.
    pub local_identifier: String,
    pub status: UploadStatus,
    /// Set once at insertion.
    pub creation_date: DateTime<Utc>,
    pub media_type: MediaType,
}

/// Record counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub pending: u64,
    pub uploading: u64,
    pub uploaded: u64,
    pub failed: u64,
}

impl StatusSummary {
    pub fn get(&self, status: UploadStatus) -> u64 {
        match status {
            UploadStatus::Pending => self.pending,
            UploadStatus::Uploading => self.uploading,
            UploadStatus::Uploaded => self.uploaded,
            UploadStatus::Failed => self.failed,
        }
    }

    pub(crate) fn set(&mut self, status: UploadStatus, count: u64) {
        match status {
            UploadStatus::Pending => self.pending = count,
            UploadStatus::Uploading => self.uploading = count,
            UploadStatus::Uploaded => self.uploaded = count,
            UploadStatus::Failed => self.failed = count,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.uploading + self.uploaded + self.failed
    }
}
