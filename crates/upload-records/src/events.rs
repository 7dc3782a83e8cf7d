//! Record event broadcaster for in-process change notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::record::{UploadRecord, UploadStatus};

/// A committed change to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordEvent {
    Inserted {
        record: UploadRecord,
    },
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        local_identifier: String,
        from: UploadStatus,
        to: UploadStatus,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Deleted { local_identifier: String },
}

impl RecordEvent {
    /// Identifier of the record the event is about.
    pub fn local_identifier(&self) -> &str {
        match self {
            RecordEvent::Inserted { record } => &record.local_identifier,
            RecordEvent::StatusChanged {
                local_identifier, ..
            }
            | RecordEvent::Deleted { local_identifier } => local_identifier,
        }
    }
}

/// Broadcasts record events to subscribers.
#[derive(Clone)]
pub struct RecordEventBroadcaster {
    sender: Arc<broadcast::Sender<RecordEvent>>,
}

impl RecordEventBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: RecordEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RecordEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
