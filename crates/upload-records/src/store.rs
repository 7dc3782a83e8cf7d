//! Durable store of upload records.
//!
//! Wraps the SQLite [`Database`] with the record state machine. Every
//! mutation runs in its own transaction and is committed before the call
//! returns; events are broadcast only after the commit succeeds.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn};

use crate::config::StoreConfig;
use crate::db::record_repo::{self, RecordRow};
use crate::db::{Database, DatabaseError};
use crate::error::{StoreError, UploadRecordsError};
use crate::events::{RecordEvent, RecordEventBroadcaster};
use crate::record::{MediaType, StatusSummary, UploadRecord, UploadStatus};

fn record_from_row(row: RecordRow) -> Result<UploadRecord, StoreError> {
    Ok(UploadRecord {
        status: row.status.parse()?,
        creation_date: record_repo::parse_timestamp(&row.creation_date)?,
        media_type: MediaType::from_code(row.media_type),
        local_identifier: row.local_identifier,
    })
}

fn row_from_record(record: &UploadRecord) -> RecordRow {
    RecordRow {
        local_identifier: record.local_identifier.clone(),
        status: record.status.as_str().to_string(),
        creation_date: record_repo::format_timestamp(&record.creation_date),
        media_type: record.media_type.code(),
    }
}

/// Shared handle to the upload record store.
///
/// Cloning is cheap; clones share the connection and the event channel.
#[derive(Clone)]
pub struct UploadRecordStore {
    db: Database,
    events: RecordEventBroadcaster,
}

impl UploadRecordStore {
    /// Opens the store described by `config` and runs migrations.
    ///
    /// Records are left exactly as persisted unless
    /// `recover_interrupted_on_open` is set. Recovery done here runs before
    /// anyone can subscribe, so it shows up only in the `warn!` log; call
    /// [`recover_interrupted`](Self::recover_interrupted) after subscribing
    /// to observe it as events.
    pub fn open(config: &StoreConfig) -> Result<Self, UploadRecordsError> {
        let path = config.resolved_database_path()?;
        let db = Database::open(&path, config.busy_timeout()).map_err(StoreError::from)?;
        let events = RecordEventBroadcaster::new(config.event_capacity.max(1));
        let store = Self::from_database(db, events);

        if config.recover_interrupted_on_open {
            store.recover_interrupted()?;
        }

        info!(path = %path.display(), "Upload record store opened");
        Ok(store)
    }

    /// Opens a store backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(db, RecordEventBroadcaster::default()))
    }

    pub fn from_database(db: Database, events: RecordEventBroadcaster) -> Self {
        Self { db, events }
    }

    /// Flushes the write-ahead log and releases the connection.
    ///
    /// Later calls on this store or any clone fail with a persistence error.
    pub fn close(&self) -> Result<(), StoreError> {
        self.db.close()?;
        Ok(())
    }

    /// Subscribes to committed changes.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    /// Enqueues an asset with status `pending`, stamped with the current time.
    pub fn insert(
        &self,
        local_identifier: &str,
        media_type: MediaType,
    ) -> Result<UploadRecord, StoreError> {
        self.insert_at(local_identifier, media_type, Utc::now())
    }

    /// Enqueues an asset with an explicit creation date.
    pub fn insert_at(
        &self,
        local_identifier: &str,
        media_type: MediaType,
        creation_date: DateTime<Utc>,
    ) -> Result<UploadRecord, StoreError> {
        let _span = info_span!("store.insert", id = local_identifier).entered();

        if local_identifier.is_empty() {
            return Err(StoreError::InvalidIdentifier);
        }
        if !record_repo::is_storable_timestamp(&creation_date) {
            return Err(StoreError::InvalidCreationDate(creation_date));
        }

        // Truncate to the stored precision so the returned record equals
        // what `get` reports later.
        let creation_date =
            record_repo::parse_timestamp(&record_repo::format_timestamp(&creation_date))?;

        let record = UploadRecord {
            local_identifier: local_identifier.to_string(),
            status: UploadStatus::Pending,
            creation_date,
            media_type,
        };

        self.db.with_transaction(|tx| {
            if record_repo::find_by_id(tx, local_identifier)?.is_some() {
                return Err(StoreError::DuplicateKey(local_identifier.to_string()));
            }
            record_repo::insert(tx, &row_from_record(&record))?;
            Ok(())
        })?;

        debug!(media_type = media_type.code(), "Upload record inserted");
        self.events.send(RecordEvent::Inserted {
            record: record.clone(),
        });

        Ok(record)
    }

    /// Moves a record to `new_status` along the transition graph.
    pub fn update_status(
        &self,
        local_identifier: &str,
        new_status: UploadStatus,
    ) -> Result<(), StoreError> {
        let _span = info_span!("store.update_status", id = local_identifier, to = %new_status)
            .entered();

        let from = self.db.with_transaction(|tx| {
            let row = record_repo::find_by_id(tx, local_identifier)?
                .ok_or_else(|| StoreError::NotFound(local_identifier.to_string()))?;
            let current: UploadStatus = row.status.parse()?;

            if !current.can_transition_to(new_status) {
                return Err(StoreError::InvalidTransition {
                    id: local_identifier.to_string(),
                    from: current,
                    to: new_status,
                });
            }

            record_repo::update_status(tx, local_identifier, new_status.as_str())?;
            Ok(current)
        })?;

        debug!(from = %from, "Upload record status changed");
        self.events.send(RecordEvent::StatusChanged {
            local_identifier: local_identifier.to_string(),
            from,
            to: new_status,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Looks up a record by identifier.
    pub fn get(&self, local_identifier: &str) -> Result<Option<UploadRecord>, StoreError> {
        self.db.with_conn(|conn| {
            record_repo::find_by_id(conn, local_identifier)?
                .map(record_from_row)
                .transpose()
        })
    }

    /// All records with `status`, oldest first.
    pub fn list_by_status(&self, status: UploadStatus) -> Result<Vec<UploadRecord>, StoreError> {
        self.db.with_conn(|conn| {
            record_repo::list_by_status(conn, status.as_str())?
                .into_iter()
                .map(record_from_row)
                .collect()
        })
    }

    /// Removes a record. Absent identifiers are not an error.
    pub fn delete(&self, local_identifier: &str) -> Result<(), StoreError> {
        let removed = self
            .db
            .with_transaction(|tx| record_repo::delete(tx, local_identifier))?;

        if removed > 0 {
            debug!(id = local_identifier, "Upload record deleted");
            self.events.send(RecordEvent::Deleted {
                local_identifier: local_identifier.to_string(),
            });
        }

        Ok(())
    }

    pub fn count_by_status(&self, status: UploadStatus) -> Result<u64, StoreError> {
        let count = self
            .db
            .with_conn(|conn| record_repo::count_by_status(conn, status.as_str()))?;
        Ok(count)
    }

    /// Record counts for every status, read in one consistent snapshot.
    pub fn status_summary(&self) -> Result<StatusSummary, StoreError> {
        let summary = self.db.with_conn(|conn| {
            let mut summary = StatusSummary::default();
            for status in UploadStatus::ALL {
                summary.set(status, record_repo::count_by_status(conn, status.as_str())?);
            }
            Ok::<_, DatabaseError>(summary)
        })?;
        Ok(summary)
    }

    /// Marks every record left in `uploading` as `failed`.
    ///
    /// No upload can still be in flight when a fresh process opens the store,
    /// so such records were interrupted by a crash or kill. Moving them to
    /// `failed` lets the transport retry them. Only runs when the caller asks
    /// for it. Returns the affected identifiers, oldest first.
    pub fn recover_interrupted(&self) -> Result<Vec<String>, StoreError> {
        let _span = info_span!("store.recover_interrupted").entered();

        let recovered = self.db.with_transaction(|tx| {
            let rows = record_repo::list_by_status(tx, UploadStatus::Uploading.as_str())?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                record_repo::update_status(
                    tx,
                    &row.local_identifier,
                    UploadStatus::Failed.as_str(),
                )?;
                ids.push(row.local_identifier);
            }
            Ok::<_, DatabaseError>(ids)
        })?;

        if recovered.is_empty() {
            return Ok(recovered);
        }

        warn!(
            count = recovered.len(),
            "Marked interrupted uploads as failed"
        );
        let now = Utc::now();
        for id in &recovered {
            self.events.send(RecordEvent::StatusChanged {
                local_identifier: id.clone(),
                from: UploadStatus::Uploading,
                to: UploadStatus::Failed,
                timestamp: now,
            });
        }

        Ok(recovered)
    }
}
