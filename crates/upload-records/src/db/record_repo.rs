//! Upload record repository — row operations on the `upload_records` table.
//!
//! Functions take a borrowed connection so the store can compose them
//! inside a single transaction.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw upload record row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub local_identifier: String,
    pub status: String,
    pub creation_date: String,
    pub media_type: i64,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            local_identifier: row.get("local_identifier")?,
            status: row.get("status")?,
            creation_date: row.get("creation_date")?,
            media_type: row.get("media_type")?,
        })
    }
}

/// Whether `ts` formats as four-digit-year RFC 3339. Years outside
/// 0000-9999 gain a sign and break both parsing and text ordering.
pub fn is_storable_timestamp(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Formats a timestamp as fixed-width RFC 3339 so text order is time order.
///
/// Only valid for timestamps accepted by [`is_storable_timestamp`].
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptValue {
            column: "creation_date",
            reason: format!("'{}': {}", s, e),
        })
}

/// Inserts a new record row.
pub fn insert(conn: &Connection, row: &RecordRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO upload_records (local_identifier, status, creation_date, media_type)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            row.local_identifier,
            row.status,
            row.creation_date,
            row.media_type,
        ],
    )?;
    Ok(())
}

/// Finds a record by its local identifier.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<RecordRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM upload_records WHERE local_identifier = ?1",
            params![id],
            RecordRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Lists records with the given status, oldest first.
///
/// Rows sharing a creation date keep insertion order.
pub fn list_by_status(conn: &Connection, status: &str) -> Result<Vec<RecordRow>, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM upload_records WHERE status = ?1
         ORDER BY creation_date ASC, rowid ASC",
    )?;
    let rows = stmt
        .query_map(params![status], RecordRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Updates only the status of a record. Returns the number of rows changed.
pub fn update_status(conn: &Connection, id: &str, status: &str) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE upload_records SET status = ?2 WHERE local_identifier = ?1",
        params![id, status],
    )?;
    Ok(changed)
}

/// Deletes a record. Returns the number of rows removed.
pub fn delete(conn: &Connection, id: &str) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM upload_records WHERE local_identifier = ?1",
        params![id],
    )?;
    Ok(removed)
}

/// Counts records with the given status.
pub fn count_by_status(conn: &Connection, status: &str) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM upload_records WHERE status = ?1",
        params![status],
        |r| r.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use chrono::TimeZone;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("Failed to open test database");
        migrations::run_all(&conn).expect("Failed to migrate test database");
        conn
    }

    fn sample_row(id: &str) -> RecordRow {
        RecordRow {
            local_identifier: id.to_string(),
            status: "pending".to_string(),
            creation_date: "2026-01-01T00:00:00.000000Z".to_string(),
            media_type: 1,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = test_conn();
        insert(&conn, &sample_row("asset-1")).unwrap();

        let found = find_by_id(&conn, "asset-1").unwrap().unwrap();
        assert_eq!(found, sample_row("asset-1"));
    }

    #[test]
    fn test_find_nonexistent() {
        let conn = test_conn();
        assert!(find_by_id(&conn, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_rejected_by_primary_key() {
        let conn = test_conn();
        insert(&conn, &sample_row("dup")).unwrap();
        assert!(insert(&conn, &sample_row("dup")).is_err());
    }

    #[test]
    fn test_list_by_status_orders_by_creation_date() {
        let conn = test_conn();
        let mut newer = sample_row("newer");
        newer.creation_date = "2026-01-02T00:00:00.000000Z".to_string();
        insert(&conn, &newer).unwrap();
        insert(&conn, &sample_row("older")).unwrap();

        let mut failed = sample_row("other");
        failed.status = "failed".to_string();
        insert(&conn, &failed).unwrap();

        let ids: Vec<String> = list_by_status(&conn, "pending")
            .unwrap()
            .into_iter()
            .map(|r| r.local_identifier)
            .collect();
        assert_eq!(ids, vec!["older", "newer"]);
    }

    #[test]
    fn test_list_by_status_ties_keep_insertion_order() {
        let conn = test_conn();
        for id in ["c", "a", "b"] {
            insert(&conn, &sample_row(id)).unwrap();
        }

        let ids: Vec<String> = list_by_status(&conn, "pending")
            .unwrap()
            .into_iter()
            .map(|r| r.local_identifier)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_update_status_and_delete_report_changes() {
        let conn = test_conn();
        insert(&conn, &sample_row("u1")).unwrap();

        assert_eq!(update_status(&conn, "u1", "uploading").unwrap(), 1);
        assert_eq!(update_status(&conn, "missing", "uploading").unwrap(), 0);
        assert_eq!(find_by_id(&conn, "u1").unwrap().unwrap().status, "uploading");

        assert_eq!(delete(&conn, "u1").unwrap(), 1);
        assert_eq!(delete(&conn, "u1").unwrap(), 0);
    }

    #[test]
    fn test_count_by_status() {
        let conn = test_conn();
        insert(&conn, &sample_row("c1")).unwrap();
        insert(&conn, &sample_row("c2")).unwrap();

        let mut failed = sample_row("c3");
        failed.status = "failed".to_string();
        insert(&conn, &failed).unwrap();

        assert_eq!(count_by_status(&conn, "pending").unwrap(), 2);
        assert_eq!(count_by_status(&conn, "failed").unwrap(), 1);
        assert_eq!(count_by_status(&conn, "uploaded").unwrap(), 0);
    }

    #[test]
    fn test_storable_timestamp_range() {
        let first = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(is_storable_timestamp(&first));
        assert!(is_storable_timestamp(&last));
        assert!(parse_timestamp(&format_timestamp(&last)).is_ok());

        let too_late = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let too_early = Utc.with_ymd_and_hms(-1, 12, 31, 0, 0, 0).unwrap();
        assert!(!is_storable_timestamp(&too_late));
        assert!(!is_storable_timestamp(&too_early));
    }

    #[test]
    fn test_timestamp_format_is_fixed_width_and_parses_back() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2026-03-04T05:06:07.000000Z");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DatabaseError::CorruptValue { column: "creation_date", .. })
        ));
    }
}
