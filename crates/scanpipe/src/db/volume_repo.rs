//! Volume repository: CRUD for the `journal_volumes` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::catalog::model::{JournalVolume, StageFlags, VolumeStatus};

const COLUMNS: &str = "id, type, journal, volume, status, status_message, db_done, db_uploaded,
    bucket_uploaded, ocr_uploaded, file_hash, created_at, updated_at";

fn from_row(row: &Row<'_>) -> Result<JournalVolume, rusqlite::Error> {
    Ok(JournalVolume {
        id: row.get("id")?,
        kind: row.get("type")?,
        journal: row.get("journal")?,
        volume: row.get("volume")?,
        status: row.get("status")?,
        status_message: row.get("status_message")?,
        flags: StageFlags {
            db_done: row.get("db_done")?,
            db_uploaded: row.get("db_uploaded")?,
            bucket_uploaded: row.get("bucket_uploaded")?,
            ocr_uploaded: row.get("ocr_uploaded")?,
        },
        file_hash: row.get("file_hash")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_conflict(e: rusqlite::Error, volume: &JournalVolume) -> DatabaseError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::Conflict(format!("volume {} already exists", volume.display_name()))
        }
        other => DatabaseError::Sqlite(other),
    }
}

pub fn insert(db: &Database, volume: &JournalVolume) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            &format!(
                "INSERT INTO journal_volumes ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                COLUMNS
            ),
            params![
                volume.id,
                volume.kind,
                volume.journal,
                volume.volume,
                volume.status,
                volume.status_message,
                volume.flags.db_done,
                volume.flags.db_uploaded,
                volume.flags.bucket_uploaded,
                volume.flags.ocr_uploaded,
                volume.file_hash,
                volume.created_at,
                volume.updated_at,
            ],
        )
        .map_err(|e| map_conflict(e, volume))?;
        Ok(())
    })
}

/// Overwrites the mutable state of a volume. Identity columns are never updated.
pub fn update(db: &Database, volume: &JournalVolume) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE journal_volumes SET status = ?2, status_message = ?3, db_done = ?4,
             db_uploaded = ?5, bucket_uploaded = ?6, ocr_uploaded = ?7, file_hash = ?8,
             updated_at = ?9
             WHERE id = ?1",
            params![
                volume.id,
                volume.status,
                volume.status_message,
                volume.flags.db_done,
                volume.flags.db_uploaded,
                volume.flags.bucket_uploaded,
                volume.flags.ocr_uploaded,
                volume.file_hash,
                volume.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("volume {}", volume.id)));
        }
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JournalVolume>, DatabaseError> {
    db.with_conn(|conn| {
        let volume = conn
            .query_row(
                &format!("SELECT {} FROM journal_volumes WHERE id = ?1", COLUMNS),
                params![id],
                from_row,
            )
            .optional()?;
        Ok(volume)
    })
}

pub fn find_by_key(
    db: &Database,
    kind: &str,
    journal: &str,
    volume: &str,
) -> Result<Option<JournalVolume>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                &format!(
                    "SELECT {} FROM journal_volumes WHERE type = ?1 AND journal = ?2 AND volume = ?3",
                    COLUMNS
                ),
                params![kind, journal, volume],
                from_row,
            )
            .optional()?;
        Ok(found)
    })
}

pub fn list_by_status(
    db: &Database,
    status: VolumeStatus,
) -> Result<Vec<JournalVolume>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM journal_volumes WHERE status = ?1 ORDER BY created_at",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![status], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let volume = JournalVolume::new("seri", "test.", "0001");
        insert(&db, &volume).unwrap();

        let found = find_by_id(&db, &volume.id).unwrap().unwrap();
        assert_eq!(found, volume);

        let by_key = find_by_key(&db, "seri", "test.", "0001").unwrap().unwrap();
        assert_eq!(by_key.id, volume.id);
        assert!(find_by_key(&db, "seri", "test.", "0002").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_key_is_conflict() {
        let db = test_db();
        insert(&db, &JournalVolume::new("seri", "test.", "0001")).unwrap();
        let result = insert(&db, &JournalVolume::new("seri", "test.", "0001"));
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
    }

    #[test]
    fn test_update_persists_flags_and_status() {
        let db = test_db();
        let mut volume = JournalVolume::new("seri", "test.", "0001");
        insert(&db, &volume).unwrap();

        volume.status = VolumeStatus::Error;
        volume.status_message = Some("boom".to_string());
        volume.flags.db_done = true;
        volume.flags.bucket_uploaded = true;
        volume.file_hash = Some("abc".to_string());
        update(&db, &volume).unwrap();

        let found = find_by_id(&db, &volume.id).unwrap().unwrap();
        assert_eq!(found.status, VolumeStatus::Error);
        assert_eq!(found.status_message.as_deref(), Some("boom"));
        assert!(found.flags.db_done);
        assert!(!found.flags.db_uploaded);
        assert!(found.flags.bucket_uploaded);
        assert_eq!(found.file_hash.as_deref(), Some("abc"));

        let errored = list_by_status(&db, VolumeStatus::Error).unwrap();
        assert_eq!(errored.len(), 1);
        assert!(list_by_status(&db, VolumeStatus::Done).unwrap().is_empty());
    }

    #[test]
    fn test_update_unknown_volume() {
        let db = test_db();
        let volume = JournalVolume::new("seri", "test.", "0001");
        assert!(matches!(
            update(&db, &volume),
            Err(DatabaseError::NotFound(_))
        ));
    }
}
