//! SQLite implementation of the record store.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::traits::{widen_bounds, IdPolicy, RecordStore, StoreError};
use crate::catalog::{Record, RecordDraft, RecordId};

/// Schema for the record table.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    strength REAL NOT NULL,
    image_ref TEXT NOT NULL,
    tagline TEXT NOT NULL,
    created_date TEXT NOT NULL,
    is_user_created INTEGER NOT NULL DEFAULT 0,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_name ON records(name);
"#;

const UPSERT: &str = "INSERT OR REPLACE INTO records
  (id, name, description, strength, image_ref, tagline, created_date, is_user_created, stored_at)
  VALUES (?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))";

/// Persistent record store backed by a single SQLite table.
pub struct SqliteStore {
  conn: Mutex<Connection>,
  ids: IdPolicy,
}

impl SqliteStore {
  /// Open or create the store at `path`, creating parent directories.
  pub fn open(path: &Path, ids: IdPolicy) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StoreError::Unavailable(format!(
          "Failed to create store directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StoreError::Unavailable(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let store = Self::with_connection(conn, ids);
    store
      .init()
      .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Opened local store");
    Ok(store)
  }

  /// Open a store that lives only as long as this value
  #[cfg(test)]
  pub fn open_in_memory(ids: IdPolicy) -> Result<Self, StoreError> {
    let conn =
      Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
    let store = Self::with_connection(conn, ids);
    store.init()?;
    Ok(store)
  }

  fn with_connection(conn: Connection, ids: IdPolicy) -> Self {
    Self {
      conn: Mutex::new(conn),
      ids,
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
  Ok(Record {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    strength: row.get(3)?,
    image_ref: row.get(4)?,
    tagline: row.get(5)?,
    created_date: row.get(6)?,
    is_user_created: row.get(7)?,
  })
}

/// (min, max) of stored ids, both 0 when empty
fn id_bounds(tx: &Transaction<'_>) -> rusqlite::Result<(RecordId, RecordId)> {
  tx.query_row(
    "SELECT COALESCE(MIN(id), 0), COALESCE(MAX(id), 0) FROM records",
    [],
    |row| Ok((row.get(0)?, row.get(1)?)),
  )
}

/// Write `record`, taking its origin from `user_created` rather than the record
fn write_record(
  tx: &Transaction<'_>,
  record: &Record,
  user_created: bool,
) -> rusqlite::Result<usize> {
  tx.execute(
    UPSERT,
    params![
      record.id,
      record.name,
      record.description,
      record.strength,
      record.image_ref,
      record.tagline,
      record.created_date,
      user_created,
    ],
  )
}

impl RecordStore for SqliteStore {
  fn init(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute_batch(SCHEMA).map_err(StoreError::WriteFailed)
  }

  fn upsert_all(&self, records: &[Record]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction().map_err(StoreError::WriteFailed)?;

    let (mut min, mut max) = widen_bounds(
      id_bounds(&tx).map_err(StoreError::ReadFailed)?,
      records,
    );

    for record in records {
      let existing_is_user: Option<bool> = tx
        .query_row(
          "SELECT is_user_created FROM records WHERE id = ?",
          params![record.id],
          |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::ReadFailed)?;

      if existing_is_user == Some(true) {
        let new_id = self.ids.next_id(min, max);
        tx.execute(
          "UPDATE records SET id = ? WHERE id = ?",
          params![new_id, record.id],
        )
        .map_err(StoreError::WriteFailed)?;
        min = min.min(new_id);
        max = max.max(new_id);
        info!(from = record.id, to = new_id, "Re-keyed user record displaced by remote id");
      }

      write_record(&tx, record, false).map_err(StoreError::WriteFailed)?;
    }

    // Dropping an uncommitted transaction rolls the whole batch back
    tx.commit().map_err(StoreError::WriteFailed)?;
    debug!(count = records.len(), "Upserted records");
    Ok(())
  }

  fn get_all(&self) -> Result<Vec<Record>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare(
        "SELECT id, name, description, strength, image_ref, tagline, created_date, is_user_created
         FROM records",
      )
      .map_err(StoreError::ReadFailed)?;

    let records = stmt
      .query_map([], row_to_record)
      .map_err(StoreError::ReadFailed)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(StoreError::ReadFailed)?;

    Ok(records)
  }

  fn get_max_id(&self) -> Result<RecordId, StoreError> {
    let conn = self.lock()?;
    conn
      .query_row("SELECT COALESCE(MAX(id), 0) FROM records", [], |row| {
        row.get(0)
      })
      .map_err(StoreError::ReadFailed)
  }

  fn insert_new(&self, draft: RecordDraft) -> Result<Record, StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction().map_err(StoreError::WriteFailed)?;

    let (min, max) = id_bounds(&tx).map_err(StoreError::ReadFailed)?;
    let record = draft.into_record(self.ids.next_id(min, max));

    write_record(&tx, &record, true).map_err(StoreError::WriteFailed)?;
    tx.commit().map_err(StoreError::WriteFailed)?;

    Ok(record)
  }

  fn clear(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM records", [])
      .map_err(StoreError::WriteFailed)?;
    info!("Cleared local store");
    Ok(())
  }

  fn is_persistent(&self) -> bool {
    true
  }
}
