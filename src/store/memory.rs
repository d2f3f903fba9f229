//! In-memory record store, used when persistent storage is unavailable.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::traits::{widen_bounds, IdPolicy, RecordStore, StoreError};
use crate::catalog::{Record, RecordDraft, RecordId};

/// Session-only store with the same semantics as the SQLite one.
/// Nothing survives a restart.
pub struct MemoryStore {
  records: Mutex<BTreeMap<RecordId, Record>>,
  ids: IdPolicy,
}

impl MemoryStore {
  pub fn new(ids: IdPolicy) -> Self {
    Self {
      records: Mutex::new(BTreeMap::new()),
      ids,
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<RecordId, Record>>, StoreError> {
    self.records.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

fn id_bounds(records: &BTreeMap<RecordId, Record>) -> (RecordId, RecordId) {
  let min = records.keys().next().copied().unwrap_or(0);
  let max = records.keys().next_back().copied().unwrap_or(0);
  (min, max)
}

impl RecordStore for MemoryStore {
  fn init(&self) -> Result<(), StoreError> {
    Ok(())
  }

  fn upsert_all(&self, incoming: &[Record]) -> Result<(), StoreError> {
    let mut records = self.lock()?;
    let (mut min, mut max) = widen_bounds(id_bounds(&records), incoming);

    for record in incoming {
      let displaces_user = records
        .get(&record.id)
        .is_some_and(|existing| existing.is_user_created);

      if displaces_user {
        if let Some(mut moved) = records.remove(&record.id) {
          moved.id = self.ids.next_id(min, max);
          min = min.min(moved.id);
          max = max.max(moved.id);
          records.insert(moved.id, moved);
        }
      }

      records.insert(
        record.id,
        Record {
          is_user_created: false,
          ..record.clone()
        },
      );
    }

    Ok(())
  }

  fn get_all(&self) -> Result<Vec<Record>, StoreError> {
    Ok(self.lock()?.values().cloned().collect())
  }

  fn get_max_id(&self) -> Result<RecordId, StoreError> {
    Ok(id_bounds(&*self.lock()?).1)
  }

  fn insert_new(&self, draft: RecordDraft) -> Result<Record, StoreError> {
    let mut records = self.lock()?;
    let (min, max) = id_bounds(&records);
    let record = draft.into_record(self.ids.next_id(min, max));
    records.insert(record.id, record.clone());
    Ok(record)
  }

  fn clear(&self) -> Result<(), StoreError> {
    self.lock()?.clear();
    Ok(())
  }

  fn is_persistent(&self) -> bool {
    false
  }
}
