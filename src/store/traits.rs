//! Core trait and types for the local record store.

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{Record, RecordDraft, RecordId};

#[derive(Error, Debug)]
pub enum StoreError {
  /// The platform refused persistent storage (path, permissions, corrupt file)
  #[error("Storage unavailable: {0}")]
  Unavailable(String),

  #[error("Write failed: {0}")]
  WriteFailed(#[source] rusqlite::Error),

  #[error("Read failed: {0}")]
  ReadFailed(#[source] rusqlite::Error),

  #[error("Store lock poisoned")]
  LockPoisoned,
}

/// How ids are chosen for records created locally.
///
/// Remote ids are whatever the catalog sends. Local ids must never shadow them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
  /// One above the highest stored id. A user record later hit by a remote id
  /// is moved above the incoming batch.
  #[default]
  AfterMax,
  /// One below the lowest stored id (and never above -1)
  Negative,
}

impl IdPolicy {
  /// Next free id given the current id bounds (0 for an empty store)
  pub fn next_id(self, min: RecordId, max: RecordId) -> RecordId {
    match self {
      IdPolicy::AfterMax => max.max(0) + 1,
      IdPolicy::Negative => min.min(0) - 1,
    }
  }
}

/// Widen stored id bounds with the ids of an incoming batch
pub(crate) fn widen_bounds(
  (min, max): (RecordId, RecordId),
  records: &[Record],
) -> (RecordId, RecordId) {
  records
    .iter()
    .fold((min, max), |(lo, hi), r| (lo.min(r.id), hi.max(r.id)))
}

/// A keyed table of records.
///
/// Every write is an upsert by id; records are only removed by `clear`.
pub trait RecordStore: Send + Sync {
  /// Create the table if needed. Safe to call repeatedly.
  fn init(&self) -> Result<(), StoreError>;

  /// Merge a batch of remote records: insert or replace each by id, all or nothing.
  ///
  /// Every record in the batch is stored as remote, whatever its
  /// `is_user_created` says. A stored user-created record whose id is taken by
  /// the batch is re-keyed instead of overwritten.
  fn upsert_all(&self, records: &[Record]) -> Result<(), StoreError>;

  /// Every stored record, in no particular order
  fn get_all(&self) -> Result<Vec<Record>, StoreError>;

  /// Highest stored id, or 0 when empty
  fn get_max_id(&self) -> Result<RecordId, StoreError>;

  /// Assign the next id under the store's policy and insert, atomically
  fn insert_new(&self, draft: RecordDraft) -> Result<Record, StoreError>;

  /// Remove every record
  fn clear(&self) -> Result<(), StoreError>;

  /// Whether records survive a restart
  fn is_persistent(&self) -> bool;
}
