//! Creation of user records.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::catalog::{Record, RecordDraft};
use crate::store::{RecordStore, StoreError};

#[derive(Error, Debug)]
pub enum CreateError {
  #[error("{0}")]
  Invalid(String),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Builds user records, inserts them, and announces each one that was committed.
#[derive(Clone)]
pub struct RecordFactory {
  store: Arc<dyn RecordStore>,
  created_tx: mpsc::UnboundedSender<Record>,
}

impl RecordFactory {
  /// Create a factory and the receiving end of its creation notifications
  pub fn new(store: Arc<dyn RecordStore>) -> (Self, mpsc::UnboundedReceiver<Record>) {
    let (created_tx, created_rx) = mpsc::unbounded_channel();
    (Self { store, created_tx }, created_rx)
  }

  /// Validate and insert a draft.
  ///
  /// The id is assigned by the store in the same step as the insert, so two
  /// creations never share an id. Failures are logged and returned; nothing
  /// is announced for them.
  pub fn create(&self, draft: RecordDraft) -> Result<Record, CreateError> {
    validate(&draft)?;

    let record = self.store.insert_new(draft).map_err(|e| {
      error!(error = %e, "Failed to store new record");
      e
    })?;
    info!(id = record.id, name = %record.name, "Created record");

    if self.created_tx.send(record.clone()).is_err() {
      debug!("No listener for created records");
    }

    Ok(record)
  }
}

fn validate(draft: &RecordDraft) -> Result<(), CreateError> {
  if draft.name.trim().is_empty() {
    return Err(CreateError::Invalid("Name is required".to_string()));
  }
  if !draft.strength.is_finite() || !(0.0..=100.0).contains(&draft.strength) {
    return Err(CreateError::Invalid(
      "Strength must be between 0 and 100".to_string(),
    ));
  }
  Ok(())
}

/// Parse a strength typed by a user, accepting a decimal comma ("5,5")
pub fn parse_strength(input: &str) -> Result<f64, CreateError> {
  let normalized = input.trim().trim_end_matches('%').trim().replace(',', ".");
  normalized
    .parse::<f64>()
    .map_err(|_| CreateError::Invalid(format!("Not a number: {}", input.trim())))
}
