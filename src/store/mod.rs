//! Local record store: the offline cache of the catalog.
//!
//! A single table keyed by record id. All writes are upserts, so concurrent
//! writers stay safe without a spanning transaction (last write wins by id).
//! When the database cannot be opened the app keeps working on an in-memory
//! store for the current session.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{IdPolicy, RecordStore, StoreError};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

/// Open the configured store, degrading to memory if storage is refused
pub fn open_store(config: &Config) -> Arc<dyn RecordStore> {
  let ids = config.store.ids;

  if !config.store.enabled {
    info!("Local store disabled, keeping catalog in memory");
    return Arc::new(MemoryStore::new(ids));
  }

  let opened = config
    .store_path()
    .map_err(|e| StoreError::Unavailable(e.to_string()))
    .and_then(|path| SqliteStore::open(&path, ids));

  match opened {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, "Local store unavailable, keeping catalog in memory for this session");
      Arc::new(MemoryStore::new(ids))
    }
  }
}
