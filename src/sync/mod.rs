//! Keeping the local store and the displayed record set in step.
//!
//! Page loads and record creation both end with a full reload from the
//! store, so what is displayed is always derived from the store.

mod coordinator;
mod factory;

pub use coordinator::{LoadOutcome, PageState, SyncCoordinator, SyncError};
pub use factory::{parse_strength, CreateError, RecordFactory};
