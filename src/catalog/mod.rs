//! Remote catalog access: domain types, wire types, and the HTTP client.

pub mod api_types;
pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogClient, CatalogSource};
pub use error::CatalogError;
pub use types::{Record, RecordDraft, RecordId};
