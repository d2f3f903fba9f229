mod catalog;

pub use catalog::{draw_catalog, CatalogScreen};
