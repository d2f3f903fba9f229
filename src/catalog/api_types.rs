//! Serde-deserializable types matching the catalog API responses.
//!
//! These are kept apart from the domain types so the wire names (`abv`,
//! `first_brewed`, ...) and the API's looser typing stay at the edge.

use serde::Deserialize;

use super::types::Record;

/// One item of the paged list endpoint
#[derive(Debug, Deserialize)]
pub struct ApiBeer {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Some catalog entries have a null abv
  #[serde(default)]
  pub abv: Option<f64>,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub tagline: Option<String>,
  #[serde(default)]
  pub first_brewed: Option<String>,
}

impl ApiBeer {
  /// Anything served by the catalog is remote, whatever flags it carries
  pub fn into_record(self) -> Record {
    Record {
      id: self.id,
      name: self.name,
      description: self.description.unwrap_or_default(),
      strength: self.abv.unwrap_or(0.0),
      image_ref: self.image.unwrap_or_default(),
      tagline: self.tagline.unwrap_or_default(),
      created_date: self.first_brewed.unwrap_or_default(),
      is_user_created: false,
    }
  }
}
