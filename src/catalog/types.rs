use serde::{Deserialize, Serialize};

/// Identifier of a catalog record, unique within the store.
pub type RecordId = i64;

/// A single catalog item as stored and displayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id: RecordId,
  pub name: String,
  pub description: String,
  /// Alcohol by volume, in percent
  pub strength: f64,
  /// Image file name, resolved against the catalog image base url
  pub image_ref: String,
  pub tagline: String,
  pub created_date: String,
  pub is_user_created: bool,
}

/// Image used for records created locally
pub const USER_IMAGE_REF: &str = "personalized_beer.png";

/// Tagline used for records created locally
pub const USER_TAGLINE: &str = "Custom beer";

/// Fields supplied by a user when creating a record.
///
/// The id is assigned by the store at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
  pub name: String,
  pub description: String,
  pub strength: f64,
  pub image_ref: String,
  pub tagline: String,
  pub created_date: String,
}

impl RecordDraft {
  /// Build a draft with the defaults for user-created records, dated today.
  pub fn new(name: impl Into<String>, description: impl Into<String>, strength: f64) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      strength,
      image_ref: USER_IMAGE_REF.to_string(),
      tagline: USER_TAGLINE.to_string(),
      created_date: chrono::Local::now().format("%d/%m/%Y").to_string(),
    }
  }

  /// Turn the draft into a record carrying the assigned id
  pub fn into_record(self, id: RecordId) -> Record {
    Record {
      id,
      name: self.name,
      description: self.description,
      strength: self.strength,
      image_ref: self.image_ref,
      tagline: self.tagline,
      created_date: self.created_date,
      is_user_created: true,
    }
  }
}

impl Record {
  /// Resolve the image reference to a full url, or None if the record has no image
  pub fn image_url(&self, base_url: &str) -> Option<String> {
    if self.image_ref.is_empty() {
      return None;
    }
    Some(format!(
      "{}/{}",
      base_url.trim_end_matches('/'),
      self.image_ref.trim_start_matches('/')
    ))
  }
}
