use thiserror::Error;

/// Failures talking to the remote catalog.
///
/// All of these are recoverable: the next explicit page request retries.
#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("Catalog returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body: String,
  },

  #[error("Invalid catalog response: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Invalid catalog url: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl CatalogError {
  pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
    let body = if body.len() <= MAX_ERROR_BODY_LENGTH {
      body.to_string()
    } else {
      let mut end = MAX_ERROR_BODY_LENGTH;
      while !body.is_char_boundary(end) {
        end -= 1;
      }
      format!("{}... ({} bytes)", &body[..end], body.len())
    };
    CatalogError::Status { status, body }
  }
}
