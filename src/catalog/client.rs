use std::future::Future;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::config::CatalogConfig;

use super::api_types::ApiBeer;
use super::error::CatalogError;
use super::types::Record;

/// A remote source of paged catalog records.
///
/// An empty page means there are no further pages.
pub trait CatalogSource: Send + Sync {
  fn fetch_page(&self, page: u32)
    -> impl Future<Output = Result<Vec<Record>, CatalogError>> + Send;
}

/// HTTP client for the paged catalog list endpoint
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base: Url,
  per_page: Option<u32>,
}

impl CatalogClient {
  pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
    let base = Url::parse(&config.url)?;
    if base.cannot_be_a_base() {
      return Err(CatalogError::InvalidUrl(
        url::ParseError::RelativeUrlWithCannotBeABaseBase,
      ));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("hopdex/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      base,
      per_page: config.per_page,
    })
  }

  /// Build the list url for a page, e.g. `<base>/beers?page=2`
  fn page_url(&self, page: u32) -> Result<Url, CatalogError> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| CatalogError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
      .pop_if_empty()
      .push("beers");

    {
      let mut query = url.query_pairs_mut();
      query.append_pair("page", &page.to_string());
      if let Some(per_page) = self.per_page {
        query.append_pair("per_page", &per_page.to_string());
      }
    }

    Ok(url)
  }

  /// Get one page of records
  pub async fn get_page(&self, page: u32) -> Result<Vec<Record>, CatalogError> {
    let url = self.page_url(page)?;
    debug!(%url, "Fetching catalog page");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      return Err(CatalogError::from_status(status, &body));
    }

    let beers: Vec<ApiBeer> = serde_json::from_str(&body)?;
    Ok(beers.into_iter().map(ApiBeer::into_record).collect())
  }
}

impl CatalogSource for CatalogClient {
  async fn fetch_page(&self, page: u32) -> Result<Vec<Record>, CatalogError> {
    self.get_page(page).await
  }
}
