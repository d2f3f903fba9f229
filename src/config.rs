use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::IdPolicy;

/// Default catalog endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://punkapi.online/v3";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  /// Base url of the catalog API; pages are read from `<url>/beers?page=N`
  pub url: String,
  /// Where image refs are resolved (defaults to `<url>/images`)
  pub image_base_url: Option<String>,
  /// Page size sent as `per_page`; the API default is used when unset
  pub per_page: Option<u32>,
  pub timeout_secs: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_CATALOG_URL.to_string(),
      image_base_url: None,
      per_page: None,
      timeout_secs: 15,
    }
  }
}

impl CatalogConfig {
  pub fn image_base_url(&self) -> String {
    match &self.image_base_url {
      Some(url) => url.clone(),
      None => format!("{}/images", self.url.trim_end_matches('/')),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Database file (defaults to `$XDG_DATA_HOME/hopdex/catalog.db`)
  pub path: Option<PathBuf>,
  /// How ids are assigned to locally created records
  pub ids: IdPolicy,
  /// Set to false to keep the catalog in memory only
  pub enabled: bool,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      path: None,
      ids: IdPolicy::default(),
      enabled: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Maximum number of name suggestions shown while typing
  pub suggestion_limit: usize,
  /// Description characters shown on a card
  pub excerpt_len: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      suggestion_limit: 10,
      excerpt_len: 100,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./hopdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/hopdex/config.yaml
  ///
  /// Defaults are used when no file exists. `HOPDEX_CATALOG_URL` overrides
  /// the catalog url in every case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var("HOPDEX_CATALOG_URL") {
      config.catalog.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("hopdex.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("hopdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null rather than an empty map
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Directory for the database and log files
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("hopdex"))
  }

  /// Resolved database path
  pub fn store_path(&self) -> Result<PathBuf> {
    match &self.store.path {
      Some(p) => Ok(p.clone()),
      None => Ok(Self::data_dir()?.join("catalog.db")),
    }
  }
}
