//! File-backed configuration.
//!
//! Every setting has a default, so a missing file or a partial file both work. The file is
//! TOML and lives at [`Config::default_path`] unless a path is given explicitly:
//!
//! ```toml
//! base_url = "https://api.openalex.org"
//! mailto = "me@example.org"
//! page_size = 200
//! taxonomy_page_size = 50
//! request_timeout_secs = 30
//! cache_ttl_secs = 300
//! listing_cap = 5000
//! ```

use super::*;

/// Settings for talking to the catalog and for bounding the work done per request.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use harvester::config::Config;
///
/// let config = Config::default().with_mailto("me@example.org").with_cache_ttl(Duration::from_secs(60));
/// assert_eq!(config.cache_ttl(), Duration::from_secs(60));
/// assert_eq!(config.page_size, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Root of the catalog API
  pub base_url:             String,
  /// Contact address sent with every request, opting into the catalog's polite pool
  pub mailto:               Option<String>,
  /// Page size for publication walks
  pub page_size:            usize,
  /// Page size for taxonomy level listings
  pub taxonomy_page_size:   usize,
  /// Upper bound on a single catalog call, in seconds
  pub request_timeout_secs: u64,
  /// How long a taxonomy listing stays cached, in seconds
  pub cache_ttl_secs:       u64,
  /// Upper bound on uncapped listings such as institutions per country
  pub listing_cap:          Option<usize>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url:             "https://api.openalex.org".to_owned(),
      mailto:               None,
      page_size:            MAX_PAGE_SIZE,
      taxonomy_page_size:   50,
      request_timeout_secs: 30,
      cache_ttl_secs:       300,
      listing_cap:          None,
    }
  }
}

impl Config {
  /// Location of the configuration file.
  ///
  /// - On Unix: `~/.config/harvester/config.toml`
  /// - On macOS: `~/Library/Application Support/harvester/config.toml`
  /// - On Windows: `%APPDATA%\harvester\config.toml`
  /// - Fallback: `./harvester/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("harvester").join("config.toml")
  }

  /// Reads a configuration file.
  ///
  /// # Errors
  ///
  /// Fails when the file cannot be read, is not valid TOML, or holds invalid values.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()
  }

  /// Reads the file at [`Config::default_path`] if there is one, defaults otherwise.
  ///
  /// # Errors
  ///
  /// Fails only when the file exists and cannot be loaded.
  pub fn load_or_default() -> Result<Self> {
    let path = Self::default_path();
    if path.exists() {
      Self::load(path)
    } else {
      trace!("No configuration at {}, using defaults", path.display());
      Ok(Self::default())
    }
  }

  /// Rejects values no walk could run with.
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::Config`] for zero page sizes or a zero timeout.
  pub fn validate(self) -> Result<Self> {
    if self.page_size == 0 || self.taxonomy_page_size == 0 {
      return Err(HarvesterError::Config("Page sizes must be at least 1".into()));
    }
    if self.request_timeout_secs == 0 {
      return Err(HarvesterError::Config("Request timeout must be at least one second".into()));
    }
    Ok(self)
  }

  #[allow(missing_docs)]
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  #[allow(missing_docs)]
  pub fn with_mailto(mut self, mailto: impl Into<String>) -> Self {
    self.mailto = Some(mailto.into());
    self
  }

  /// Sets the publication page size, clamped into `1..=MAX_PAGE_SIZE`.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    self
  }

  #[allow(missing_docs)]
  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout_secs = timeout.as_secs().max(1);
    self
  }

  #[allow(missing_docs)]
  pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
    self.cache_ttl_secs = ttl.as_secs();
    self
  }

  #[allow(missing_docs)]
  pub fn with_listing_cap(mut self, cap: usize) -> Self {
    self.listing_cap = Some(cap);
    self
  }

  #[allow(missing_docs)]
  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

  #[allow(missing_docs)]
  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }
}
