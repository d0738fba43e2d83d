//! Error types for the harvester library.
//!
//! Data retrieval in this crate is fail-open: a failed or timed-out page simply
//! ends a walk early and the caller receives whatever was gathered. The errors
//! defined here are therefore mostly the fail-closed cases, where the caller
//! asked for something that cannot be answered:
//! - A column name that is not part of the publication schema
//! - An institution that cannot be resolved to an identifier
//! - Configuration that cannot be read or parsed
//!
//! Transport-level variants still exist because the [`CatalogSource`] seam reports
//! them; the walker and the facade decide whether they propagate.
//!
//! # Examples
//!
//! ```
//! use harvester::{column::project, error::HarvesterError, record::Publication};
//!
//! let publication = Publication::default();
//! match project(&publication, &["Title", "Bogus"]) {
//!   Err(HarvesterError::InvalidColumn(name)) => assert_eq!(name, "Bogus"),
//!   other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! [`CatalogSource`]: crate::source::CatalogSource

use thiserror::Error;

/// Error type alias used for the [`harvester`](crate) crate.
pub type Result<T> = core::result::Result<T, HarvesterError>;

/// Errors that can occur when harvesting from the catalog.
#[derive(Error, Debug)]
pub enum HarvesterError {
  /// A requested column is not one of the fixed publication attributes.
  ///
  /// Carries the offending name exactly as the caller supplied it. This is a caller
  /// programming error and is never defaulted or retried.
  #[error("Invalid column \"{0}\", see `harvester::column::Column::ALL`")]
  InvalidColumn(String),

  /// An identifier could not be resolved.
  ///
  /// Raised when a free-text institution search yields no match, or when a single
  /// entity lookup comes back empty. The string is the input that failed to resolve.
  #[error("No catalog entry found for \"{0}\"")]
  NotFound(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - TLS/SSL errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The catalog answered with a non-success status or an unusable envelope.
  #[error("API error: {0}")]
  ApiError(String),

  /// A response body could not be decoded.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A request URL could not be assembled from the configured base URL.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// A single source call exceeded the configured request timeout.
  #[error("Request to the catalog timed out")]
  Timeout,

  /// A file system operation failed, typically while reading a config file.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A configuration file was not valid TOML for [`Config`](crate::config::Config).
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// Configuration values were rejected.
  #[error("{0}")]
  Config(String),
}
