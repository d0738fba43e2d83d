//! Errors surfaced by the `harvester` command line.

use harvester::error::HarvesterError;
use thiserror::Error;

/// Result alias for the command line.
pub type Result<T> = core::result::Result<T, HarvesterdError>;

/// Everything that can end a command early.
#[derive(Error, Debug)]
pub enum HarvesterdError {
  /// The library rejected the request, e.g. an unknown column or an unresolvable institution.
  #[error(transparent)]
  Harvester(#[from] HarvesterError),

  /// Writing to stdout or stderr failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// An output record could not be encoded.
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
