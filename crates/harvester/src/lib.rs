//! Bulk retrieval and aggregation of scholarly metadata.
//!
//! `harvester` pulls publications, institutions and concepts out of the
//! [OpenAlex](https://openalex.org) catalog and turns them into bounded, tabular result sets:
//!
//! - Pagination over both offset (`page`) and cursor (`next_cursor`) style listings
//! - Hard result caps, never over-returning even when the last page overshoots
//! - Fail-open retrieval: a failed page ends the walk and keeps what was gathered
//! - A fixed, selectable publication schema with defaults for missing fields
//! - A time-bounded cache over the concept taxonomy
//!
//! # Getting Started
//!
//! ```no_run
//! use harvester::{config::Config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let harvester = Harvester::openalex(Config::default())?;
//!
//!   // Up to 50 publications from US institutions, three columns each
//!   let harvest = harvester.by_country("US", 50, &["Title", "DOI", "Cited by Count"]).await?;
//!   println!("retrieved {} rows", harvest.retrieved);
//!
//!   // Top of the field-of-study taxonomy, served from cache on repeat calls
//!   let roots = harvester.root_concepts().await;
//!   for concept in roots.iter() {
//!     println!("{} ({})", concept.name, concept.publication_count);
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`harvester`]: The aggregation facade and its public entry points
//! - [`walker`]: Pagination over offset and cursor listings
//! - [`record`]: Normalization of raw catalog records
//! - [`column`]: Column selection and row projection
//! - [`cache`]: The taxonomy cache and its clocks
//! - [`taxonomy`]: Concept level queries
//! - [`source`]: The catalog seam, with HTTP and in-memory implementations
//! - [`query`]: Immutable walk descriptions
//! - [`config`]: File-backed configuration
//! - [`error`]: The crate error type

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::{BTreeMap, HashMap},
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::{Arc, Mutex},
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod cache;
pub mod column;
pub mod config;
pub mod error;
pub mod harvester;
pub mod query;
pub mod record;
pub mod source;
pub mod taxonomy;
pub mod walker;

pub use crate::harvester::{Harvest, Harvester};
use crate::{
  cache::*, column::*, config::*, error::*, query::*, record::*, source::*, walker::*,
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use harvester::prelude::*;
///
/// async fn example(source: impl CatalogSource) -> Result<(), HarvesterError> {
///   let query = Query::new("concepts.id:C41008148").with_cap(10);
///   let records = Walker::new(&source).fetch(&query).await;
///   assert!(records.len() <= 10);
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    cache::Clock,
    error::HarvesterError,
    query::{Pagination, Query},
    source::CatalogSource,
    walker::{CancellationToken, Walker},
  };
}
