//! The seam between the aggregation engine and the external catalog.
//!
//! Everything above this module talks to the catalog through [`CatalogSource`], which knows
//! two calls: fetch one page of a listing, and fetch one entity by identifier. The listing
//! call is described by a [`PageRequest`] and answered with the catalog's envelope, a
//! [`Page`] of raw records plus [`PageMeta`].
//!
//! Two implementations ship with the crate:
//!
//! - [`OpenAlex`]: the HTTP client for `api.openalex.org` (or a compatible mirror)
//! - [`MemorySource`]: an in-memory catalog that applies the same filter and paging rules to
//!   a fixed set of records, counting every call it answers
//!
//! A source reports failures as errors. Whether a failure ends a walk quietly or reaches the
//! caller is decided by the [`Walker`](crate::walker::Walker) and the
//! [`Harvester`](crate::Harvester), not here.

use super::*;

pub mod memory;
pub mod openalex;

pub use memory::MemorySource;
pub use openalex::OpenAlex;

/// Where in a listing a [`PageRequest`] starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Position {
  /// No paging parameter at all; the source serves its first page.
  #[default]
  First,
  /// Numbered page, starting at 1.
  Page(u32),
  /// Cursor continuation. `None` asks the source to start a new cursor.
  Cursor(Option<String>),
}

/// One request for a batch of a catalog listing.
///
/// ```
/// use harvester::{
///   query::Entity,
///   source::{PageRequest, Position},
/// };
///
/// let request =
///   PageRequest::new(Entity::Concepts).with_filter("level:0").with_per_page(50).at_page(2);
/// assert_eq!(request.position, Position::Page(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  /// Collection to list
  pub entity:   Entity,
  /// Filter expression, sent verbatim
  pub filter:   Option<String>,
  /// Requested page size; the source default applies when absent
  pub per_page: Option<usize>,
  /// Paging position
  pub position: Position,
  /// Field to aggregate counts by instead of listing records
  pub group_by: Option<String>,
}

impl PageRequest {
  /// Starts a request for the first page of `entity`, unfiltered.
  pub fn new(entity: Entity) -> Self {
    Self { entity, filter: None, per_page: None, position: Position::First, group_by: None }
  }

  #[allow(missing_docs)]
  pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
    self.filter = Some(filter.into());
    self
  }

  #[allow(missing_docs)]
  pub fn with_per_page(mut self, per_page: usize) -> Self {
    self.per_page = Some(per_page);
    self
  }

  #[allow(missing_docs)]
  pub fn at_page(mut self, page: u32) -> Self {
    self.position = Position::Page(page);
    self
  }

  #[allow(missing_docs)]
  pub fn at_cursor(mut self, cursor: Option<String>) -> Self {
    self.position = Position::Cursor(cursor);
    self
  }

  #[allow(missing_docs)]
  pub fn grouped_by(mut self, field: impl Into<String>) -> Self {
    self.group_by = Some(field.into());
    self
  }
}

/// The catalog's response envelope for a listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
  /// Records on this page, in source order
  #[serde(default)]
  pub results:  Vec<RawRecord>,
  /// Listing metadata
  #[serde(default)]
  pub meta:     PageMeta,
  /// Aggregated counts, only present for `group_by` requests
  #[serde(default)]
  pub group_by: Vec<RawRecord>,
}

/// Listing metadata carried alongside a [`Page`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
  /// Total number of records matching the filter
  #[serde(default)]
  pub count:       Option<u64>,
  /// Continuation token for cursor paging
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next_cursor: Option<String>,
  /// Continuation token as named by older envelopes
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next_page:   Option<String>,
}

impl PageMeta {
  /// The continuation token, whichever name the envelope used for it.
  pub fn next_token(&self) -> Option<&str> {
    self.next_cursor.as_deref().or(self.next_page.as_deref()).filter(|token| !token.is_empty())
  }
}

/// Read access to a paginated scholarly catalog.
///
/// Implementations must be read-only and idempotent: issuing the same request twice against
/// an unchanged catalog yields the same page. Callers rely on this to cache and to re-run
/// walks.
#[async_trait]
pub trait CatalogSource: Send + Sync {
  /// Fetches one page of a listing.
  ///
  /// # Errors
  ///
  /// Returns an error when the transport fails, the catalog answers with a non-success
  /// status, or the body is not a valid envelope.
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;

  /// Fetches a single entity by its identifier (short or full form).
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::NotFound`] when the catalog has no such entity, and the same
  /// transport errors as [`CatalogSource::fetch_page`].
  async fn fetch_entity(&self, entity: Entity, id: &str) -> Result<RawRecord>;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
    (**self).fetch_page(request).await
  }

  async fn fetch_entity(&self, entity: Entity, id: &str) -> Result<RawRecord> {
    (**self).fetch_entity(entity, id).await
  }
}
