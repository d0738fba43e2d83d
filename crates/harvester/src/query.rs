//! Immutable descriptions of a paginated walk.
//!
//! A [`Query`] names what to list (an [`Entity`] and a filter expression), how to page
//! through it ([`Pagination`]) and how much of it the caller wants (the cap). Builder
//! methods consume the query and hand back a new one, so a query that has been handed to a
//! [`Walker`](crate::walker::Walker) can no longer change underneath it.
//!
//! ```
//! use harvester::query::{Pagination, Query};
//!
//! let query = Query::new("institutions.country_code:US").with_cap(50);
//! assert_eq!(query.page_size(), 200);
//! assert_eq!(query.pagination(), Pagination::Offset);
//!
//! // Page sizes are clamped into what the catalog accepts.
//! assert_eq!(query.clone().with_page_size(10_000).page_size(), 200);
//! assert_eq!(query.with_page_size(0).page_size(), 1);
//! ```

use super::*;

/// Largest page the catalog will serve in one response.
pub const MAX_PAGE_SIZE: usize = 200;

/// Catalog collections that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
  /// Scholarly works (publications)
  Works,
  /// Research institutions
  Institutions,
  /// Concepts, the field-of-study taxonomy
  Concepts,
}

impl Entity {
  /// Path segment of this collection below the catalog base URL.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Works => "works",
      Self::Institutions => "institutions",
      Self::Concepts => "concepts",
    }
  }
}

impl Display for Entity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// How successive batches of a listing are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pagination {
  /// Numbered pages starting at 1
  #[default]
  Offset,
  /// Opaque continuation tokens handed back by the source
  Cursor,
}

/// A single paginated listing, bounded by a cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  /// Collection to list
  entity:     Entity,
  /// Catalog filter expression, e.g. `concepts.id:C41008148`
  filter:     String,
  /// Items requested per page, within `1..=MAX_PAGE_SIZE`
  page_size:  usize,
  /// Upper bound on the number of items a walk returns
  cap:        usize,
  /// Paging style
  pagination: Pagination,
}

impl Query {
  /// Creates an offset-paged works query with the maximum page size and a cap of zero.
  pub fn new(filter: impl Into<String>) -> Self {
    Self {
      entity:     Entity::Works,
      filter:     filter.into(),
      page_size:  MAX_PAGE_SIZE,
      cap:        0,
      pagination: Pagination::Offset,
    }
  }

  /// Lists `entity` instead of works.
  pub fn with_entity(mut self, entity: Entity) -> Self {
    self.entity = entity;
    self
  }

  /// Sets the page size, clamped into `1..=MAX_PAGE_SIZE`.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    self
  }

  /// Sets the maximum number of items a walk may return.
  pub fn with_cap(mut self, cap: usize) -> Self {
    self.cap = cap;
    self
  }

  /// Switches paging style.
  pub fn with_pagination(mut self, pagination: Pagination) -> Self {
    self.pagination = pagination;
    self
  }

  #[allow(missing_docs)]
  pub fn entity(&self) -> Entity { self.entity }

  #[allow(missing_docs)]
  pub fn filter(&self) -> &str { &self.filter }

  #[allow(missing_docs)]
  pub fn page_size(&self) -> usize { self.page_size }

  #[allow(missing_docs)]
  pub fn cap(&self) -> usize { self.cap }

  #[allow(missing_docs)]
  pub fn pagination(&self) -> Pagination { self.pagination }
}
