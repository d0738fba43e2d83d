//! Pagination over catalog listings.
//!
//! A [`Walker`] turns a [`Query`] into a bounded list of raw records by requesting one page
//! after another until one of these holds:
//!
//! - the cap has been reached
//! - the source is exhausted (a short page, an empty page, or no continuation token)
//! - a page request fails or exceeds the per-request timeout
//! - the walk was cancelled through its [`CancellationToken`]
//!
//! The walk is fail-open. None of these outcomes is an error; the caller always receives the
//! records gathered up to that point, truncated to the cap. Failures are logged at `warn`.
//!
//! # Examples
//!
//! ```
//! use harvester::{
//!   query::{Pagination, Query},
//!   source::MemorySource,
//!   walker::Walker,
//! };
//!
//! # tokio_test::block_on(async {
//! let source = MemorySource::new();
//! let query = Query::new("concepts.id:C41008148").with_cap(10).with_pagination(Pagination::Cursor);
//!
//! let records = Walker::new(&source).fetch(&query).await;
//! assert!(records.is_empty());
//! assert_eq!(source.calls(), 1);
//! # });
//! ```

use std::{
  collections::HashSet,
  future::Future,
  sync::atomic::{AtomicBool, Ordering},
};

use super::*;

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A shared flag that asks running walks to stop.
///
/// Clones observe the same flag. Walks check it before each page request, never during one,
/// so a page already in flight is still collected.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  /// Set once cancellation has been requested
  cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
  /// A token that has not been cancelled.
  pub fn new() -> Self { Self::default() }

  /// Requests cancellation. Idempotent.
  pub fn cancel(&self) { self.cancelled.store(true, Ordering::SeqCst); }

  #[allow(missing_docs)]
  pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::SeqCst) }
}

/// Runs `call` under `timeout`, reporting an elapsed timer as [`HarvesterError::Timeout`].
pub async fn timed<T>(timeout: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
  tokio::time::timeout(timeout, call).await.map_err(|_| HarvesterError::Timeout)?
}

/// Walks a paginated listing on behalf of one query.
#[derive(Debug)]
pub struct Walker<'a, S: ?Sized> {
  /// Catalog to walk
  source:  &'a S,
  /// Upper bound on each page request
  timeout: Duration,
  /// Checked before every page request
  cancel:  CancellationToken,
}

impl<'a, S: CatalogSource + ?Sized> Walker<'a, S> {
  /// A walker over `source` with the default timeout and a token nobody else holds.
  pub fn new(source: &'a S) -> Self {
    Self { source, timeout: DEFAULT_REQUEST_TIMEOUT, cancel: CancellationToken::new() }
  }

  #[allow(missing_docs)]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Observes `cancel` between page requests.
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Collects at most `query.cap()` records.
  ///
  /// A cap of zero returns immediately without contacting the source. Walking an unchanged
  /// source twice with the same query yields the same records.
  pub async fn fetch(&self, query: &Query) -> Vec<RawRecord> {
    let cap = query.cap();
    if cap == 0 {
      trace!("Cap is zero, not contacting the catalog");
      return Vec::new();
    }

    let mut records = match query.pagination() {
      Pagination::Offset => self.walk_offset(query).await,
      Pagination::Cursor => self.walk_cursor(query).await,
    };
    records.truncate(cap);
    debug!("Walk over {} with filter {:?} gathered {} records", query.entity(), query.filter(), records.len());
    records
  }

  /// Numbered pages from 1 until a short or empty page.
  async fn walk_offset(&self, query: &Query) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut page_number = 1;
    loop {
      let Some(page) = self.next_page(query, Position::Page(page_number)).await else { break };
      let received = page.results.len();
      if received == 0 {
        break;
      }
      records.extend(page.results);
      if records.len() >= query.cap() || received < query.page_size() {
        break;
      }
      page_number += 1;
    }
    records
  }

  /// Continuation tokens from a fresh cursor until the source stops handing them out.
  async fn walk_cursor(&self, query: &Query) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = None;
    loop {
      let Some(page) = self.next_page(query, Position::Cursor(cursor.take())).await else { break };
      if page.results.is_empty() {
        break;
      }
      records.extend(page.results);
      if records.len() >= query.cap() {
        break;
      }
      match page.meta.next_token() {
        None => break,
        Some(token) if !seen.insert(token.to_owned()) => {
          warn!("Catalog repeated cursor {token}, ending walk with {} records", records.len());
          break;
        },
        Some(token) => cursor = Some(token.to_owned()),
      }
    }
    records
  }

  /// Requests one page, or `None` when the walk has to end here.
  async fn next_page(&self, query: &Query, position: Position) -> Option<Page> {
    if self.cancel.is_cancelled() {
      debug!("Walk over {} cancelled before requesting {position:?}", query.entity());
      return None;
    }

    let mut request = PageRequest::new(query.entity()).with_per_page(query.page_size());
    if !query.filter().is_empty() {
      request = request.with_filter(query.filter());
    }
    request.position = position;

    match timed(self.timeout, self.source.fetch_page(&request)).await {
      Ok(page) => {
        trace!("Received {} records at {:?}", page.results.len(), request.position);
        Some(page)
      },
      Err(e) => {
        warn!("Page request at {:?} failed, keeping what was gathered: {e}", request.position);
        None
      },
    }
  }
}
