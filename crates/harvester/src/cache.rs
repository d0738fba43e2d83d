//! Time-bounded cache for taxonomy listings.
//!
//! Concept levels change rarely and are requested constantly (every picker render walks them),
//! so listings are kept for a fixed time-to-live. Entries are keyed by the whole query shape,
//! `(level, parent, page)`, and are immutable: a refetch replaces the entry wholesale.
//!
//! The cache never holds its lock across a fetch. Two callers missing on the same key at the
//! same moment will both fetch, which is harmless because catalog reads are idempotent.
//!
//! Time comes from a [`Clock`], so tests can drive expiry with a [`ManualClock`] instead of
//! sleeping.
//!
//! # Examples
//!
//! ```
//! use std::{sync::Arc, time::Duration};
//!
//! use harvester::{cache::{ManualClock, TaxonomyCache}, record::ConceptNode};
//!
//! # tokio_test::block_on(async {
//! let clock = Arc::new(ManualClock::default());
//! let cache = TaxonomyCache::new(Duration::from_secs(300)).with_clock(clock.clone());
//!
//! let fetched = cache.get_or_fetch(0, None, 1, || async { Ok(Vec::<ConceptNode>::new()) }).await;
//! assert!(fetched.is_empty());
//! assert_eq!(cache.len(), 1);
//!
//! clock.advance(Duration::from_secs(301));
//! cache.purge_expired();
//! assert!(cache.is_empty());
//! # });
//! ```

use std::{future::Future, sync::PoisonError};

use super::*;

/// Source of the current time for cache expiry.
pub trait Clock: Send + Sync + std::fmt::Debug {
  /// The current instant.
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  /// Current reading
  now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
  fn default() -> Self { Self::new(DateTime::<Utc>::UNIX_EPOCH) }
}

impl ManualClock {
  /// A clock stopped at `start`.
  pub fn new(start: DateTime<Utc>) -> Self { Self { now: Mutex::new(start) } }

  /// Moves the clock forward.
  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now += to_delta(by);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> { *self.now.lock().unwrap_or_else(PoisonError::into_inner) }
}

/// The full shape of a taxonomy listing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  /// Taxonomy level
  pub level:  u32,
  /// Short identifier of the ancestor filter, if any
  pub parent: Option<String>,
  /// Page number, starting at 1
  pub page:   u32,
}

impl CacheKey {
  /// Builds a key, normalizing the parent to its short identifier.
  pub fn new(level: u32, parent: Option<&str>, page: u32) -> Self {
    Self { level, parent: parent.map(|parent| short_id(parent).to_owned()), page }
  }
}

/// A cached listing.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  /// The listing, shared with every caller that hit it
  pub concepts:    Arc<[ConceptNode]>,
  /// When the listing was stored
  pub inserted_at: DateTime<Utc>,
}

/// Memoizes taxonomy listings for a fixed time-to-live.
#[derive(Debug)]
pub struct TaxonomyCache {
  /// How long entries stay fresh
  ttl:     TimeDelta,
  /// Time source for insertion stamps and expiry
  clock:   Arc<dyn Clock>,
  /// Stored listings
  entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl TaxonomyCache {
  /// An empty cache on the system clock.
  pub fn new(ttl: Duration) -> Self {
    Self { ttl: to_delta(ttl), clock: Arc::new(SystemClock), entries: Mutex::new(HashMap::new()) }
  }

  /// Replaces the time source.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Returns the listing for `(level, parent, page)`, fetching it on a miss or after expiry.
  ///
  /// A failed fetch is logged and answered with an empty listing. Failures are not stored,
  /// so the next call tries the catalog again.
  pub async fn get_or_fetch<F, Fut>(
    &self,
    level: u32,
    parent: Option<&str>,
    page: u32,
    fetch: F,
  ) -> Arc<[ConceptNode]>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<ConceptNode>>>,
  {
    let key = CacheKey::new(level, parent, page);
    if let Some(concepts) = self.get(&key) {
      trace!("Taxonomy cache hit for {key:?}");
      return concepts;
    }

    trace!("Taxonomy cache miss for {key:?}");
    match fetch().await {
      Ok(concepts) => {
        let concepts: Arc<[ConceptNode]> = concepts.into();
        let entry = CacheEntry { concepts: Arc::clone(&concepts), inserted_at: self.clock.now() };
        self.lock().insert(key, entry);
        concepts
      },
      Err(e) => {
        warn!("Taxonomy fetch for {key:?} failed, serving an empty listing: {e}");
        Arc::from(Vec::new())
      },
    }
  }

  /// The fresh entry for `key`, if there is one.
  pub fn get(&self, key: &CacheKey) -> Option<Arc<[ConceptNode]>> {
    let now = self.clock.now();
    self
      .lock()
      .get(key)
      .filter(|entry| self.is_fresh(entry, now))
      .map(|entry| Arc::clone(&entry.concepts))
  }

  /// Drops every expired entry.
  pub fn purge_expired(&self) {
    let now = self.clock.now();
    self.lock().retain(|_, entry| self.is_fresh(entry, now));
  }

  /// Drops every entry.
  pub fn clear(&self) { self.lock().clear(); }

  /// Number of stored entries, fresh or not.
  pub fn len(&self) -> usize { self.lock().len() }

  #[allow(missing_docs)]
  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  #[allow(missing_docs)]
  pub fn ttl(&self) -> Duration { self.ttl.to_std().unwrap_or_default() }

  /// Whether `entry` is still within the time-to-live at `now`.
  fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(entry.inserted_at) < self.ttl
  }

  /// Locks the entry map, recovering from a poisoned lock since entries are never half
  /// written.
  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Converts a std duration, saturating at the largest representable delta.
fn to_delta(duration: Duration) -> TimeDelta { TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX) }
