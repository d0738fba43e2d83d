//! An in-memory catalog.
//!
//! [`MemorySource`] serves a fixed set of records per [`Entity`] with the same request shape
//! as the HTTP catalog, so walks, caches and the facade can be exercised offline. It also
//! records every request it answers and can be told to fail or stall, which is how the
//! fail-open paths are tested.
//!
//! Filters are a comma separated conjunction of `path:value` clauses. Paths are dotted and
//! resolved literally against the stored records, descending into arrays along the way, so
//! `ancestors.id:C1` matches a concept with any ancestor whose `id` is `C1`. Identifiers are
//! compared in their short form and without regard to ASCII case. A path ending in `.search`
//! matches when the field contains the value, ignoring case.
//!
//! # Examples
//!
//! ```
//! use harvester::{
//!   query::Entity,
//!   source::{CatalogSource, MemorySource, PageRequest},
//! };
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let source = MemorySource::new().with_records(Entity::Institutions, vec![
//!   serde_json::from_value(json!({"id": "https://openalex.org/I1", "country_code": "FR"})).unwrap(),
//!   serde_json::from_value(json!({"id": "https://openalex.org/I2", "country_code": "US"})).unwrap(),
//! ]);
//!
//! let page = source
//!   .fetch_page(&PageRequest::new(Entity::Institutions).with_filter("country_code:us"))
//!   .await
//!   .unwrap();
//! assert_eq!(page.results.len(), 1);
//! assert_eq!(source.calls(), 1);
//! # });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

/// Page size used when a request does not name one.
pub const DEFAULT_PER_PAGE: usize = 25;

/// An in-memory [`CatalogSource`] that counts and records its calls.
#[derive(Debug, Default)]
pub struct MemorySource {
  /// Records per collection, in listing order
  collections:    HashMap<Entity, Vec<RawRecord>>,
  /// Calls numbered from this one on fail
  fail_from_call: Option<usize>,
  /// Artificial latency applied to every call
  delay:          Option<Duration>,
  /// Number of calls answered so far
  calls:          AtomicUsize,
  /// Listing requests in the order they arrived
  requests:       Mutex<Vec<PageRequest>>,
}

impl MemorySource {
  /// An empty catalog.
  pub fn new() -> Self { Self::default() }

  /// Adds `records` to the end of the `entity` collection.
  pub fn with_records(mut self, entity: Entity, records: Vec<RawRecord>) -> Self {
    self.collections.entry(entity).or_default().extend(records);
    self
  }

  /// Makes call number `call` (counting from 1) and every later call fail.
  pub fn fail_from_call(mut self, call: usize) -> Self {
    self.fail_from_call = Some(call);
    self
  }

  /// Delays every answer by `delay`.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  /// Calls answered so far, listings and lookups alike.
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  /// Listing requests received so far.
  pub fn requests(&self) -> Vec<PageRequest> {
    self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
  }

  /// Counts the call, waits out the delay, and fails it if asked to.
  async fn answer(&self) -> Result<()> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    match self.fail_from_call {
      Some(first) if call >= first => Err(HarvesterError::ApiError(format!("call {call} refused"))),
      _ => Ok(()),
    }
  }

  /// Records of `entity` that satisfy `filter`.
  fn matching(&self, entity: Entity, filter: Option<&str>) -> Vec<&RawRecord> {
    let clauses = filter.map(parse_filter).unwrap_or_default();
    self
      .collections
      .get(&entity)
      .map(|records| {
        records.iter().filter(|record| clauses.iter().all(|clause| clause.matches(record))).collect()
      })
      .unwrap_or_default()
  }
}

#[async_trait]
impl CatalogSource for MemorySource {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
    if let Ok(mut requests) = self.requests.lock() {
      requests.push(request.clone());
    }
    self.answer().await?;

    let matching = self.matching(request.entity, request.filter.as_deref());
    let count = Some(matching.len() as u64);

    if let Some(field) = &request.group_by {
      let group_by = group(&matching, field);
      let meta = PageMeta { count: Some(group_by.len() as u64), ..Default::default() };
      return Ok(Page { results: Vec::new(), meta, group_by });
    }

    let per_page = request.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let start = match &request.position {
      Position::First | Position::Cursor(None) => 0,
      Position::Page(page) => (*page as usize).saturating_sub(1).saturating_mul(per_page),
      Position::Cursor(Some(token)) => token
        .parse::<usize>()
        .map_err(|_| HarvesterError::ApiError(format!("unknown cursor {token}")))?,
    };
    let results: Vec<RawRecord> =
      matching.iter().skip(start).take(per_page).map(|&record| record.clone()).collect();
    let end = start + results.len();

    let next_cursor = match request.position {
      Position::Cursor(_) if end < matching.len() => Some(end.to_string()),
      _ => None,
    };
    trace!("Memory source serving {} of {} {}", results.len(), matching.len(), request.entity);
    Ok(Page { results, meta: PageMeta { count, next_cursor, next_page: None }, group_by: Vec::new() })
  }

  async fn fetch_entity(&self, entity: Entity, id: &str) -> Result<RawRecord> {
    self.answer().await?;
    let wanted = short_id(id);
    self
      .collections
      .get(&entity)
      .into_iter()
      .flatten()
      .find(|record| {
        record
          .get("id")
          .and_then(Value::as_str)
          .is_some_and(|candidate| short_id(candidate).eq_ignore_ascii_case(wanted))
      })
      .cloned()
      .ok_or_else(|| HarvesterError::NotFound(id.to_owned()))
  }
}

/// One `path:value` condition of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
  /// Dotted path into the record
  path:   Vec<String>,
  /// Value to compare against
  value:  String,
  /// Substring rather than identity comparison
  search: bool,
}

impl Clause {
  /// Whether any value found at the path satisfies the clause.
  fn matches(&self, record: &RawRecord) -> bool {
    let Some((first, rest)) = self.path.split_first() else { return false };
    let mut leaves = Vec::new();
    if let Some(value) = record.get(first) {
      collect_leaves(value, rest, &mut leaves);
    }
    leaves.into_iter().filter_map(leaf_text).any(|leaf| {
      if self.search {
        leaf.to_lowercase().contains(&self.value.to_lowercase())
      } else {
        short_id(&leaf).eq_ignore_ascii_case(short_id(&self.value))
      }
    })
  }
}

/// Splits a filter expression into clauses, skipping any without a `:`.
fn parse_filter(filter: &str) -> Vec<Clause> {
  filter
    .split(',')
    .filter_map(|clause| clause.split_once(':'))
    .map(|(path, value)| {
      let (path, search) = match path.strip_suffix(".search") {
        Some(path) => (path, true),
        None => (path, false),
      };
      Clause { path: path.split('.').map(str::to_owned).collect(), value: value.to_owned(), search }
    })
    .collect()
}

/// Gathers every value reachable through `path`, flattening arrays on the way.
fn collect_leaves<'a>(value: &'a Value, path: &[String], leaves: &mut Vec<&'a Value>) {
  match value {
    Value::Array(items) => items.iter().for_each(|item| collect_leaves(item, path, leaves)),
    _ => match path.split_first() {
      None => leaves.push(value),
      Some((next, rest)) => {
        if let Some(child) = value.get(next) {
          collect_leaves(child, rest, leaves);
        }
      },
    },
  }
}

/// Comparable text for a scalar leaf.
fn leaf_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Buckets `records` by the value at `field`, largest bucket first.
fn group(records: &[&RawRecord], field: &str) -> Vec<RawRecord> {
  let path: Vec<String> = field.split('.').map(str::to_owned).collect();
  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  for record in records {
    let Some((first, rest)) = path.split_first() else { continue };
    let mut leaves = Vec::new();
    if let Some(value) = record.get(first) {
      collect_leaves(value, rest, &mut leaves);
    }
    if let Some(key) = leaves.into_iter().find_map(leaf_text) {
      *counts.entry(key).or_default() += 1;
    }
  }

  let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
  buckets.sort_by(|(a_key, a_count), (b_key, b_count)| b_count.cmp(a_count).then(a_key.cmp(b_key)));
  buckets
    .into_iter()
    .map(|(key, count)| {
      RawRecord::from([
        ("key".to_owned(), Value::from(key.clone())),
        ("key_display_name".to_owned(), Value::from(key)),
        ("count".to_owned(), Value::from(count)),
      ])
    })
    .collect()
}
