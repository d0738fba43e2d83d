//! Queries over the concept taxonomy.
//!
//! Concepts form a shallow hierarchy: roots at level 0, and each deeper level refines the one
//! above it, down to level [`MAX_LEVEL`]. A level listing is an ordinary numbered-page
//! request against the concepts collection, optionally restricted to descendants of one
//! parent. These functions talk to the source directly; the facade puts the
//! [`TaxonomyCache`](crate::cache::TaxonomyCache) in front of them.

use futures::future::join_all;

use super::*;

/// Deepest level the catalog assigns to concepts.
pub const MAX_LEVEL: u32 = 4;

/// Filter expression selecting one level, optionally below `parent`.
///
/// ```
/// use harvester::taxonomy::level_filter;
///
/// assert_eq!(level_filter(0, None), "level:0");
/// assert_eq!(level_filter(2, Some("https://openalex.org/C41008148")), "level:2,ancestors.id:C41008148");
/// ```
pub fn level_filter(level: u32, parent: Option<&str>) -> String {
  match parent {
    Some(parent) => format!("level:{level},ancestors.id:{}", short_id(parent)),
    None => format!("level:{level}"),
  }
}

/// Fetches one page of concepts at `level`.
///
/// Levels beyond [`MAX_LEVEL`] are sent as asked; the catalog answers them with an empty
/// listing.
///
/// # Errors
///
/// Propagates the source failure or [`HarvesterError::Timeout`], leaving the fail-open
/// decision to the caller.
pub async fn concepts_by_level<S: CatalogSource + ?Sized>(
  source: &S,
  level: u32,
  parent: Option<&str>,
  page: u32,
  per_page: usize,
  timeout: Duration,
) -> Result<Vec<ConceptNode>> {
  if level > MAX_LEVEL {
    warn!("Concept level {level} is deeper than the catalog's {MAX_LEVEL}, requesting it anyway");
  }
  let request = PageRequest::new(Entity::Concepts)
    .with_filter(level_filter(level, parent))
    .with_per_page(per_page)
    .at_page(page.max(1));
  let page = timed(timeout, source.fetch_page(&request)).await?;
  trace!("Level {level} listing returned {} concepts", page.results.len());
  Ok(page.results.iter().map(|raw| ConceptNode::from_raw(raw).with_parent(parent)).collect())
}

/// Number of concepts at each level from 0 to [`MAX_LEVEL`], requested concurrently.
///
/// Each level costs one single-item request whose total count is read from the envelope. A
/// level whose request fails counts zero.
pub async fn concept_counts<S: CatalogSource + ?Sized>(source: &S, timeout: Duration) -> BTreeMap<u32, u64> {
  let counts = join_all((0..=MAX_LEVEL).map(|level| async move {
    let request =
      PageRequest::new(Entity::Concepts).with_filter(level_filter(level, None)).with_per_page(1);
    let count = match timed(timeout, source.fetch_page(&request)).await {
      Ok(page) => page.meta.count.unwrap_or_default(),
      Err(e) => {
        warn!("Counting level {level} concepts failed: {e}");
        0
      },
    };
    (level, count)
  }))
  .await;
  counts.into_iter().collect()
}
