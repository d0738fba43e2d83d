//! The aggregation facade.
//!
//! [`Harvester`] is the entry point for callers. It ties a [`CatalogSource`] to a
//! [`Config`] and a shared [`TaxonomyCache`], and answers three kinds of question:
//!
//! - Publication harvests ([`Harvester::by_institution`], [`Harvester::by_country`],
//!   [`Harvester::by_field`]): walk the works listing under a filter, normalize every record
//!   and project it onto the requested columns.
//! - Listings for pickers and detail views ([`Harvester::countries`],
//!   [`Harvester::institutions_in_country`], [`Harvester::institution`],
//!   [`Harvester::recent_publications`]).
//! - Taxonomy queries ([`Harvester::concepts`], [`Harvester::root_concepts`],
//!   [`Harvester::concept_counts`]), served through the cache.
//!
//! Column names are checked before the catalog is contacted, and institution names must
//! resolve to an identifier; those are the only errors a harvest returns. Everything after
//! that is fail-open, so a harvest may come back with fewer rows than its cap.
//!
//! # Examples
//!
//! ```
//! use harvester::{config::Config, query::Entity, source::MemorySource, Harvester};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let work = serde_json::from_value(json!({
//!   "display_name": "On Computable Numbers",
//!   "concepts": [{"id": "https://openalex.org/C41008148"}]
//! }))
//! .unwrap();
//! let source = MemorySource::new().with_records(Entity::Works, vec![work]);
//! let harvester = Harvester::new(source, Config::default());
//!
//! let harvest = harvester.by_field("C41008148", 10, &["Title", "DOI"]).await.unwrap();
//! assert_eq!(harvest.retrieved, 1);
//! assert_eq!(harvest.rows[0].values().map(ToString::to_string).collect::<Vec<_>>(), vec![
//!   "On Computable Numbers",
//!   "N/A"
//! ]);
//! # });
//! ```

use super::*;
use crate::taxonomy::{concept_counts, concepts_by_level};

lazy_static! {
  /// An institution identifier, bare or namespaced.
  static ref INSTITUTION_ID: Regex = Regex::new(r"^(?:https?://openalex\.org/)?(I\d+)$").unwrap();
}

/// Rows gathered by a harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Harvest {
  /// Projected rows in catalog order
  pub rows:      Vec<Row>,
  /// Number of rows, which may be below the requested cap
  pub retrieved: usize,
}

impl Harvest {
  /// Wraps rows, counting them.
  pub fn new(rows: Vec<Row>) -> Self { Self { retrieved: rows.len(), rows } }
}

/// Bulk retrieval over a scholarly catalog.
///
/// Cheap to share behind an [`Arc`]: every method takes `&self`, and the only mutable state
/// is the taxonomy cache, which synchronizes itself.
#[derive(Debug)]
pub struct Harvester<S> {
  /// Where records come from
  source: S,
  /// Page sizes, timeout and listing bounds
  config: Config,
  /// Taxonomy listings, possibly shared with other harvesters
  cache:  Arc<TaxonomyCache>,
}

impl Harvester<OpenAlex> {
  /// A harvester over the OpenAlex HTTP API described by `config`.
  ///
  /// # Errors
  ///
  /// Fails when the configured base URL is unusable or the HTTP client cannot be built.
  pub fn openalex(config: Config) -> Result<Self> {
    let source = OpenAlex::new(&config)?;
    Ok(Self::new(source, config))
  }
}

impl<S: CatalogSource> Harvester<S> {
  /// A harvester with its own taxonomy cache, sized by `config`.
  pub fn new(source: S, config: Config) -> Self {
    let cache = Arc::new(TaxonomyCache::new(config.cache_ttl()));
    Self { source, config, cache }
  }

  /// Uses `cache` for taxonomy listings instead of a private one.
  pub fn with_cache(mut self, cache: Arc<TaxonomyCache>) -> Self {
    self.cache = cache;
    self
  }

  #[allow(missing_docs)]
  pub fn source(&self) -> &S { &self.source }

  #[allow(missing_docs)]
  pub fn config(&self) -> &Config { &self.config }

  #[allow(missing_docs)]
  pub fn cache(&self) -> &Arc<TaxonomyCache> { &self.cache }

  /// Publications affiliated with an institution, given by identifier or by name.
  ///
  /// An identifier such as `I136199984` (optionally prefixed with `https://openalex.org/`) is
  /// used as is. Anything else is searched for by display name and the first match is used.
  ///
  /// # Errors
  ///
  /// - [`HarvesterError::InvalidColumn`] for an unknown column, before any request
  /// - [`HarvesterError::NotFound`] when the name matches nothing or the search fails
  pub async fn by_institution<N: AsRef<str>>(
    &self,
    name_or_id: &str,
    cap: usize,
    columns: &[N],
  ) -> Result<Harvest> {
    self.by_institution_with_cancel(name_or_id, cap, columns, CancellationToken::new()).await
  }

  /// [`Harvester::by_institution`], stopping early once `cancel` fires.
  pub async fn by_institution_with_cancel<N: AsRef<str>>(
    &self,
    name_or_id: &str,
    cap: usize,
    columns: &[N],
    cancel: CancellationToken,
  ) -> Result<Harvest> {
    let columns = Column::parse_all(columns)?;
    let id = self.resolve_institution(name_or_id).await?;
    Ok(self.harvest(format!("institutions.id:{id}"), cap, &columns, cancel).await)
  }

  /// Publications from institutions in a country, by two letter country code.
  ///
  /// # Errors
  ///
  /// [`HarvesterError::InvalidColumn`] for an unknown column, before any request.
  pub async fn by_country<N: AsRef<str>>(&self, code: &str, cap: usize, columns: &[N]) -> Result<Harvest> {
    self.by_country_with_cancel(code, cap, columns, CancellationToken::new()).await
  }

  /// [`Harvester::by_country`], stopping early once `cancel` fires.
  pub async fn by_country_with_cancel<N: AsRef<str>>(
    &self,
    code: &str,
    cap: usize,
    columns: &[N],
    cancel: CancellationToken,
  ) -> Result<Harvest> {
    let columns = Column::parse_all(columns)?;
    Ok(self.harvest(format!("institutions.country_code:{}", code.trim()), cap, &columns, cancel).await)
  }

  /// Publications tagged with a concept.
  ///
  /// # Errors
  ///
  /// [`HarvesterError::InvalidColumn`] for an unknown column, before any request.
  pub async fn by_field<N: AsRef<str>>(&self, concept_id: &str, cap: usize, columns: &[N]) -> Result<Harvest> {
    self.by_field_with_cancel(concept_id, cap, columns, CancellationToken::new()).await
  }

  /// [`Harvester::by_field`], stopping early once `cancel` fires.
  pub async fn by_field_with_cancel<N: AsRef<str>>(
    &self,
    concept_id: &str,
    cap: usize,
    columns: &[N],
    cancel: CancellationToken,
  ) -> Result<Harvest> {
    let columns = Column::parse_all(columns)?;
    let filter = format!("concepts.id:{}", short_id(concept_id.trim()));
    Ok(self.harvest(filter, cap, &columns, cancel).await)
  }

  /// Turns an institution name or identifier into a short identifier.
  ///
  /// # Errors
  ///
  /// [`HarvesterError::NotFound`] for a blank name, or when a name search matches nothing, fails,
  /// or times out.
  pub async fn resolve_institution(&self, name_or_id: &str) -> Result<String> {
    let name_or_id = name_or_id.trim();
    if name_or_id.is_empty() {
      return Err(HarvesterError::NotFound(name_or_id.to_owned()));
    }
    if let Some(id) = INSTITUTION_ID.captures(name_or_id).and_then(|captures| captures.get(1)) {
      return Ok(id.as_str().to_owned());
    }

    // Commas separate filter clauses, so they cannot appear in a search term.
    let term = name_or_id.replace(',', " ");
    let request = PageRequest::new(Entity::Institutions)
      .with_filter(format!("display_name.search:{term}"))
      .with_per_page(1);
    let page = timed(self.config.request_timeout(), self.source.fetch_page(&request)).await.map_err(|e| {
      warn!("Searching for institution {name_or_id:?} failed: {e}");
      HarvesterError::NotFound(name_or_id.to_owned())
    })?;

    let id = page
      .results
      .first()
      .and_then(|raw| raw.get("id"))
      .and_then(Value::as_str)
      .map(|id| short_id(id).to_owned())
      .ok_or_else(|| HarvesterError::NotFound(name_or_id.to_owned()))?;
    debug!("Resolved institution {name_or_id:?} to {id}");
    Ok(id)
  }

  /// Number of institutions per country, largest first. Empty when the catalog fails.
  pub async fn countries(&self) -> Vec<CountrySummary> {
    let request =
      PageRequest::new(Entity::Institutions).grouped_by("country_code").with_per_page(MAX_PAGE_SIZE);
    match timed(self.config.request_timeout(), self.source.fetch_page(&request)).await {
      Ok(page) => page.group_by.iter().map(CountrySummary::from_raw).collect(),
      Err(e) => {
        warn!("Grouping institutions by country failed: {e}");
        Vec::new()
      },
    }
  }

  /// Every institution in a country, bounded only by the configured listing cap.
  pub async fn institutions_in_country(&self, code: &str) -> Vec<InstitutionSummary> {
    self.institutions_in_country_with_cancel(code, CancellationToken::new()).await
  }

  /// [`Harvester::institutions_in_country`], stopping early once `cancel` fires.
  pub async fn institutions_in_country_with_cancel(
    &self,
    code: &str,
    cancel: CancellationToken,
  ) -> Vec<InstitutionSummary> {
    let query = Query::new(format!("country_code:{}", code.trim()))
      .with_entity(Entity::Institutions)
      .with_pagination(Pagination::Cursor)
      .with_page_size(self.config.page_size)
      .with_cap(self.config.listing_cap.unwrap_or(usize::MAX));
    let records = self.walker(cancel).fetch(&query).await;
    records.iter().map(InstitutionSummary::from_raw).collect()
  }

  /// Headline numbers for one institution.
  ///
  /// # Errors
  ///
  /// [`HarvesterError::NotFound`] when the lookup fails for any reason.
  pub async fn institution(&self, id: &str) -> Result<InstitutionSummary> {
    match timed(self.config.request_timeout(), self.source.fetch_entity(Entity::Institutions, id)).await {
      Ok(raw) => Ok(InstitutionSummary::from_raw(&raw)),
      Err(e) => {
        debug!("Institution lookup for {id} failed: {e}");
        Err(HarvesterError::NotFound(id.to_owned()))
      },
    }
  }

  /// Up to `cap` fully normalized publications of an institution, in catalog order.
  pub async fn recent_publications(&self, institution_id: &str, cap: usize) -> Vec<Publication> {
    self.recent_publications_with_cancel(institution_id, cap, CancellationToken::new()).await
  }

  /// [`Harvester::recent_publications`], stopping early once `cancel` fires.
  pub async fn recent_publications_with_cancel(
    &self,
    institution_id: &str,
    cap: usize,
    cancel: CancellationToken,
  ) -> Vec<Publication> {
    let query = Query::new(format!("institutions.id:{}", short_id(institution_id.trim())))
      .with_page_size(self.config.page_size)
      .with_cap(cap);
    self.walker(cancel).fetch(&query).await.iter().map(Publication::from_raw).collect()
  }

  /// One page of concepts at `level`, optionally below `parent`, served from the cache.
  ///
  /// Pages count from 1, and page 0 is read as page 1. A failed fetch yields an empty listing
  /// that is not cached.
  pub async fn concepts(&self, level: u32, parent: Option<&str>, page: u32) -> Arc<[ConceptNode]> {
    let page = page.max(1);
    let per_page = self.config.taxonomy_page_size;
    let timeout = self.config.request_timeout();
    self
      .cache
      .get_or_fetch(level, parent, page, || {
        concepts_by_level(&self.source, level, parent, page, per_page, timeout)
      })
      .await
  }

  /// The first page of level 0 concepts.
  pub async fn root_concepts(&self) -> Arc<[ConceptNode]> { self.concepts(0, None, 1).await }

  /// Number of concepts at each taxonomy level. Uncached.
  pub async fn concept_counts(&self) -> BTreeMap<u32, u64> {
    concept_counts(&self.source, self.config.request_timeout()).await
  }

  /// A walker over this harvester's source with the configured timeout.
  fn walker(&self, cancel: CancellationToken) -> Walker<'_, S> {
    Walker::new(&self.source).with_timeout(self.config.request_timeout()).with_cancellation(cancel)
  }

  /// Walks works under `filter` and projects each onto `columns`.
  async fn harvest(&self, filter: String, cap: usize, columns: &[Column], cancel: CancellationToken) -> Harvest {
    let query = Query::new(filter).with_page_size(self.config.page_size).with_cap(cap);
    let records = self.walker(cancel).fetch(&query).await;
    Harvest::new(records.iter().map(|raw| Row::select(&Publication::from_raw(raw), columns)).collect())
  }
}
