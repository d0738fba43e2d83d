//! HTTP implementation of [`CatalogSource`] for the OpenAlex REST API.
//!
//! Listings are `GET {base_url}/{entity}` with the paging and filter parameters encoded as a
//! query string, and single entities are `GET {base_url}/{entity}/{id}`. Any non-success
//! status is reported as [`HarvesterError::ApiError`]; there is no retry here.

use reqwest::Url;

use super::*;

/// Cursor value that asks OpenAlex to open a new cursor.
const CURSOR_START: &str = "*";

/// Client for the OpenAlex catalog.
///
/// # Examples
///
/// ```no_run
/// use harvester::{
///   config::Config,
///   query::Entity,
///   source::{CatalogSource, OpenAlex, PageRequest},
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let openalex = OpenAlex::new(&Config::default())?;
/// let page = openalex
///   .fetch_page(&PageRequest::new(Entity::Concepts).with_filter("level:0").with_per_page(5))
///   .await?;
/// println!("{} level 0 concepts", page.meta.count.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenAlex {
  /// Shared connection pool
  client:   reqwest::Client,
  /// Root of the API, e.g. `https://api.openalex.org`
  base_url: Url,
  /// Contact address for the catalog's polite pool
  mailto:   Option<String>,
}

impl OpenAlex {
  /// Builds a client from the base URL, contact address and timeout in `config`.
  ///
  /// # Errors
  ///
  /// Fails when the base URL does not parse or cannot carry path segments, or when the
  /// underlying HTTP client cannot be constructed.
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)?;
    if base_url.cannot_be_a_base() {
      return Err(HarvesterError::Config(format!(
        "Base URL {} cannot be used as an API root",
        config.base_url
      )));
    }
    let client = reqwest::Client::builder()
      .timeout(config.request_timeout())
      .user_agent(concat!("harvester/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, base_url, mailto: config.mailto.clone() })
  }

  /// Assembles the URL for a listing request.
  pub fn listing_url(&self, request: &PageRequest) -> Result<Url> {
    let mut url = self.collection_url(request.entity, None)?;
    {
      let mut pairs = url.query_pairs_mut();
      if let Some(filter) = &request.filter {
        pairs.append_pair("filter", filter);
      }
      if let Some(group_by) = &request.group_by {
        pairs.append_pair("group_by", group_by);
      }
      if let Some(per_page) = request.per_page {
        pairs.append_pair("per-page", &per_page.to_string());
      }
      match &request.position {
        Position::First => {},
        Position::Page(page) => {
          pairs.append_pair("page", &page.to_string());
        },
        Position::Cursor(cursor) => {
          pairs.append_pair("cursor", cursor.as_deref().unwrap_or(CURSOR_START));
        },
      }
      if let Some(mailto) = &self.mailto {
        pairs.append_pair("mailto", mailto);
      }
    }
    if url.query() == Some("") {
      url.set_query(None);
    }
    Ok(url)
  }

  /// `{base_url}/{entity}` or `{base_url}/{entity}/{id}`.
  fn collection_url(&self, entity: Entity, id: Option<&str>) -> Result<Url> {
    let mut url = self.base_url.clone();
    {
      let mut segments = url.path_segments_mut().map_err(|_| {
        HarvesterError::Config(format!("Base URL {} cannot carry a path", self.base_url))
      })?;
      segments.pop_if_empty().push(entity.as_str());
      if let Some(id) = id {
        segments.push(id);
      }
    }
    Ok(url)
  }

  /// Issues a GET and returns the body of a successful response.
  async fn get(&self, url: Url) -> Result<Vec<u8>> {
    debug!("Fetching from catalog via: {}", url);
    let response = self.client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
      trace!("Catalog response for {url}: {response:?}");
      return Err(HarvesterError::ApiError(format!("{url} returned {status}")));
    }
    let data = response.bytes().await?;
    trace!("Catalog response: {}", String::from_utf8_lossy(&data));
    Ok(data.to_vec())
  }
}

#[async_trait]
impl CatalogSource for OpenAlex {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
    let data = self.get(self.listing_url(request)?).await?;
    let page: Page = serde_json::from_slice(&data)?;
    trace!("Decoded page with {} results", page.results.len());
    Ok(page)
  }

  async fn fetch_entity(&self, entity: Entity, id: &str) -> Result<RawRecord> {
    let short = short_id(id);
    let url = self.collection_url(entity, Some(short))?;
    match self.get(url).await {
      Ok(data) => Ok(serde_json::from_slice(&data)?),
      Err(HarvesterError::ApiError(reason)) => {
        debug!("Lookup of {entity} {short} failed: {reason}");
        Err(HarvesterError::NotFound(id.to_owned()))
      },
      Err(e) => Err(e),
    }
  }
}
