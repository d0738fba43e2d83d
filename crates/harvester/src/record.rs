//! Normalization of raw catalog records.
//!
//! The catalog's records are loosely shaped: fields come and go between entity versions,
//! nested objects are sometimes missing entirely, and `null` shows up wherever a value is
//! unknown. Raw records therefore stay as an untyped [`RawRecord`] map, and everything past
//! this module works with fixed types instead:
//!
//! - [`Publication`]: the nineteen exportable attributes of a work
//! - [`ConceptNode`]: one node of the field-of-study taxonomy
//! - [`InstitutionSummary`]: headline numbers for an institution
//! - [`CountrySummary`]: institution counts grouped by country
//!
//! Every conversion is total. Each attribute is read on its own, so a missing or oddly typed
//! path only ever defaults that one attribute: text falls back to [`NOT_AVAILABLE`], counts to
//! zero and flags to `None`.
//!
//! # Examples
//!
//! ```
//! use harvester::record::{Publication, RawRecord};
//!
//! let raw: RawRecord = serde_json::from_str(
//!   r#"{
//!     "display_name": "Attention Is All You Need",
//!     "cited_by_count": 100000,
//!     "authorships": [
//!       {"author": {"display_name": "Ashish Vaswani"}},
//!       {"author": {}}
//!     ],
//!     "biblio": null
//!   }"#,
//! )
//! .unwrap();
//!
//! let publication = Publication::from_raw(&raw);
//! assert_eq!(publication.title, "Attention Is All You Need");
//! assert_eq!(publication.authors, "Ashish Vaswani, N/A");
//! assert_eq!(publication.pages, "N/A");
//! assert_eq!(publication.open_access, None);
//! ```

use super::*;

/// An untyped record exactly as the catalog returned it.
pub type RawRecord = BTreeMap<String, Value>;

/// Placeholder for text attributes the catalog did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Strips the catalog namespace from an identifier, leaving e.g. `C41008148`.
///
/// ```
/// use harvester::record::short_id;
///
/// assert_eq!(short_id("https://openalex.org/C41008148"), "C41008148");
/// assert_eq!(short_id("C41008148"), "C41008148");
/// ```
pub fn short_id(id: &str) -> &str { id.trim_end_matches('/').rsplit('/').next().unwrap_or(id) }

/// A work, reduced to the fixed set of exportable attributes.
///
/// Field order follows [`Column::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
  /// Display title
  pub title:            String,
  /// DOI, as a resolver URL when the catalog has one
  pub doi:              String,
  /// Publication date, `YYYY-MM-DD`
  pub publication_date: String,
  /// Number of works citing this one
  pub cited_by_count:   u64,
  /// Author display names in authorship order, joined with `", "`
  pub authors:          String,
  /// Abstract text
  pub abstract_text:    String,
  /// Journal, repository or conference name
  pub venue:            String,
  /// Work type, e.g. `article`
  pub work_type:        String,
  /// Whether the work is open access
  pub open_access:      Option<bool>,
  /// Volume within the venue
  pub volume:           String,
  /// Issue within the volume
  pub issue:            String,
  /// Page range
  pub pages:            String,
  /// Publisher of the venue
  pub publisher:        String,
  /// Language code
  pub language:         String,
  /// Number of works this one cites
  pub references_count: u64,
  /// Whether the work has been retracted
  pub is_retracted:     Option<bool>,
  /// Whether the work is paratext (front matter, table of contents, ...)
  pub is_paratext:      Option<bool>,
  /// Landing page of the work at its venue
  pub source_url:       String,
  /// License the work is published under
  pub license:          String,
}

impl Default for Publication {
  fn default() -> Self { Self::from_raw(&RawRecord::new()) }
}

impl Publication {
  /// Normalizes a raw work record. Never fails.
  pub fn from_raw(raw: &RawRecord) -> Self {
    Self {
      title:            first_text(raw, &[&["display_name"], &["title"]]),
      doi:              text(raw, &["doi"]),
      publication_date: text(raw, &["publication_date"]),
      cited_by_count:   count(raw, &["cited_by_count"]),
      authors:          authors(raw),
      abstract_text:    abstract_text(raw),
      venue:            first_text(raw, &[&["host_venue", "display_name"], &[
        "primary_location",
        "source",
        "display_name",
      ]]),
      work_type:        text(raw, &["type"]),
      open_access:      flag(raw, &["open_access", "is_oa"]),
      volume:           first_text(raw, &[&["host_venue", "volume"], &["biblio", "volume"]]),
      issue:            first_text(raw, &[&["host_venue", "issue"], &["biblio", "issue"]]),
      pages:            pages(raw),
      publisher:        first_text(raw, &[&["host_venue", "publisher"], &[
        "primary_location",
        "source",
        "host_organization_name",
      ]]),
      language:         text(raw, &["language"]),
      references_count: count(raw, &["referenced_works_count"]),
      is_retracted:     flag(raw, &["is_retracted"]),
      is_paratext:      flag(raw, &["is_paratext"]),
      source_url:       first_text(raw, &[&["host_venue", "url"], &[
        "primary_location",
        "landing_page_url",
      ]]),
      license:          first_text(raw, &[&["license"], &["primary_location", "license"]]),
    }
  }
}

/// One node of the concept taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
  /// Short identifier, e.g. `C41008148`
  pub id:                String,
  /// Display name
  pub name:              String,
  /// Number of works tagged with this concept
  pub publication_count: u64,
  /// Depth in the taxonomy; roots are level 0
  pub level:             u32,
  /// Short identifier of the parent concept, when known
  pub parent:            Option<String>,
}

impl ConceptNode {
  /// Normalizes a raw concept record. Never fails.
  ///
  /// The parent is taken from the first ancestor one level up, if the record lists its
  /// ancestors.
  pub fn from_raw(raw: &RawRecord) -> Self {
    let level = lookup(raw, &["level"]).and_then(Value::as_u64).map_or(0, saturating_u32);
    let parent = lookup(raw, &["ancestors"]).and_then(Value::as_array).and_then(|ancestors| {
      ancestors
        .iter()
        .filter(|ancestor| {
          ancestor.get("level").and_then(Value::as_u64) == Some(u64::from(level).wrapping_sub(1))
        })
        .find_map(|ancestor| ancestor.get("id").and_then(Value::as_str))
        .map(|id| short_id(id).to_owned())
    });
    Self {
      id: short_id(&text(raw, &["id"])).to_owned(),
      name: text(raw, &["display_name"]),
      publication_count: count(raw, &["works_count"]),
      level,
      parent,
    }
  }

  /// Replaces the parent reference, used when the parent is known from the query itself.
  pub fn with_parent(mut self, parent: Option<&str>) -> Self {
    if let Some(parent) = parent {
      self.parent = Some(short_id(parent).to_owned());
    }
    self
  }
}

/// Headline numbers for an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionSummary {
  /// Short identifier, e.g. `I136199984`
  pub id:             String,
  /// Display name
  pub name:           String,
  /// Number of works affiliated with the institution
  pub works_count:    u64,
  /// Citations received by those works
  pub cited_by_count: u64,
  /// Country code, or country name when only that is given
  pub country:        String,
}

impl InstitutionSummary {
  /// Normalizes a raw institution record. Never fails.
  pub fn from_raw(raw: &RawRecord) -> Self {
    Self {
      id:             short_id(&text(raw, &["id"])).to_owned(),
      name:           text(raw, &["display_name"]),
      works_count:    count(raw, &["works_count"]),
      cited_by_count: count(raw, &["cited_by_count"]),
      country:        first_text(raw, &[&["country_code"], &["geo", "country_code"], &[
        "location", "country",
      ]]),
    }
  }
}

/// Number of institutions in one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySummary {
  /// Two letter country code
  pub code:  String,
  /// Country name, or the code when the catalog gives no name
  pub name:  String,
  /// Number of institutions
  pub count: u64,
}

impl CountrySummary {
  /// Normalizes one `group_by` bucket. Never fails.
  ///
  /// Bucket keys may be bare codes or namespaced URLs; the code is the last two characters.
  pub fn from_raw(raw: &RawRecord) -> Self {
    let key = lookup(raw, &["key"]).and_then(Value::as_str).unwrap_or_default();
    let code = key.char_indices().rev().nth(1).map_or(key, |(start, _)| &key[start..]).to_owned();
    let name = lookup(raw, &["key_display_name"])
      .and_then(Value::as_str)
      .filter(|name| !name.is_empty())
      .map_or_else(|| code.clone(), str::to_owned);
    Self { code, name, count: count(raw, &["count"]) }
  }
}

/// Walks `path` through nested objects, treating `null` as absent.
fn lookup<'a>(raw: &'a RawRecord, path: &[&str]) -> Option<&'a Value> {
  let (first, rest) = path.split_first()?;
  let mut current = raw.get(*first)?;
  for component in rest {
    current = current.as_object()?.get(*component)?;
  }
  (!current.is_null()).then_some(current)
}

/// Text at `path`; numbers and booleans are rendered, anything else is not available.
fn text(raw: &RawRecord, path: &[&str]) -> String {
  try_text(raw, path).unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// Like [`text`], without the fallback.
fn try_text(raw: &RawRecord, path: &[&str]) -> Option<String> {
  match lookup(raw, path)? {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Text at the first of `paths` that has any.
fn first_text(raw: &RawRecord, paths: &[&[&str]]) -> String {
  paths
    .iter()
    .find_map(|path| try_text(raw, path))
    .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// Non-negative integer at `path`, zero otherwise.
fn count(raw: &RawRecord, path: &[&str]) -> u64 {
  lookup(raw, path).and_then(Value::as_u64).unwrap_or_default()
}

/// Boolean at `path`.
fn flag(raw: &RawRecord, path: &[&str]) -> Option<bool> { lookup(raw, path)?.as_bool() }

/// Narrows a level, saturating instead of wrapping.
fn saturating_u32(value: u64) -> u32 { u32::try_from(value).unwrap_or(u32::MAX) }

/// Author names in authorship order; an authorship without a name contributes `N/A`.
fn authors(raw: &RawRecord) -> String {
  let names: Vec<&str> = lookup(raw, &["authorships"])
    .and_then(Value::as_array)
    .map(|authorships| {
      authorships
        .iter()
        .map(|authorship| {
          authorship
            .get("author")
            .and_then(|author| author.get("display_name"))
            .and_then(Value::as_str)
            .unwrap_or(NOT_AVAILABLE)
        })
        .collect()
    })
    .unwrap_or_default();

  if names.is_empty() {
    NOT_AVAILABLE.to_owned()
  } else {
    names.join(", ")
  }
}

/// The plain abstract, or one rebuilt from the catalog's inverted index.
fn abstract_text(raw: &RawRecord) -> String {
  if let Some(text) = try_text(raw, &["abstract"]) {
    return text;
  }
  let Some(index) = lookup(raw, &["abstract_inverted_index"]).and_then(Value::as_object) else {
    return NOT_AVAILABLE.to_owned();
  };

  let mut positioned: Vec<(u64, &str)> = index
    .iter()
    .flat_map(|(word, positions)| {
      positions
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_u64)
        .map(move |position| (position, word.as_str()))
    })
    .collect();
  if positioned.is_empty() {
    return NOT_AVAILABLE.to_owned();
  }
  positioned.sort_unstable();
  positioned.into_iter().map(|(_, word)| word).collect::<Vec<_>>().join(" ")
}

/// `biblio.pages`, or a range built from the first and last page.
fn pages(raw: &RawRecord) -> String {
  if let Some(pages) = try_text(raw, &["biblio", "pages"]) {
    return pages;
  }
  match (try_text(raw, &["biblio", "first_page"]), try_text(raw, &["biblio", "last_page"])) {
    (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
    (Some(first), _) => first,
    (None, Some(last)) => last,
    (None, None) => NOT_AVAILABLE.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(json: &str) -> RawRecord { serde_json::from_str(json).unwrap() }

  #[test]
  fn test_empty_record_defaults_everything() {
    let publication = Publication::from_raw(&RawRecord::new());
    assert_eq!(publication.title, NOT_AVAILABLE);
    assert_eq!(publication.doi, NOT_AVAILABLE);
    assert_eq!(publication.cited_by_count, 0);
    assert_eq!(publication.references_count, 0);
    assert_eq!(publication.authors, NOT_AVAILABLE);
    assert_eq!(publication.abstract_text, NOT_AVAILABLE);
    assert_eq!(publication.open_access, None);
    assert_eq!(publication.is_retracted, None);
    assert_eq!(publication.is_paratext, None);
    assert_eq!(publication.license, NOT_AVAILABLE);
    assert_eq!(publication, Publication::default());
  }

  #[test]
  fn test_full_legacy_record() {
    let publication = Publication::from_raw(&raw(
      r#"{
        "id": "https://openalex.org/W2741809807",
        "display_name": "The state of OA",
        "doi": "https://doi.org/10.7717/peerj.4375",
        "publication_date": "2018-02-13",
        "cited_by_count": 715,
        "abstract": "Despite growing interest in Open Access...",
        "type": "journal-article",
        "open_access": {"is_oa": true, "oa_status": "gold"},
        "host_venue": {
          "display_name": "PeerJ",
          "volume": "6",
          "issue": null,
          "publisher": "PeerJ",
          "url": "https://peerj.com/articles/4375"
        },
        "biblio": {"pages": "e4375"},
        "language": "en",
        "referenced_works_count": 51,
        "is_retracted": false,
        "is_paratext": false,
        "license": "cc-by",
        "authorships": [
          {"author": {"display_name": "Heather Piwowar"}},
          {"author": {"display_name": "Jason Priem"}}
        ]
      }"#,
    ));
    assert_eq!(publication.title, "The state of OA");
    assert_eq!(publication.doi, "https://doi.org/10.7717/peerj.4375");
    assert_eq!(publication.publication_date, "2018-02-13");
    assert_eq!(publication.cited_by_count, 715);
    assert_eq!(publication.authors, "Heather Piwowar, Jason Priem");
    assert_eq!(publication.abstract_text, "Despite growing interest in Open Access...");
    assert_eq!(publication.venue, "PeerJ");
    assert_eq!(publication.work_type, "journal-article");
    assert_eq!(publication.open_access, Some(true));
    assert_eq!(publication.volume, "6");
    assert_eq!(publication.issue, NOT_AVAILABLE);
    assert_eq!(publication.pages, "e4375");
    assert_eq!(publication.publisher, "PeerJ");
    assert_eq!(publication.language, "en");
    assert_eq!(publication.references_count, 51);
    assert_eq!(publication.is_retracted, Some(false));
    assert_eq!(publication.is_paratext, Some(false));
    assert_eq!(publication.source_url, "https://peerj.com/articles/4375");
    assert_eq!(publication.license, "cc-by");
  }

  #[test]
  fn test_current_record_shape_fallbacks() {
    let publication = Publication::from_raw(&raw(
      r#"{
        "title": "Only a title",
        "primary_location": {
          "landing_page_url": "https://example.org/w/1",
          "license": "cc-by-nc",
          "source": {"display_name": "Example Journal", "host_organization_name": "Example Press"}
        },
        "biblio": {"volume": "12", "issue": "3", "first_page": "101", "last_page": "110"},
        "abstract_inverted_index": {"world": [1], "Hello": [0], "again": [3], "hello": [2]}
      }"#,
    ));
    assert_eq!(publication.title, "Only a title");
    assert_eq!(publication.venue, "Example Journal");
    assert_eq!(publication.publisher, "Example Press");
    assert_eq!(publication.source_url, "https://example.org/w/1");
    assert_eq!(publication.license, "cc-by-nc");
    assert_eq!(publication.volume, "12");
    assert_eq!(publication.issue, "3");
    assert_eq!(publication.pages, "101-110");
    assert_eq!(publication.abstract_text, "Hello world hello again");
  }

  #[test]
  fn test_malformed_nesting_only_defaults_that_attribute() {
    let publication = Publication::from_raw(&raw(
      r#"{
        "display_name": "Still here",
        "host_venue": "not an object",
        "open_access": [],
        "biblio": {"pages": {"nested": true}},
        "cited_by_count": "12",
        "referenced_works_count": -4,
        "authorships": {"author": "wrong shape"},
        "abstract_inverted_index": {"word": "not positions"}
      }"#,
    ));
    assert_eq!(publication.title, "Still here");
    assert_eq!(publication.venue, NOT_AVAILABLE);
    assert_eq!(publication.open_access, None);
    assert_eq!(publication.pages, NOT_AVAILABLE);
    assert_eq!(publication.cited_by_count, 0);
    assert_eq!(publication.references_count, 0);
    assert_eq!(publication.authors, NOT_AVAILABLE);
    assert_eq!(publication.abstract_text, NOT_AVAILABLE);
  }

  #[test]
  fn test_single_page_and_numeric_text() {
    let publication =
      Publication::from_raw(&raw(r#"{"biblio": {"first_page": "7", "last_page": "7", "volume": 42}}"#));
    assert_eq!(publication.pages, "7");
    assert_eq!(publication.volume, "42");
  }

  #[test]
  fn test_concept_node() {
    let node = ConceptNode::from_raw(&raw(
      r#"{
        "id": "https://openalex.org/C119857082",
        "display_name": "Machine learning",
        "works_count": 3900000,
        "level": 1,
        "ancestors": [
          {"id": "https://openalex.org/C154945302", "level": 1},
          {"id": "https://openalex.org/C41008148", "level": 0}
        ]
      }"#,
    ));
    assert_eq!(node.id, "C119857082");
    assert_eq!(node.name, "Machine learning");
    assert_eq!(node.publication_count, 3_900_000);
    assert_eq!(node.level, 1);
    assert_eq!(node.parent.as_deref(), Some("C41008148"));

    let root = ConceptNode::from_raw(&raw(r#"{"id": "C41008148", "level": 0}"#));
    assert_eq!(root.parent, None);
    assert_eq!(root.name, NOT_AVAILABLE);
    assert_eq!(root.publication_count, 0);

    let overridden = root.with_parent(Some("https://openalex.org/C1"));
    assert_eq!(overridden.parent.as_deref(), Some("C1"));
  }

  #[test]
  fn test_institution_summary() {
    let institution = InstitutionSummary::from_raw(&raw(
      r#"{
        "id": "https://openalex.org/I136199984",
        "display_name": "Harvard University",
        "works_count": 500000,
        "cited_by_count": 30000000,
        "geo": {"country_code": "US", "country": "United States"}
      }"#,
    ));
    assert_eq!(institution.id, "I136199984");
    assert_eq!(institution.name, "Harvard University");
    assert_eq!(institution.works_count, 500_000);
    assert_eq!(institution.country, "US");

    let legacy = InstitutionSummary::from_raw(&raw(r#"{"location": {"country": "France"}}"#));
    assert_eq!(legacy.country, "France");
    assert_eq!(legacy.cited_by_count, 0);
  }

  #[test]
  fn test_country_summary() {
    let country = CountrySummary::from_raw(&raw(
      r#"{"key": "https://openalex.org/countries/US", "key_display_name": "United States", "count": 10}"#,
    ));
    assert_eq!(country, CountrySummary {
      code:  "US".into(),
      name:  "United States".into(),
      count: 10,
    });

    let bare = CountrySummary::from_raw(&raw(r#"{"key": "fr", "count": 3}"#));
    assert_eq!(bare.code, "fr");
    assert_eq!(bare.name, "fr");

    let empty = CountrySummary::from_raw(&RawRecord::new());
    assert_eq!(empty.code, "");
    assert_eq!(empty.count, 0);
  }

  #[test]
  fn test_short_id() {
    assert_eq!(short_id("https://openalex.org/I136199984"), "I136199984");
    assert_eq!(short_id("https://openalex.org/I136199984/"), "I136199984");
    assert_eq!(short_id(""), "");
  }
}
