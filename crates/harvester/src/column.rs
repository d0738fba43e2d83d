//! Column selection and row projection.
//!
//! A [`Publication`] always carries all nineteen attributes; exports only want some of them,
//! in an order the caller picks. [`project`] turns a publication plus a list of column names
//! into a [`Row`] holding exactly those cells, in exactly that order.
//!
//! Column names are the display names listed in [`Column::ALL`]. Matching is exact and
//! case-sensitive. Unlike missing data, an unknown column name is a caller mistake and is
//! reported as [`HarvesterError::InvalidColumn`] before any row is built.
//!
//! # Examples
//!
//! ```
//! use harvester::{
//!   column::{project, Cell, Column},
//!   record::Publication,
//! };
//!
//! let publication = Publication { title: "On Computable Numbers".into(), ..Default::default() };
//! let row = project(&publication, &["Cited by Count", "Title"]).unwrap();
//!
//! assert_eq!(row.columns().collect::<Vec<_>>(), vec![Column::CitedByCount, Column::Title]);
//! assert_eq!(row.get(Column::Title), Some(&Cell::Text("On Computable Numbers".into())));
//! assert_eq!(row.get(Column::Doi), None);
//! ```

use serde::ser::SerializeMap;

use super::*;

/// One exportable publication attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
  /// Display title
  Title,
  /// Digital Object Identifier
  Doi,
  /// Date of publication
  PublicationDate,
  /// Incoming citations
  CitedByCount,
  /// Authors, flattened
  Authors,
  /// Abstract text
  Abstract,
  /// Host venue name
  Venue,
  /// Work type
  Type,
  /// Open access flag
  OpenAccess,
  /// Venue volume
  Volume,
  /// Venue issue
  Issue,
  /// Page range
  Pages,
  /// Venue publisher
  Publisher,
  /// Language code
  Language,
  /// Outgoing references
  ReferencesCount,
  /// Retraction flag
  IsRetracted,
  /// Paratext flag
  IsParatext,
  /// Landing page URL
  SourceUrl,
  /// Publication license
  License,
}

impl Column {
  /// Every column, in canonical export order.
  pub const ALL: [Column; 19] = [
    Column::Title,
    Column::Doi,
    Column::PublicationDate,
    Column::CitedByCount,
    Column::Authors,
    Column::Abstract,
    Column::Venue,
    Column::Type,
    Column::OpenAccess,
    Column::Volume,
    Column::Issue,
    Column::Pages,
    Column::Publisher,
    Column::Language,
    Column::ReferencesCount,
    Column::IsRetracted,
    Column::IsParatext,
    Column::SourceUrl,
    Column::License,
  ];

  /// The display name, which is also the name accepted by [`Column::parse`].
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Title => "Title",
      Self::Doi => "DOI",
      Self::PublicationDate => "Publication Date",
      Self::CitedByCount => "Cited by Count",
      Self::Authors => "Authors",
      Self::Abstract => "Abstract",
      Self::Venue => "Venue",
      Self::Type => "Type",
      Self::OpenAccess => "Open Access",
      Self::Volume => "Volume",
      Self::Issue => "Issue",
      Self::Pages => "Pages",
      Self::Publisher => "Publisher",
      Self::Language => "Language",
      Self::ReferencesCount => "References Count",
      Self::IsRetracted => "Is Retracted",
      Self::IsParatext => "Is Paratext",
      Self::SourceUrl => "Source URL",
      Self::License => "License",
    }
  }

  /// Parses a display name.
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::InvalidColumn`] carrying `name` when it is not a column.
  pub fn parse(name: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|column| column.as_str() == name)
      .ok_or_else(|| HarvesterError::InvalidColumn(name.to_owned()))
  }

  /// Parses a whole selection, keeping its order and any repeats.
  ///
  /// # Errors
  ///
  /// Fails on the first unknown name in selection order.
  pub fn parse_all<N: AsRef<str>>(names: &[N]) -> Result<Vec<Self>> {
    names.iter().map(|name| Self::parse(name.as_ref())).collect()
  }
}

impl Display for Column {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Column {
  type Err = HarvesterError;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl Serialize for Column {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// A single projected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
  /// Free text; absent text is already [`NOT_AVAILABLE`]
  Text(String),
  /// A non-negative count
  Count(u64),
  /// A yes/no attribute
  Flag(bool),
  /// A yes/no attribute the catalog did not provide
  NotAvailable,
}

impl Display for Cell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Cell::Text(text) => f.write_str(text),
      Cell::Count(count) => write!(f, "{count}"),
      Cell::Flag(flag) => write!(f, "{flag}"),
      Cell::NotAvailable => f.write_str(NOT_AVAILABLE),
    }
  }
}

impl Serialize for Cell {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Cell::Text(text) => serializer.serialize_str(text),
      Cell::Count(count) => serializer.serialize_u64(*count),
      Cell::Flag(flag) => serializer.serialize_bool(*flag),
      Cell::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
    }
  }
}

impl From<Option<bool>> for Cell {
  fn from(flag: Option<bool>) -> Self { flag.map_or(Cell::NotAvailable, Cell::Flag) }
}

impl Publication {
  /// The value of one attribute as a [`Cell`].
  pub fn cell(&self, column: Column) -> Cell {
    match column {
      Column::Title => Cell::Text(self.title.clone()),
      Column::Doi => Cell::Text(self.doi.clone()),
      Column::PublicationDate => Cell::Text(self.publication_date.clone()),
      Column::CitedByCount => Cell::Count(self.cited_by_count),
      Column::Authors => Cell::Text(self.authors.clone()),
      Column::Abstract => Cell::Text(self.abstract_text.clone()),
      Column::Venue => Cell::Text(self.venue.clone()),
      Column::Type => Cell::Text(self.work_type.clone()),
      Column::OpenAccess => self.open_access.into(),
      Column::Volume => Cell::Text(self.volume.clone()),
      Column::Issue => Cell::Text(self.issue.clone()),
      Column::Pages => Cell::Text(self.pages.clone()),
      Column::Publisher => Cell::Text(self.publisher.clone()),
      Column::Language => Cell::Text(self.language.clone()),
      Column::ReferencesCount => Cell::Count(self.references_count),
      Column::IsRetracted => self.is_retracted.into(),
      Column::IsParatext => self.is_paratext.into(),
      Column::SourceUrl => Cell::Text(self.source_url.clone()),
      Column::License => Cell::Text(self.license.clone()),
    }
  }
}

/// A publication restricted to selected columns, in selection order.
///
/// Serializes as a JSON object whose keys are the column display names, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
  /// Selected columns and their values
  cells: Vec<(Column, Cell)>,
}

impl Row {
  /// Builds a row from an already validated selection.
  pub fn select(publication: &Publication, columns: &[Column]) -> Self {
    Self { cells: columns.iter().map(|&column| (column, publication.cell(column))).collect() }
  }

  /// The value of `column`, if it was selected.
  pub fn get(&self, column: Column) -> Option<&Cell> {
    self.cells.iter().find(|(selected, _)| *selected == column).map(|(_, cell)| cell)
  }

  /// Selected columns in order.
  pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
    self.cells.iter().map(|(column, _)| *column)
  }

  /// Values in column order.
  pub fn values(&self) -> impl Iterator<Item = &Cell> { self.cells.iter().map(|(_, cell)| cell) }

  /// `(column, value)` pairs in order.
  pub fn iter(&self) -> impl Iterator<Item = &(Column, Cell)> { self.cells.iter() }

  /// Number of selected columns.
  pub fn len(&self) -> usize { self.cells.len() }

  #[allow(missing_docs)]
  pub fn is_empty(&self) -> bool { self.cells.is_empty() }
}

impl Serialize for Row {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.cells.len()))?;
    for (column, cell) in &self.cells {
      map.serialize_entry(column.as_str(), cell)?;
    }
    map.end()
  }
}

/// Projects `publication` onto the named columns.
///
/// The row has exactly `columns.len()` entries, in the given order.
///
/// # Errors
///
/// Returns [`HarvesterError::InvalidColumn`] naming the first unknown column. No partial row
/// is produced.
pub fn project<N: AsRef<str>>(publication: &Publication, columns: &[N]) -> Result<Row> {
  let columns = Column::parse_all(columns)?;
  Ok(Row::select(publication, &columns))
}
