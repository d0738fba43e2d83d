//! Subcommands of the `harvester` binary.

use super::*;

pub mod columns;
pub mod concepts;
pub mod harvest;
pub mod institutions;

pub use columns::columns;
pub use concepts::{concept_counts, concepts};
pub use harvest::{harvest, Scope};
pub use institutions::{countries, institutions};

/// Columns exported when none are requested.
pub const DEFAULT_COLUMNS: [&str; 3] = ["Title", "DOI", "Publication Date"];

/// Available commands for the CLI
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
  /// Harvest publications affiliated with an institution
  Institution(HarvestOptions),

  /// Harvest publications from institutions in a country
  Country(HarvestOptions),

  /// Harvest publications tagged with a field of study (concept)
  Field(HarvestOptions),

  /// List one page of the concept taxonomy
  Concepts(ConceptsOptions),

  /// Count the concepts at each taxonomy level
  ConceptCounts,

  /// Count institutions per country
  Countries,

  /// List every institution in a country
  Institutions {
    /// Two letter country code, e.g. "FR"
    country: String,
  },

  /// List the columns a harvest can export
  Columns,
}

/// Arguments shared by the publication harvests.
#[derive(Args, Clone, Debug)]
pub struct HarvestOptions {
  /// Institution name or OpenAlex id, country code, or concept id, depending on the command
  /// Examples: "I136199984", "Harvard University", "US", "C41008148"
  pub target: String,

  /// Maximum number of publications to retrieve
  #[arg(long, default_value_t = 100)]
  pub cap: usize,

  /// Column to export, repeatable. Defaults to Title, DOI and Publication Date
  #[arg(long = "column", short = 'c', value_name = "COLUMN")]
  pub columns: Vec<String>,
}

impl HarvestOptions {
  /// The requested columns, or [`DEFAULT_COLUMNS`] when none were given.
  pub fn selected_columns(&self) -> Vec<String> {
    if self.columns.is_empty() {
      DEFAULT_COLUMNS.iter().map(|&column| column.to_owned()).collect()
    } else {
      self.columns.clone()
    }
  }
}

/// Arguments for browsing the taxonomy.
#[derive(Args, Clone, Debug)]
pub struct ConceptsOptions {
  /// Taxonomy level, 0 for the roots
  #[arg(long, default_value_t = 0)]
  pub level: u32,

  /// Only list descendants of this concept id
  #[arg(long)]
  pub parent: Option<String>,

  /// Page of the listing, starting at 1
  #[arg(long, default_value_t = 1)]
  pub page: u32,
}
