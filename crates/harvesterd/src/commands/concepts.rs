//! Browsing the concept taxonomy.

use super::*;

/// One line of [`concept_counts`] output.
#[derive(Debug, Serialize)]
struct LevelCount {
  /// Taxonomy level
  level: u32,
  /// Concepts at that level
  count: u64,
}

/// Function for [`Commands::Concepts`].
pub async fn concepts<I: UserInteraction, S: CatalogSource>(
  interaction: &I,
  harvester: &Harvester<S>,
  options: ConceptsOptions,
) -> Result<()> {
  let ConceptsOptions { level, parent, page } = options;
  let listing = harvester.concepts(level, parent.as_deref(), page).await;
  for concept in listing.iter() {
    interaction.emit(concept)?;
  }
  if listing.is_empty() {
    interaction.reply(ResponseContent::Info(&format!("No concepts at level {level} on page {page}")))
  } else {
    interaction.reply(ResponseContent::Success(&format!("Listed {} concepts at level {level}", listing.len())))
  }
}

/// Function for [`Commands::ConceptCounts`].
pub async fn concept_counts<I: UserInteraction, S: CatalogSource>(
  interaction: &I,
  harvester: &Harvester<S>,
) -> Result<()> {
  for (level, count) in harvester.concept_counts().await {
    interaction.emit(&LevelCount { level, count })?;
  }
  Ok(())
}
