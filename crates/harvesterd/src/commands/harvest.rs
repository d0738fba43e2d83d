//! The publication harvests: by institution, by country, and by field.

use super::*;

/// What a harvest is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  /// One institution, by name or id
  Institution,
  /// Institutions in one country
  Country,
  /// One concept
  Field,
}

/// Function for [`Commands::Institution`], [`Commands::Country`] and [`Commands::Field`].
///
/// Emits one JSON object per row. A harvest interrupted through `cancel` still emits the rows
/// gathered before the interruption.
pub async fn harvest<I: UserInteraction, S: CatalogSource>(
  interaction: &I,
  harvester: &Harvester<S>,
  scope: Scope,
  options: HarvestOptions,
  cancel: CancellationToken,
) -> Result<()> {
  let columns = options.selected_columns();
  let HarvestOptions { target, cap, .. } = options;
  interaction.reply(ResponseContent::Working(&format!("Harvesting up to {cap} publications for {target}")))?;

  let result = match scope {
    Scope::Institution => harvester.by_institution_with_cancel(&target, cap, &columns, cancel.clone()).await,
    Scope::Country => harvester.by_country_with_cancel(&target, cap, &columns, cancel.clone()).await,
    Scope::Field => harvester.by_field_with_cancel(&target, cap, &columns, cancel.clone()).await,
  };
  let harvest = result?;
  trace!("Harvest for {target} returned {} rows", harvest.retrieved);

  for row in &harvest.rows {
    interaction.emit(row)?;
  }

  let summary = format!("Retrieved {} of up to {cap} publications", harvest.retrieved);
  if cancel.is_cancelled() {
    interaction.reply(ResponseContent::Warning(&format!("Interrupted. {summary}")))
  } else {
    interaction.reply(ResponseContent::Success(&summary))
  }
}
