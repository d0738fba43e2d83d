//! Country and institution listings.

use super::*;

/// Function for [`Commands::Countries`].
pub async fn countries<I: UserInteraction, S: CatalogSource>(
  interaction: &I,
  harvester: &Harvester<S>,
) -> Result<()> {
  let countries = harvester.countries().await;
  for country in &countries {
    interaction.emit(country)?;
  }
  interaction.reply(ResponseContent::Info(&format!("{} countries", countries.len())))
}

/// Function for [`Commands::Institutions`].
pub async fn institutions<I: UserInteraction, S: CatalogSource>(
  interaction: &I,
  harvester: &Harvester<S>,
  country: &str,
  cancel: CancellationToken,
) -> Result<()> {
  interaction.reply(ResponseContent::Working(&format!("Listing institutions in {country}")))?;
  let institutions = harvester.institutions_in_country_with_cancel(country, cancel).await;
  for institution in &institutions {
    interaction.emit(institution)?;
  }
  interaction.reply(ResponseContent::Success(&format!("Listed {} institutions", institutions.len())))
}
