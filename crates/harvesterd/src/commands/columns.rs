//! The exportable column names.

use harvester::column::Column;

use super::*;

/// Function for [`Commands::Columns`]. Needs no catalog access.
pub fn columns<I: UserInteraction>(interaction: &I) -> Result<()> {
  for column in Column::ALL {
    interaction.emit(&column)?;
  }
  Ok(())
}
