//! Reference rows every warehouse starts with.

use pitboard_core::store::WarehouseStore;
use serde::Serialize;

use crate::{
  error::{store_err, Result},
  event::SportCode,
  unit::unit_of_work,
};

/// Round code of the single round every race is filed under.
pub const RACE_ROUND: (&str, &str) = ("RACE", "Race");

/// Known round codes and their display names.
pub const ROUNDS: &[(&str, &str)] = &[
  ("PRACTICE", "Practice"),
  ("QUALIFYING", "Qualifying"),
  ("HEAT", "Heat"),
  ("LCQ", "Last Chance Qualifier"),
  ("MAIN_EVENT", "Main Event"),
  RACE_ROUND,
  ("FINAL", "Final"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
  pub sports: usize,
  pub rounds: usize,
}

/// Get-or-create every sport and round code in one unit of work.
#[tracing::instrument(skip(store))]
pub async fn seed_reference_data<S: WarehouseStore>(store: &S) -> Result<SeedSummary> {
  let summary = unit_of_work(store, seed_rows(store)).await?;
  tracing::info!(sports = summary.sports, rounds = summary.rounds, "seeded reference data");
  Ok(summary)
}

async fn seed_rows<S: WarehouseStore>(store: &S) -> Result<SeedSummary> {
  for sport in SportCode::ALL {
    store
      .get_or_create_sport(sport.code().to_owned(), sport.display_name().to_owned())
      .await
      .map_err(store_err)?;
  }
  for (code, name) in ROUNDS {
    store
      .get_or_create_round((*code).to_owned(), (*name).to_owned())
      .await
      .map_err(store_err)?;
  }
  Ok(SeedSummary { sports: SportCode::ALL.len(), rounds: ROUNDS.len() })
}
