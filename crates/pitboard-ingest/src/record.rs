//! Appending score facts for one race.

use pitboard_core::{
  score::{MetricKey, NewScore, WinnerValue},
  store::WarehouseStore,
};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::{store_err, Result};

/// Where the facts of one race land.
#[derive(Debug, Clone, Copy)]
pub struct RaceScope {
  pub sport_id:       Uuid,
  pub event_id:       Uuid,
  pub event_round_id: Uuid,
  pub run_id:         Uuid,
}

/// Writes score facts for one race. Every call appends; nothing is merged.
pub struct ScoreRecorder<'a, S> {
  store: &'a S,
  scope: RaceScope,
}

impl<'a, S: WarehouseStore> ScoreRecorder<'a, S> {
  pub fn new(store: &'a S, scope: RaceScope) -> Self { Self { store, scope } }

  async fn append(
    &self,
    participant_id: Uuid,
    metric_key: MetricKey,
    metric_value: Value,
  ) -> Result<()> {
    self
      .store
      .record_score(NewScore {
        sport_id: self.scope.sport_id,
        event_id: self.scope.event_id,
        event_round_id: Some(self.scope.event_round_id),
        event_participant_id: participant_id,
        metric_key,
        metric_value,
        run_id: self.scope.run_id,
      })
      .await
      .map_err(store_err)?;
    Ok(())
  }

  /// The whole driver object.
  pub async fn driver(
    &self,
    participant_id: Uuid,
    driver: &Map<String, Value>,
  ) -> Result<()> {
    self
      .append(participant_id, MetricKey::RaceDriver, Value::Object(driver.clone()))
      .await
  }

  /// One lap entry, verbatim.
  pub async fn lap(&self, participant_id: Uuid, lap: &Map<String, Value>) -> Result<()> {
    self
      .append(participant_id, MetricKey::RaceLap, Value::Object(lap.clone()))
      .await
  }

  /// One flat result row, verbatim.
  pub async fn result(&self, participant_id: Uuid, row: &Map<String, Value>) -> Result<()> {
    self
      .append(participant_id, MetricKey::RaceResult, Value::Object(row.clone()))
      .await
  }

  pub async fn winner(&self, participant_id: Uuid, winner: &WinnerValue) -> Result<()> {
    let value = serde_json::to_value(winner)?;
    self.append(participant_id, MetricKey::Winner, value).await
  }

  /// Keep a payload nothing could be parsed from on the event round.
  ///
  /// Returns whether the payload was stored. A failure here is logged and
  /// swallowed so that it never fails the event.
  pub async fn capture_raw(&self, race_id: i64, payload: &Value) -> bool {
    match self
      .store
      .append_round_payload(self.scope.event_round_id, payload.clone())
      .await
    {
      Ok(()) => true,
      Err(e) => {
        warn!(race_id, error = %e, "could not keep unparsed race payload");
        false
      }
    }
  }
}
