//! Score types: the append-only fact ledger of the warehouse.
//!
//! A score is one observed metric for one participant within one event
//! round. Scores are never updated, merged or deduplicated: re-ingesting an
//! event appends a fresh set tagged with that run's `run_id`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── MetricKey ───────────────────────────────────────────────────────────────

/// The kind of observation a score carries. The string form is stored in
/// the `metric_key` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricKey {
  /// The full per-driver object from a driver-object race payload.
  RaceDriver,
  /// One lap entry of one driver, verbatim.
  RaceLap,
  /// One row of a flat result list, verbatim.
  RaceResult,
  /// The race winner derived from lap positions; value is a [`WinnerValue`].
  Winner,
  /// Keys written by other producers; preserved on read.
  Other(String),
}

impl MetricKey {
  pub fn as_str(&self) -> &str {
    match self {
      Self::RaceDriver => "race_driver",
      Self::RaceLap => "race_lap",
      Self::RaceResult => "race_result",
      Self::Winner => "winner",
      Self::Other(key) => key,
    }
  }
}

impl fmt::Display for MetricKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MetricKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s {
      "race_driver" => Self::RaceDriver,
      "race_lap" => Self::RaceLap,
      "race_result" => Self::RaceResult,
      "winner" => Self::Winner,
      "" => return Err(Error::InvalidMetricKey(s.to_owned())),
      other => Self::Other(other.to_owned()),
    })
  }
}

impl Serialize for MetricKey {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for MetricKey {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Winner payload ──────────────────────────────────────────────────────────

/// Payload of a [`MetricKey::Winner`] score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerValue {
  pub player_name: String,
  pub team_name:   Option<String>,
  pub final_pos:   i64,
  pub race_id:     i64,
}

// ─── Score ───────────────────────────────────────────────────────────────────

/// An immutable observation. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
  pub score_id:             Uuid,
  pub sport_id:             Uuid,
  pub event_id:             Uuid,
  pub event_round_id:       Option<Uuid>,
  pub event_participant_id: Uuid,
  pub metric_key:           MetricKey,
  pub metric_value:         serde_json::Value,
  /// The ingestion run that wrote this score.
  pub run_id:               Uuid,
  /// Server-assigned timestamp.
  pub recorded_at:          DateTime<Utc>,
}

/// Input to [`crate::store::WarehouseStore::record_score`].
/// `score_id` and `recorded_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewScore {
  pub sport_id:             Uuid,
  pub event_id:             Uuid,
  pub event_round_id:       Option<Uuid>,
  pub event_participant_id: Uuid,
  pub metric_key:           MetricKey,
  pub metric_value:         serde_json::Value,
  pub run_id:               Uuid,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::WarehouseStore::list_scores`].
#[derive(Debug, Clone, Default)]
pub struct ScoreQuery {
  pub event_id:   Option<Uuid>,
  pub metric_key: Option<MetricKey>,
  pub run_id:     Option<Uuid>,
  pub limit:      Option<usize>,
}
