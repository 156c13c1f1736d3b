//! The `WarehouseStore` trait and supporting input types.
//!
//! The trait is implemented by storage backends (e.g.
//! `pitboard-store-sqlite`). The ingestion engine depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{
    Event, EventParticipant, EventRound, ParticipantRole, Player, Round, Sport,
    Team, Tour, TourYear,
  },
  score::{NewScore, Score, ScoreQuery},
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input to [`WarehouseStore::upsert_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub sport_id:     Uuid,
  pub tour_year_id: Uuid,
  pub name:         String,
  pub start_date:   Option<DateTime<Utc>>,
  pub end_date:     Option<DateTime<Utc>>,
  pub venue:        Option<String>,
  pub meta:         serde_json::Value,
}

/// Input to [`WarehouseStore::get_or_create_event_participant`].
#[derive(Debug, Clone)]
pub struct NewParticipant {
  pub sport_id:  Uuid,
  pub event_id:  Uuid,
  pub player_id: Uuid,
  pub team_id:   Option<Uuid>,
  pub role:      ParticipantRole,
}

/// Row counts per table, for diagnostics and idempotence checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  pub sports:             u64,
  pub tours:              u64,
  pub tour_years:         u64,
  pub events:             u64,
  pub teams:              u64,
  pub players:            u64,
  pub rounds:             u64,
  pub event_rounds:       u64,
  pub event_participants: u64,
  pub scores:             u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a results warehouse backend.
///
/// Every `get_or_create_*` method is a single atomic primitive: it inserts
/// the row unless one with the same natural key exists, and returns the
/// stored row either way. Calling it repeatedly with the same key never
/// creates duplicates, including across concurrent writers.
///
/// Writes issued between [`begin`](Self::begin) and [`commit`](Self::commit)
/// form one unit of work. Rows created inside it are visible to every later
/// call on the same store before the commit.
///
/// Score writes are append-only.
pub trait WarehouseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Unit of work ──────────────────────────────────────────────────────

  /// Open a unit of work.
  fn begin(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Make every write since [`begin`](Self::begin) durable.
  fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Discard every write since [`begin`](Self::begin).
  fn rollback(&self)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reference entities ────────────────────────────────────────────────

  /// Natural key: `code`. `name` is only used when the row is created.
  fn get_or_create_sport(
    &self,
    code: String,
    name: String,
  ) -> impl Future<Output = Result<Sport, Self::Error>> + Send + '_;

  fn get_or_create_tour(
    &self,
    sport_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Tour, Self::Error>> + Send + '_;

  fn get_or_create_tour_year(
    &self,
    sport_id: Uuid,
    tour_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<TourYear, Self::Error>> + Send + '_;

  /// Natural key: `(sport_id, name)`. An existing event only has its `meta`
  /// replaced; every other field keeps its original value.
  fn upsert_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Natural key: `code`, shared across sports.
  fn get_or_create_round(
    &self,
    code: String,
    name: String,
  ) -> impl Future<Output = Result<Round, Self::Error>> + Send + '_;

  /// Natural key: `(sport_id, event_id, round_id)`. `parent_id` is only
  /// used when the row is created.
  fn get_or_create_event_round(
    &self,
    sport_id: Uuid,
    event_id: Uuid,
    round_id: Uuid,
    parent_id: Option<Uuid>,
  ) -> impl Future<Output = Result<EventRound, Self::Error>> + Send + '_;

  fn get_or_create_team(
    &self,
    sport_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  /// Natural key: `(sport_id, name)`. When the player exists without a team
  /// and `team_id` is given, the team is backfilled; an existing team is
  /// never overwritten.
  fn get_or_create_player(
    &self,
    sport_id: Uuid,
    name: String,
    team_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Player, Self::Error>> + Send + '_;

  /// Natural key: `(sport_id, event_id, player_id)`, with the same team
  /// backfill rule as [`get_or_create_player`](Self::get_or_create_player).
  fn get_or_create_event_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<EventParticipant, Self::Error>> + Send + '_;

  /// Append `payload` to the `race_payloads` list in the event round's
  /// metadata, creating the list (or the metadata object) if needed.
  fn append_round_payload(
    &self,
    event_round_id: Uuid,
    payload: serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Scores (append-only) ─────────────────────────────────────────

  /// Record a new score. `score_id` and `recorded_at` are set by the store.
  fn record_score(
    &self,
    input: NewScore,
  ) -> impl Future<Output = Result<Score, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn get_event_round(
    &self,
    event_round_id: Uuid,
  ) -> impl Future<Output = Result<Option<EventRound>, Self::Error>> + Send + '_;

  /// Scores matching `query`, oldest first.
  fn list_scores<'a>(
    &'a self,
    query: &'a ScoreQuery,
  ) -> impl Future<Output = Result<Vec<Score>, Self::Error>> + Send + 'a;

  fn counts(
    &self,
  ) -> impl Future<Output = Result<TableCounts, Self::Error>> + Send + '_;
}
