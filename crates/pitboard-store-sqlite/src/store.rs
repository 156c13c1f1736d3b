//! [`SqliteStore`], the SQLite implementation of [`WarehouseStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row};
use serde_json::Value;
use uuid::Uuid;

use pitboard_core::{
  entity::{
    Event, EventParticipant, EventRound, Player, Round, Sport, Team, Tour,
    TourYear,
  },
  score::{NewScore, Score, ScoreQuery},
  store::{NewEvent, NewParticipant, TableCounts, WarehouseStore},
};

use crate::{
  encode::{
    encode_dt, encode_json, encode_uuid, RawEvent, RawEventRound,
    RawParticipant, RawPlayer, RawRound, RawScore, RawSport, RawTeam, RawTour,
    RawTourYear, EVENT_COLS, EVENT_ROUND_COLS, PARTICIPANT_COLS, PLAYER_COLS,
    ROUND_COLS, SCORE_COLS, SPORT_COLS, TEAM_COLS, TOUR_COLS, TOUR_YEAR_COLS,
  },
  schema::SCHEMA,
  Error, Result,
};

/// One parameterised write executed before the natural-key lookup.
type Write = (String, Vec<Option<String>>);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A results warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Clones share
/// the connection, and therefore share any open unit of work.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The get-or-create primitive shared by every reference entity.
  ///
  /// Runs `writes` (an `INSERT ... ON CONFLICT`, optionally a backfill) and
  /// then `select` inside one savepoint, so the natural-key check and the
  /// insert are a single atomic step on this connection. The UNIQUE
  /// constraints keep other connections from sneaking in a duplicate.
  async fn insert_or_fetch<R, F>(
    &self,
    entity: &'static str,
    writes: Vec<Write>,
    select: String,
    select_params: Vec<Option<String>>,
    read: F,
  ) -> Result<R>
  where
    R: Send + 'static,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let (raw, changed) = self
      .conn
      .call(move |conn| {
        let sp = conn.savepoint()?;
        let mut changed = 0;
        for (sql, params) in &writes {
          changed += sp.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        }
        let raw = sp.query_row(
          &select,
          rusqlite::params_from_iter(select_params.iter()),
          read,
        )?;
        sp.commit()?;
        Ok((raw, changed))
      })
      .await?;

    if changed > 0 {
      tracing::trace!(entity, changed, "natural-key write applied");
    }
    Ok(raw)
  }

  async fn fetch_optional<R, F>(
    &self,
    select: String,
    params: Vec<Option<String>>,
    read: F,
  ) -> Result<Option<R>>
  where
    R: Send + 'static,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(&select, rusqlite::params_from_iter(params.iter()), read)
              .optional()?,
          )
        })
        .await?,
    )
  }
}

/// Merge `payload` into event-round metadata under `race_payloads`.
///
/// An object keeps its other keys; a non-list `race_payloads` is folded into
/// the new list ahead of `payload`; anything that is not an object is
/// replaced.
pub(crate) fn with_race_payload(meta: Option<Value>, payload: Value) -> Value {
  let mut obj = match meta {
    Some(Value::Object(obj)) => obj,
    _ => serde_json::Map::new(),
  };
  let list = match obj.remove("race_payloads") {
    Some(Value::Array(mut items)) => {
      items.push(payload);
      items
    }
    Some(Value::Null) | None => vec![payload],
    Some(other) => vec![other, payload],
  };
  obj.insert("race_payloads".to_owned(), Value::Array(list));
  Value::Object(obj)
}

fn now_str() -> String { encode_dt(Utc::now()) }

fn new_id() -> String { encode_uuid(Uuid::new_v4()) }

fn count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
  row.get::<_, i64>(idx).map(|n| n.max(0) as u64)
}

// ─── WarehouseStore impl ─────────────────────────────────────────────────────

impl WarehouseStore for SqliteStore {
  type Error = Error;

  // ── Unit of work ──────────────────────────────────────────────────────────

  async fn begin(&self) -> Result<()> { self.execute_batch("BEGIN IMMEDIATE").await }

  async fn commit(&self) -> Result<()> { self.execute_batch("COMMIT").await }

  async fn rollback(&self) -> Result<()> { self.execute_batch("ROLLBACK").await }

  // ── Reference entities ────────────────────────────────────────────────────

  async fn get_or_create_sport(&self, code: String, name: String) -> Result<Sport> {
    let insert = (
      "INSERT INTO sports (sport_id, code, name, created_at) VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (code) DO NOTHING"
        .to_owned(),
      vec![Some(new_id()), Some(code.clone()), Some(name), Some(now_str())],
    );
    let select = format!("SELECT {SPORT_COLS} FROM sports WHERE code = ?1");

    self
      .insert_or_fetch("sport", vec![insert], select, vec![Some(code)], RawSport::read)
      .await?
      .into_sport()
  }

  async fn get_or_create_tour(&self, sport_id: Uuid, name: String) -> Result<Tour> {
    let sport = encode_uuid(sport_id);
    let insert = (
      "INSERT INTO tours (tour_id, sport_id, name, created_at) VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (sport_id, name) DO NOTHING"
        .to_owned(),
      vec![Some(new_id()), Some(sport.clone()), Some(name.clone()), Some(now_str())],
    );
    let select =
      format!("SELECT {TOUR_COLS} FROM tours WHERE sport_id = ?1 AND name = ?2");

    self
      .insert_or_fetch(
        "tour",
        vec![insert],
        select,
        vec![Some(sport), Some(name)],
        RawTour::read,
      )
      .await?
      .into_tour()
  }

  async fn get_or_create_tour_year(
    &self,
    sport_id: Uuid,
    tour_id:  Uuid,
    name:     String,
  ) -> Result<TourYear> {
    let sport = encode_uuid(sport_id);
    let tour  = encode_uuid(tour_id);
    let insert = (
      "INSERT INTO tour_years (tour_year_id, sport_id, tour_id, name, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT (sport_id, tour_id, name) DO NOTHING"
        .to_owned(),
      vec![
        Some(new_id()),
        Some(sport.clone()),
        Some(tour.clone()),
        Some(name.clone()),
        Some(now_str()),
      ],
    );
    let select = format!(
      "SELECT {TOUR_YEAR_COLS} FROM tour_years
       WHERE sport_id = ?1 AND tour_id = ?2 AND name = ?3"
    );

    self
      .insert_or_fetch(
        "tour_year",
        vec![insert],
        select,
        vec![Some(sport), Some(tour), Some(name)],
        RawTourYear::read,
      )
      .await?
      .into_tour_year()
  }

  async fn upsert_event(&self, input: NewEvent) -> Result<Event> {
    let sport = encode_uuid(input.sport_id);
    let now   = now_str();
    let insert = (
      "INSERT INTO events (
         event_id, sport_id, tour_year_id, name,
         start_date, end_date, venue, meta, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
       ON CONFLICT (sport_id, name)
       DO UPDATE SET meta = excluded.meta, updated_at = excluded.created_at"
        .to_owned(),
      vec![
        Some(new_id()),
        Some(sport.clone()),
        Some(encode_uuid(input.tour_year_id)),
        Some(input.name.clone()),
        input.start_date.map(encode_dt),
        input.end_date.map(encode_dt),
        input.venue,
        Some(encode_json(&input.meta)),
        Some(now),
      ],
    );
    let select =
      format!("SELECT {EVENT_COLS} FROM events WHERE sport_id = ?1 AND name = ?2");

    self
      .insert_or_fetch(
        "event",
        vec![insert],
        select,
        vec![Some(sport), Some(input.name)],
        RawEvent::read,
      )
      .await?
      .into_event()
  }

  async fn get_or_create_round(&self, code: String, name: String) -> Result<Round> {
    let insert = (
      "INSERT INTO rounds (round_id, code, name, created_at) VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (code) DO NOTHING"
        .to_owned(),
      vec![Some(new_id()), Some(code.clone()), Some(name), Some(now_str())],
    );
    let select = format!("SELECT {ROUND_COLS} FROM rounds WHERE code = ?1");

    self
      .insert_or_fetch("round", vec![insert], select, vec![Some(code)], RawRound::read)
      .await?
      .into_round()
  }

  async fn get_or_create_event_round(
    &self,
    sport_id:  Uuid,
    event_id:  Uuid,
    round_id:  Uuid,
    parent_id: Option<Uuid>,
  ) -> Result<EventRound> {
    let sport = encode_uuid(sport_id);
    let event = encode_uuid(event_id);
    let round = encode_uuid(round_id);
    let insert = (
      "INSERT INTO event_rounds (
         event_round_id, sport_id, event_id, round_id, parent_id, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT (sport_id, event_id, round_id) DO NOTHING"
        .to_owned(),
      vec![
        Some(new_id()),
        Some(sport.clone()),
        Some(event.clone()),
        Some(round.clone()),
        parent_id.map(encode_uuid),
        Some(now_str()),
      ],
    );
    let select = format!(
      "SELECT {EVENT_ROUND_COLS} FROM event_rounds
       WHERE sport_id = ?1 AND event_id = ?2 AND round_id = ?3"
    );

    self
      .insert_or_fetch(
        "event_round",
        vec![insert],
        select,
        vec![Some(sport), Some(event), Some(round)],
        RawEventRound::read,
      )
      .await?
      .into_event_round()
  }

  async fn get_or_create_team(&self, sport_id: Uuid, name: String) -> Result<Team> {
    let sport = encode_uuid(sport_id);
    let insert = (
      "INSERT INTO teams (team_id, sport_id, name, created_at) VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (sport_id, name) DO NOTHING"
        .to_owned(),
      vec![Some(new_id()), Some(sport.clone()), Some(name.clone()), Some(now_str())],
    );
    let select =
      format!("SELECT {TEAM_COLS} FROM teams WHERE sport_id = ?1 AND name = ?2");

    self
      .insert_or_fetch(
        "team",
        vec![insert],
        select,
        vec![Some(sport), Some(name)],
        RawTeam::read,
      )
      .await?
      .into_team()
  }

  async fn get_or_create_player(
    &self,
    sport_id: Uuid,
    name:     String,
    team_id:  Option<Uuid>,
  ) -> Result<Player> {
    let sport = encode_uuid(sport_id);
    let team  = team_id.map(encode_uuid);
    let insert = (
      "INSERT INTO players (player_id, sport_id, name, team_id, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT (sport_id, name) DO NOTHING"
        .to_owned(),
      vec![
        Some(new_id()),
        Some(sport.clone()),
        Some(name.clone()),
        team.clone(),
        Some(now_str()),
      ],
    );
    // Backfill: null → value only.
    let backfill = (
      "UPDATE players SET team_id = ?3
       WHERE sport_id = ?1 AND name = ?2 AND team_id IS NULL AND ?3 IS NOT NULL"
        .to_owned(),
      vec![Some(sport.clone()), Some(name.clone()), team],
    );
    let select =
      format!("SELECT {PLAYER_COLS} FROM players WHERE sport_id = ?1 AND name = ?2");

    self
      .insert_or_fetch(
        "player",
        vec![insert, backfill],
        select,
        vec![Some(sport), Some(name)],
        RawPlayer::read,
      )
      .await?
      .into_player()
  }

  async fn get_or_create_event_participant(
    &self,
    input: NewParticipant,
  ) -> Result<EventParticipant> {
    let sport  = encode_uuid(input.sport_id);
    let event  = encode_uuid(input.event_id);
    let player = encode_uuid(input.player_id);
    let team   = input.team_id.map(encode_uuid);
    let insert = (
      "INSERT INTO event_participants (
         event_participant_id, sport_id, event_id, player_id, team_id, role, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT (sport_id, event_id, player_id) DO NOTHING"
        .to_owned(),
      vec![
        Some(new_id()),
        Some(sport.clone()),
        Some(event.clone()),
        Some(player.clone()),
        team.clone(),
        Some(input.role.as_str().to_owned()),
        Some(now_str()),
      ],
    );
    let backfill = (
      "UPDATE event_participants SET team_id = ?4
       WHERE sport_id = ?1 AND event_id = ?2 AND player_id = ?3
         AND team_id IS NULL AND ?4 IS NOT NULL"
        .to_owned(),
      vec![Some(sport.clone()), Some(event.clone()), Some(player.clone()), team],
    );
    let select = format!(
      "SELECT {PARTICIPANT_COLS} FROM event_participants
       WHERE sport_id = ?1 AND event_id = ?2 AND player_id = ?3"
    );

    self
      .insert_or_fetch(
        "event_participant",
        vec![insert, backfill],
        select,
        vec![Some(sport), Some(event), Some(player)],
        RawParticipant::read,
      )
      .await?
      .into_participant()
  }

  async fn append_round_payload(&self, event_round_id: Uuid, payload: Value) -> Result<()> {
    let id_str = encode_uuid(event_round_id);

    let found = self
      .conn
      .call(move |conn| {
        let sp = conn.savepoint()?;
        let existing: Option<Option<String>> = sp
          .query_row(
            "SELECT meta FROM event_rounds WHERE event_round_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let Some(existing) = existing else {
          return Ok(false);
        };

        let meta = existing
          .as_deref()
          .map(serde_json::from_str::<Value>)
          .transpose()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
        let updated = with_race_payload(meta, payload);

        sp.execute(
          "UPDATE event_rounds SET meta = ?2 WHERE event_round_id = ?1",
          rusqlite::params![id_str, encode_json(&updated)],
        )?;
        sp.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::EventRoundNotFound(event_round_id));
    }
    Ok(())
  }

  // ── Scores (append-only) ─────────────────────────────────────────────

  async fn record_score(&self, input: NewScore) -> Result<Score> {
    let score = Score {
      score_id:             Uuid::new_v4(),
      sport_id:             input.sport_id,
      event_id:             input.event_id,
      event_round_id:       input.event_round_id,
      event_participant_id: input.event_participant_id,
      metric_key:           input.metric_key,
      metric_value:         input.metric_value,
      run_id:               input.run_id,
      recorded_at:          Utc::now(),
    };

    let score_id_str       = encode_uuid(score.score_id);
    let sport_id_str       = encode_uuid(score.sport_id);
    let event_id_str       = encode_uuid(score.event_id);
    let event_round_id_str = score.event_round_id.map(encode_uuid);
    let participant_str    = encode_uuid(score.event_participant_id);
    let metric_key_str     = score.metric_key.as_str().to_owned();
    let metric_value_str   = encode_json(&score.metric_value);
    let run_id_str         = encode_uuid(score.run_id);
    let recorded_at_str    = encode_dt(score.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO scores (
             score_id, sport_id, event_id, event_round_id, event_participant_id,
             metric_key, metric_value, run_id, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            score_id_str,
            sport_id_str,
            event_id_str,
            event_round_id_str,
            participant_str,
            metric_key_str,
            metric_value_str,
            run_id_str,
            recorded_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(score)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
    let select = format!("SELECT {EVENT_COLS} FROM events WHERE event_id = ?1");
    self
      .fetch_optional(select, vec![Some(encode_uuid(event_id))], RawEvent::read)
      .await?
      .map(RawEvent::into_event)
      .transpose()
  }

  async fn get_event_round(&self, event_round_id: Uuid) -> Result<Option<EventRound>> {
    let select =
      format!("SELECT {EVENT_ROUND_COLS} FROM event_rounds WHERE event_round_id = ?1");
    self
      .fetch_optional(
        select,
        vec![Some(encode_uuid(event_round_id))],
        RawEventRound::read,
      )
      .await?
      .map(RawEventRound::into_event_round)
      .transpose()
  }

  async fn list_scores(&self, query: &ScoreQuery) -> Result<Vec<Score>> {
    // Build WHERE clause dynamically; placeholders are numbered in push order.
    let mut conds: Vec<String> = Vec::new();
    let mut params: Vec<Option<String>> = Vec::new();
    if let Some(event_id) = query.event_id {
      params.push(Some(encode_uuid(event_id)));
      conds.push(format!("event_id = ?{}", params.len()));
    }
    if let Some(key) = &query.metric_key {
      params.push(Some(key.as_str().to_owned()));
      conds.push(format!("metric_key = ?{}", params.len()));
    }
    if let Some(run_id) = query.run_id {
      params.push(Some(encode_uuid(run_id)));
      conds.push(format!("run_id = ?{}", params.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let limit = query.limit.map(|n| n as i64).unwrap_or(-1);
    let sql = format!(
      "SELECT {SCORE_COLS} FROM scores {where_clause}
       ORDER BY recorded_at, rowid LIMIT {limit}"
    );

    let raws: Vec<RawScore> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawScore::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScore::into_score).collect()
  }

  async fn counts(&self) -> Result<TableCounts> {
    Ok(
      self
        .conn
        .call(|conn| {
          Ok(conn.query_row(
            "SELECT
               (SELECT COUNT(*) FROM sports),
               (SELECT COUNT(*) FROM tours),
               (SELECT COUNT(*) FROM tour_years),
               (SELECT COUNT(*) FROM events),
               (SELECT COUNT(*) FROM teams),
               (SELECT COUNT(*) FROM players),
               (SELECT COUNT(*) FROM rounds),
               (SELECT COUNT(*) FROM event_rounds),
               (SELECT COUNT(*) FROM event_participants),
               (SELECT COUNT(*) FROM scores)",
            [],
            |row| {
              Ok(TableCounts {
                sports:             count(row, 0)?,
                tours:              count(row, 1)?,
                tour_years:         count(row, 2)?,
                events:             count(row, 3)?,
                teams:              count(row, 4)?,
                players:            count(row, 5)?,
                rounds:             count(row, 6)?,
                event_rounds:       count(row, 7)?,
                event_participants: count(row, 8)?,
                scores:             count(row, 9)?,
              })
            },
          )?)
        })
        .await?,
    )
  }
}
