//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. JSON blobs are stored as
//! compact JSON text. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use pitboard_core::{
  entity::{
    Event, EventParticipant, EventRound, Player, Round, Sport, Team, Tour,
    TourYear,
  },
  score::Score,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── JSON ────────────────────────────────────────────────────────────────────

pub fn encode_json(v: &serde_json::Value) -> String { v.to_string() }

pub fn decode_json(s: &str) -> Result<serde_json::Value> {
  Ok(serde_json::from_str(s)?)
}

// ─── Column lists ────────────────────────────────────────────────────────────
//
// Each list matches the field order read by the corresponding `Raw*::read`.

pub const SPORT_COLS: &str = "sport_id, code, name, created_at";
pub const TOUR_COLS: &str = "tour_id, sport_id, name, created_at";
pub const TOUR_YEAR_COLS: &str =
  "tour_year_id, sport_id, tour_id, name, created_at";
pub const EVENT_COLS: &str = "event_id, sport_id, tour_year_id, name, \
                              start_date, end_date, venue, meta, created_at";
pub const TEAM_COLS: &str = "team_id, sport_id, name, created_at";
pub const PLAYER_COLS: &str = "player_id, sport_id, name, team_id, created_at";
pub const ROUND_COLS: &str = "round_id, code, name, created_at";
pub const EVENT_ROUND_COLS: &str =
  "event_round_id, sport_id, event_id, round_id, parent_id, meta, created_at";
pub const PARTICIPANT_COLS: &str = "event_participant_id, sport_id, event_id, \
                                    player_id, team_id, role, created_at";
pub const SCORE_COLS: &str = "score_id, sport_id, event_id, event_round_id, \
                              event_participant_id, metric_key, metric_value, \
                              run_id, recorded_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sports` row.
pub struct RawSport {
  pub sport_id:   String,
  pub code:       String,
  pub name:       String,
  pub created_at: String,
}

impl RawSport {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sport_id:   row.get(0)?,
      code:       row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_sport(self) -> Result<Sport> {
    Ok(Sport {
      sport_id:   decode_uuid(&self.sport_id)?,
      code:       self.code,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `tours` row.
pub struct RawTour {
  pub tour_id:    String,
  pub sport_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawTour {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tour_id:    row.get(0)?,
      sport_id:   row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_tour(self) -> Result<Tour> {
    Ok(Tour {
      tour_id:    decode_uuid(&self.tour_id)?,
      sport_id:   decode_uuid(&self.sport_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `tour_years` row.
pub struct RawTourYear {
  pub tour_year_id: String,
  pub sport_id:     String,
  pub tour_id:      String,
  pub name:         String,
  pub created_at:   String,
}

impl RawTourYear {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tour_year_id: row.get(0)?,
      sport_id:     row.get(1)?,
      tour_id:      row.get(2)?,
      name:         row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_tour_year(self) -> Result<TourYear> {
    Ok(TourYear {
      tour_year_id: decode_uuid(&self.tour_year_id)?,
      sport_id:     decode_uuid(&self.sport_id)?,
      tour_id:      decode_uuid(&self.tour_id)?,
      name:         self.name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:     String,
  pub sport_id:     String,
  pub tour_year_id: String,
  pub name:         String,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub venue:        Option<String>,
  pub meta:         String,
  pub created_at:   String,
}

impl RawEvent {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:     row.get(0)?,
      sport_id:     row.get(1)?,
      tour_year_id: row.get(2)?,
      name:         row.get(3)?,
      start_date:   row.get(4)?,
      end_date:     row.get(5)?,
      venue:        row.get(6)?,
      meta:         row.get(7)?,
      created_at:   row.get(8)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:     decode_uuid(&self.event_id)?,
      sport_id:     decode_uuid(&self.sport_id)?,
      tour_year_id: decode_uuid(&self.tour_year_id)?,
      name:         self.name,
      start_date:   decode_opt_dt(self.start_date)?,
      end_date:     decode_opt_dt(self.end_date)?,
      venue:        self.venue,
      meta:         decode_json(&self.meta)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `teams` row.
pub struct RawTeam {
  pub team_id:    String,
  pub sport_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawTeam {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      team_id:    row.get(0)?,
      sport_id:   row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      team_id:    decode_uuid(&self.team_id)?,
      sport_id:   decode_uuid(&self.sport_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `players` row.
pub struct RawPlayer {
  pub player_id:  String,
  pub sport_id:   String,
  pub name:       String,
  pub team_id:    Option<String>,
  pub created_at: String,
}

impl RawPlayer {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:  row.get(0)?,
      sport_id:   row.get(1)?,
      name:       row.get(2)?,
      team_id:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_player(self) -> Result<Player> {
    Ok(Player {
      player_id:  decode_uuid(&self.player_id)?,
      sport_id:   decode_uuid(&self.sport_id)?,
      name:       self.name,
      team_id:    decode_opt_uuid(self.team_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `rounds` row.
pub struct RawRound {
  pub round_id:   String,
  pub code:       String,
  pub name:       String,
  pub created_at: String,
}

impl RawRound {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:   row.get(0)?,
      code:       row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_round(self) -> Result<Round> {
    Ok(Round {
      round_id:   decode_uuid(&self.round_id)?,
      code:       self.code,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `event_rounds` row.
pub struct RawEventRound {
  pub event_round_id: String,
  pub sport_id:       String,
  pub event_id:       String,
  pub round_id:       String,
  pub parent_id:      Option<String>,
  pub meta:           Option<String>,
  pub created_at:     String,
}

impl RawEventRound {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_round_id: row.get(0)?,
      sport_id:       row.get(1)?,
      event_id:       row.get(2)?,
      round_id:       row.get(3)?,
      parent_id:      row.get(4)?,
      meta:           row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_event_round(self) -> Result<EventRound> {
    Ok(EventRound {
      event_round_id: decode_uuid(&self.event_round_id)?,
      sport_id:       decode_uuid(&self.sport_id)?,
      event_id:       decode_uuid(&self.event_id)?,
      round_id:       decode_uuid(&self.round_id)?,
      parent_id:      decode_opt_uuid(self.parent_id)?,
      meta:           self.meta.as_deref().map(decode_json).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `event_participants` row.
pub struct RawParticipant {
  pub event_participant_id: String,
  pub sport_id:             String,
  pub event_id:             String,
  pub player_id:            String,
  pub team_id:              Option<String>,
  pub role:                 String,
  pub created_at:           String,
}

impl RawParticipant {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_participant_id: row.get(0)?,
      sport_id:             row.get(1)?,
      event_id:             row.get(2)?,
      player_id:            row.get(3)?,
      team_id:              row.get(4)?,
      role:                 row.get(5)?,
      created_at:           row.get(6)?,
    })
  }

  pub fn into_participant(self) -> Result<EventParticipant> {
    Ok(EventParticipant {
      event_participant_id: decode_uuid(&self.event_participant_id)?,
      sport_id:             decode_uuid(&self.sport_id)?,
      event_id:             decode_uuid(&self.event_id)?,
      player_id:            decode_uuid(&self.player_id)?,
      team_id:              decode_opt_uuid(self.team_id)?,
      role:                 self.role.parse()?,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `scores` row.
pub struct RawScore {
  pub score_id:             String,
  pub sport_id:             String,
  pub event_id:             String,
  pub event_round_id:       Option<String>,
  pub event_participant_id: String,
  pub metric_key:           String,
  pub metric_value:         String,
  pub run_id:               String,
  pub recorded_at:          String,
}

impl RawScore {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      score_id:             row.get(0)?,
      sport_id:             row.get(1)?,
      event_id:             row.get(2)?,
      event_round_id:       row.get(3)?,
      event_participant_id: row.get(4)?,
      metric_key:           row.get(5)?,
      metric_value:         row.get(6)?,
      run_id:               row.get(7)?,
      recorded_at:          row.get(8)?,
    })
  }

  pub fn into_score(self) -> Result<Score> {
    Ok(Score {
      score_id:             decode_uuid(&self.score_id)?,
      sport_id:             decode_uuid(&self.sport_id)?,
      event_id:             decode_uuid(&self.event_id)?,
      event_round_id:       decode_opt_uuid(self.event_round_id)?,
      event_participant_id: decode_uuid(&self.event_participant_id)?,
      metric_key:           self.metric_key.parse()?,
      metric_value:         decode_json(&self.metric_value)?,
      run_id:               decode_uuid(&self.run_id)?,
      recorded_at:          decode_dt(&self.recorded_at)?,
    })
  }
}
