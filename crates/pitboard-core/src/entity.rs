//! Reference entities of the results warehouse.
//!
//! Every type here except [`crate::score::Score`] is identified by a natural
//! key. Surrogate UUIDs exist so that rows can reference each other; they are
//! never used to decide whether a row already exists.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Sport hierarchy ─────────────────────────────────────────────────────────

/// A discipline (supercross, motocross, ...). Natural key: `code`, globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sport {
  pub sport_id:   Uuid,
  pub code:       String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A championship series. Natural key: `(sport, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
  pub tour_id:    Uuid,
  pub sport_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// One season of a tour. Natural key: `(sport, tour, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourYear {
  pub tour_year_id: Uuid,
  pub sport_id:     Uuid,
  pub tour_id:      Uuid,
  /// Season label, e.g. `"2025"`.
  pub name:         String,
  pub created_at:   DateTime<Utc>,
}

/// One competition instance. Natural key: `(sport, name)`.
///
/// `meta` holds the raw event-detail payload and is overwritten wholesale on
/// every re-ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:     Uuid,
  pub sport_id:     Uuid,
  pub tour_year_id: Uuid,
  pub name:         String,
  pub start_date:   Option<DateTime<Utc>>,
  pub end_date:     Option<DateTime<Utc>>,
  pub venue:        Option<String>,
  pub meta:         serde_json::Value,
  pub created_at:   DateTime<Utc>,
}

// ─── Competitors ─────────────────────────────────────────────────────────────

/// A team or manufacturer. Natural key: `(sport, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub team_id:    Uuid,
  pub sport_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A rider. Natural key: `(sport, name)`.
///
/// `team_id` may be backfilled once (null → value) but is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
  pub player_id:  Uuid,
  pub sport_id:   Uuid,
  pub name:       String,
  pub team_id:    Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

// ─── Rounds ──────────────────────────────────────────────────────────────────

/// A category of competitive session. Natural key: `code`, shared by all
/// sports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
  pub round_id:   Uuid,
  /// e.g. `PRACTICE`, `QUALIFYING`, `RACE`.
  pub code:       String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A [`Round`] instance scoped to one [`Event`], optionally nested under a
/// parent event round. Natural key: `(sport, event, round)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRound {
  pub event_round_id: Uuid,
  pub sport_id:       Uuid,
  pub event_id:       Uuid,
  pub round_id:       Uuid,
  pub parent_id:      Option<Uuid>,
  /// Free-form metadata; the raw-payload capture lives under
  /// `race_payloads`.
  pub meta:           Option<serde_json::Value>,
  pub created_at:     DateTime<Utc>,
}

// ─── Participation ───────────────────────────────────────────────────────────

/// The capacity in which a participant entered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
  #[default]
  Driver,
  Team,
  Player,
}

impl ParticipantRole {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Driver => "driver",
      Self::Team => "team",
      Self::Player => "player",
    }
  }
}

impl fmt::Display for ParticipantRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ParticipantRole {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "driver" => Ok(Self::Driver),
      "team" => Ok(Self::Team),
      "player" => Ok(Self::Player),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A player entered into an event. Natural key: `(sport, event, player)`.
///
/// `team_id` follows the same backfill-once rule as [`Player::team_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParticipant {
  pub event_participant_id: Uuid,
  pub sport_id:             Uuid,
  pub event_id:             Uuid,
  pub player_id:            Uuid,
  pub team_id:              Option<Uuid>,
  pub role:                 ParticipantRole,
  pub created_at:           DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_its_own_display() {
    for role in [
      ParticipantRole::Driver,
      ParticipantRole::Team,
      ParticipantRole::Player,
    ] {
      assert_eq!(role.to_string().parse::<ParticipantRole>().unwrap(), role);
    }
  }

  #[test]
  fn unknown_role_is_rejected() {
    let err = "pit crew".parse::<ParticipantRole>().unwrap_err();
    assert!(matches!(err, Error::UnknownRole(r) if r == "pit crew"));
  }
}
