//! Reading the event-level facts out of an event-detail payload.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Sport codes ─────────────────────────────────────────────────────────────

/// The disciplines the upstream results service covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportCode {
  Sx,
  Mx,
  Smx,
}

impl SportCode {
  pub const ALL: [Self; 3] = [Self::Sx, Self::Mx, Self::Smx];

  pub fn code(self) -> &'static str {
    match self {
      Self::Sx => "sx",
      Self::Mx => "mx",
      Self::Smx => "smx",
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Self::Sx => "Supercross",
      Self::Mx => "Motocross",
      Self::Smx => "SuperMotocross",
    }
  }

  /// Map the payload's `domain_config` onto a discipline.
  pub fn from_domain_config(domain: &str) -> Option<Self> {
    match domain.trim().to_lowercase().as_str() {
      "sx" | "supercross" => Some(Self::Sx),
      "mx" | "motocross" => Some(Self::Mx),
      "smx" | "supermotocross" | "super moto cross" => Some(Self::Smx),
      _ => None,
    }
  }
}

impl fmt::Display for SportCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// Event-level facts derived from an event-detail payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
  pub sport:      SportCode,
  pub name:       String,
  /// Season label, e.g. `"2025"`, or `"Unknown"`.
  pub season:     String,
  pub venue:      Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
}

pub const UNKNOWN_SEASON: &str = "Unknown";

impl EventDescriptor {
  pub fn from_payload(event_id: i64, payload: &Value) -> Self {
    let event = payload.get("event");
    let event_str = |key: &str| {
      event
        .and_then(|e| e.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    };

    let sport = payload
      .get("domain_config")
      .and_then(Value::as_str)
      .and_then(SportCode::from_domain_config)
      .unwrap_or(SportCode::Smx);

    let name = ["event_name", "name"]
      .iter()
      .find_map(|key| {
        payload
          .get(*key)
          .and_then(Value::as_str)
          .map(str::trim)
          .filter(|s| !s.is_empty())
      })
      .map_or_else(|| format!("Event {event_id}"), str::to_owned);

    let season = event_str("start_date_time")
      .or_else(|| event_str("start_date_time_display"))
      .and_then(season_prefix)
      .or_else(|| session_season(payload))
      .unwrap_or(UNKNOWN_SEASON)
      .to_owned();

    let venue = event_str("track_name")
      .or_else(|| event_str("venue"))
      .map(|s| s.trim().to_owned());

    Self {
      sport,
      name,
      season,
      venue,
      start_date: event_str("start_date_time").and_then(parse_timestamp),
      end_date: event_str("end_date_time").and_then(parse_timestamp),
    }
  }

  pub fn tour_name(&self) -> String {
    format!("{} Tour", self.sport.display_name())
  }
}

fn session_season(payload: &Value) -> Option<&str> {
  payload
    .get("sessions")?
    .as_array()?
    .iter()
    .filter_map(|s| s.get("start_date_time").and_then(Value::as_str))
    .find_map(season_prefix)
}

/// The leading four-digit year of a timestamp string.
fn season_prefix(s: &str) -> Option<&str> {
  s.get(..4).filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse the upstream `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DD` form as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| {
      NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
    .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};
  use serde_json::json;

  use super::*;

  #[test]
  fn domain_config_maps_to_sport() {
    assert_eq!(SportCode::from_domain_config(" SuperCross "), Some(SportCode::Sx));
    assert_eq!(SportCode::from_domain_config("motocross"), Some(SportCode::Mx));
    assert_eq!(
      SportCode::from_domain_config("Super Moto Cross"),
      Some(SportCode::Smx)
    );
    assert_eq!(SportCode::from_domain_config("enduro"), None);
  }

  #[test]
  fn full_payload() {
    let payload = json!({
      "domain_config": "sx",
      "event_name": "Anaheim 1",
      "event": {
        "start_date_time": "2025-01-11 19:00",
        "end_date_time": "2025-01-11",
        "track_name": "Angel Stadium",
        "venue": "ignored",
      },
    });
    let d = EventDescriptor::from_payload(1, &payload);

    assert_eq!(d.sport, SportCode::Sx);
    assert_eq!(d.name, "Anaheim 1");
    assert_eq!(d.tour_name(), "Supercross Tour");
    assert_eq!(d.season, "2025");
    assert_eq!(d.venue.as_deref(), Some("Angel Stadium"));
    let start = d.start_date.unwrap();
    assert_eq!((start.year(), start.hour()), (2025, 19));
    assert_eq!(d.end_date.unwrap().day(), 11);
  }

  #[test]
  fn blank_event_name_falls_through_to_name() {
    let d = EventDescriptor::from_payload(9, &json!({"event_name": "", "name": "Anaheim 1"}));
    assert_eq!(d.name, "Anaheim 1");
    let d = EventDescriptor::from_payload(9, &json!({"event_name": "  ", "name": " Houston "}));
    assert_eq!(d.name, "Houston");
    let d = EventDescriptor::from_payload(9, &json!({"event_name": " ", "name": ""}));
    assert_eq!(d.name, "Event 9");
  }

  #[test]
  fn sparse_payload_falls_back() {
    let d = EventDescriptor::from_payload(477866, &json!({"domain_config": "rally"}));
    assert_eq!(d.sport, SportCode::Smx);
    assert_eq!(d.name, "Event 477866");
    assert_eq!(d.tour_name(), "SuperMotocross Tour");
    assert_eq!(d.season, UNKNOWN_SEASON);
    assert_eq!(d.venue, None);
    assert_eq!(d.start_date, None);
  }

  #[test]
  fn season_from_sessions() {
    let payload = json!({
      "name": "Pro Motocross Round 3",
      "event": {"start_date_time": "TBD"},
      "sessions": [{"start_date_time": null}, {"start_date_time": "2024-06-01 10:00"}],
    });
    let d = EventDescriptor::from_payload(2, &payload);
    assert_eq!(d.name, "Pro Motocross Round 3");
    assert_eq!(d.season, "2024");
    assert_eq!(d.start_date, None);
  }

  #[test]
  fn display_date_supplies_season_only() {
    let payload = json!({"event": {"start_date_time_display": "2023 season opener"}});
    let d = EventDescriptor::from_payload(3, &payload);
    assert_eq!(d.season, "2023");
    assert_eq!(d.start_date, None);
  }

  #[test]
  fn timestamp_forms() {
    assert!(parse_timestamp("2025-08-16 00:00:30").is_some());
    assert!(parse_timestamp("2025-08-16 00:00").is_some());
    assert!(parse_timestamp("2025-08-16").is_some());
    assert!(parse_timestamp("16/08/2025").is_none());
  }
}
