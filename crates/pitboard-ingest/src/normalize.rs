//! Participant name and team extraction from result rows.
//!
//! Upstream rows name the same person under many different keys. The
//! candidates are kept as ordered rule tables, so supporting a new alias
//! means adding a table entry.

use serde_json::{Map, Value};

use self::FieldRule::Key;

type Row = Map<String, Value>;

const FIRST_NAME_KEYS: &[&str] = &["FirstName", "first_name"];
const LAST_NAME_KEYS: &[&str] = &["LastName", "last_name"];

/// One way of deriving a text field from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
  /// The value under this exact key.
  Key(&'static str),
  /// A first and a last name joined by a space; either half may be missing.
  FirstLast {
    first: &'static [&'static str],
    last:  &'static [&'static str],
  },
}

const FIRST_LAST: FieldRule = FieldRule::FirstLast {
  first: FIRST_NAME_KEYS,
  last:  LAST_NAME_KEYS,
};

pub const DRIVER_NAME_RULES: &[FieldRule] = &[
  Key("name"),
  Key("rider"),
  Key("driver"),
  Key("display_name"),
  Key("Rider"),
  Key("Driver"),
  Key("name_display"),
  FIRST_LAST,
];

pub const DRIVER_TEAM_RULES: &[FieldRule] = &[
  Key("team"),
  Key("Team"),
  Key("manufacturer"),
  Key("Manufacturer"),
  Key("bike"),
  Key("Bike"),
];

pub const ROW_NAME_RULES: &[FieldRule] = &[
  Key("rider"),
  Key("driver"),
  Key("name"),
  Key("racer"),
  Key("athlete"),
  Key("Rider"),
  Key("Driver"),
  Key("Name"),
  Key("RiderName"),
  Key("rider_name"),
  FIRST_LAST,
];

pub const ROW_TEAM_RULES: &[FieldRule] = &[
  Key("team"),
  Key("Team"),
  Key("team_name"),
  Key("TeamName"),
  Key("constructor"),
  Key("manufacturer"),
  Key("Manufacturer"),
  Key("bike"),
  Key("Bike"),
];

impl FieldRule {
  pub fn apply(&self, row: &Row) -> Option<String> {
    match self {
      Self::Key(key) => row.get(*key).and_then(text),
      Self::FirstLast { first, last } => {
        let first = first_text(row, first);
        let last = first_text(row, last);
        if first.is_none() && last.is_none() {
          return None;
        }
        let joined = format!(
          "{} {}",
          first.unwrap_or_default(),
          last.unwrap_or_default()
        );
        non_empty(joined.trim())
      }
    }
  }
}

/// The first rule in `rules` that yields a value.
pub fn apply_rules(row: &Row, rules: &[FieldRule]) -> Option<String> {
  rules.iter().find_map(|rule| rule.apply(row))
}

fn first_text(row: &Row, keys: &[&str]) -> Option<String> {
  keys.iter().find_map(|key| row.get(*key).and_then(text))
}

/// Strings are trimmed and must stay non-empty; non-zero numbers are
/// rendered as written. Everything else carries no text.
fn text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => non_empty(s.trim()),
    Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
    _ => None,
  }
}

fn non_empty(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_owned())
}

// ─── Row shapes ──────────────────────────────────────────────────────────────

/// Which of the two race-result shapes a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
  /// An entry of `race.drivers`, carrying its own laps.
  Driver,
  /// One row of a flat result list.
  Flat,
}

impl RowShape {
  pub fn name_rules(self) -> &'static [FieldRule] {
    match self {
      Self::Driver => DRIVER_NAME_RULES,
      Self::Flat => ROW_NAME_RULES,
    }
  }

  pub fn team_rules(self) -> &'static [FieldRule] {
    match self {
      Self::Driver => DRIVER_TEAM_RULES,
      Self::Flat => ROW_TEAM_RULES,
    }
  }
}

/// Who a row is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub name: String,
  pub team: Option<String>,
}

/// Extract the participant of `row`, or `None` when no name can be derived.
pub fn extract_identity(row: &Row, shape: RowShape) -> Option<Identity> {
  let name = apply_rules(row, shape.name_rules())?;
  let team = apply_rules(row, shape.team_rules());
  Some(Identity { name, team })
}
