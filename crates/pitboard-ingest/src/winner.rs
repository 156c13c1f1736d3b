//! Race winner derivation from lap positions.

use serde_json::{Map, Value};

/// Position carried by one lap entry.
///
/// Reads `pos`, falling back to `position` when `pos` is missing, null,
/// empty or zero. Accepts integers and strings holding an integer.
pub fn lap_position(lap: &Map<String, Value>) -> Option<i64> {
  let raw = lap
    .get("pos")
    .filter(|v| is_set(v))
    .or_else(|| lap.get("position"))?;
  parse_position(raw)
}

fn is_set(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.is_empty(),
    Value::Number(n) => n.as_f64() != Some(0.0),
    Value::Bool(b) => *b,
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

fn parse_position(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// The last readable lap position in `laps`, i.e. the finishing position.
pub fn final_position<'a, I>(laps: I) -> Option<i64>
where
  I: IntoIterator<Item = &'a Map<String, Value>>,
{
  laps
    .into_iter()
    .fold(None, |running, lap| lap_position(lap).or(running))
}

/// Tracks which driver of a race finished first.
///
/// Drivers are observed in payload order. When several finish at position 1
/// the last one observed is kept and [`contested`](Self::contested) reports
/// how many did.
#[derive(Debug)]
pub struct WinnerTracker<T> {
  winner:  Option<T>,
  at_pole: usize,
}

impl<T> Default for WinnerTracker<T> {
  fn default() -> Self { Self { winner: None, at_pole: 0 } }
}

impl<T> WinnerTracker<T> {
  pub fn observe(&mut self, final_pos: Option<i64>, candidate: T) {
    if final_pos == Some(1) {
      self.at_pole += 1;
      self.winner = Some(candidate);
    }
  }

  /// Number of drivers seen at position 1 when that is more than one.
  pub fn contested(&self) -> Option<usize> {
    (self.at_pole > 1).then_some(self.at_pole)
  }

  pub fn into_winner(self) -> Option<T> { self.winner }
}
