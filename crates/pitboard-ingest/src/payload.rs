//! Structure inference over upstream payloads.
//!
//! The results API has no published schema, and the same endpoint returns
//! differently shaped trees from one event to the next. Everything here is
//! a pure function over [`serde_json::Value`]; maps are visited in source
//! order (the workspace enables `serde_json/preserve_order`).

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Top-level keys that hold a flat result list, tried in order.
pub const RESULT_LIST_KEYS: &[&str] =
  &["results", "racers", "rows", "data", "positions", "Results", "Rows"];

/// Keys (compared case-insensitively) whose values are race identifiers.
pub const RACE_ID_KEYS: &[&str] = &["race_id", "result_id"];

/// The first list of records in a depth-first walk of `node`.
///
/// A list of records is an array whose first element is an object. Object
/// values are walked in source order and array elements by index; the first
/// match wins, so the result is fully determined by the input.
pub fn find_record_list(node: &Value) -> Option<&[Value]> {
  match node {
    Value::Array(items) if is_record_list(items) => Some(items),
    Value::Array(items) => items.iter().find_map(find_record_list),
    Value::Object(map) => map.values().find_map(find_record_list),
    _ => None,
  }
}

fn is_record_list(items: &[Value]) -> bool {
  matches!(items.first(), Some(Value::Object(_)))
}

/// Every race id reachable from an event payload, deduplicated and sorted.
///
/// Any object key equal to `race_id` or `result_id` (ignoring ASCII case)
/// contributes its value when that value reads as an integer; other values
/// are ignored.
pub fn extract_race_ids(payload: &Value) -> Vec<i64> {
  let mut ids = BTreeSet::new();
  collect_race_ids(payload, &mut ids);
  ids.into_iter().collect()
}

fn collect_race_ids(node: &Value, ids: &mut BTreeSet<i64>) {
  match node {
    Value::Object(map) => {
      for (key, value) in map {
        if RACE_ID_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) {
          if let Some(id) = coerce_id(value) {
            ids.insert(id);
          }
        }
        collect_race_ids(value, ids);
      }
    }
    Value::Array(items) => {
      for item in items {
        collect_race_ids(item, ids);
      }
    }
    _ => {}
  }
}

/// Read an identifier out of a JSON scalar.
///
/// Integers pass through, finite floats are truncated and strings are
/// parsed after trimming. Booleans, nulls and containers yield `None`.
pub fn coerce_id(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
      .or_else(|| {
        n.as_f64()
          .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
          .map(|f| f.trunc() as i64)
      }),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// The flat result rows of a race payload.
///
/// A known result-list key at the top level wins when it holds a list of
/// records; otherwise the first list of records anywhere in the payload.
pub fn result_rows(payload: &Value) -> Option<&[Value]> {
  RESULT_LIST_KEYS
    .iter()
    .find_map(|key| match payload.get(*key) {
      Some(Value::Array(items)) if is_record_list(items) => {
        Some(items.as_slice())
      }
      _ => None,
    })
    .or_else(|| find_record_list(payload))
}

/// The per-driver objects under `race.drivers`, in source order.
///
/// `drivers` may be an object keyed by driver id or an array. Entries that
/// are not objects are dropped. Returns an empty list when the payload has
/// no driver-object section.
pub fn driver_objects(payload: &Value) -> Vec<&Map<String, Value>> {
  match payload.get("race").and_then(|race| race.get("drivers")) {
    Some(Value::Object(drivers)) => {
      drivers.values().filter_map(Value::as_object).collect()
    }
    Some(Value::Array(drivers)) => {
      drivers.iter().filter_map(Value::as_object).collect()
    }
    _ => Vec::new(),
  }
}

/// The lap entries of one driver object. Non-object laps are dropped.
pub fn driver_laps(driver: &Map<String, Value>) -> Vec<&Map<String, Value>> {
  match driver.get("laps") {
    Some(Value::Array(laps)) => laps.iter().filter_map(Value::as_object).collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn locator_skips_scalar_lists() {
    let tree = json!({"a": {"b": [1, 2, 3]}, "c": [{"x": 1}, {"x": 2}]});
    assert_eq!(find_record_list(&tree), Some(&[json!({"x": 1}), json!({"x": 2})][..]));
  }

  #[test]
  fn locator_descends_into_arrays() {
    let tree = json!([[], [0, [{"deep": true}]], [{"late": true}]]);
    assert_eq!(find_record_list(&tree), Some(&[json!({"deep": true})][..]));
  }

  #[test]
  fn locator_finds_nothing_in_scalars() {
    assert_eq!(find_record_list(&json!({"a": [1, [2]], "b": "c"})), None);
    assert_eq!(find_record_list(&json!(null)), None);
  }

  #[test]
  fn race_ids_are_deduplicated_and_sorted() {
    let payload = json!({
      "race_id": "42",
      "sessions": [{"races": [{"result_id": 43}, {"Race_ID": 42}]}],
    });
    assert_eq!(extract_race_ids(&payload), vec![42, 43]);
  }

  #[test]
  fn unreadable_race_ids_are_ignored() {
    let payload = json!({
      "race_id": "soon",
      "x": {"RESULT_ID": null, "race_id": true},
      "y": [{"result_id": " 7 "}, {"result_id": 8.9}],
    });
    assert_eq!(extract_race_ids(&payload), vec![7, 8]);
  }

  #[test]
  fn race_id_container_values_are_still_searched() {
    let payload = json!({"race_id": {"result_id": 5}});
    assert_eq!(extract_race_ids(&payload), vec![5]);
  }

  #[test]
  fn known_result_key_beats_locator() {
    let payload = json!({
      "meta": [{"not": "a result"}],
      "rows": [{"rider": "A"}],
    });
    assert_eq!(result_rows(&payload), Some(&[json!({"rider": "A"})][..]));
  }

  #[test]
  fn known_result_key_must_hold_records() {
    let payload = json!({"results": [], "nested": {"list": [{"rider": "B"}]}});
    assert_eq!(result_rows(&payload), Some(&[json!({"rider": "B"})][..]));
  }

  #[test]
  fn drivers_accept_map_or_list() {
    let map = json!({"race": {"drivers": {"7": {"name": "A"}, "9": 3, "1": {"name": "B"}}}});
    let names: Vec<_> = driver_objects(&map).iter().map(|d| d["name"].clone()).collect();
    assert_eq!(names, vec![json!("A"), json!("B")]);

    let list = json!({"race": {"drivers": [{"name": "C"}, "x"]}});
    assert_eq!(driver_objects(&list).len(), 1);

    assert!(driver_objects(&json!({"race": {}})).is_empty());
  }

  #[test]
  fn non_object_laps_are_dropped() {
    let driver = json!({"laps": [{"pos": 2}, 5, null, {"pos": 1}]});
    let laps = driver_laps(driver.as_object().unwrap());
    assert_eq!(laps.len(), 2);
  }
}
