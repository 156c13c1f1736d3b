//! Property tests for payload structure inference over generated JSON trees.

use std::collections::BTreeSet;

use pitboard_ingest::payload::{extract_race_ids, find_record_list};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
  prop_oneof![
    Just(Value::Null),
    any::<bool>().prop_map(Value::Bool),
    any::<i64>().prop_map(Value::from),
    "[a-z0-9 ]{0,8}".prop_map(Value::from),
  ]
}

fn key() -> impl Strategy<Value = String> {
  prop_oneof![
    "[a-z]{1,6}",
    Just("race_id".to_owned()),
    Just("RESULT_ID".to_owned()),
    Just("Race_Id".to_owned()),
  ]
}

fn tree() -> impl Strategy<Value = Value> {
  scalar().prop_recursive(4, 64, 6, |inner| {
    prop_oneof![
      prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
      prop::collection::vec((key(), inner), 0..6)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
    ]
  })
}

/// Reference walk: every array that is a record list, in depth-first order.
fn record_lists(node: &Value, out: &mut Vec<Vec<Value>>) {
  match node {
    Value::Array(items) => {
      if matches!(items.first(), Some(Value::Object(_))) {
        out.push(items.clone());
      }
      items.iter().for_each(|item| record_lists(item, out));
    }
    Value::Object(map) => map.values().for_each(|v| record_lists(v, out)),
    _ => {}
  }
}

fn is_race_key(key: &str) -> bool {
  let key = key.to_ascii_lowercase();
  key == "race_id" || key == "result_id"
}

proptest! {
  #[test]
  fn locator_returns_first_record_list(tree in tree()) {
    let mut all = Vec::new();
    record_lists(&tree, &mut all);
    let found = find_record_list(&tree).map(<[Value]>::to_vec);
    prop_assert_eq!(found, all.into_iter().next());
  }

  #[test]
  fn locator_result_starts_with_object(tree in tree()) {
    if let Some(list) = find_record_list(&tree) {
      prop_assert!(list[0].is_object());
    }
  }

  #[test]
  fn race_ids_are_sorted_and_unique(tree in tree()) {
    let ids = extract_race_ids(&tree);
    prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn planted_ids_are_found(tree in tree(), ids in prop::collection::vec(any::<i64>(), 1..5)) {
    let planted: Vec<Value> = ids
      .iter()
      .enumerate()
      .map(|(i, id)| {
        let key = if i % 2 == 0 { "race_id" } else { "Result_Id" };
        let value = if i % 3 == 0 { Value::from(id.to_string()) } else { Value::from(*id) };
        let mut record = Map::new();
        record.insert(key.to_owned(), value);
        serde_json::json!({ "wrapper": [record] })
      })
      .collect();
    let payload = serde_json::json!({ "tree": tree, "planted": planted });

    let found: BTreeSet<i64> = extract_race_ids(&payload).into_iter().collect();
    for id in &ids {
      prop_assert!(found.contains(id));
    }
  }

  #[test]
  fn trees_without_race_keys_have_no_ids(tree in tree()) {
    fn has_race_key(node: &Value) -> bool {
      match node {
        Value::Object(map) => map.iter().any(|(k, v)| is_race_key(k) || has_race_key(v)),
        Value::Array(items) => items.iter().any(has_race_key),
        _ => false,
      }
    }
    if !has_race_key(&tree) {
      prop_assert!(extract_race_ids(&tree).is_empty());
    }
  }
}
