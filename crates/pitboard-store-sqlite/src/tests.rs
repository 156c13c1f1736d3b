//! Integration tests for `SqliteStore` against an in-memory database.

use pitboard_core::{
  entity::{ParticipantRole, Sport},
  score::{MetricKey, NewScore, ScoreQuery},
  store::{NewEvent, NewParticipant, WarehouseStore},
};
use serde_json::json;
use uuid::Uuid;

use crate::{store::with_race_payload, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn sport(s: &SqliteStore) -> Sport {
  s.get_or_create_sport("sx".into(), "Supercross".into())
    .await
    .unwrap()
}

fn new_event(sport_id: Uuid, tour_year_id: Uuid, meta: serde_json::Value) -> NewEvent {
  NewEvent {
    sport_id,
    tour_year_id,
    name: "Anaheim 1".into(),
    start_date: None,
    end_date: None,
    venue: Some("Angel Stadium".into()),
    meta,
  }
}

/// Sport → tour → season → event, ready for rounds and participants.
async fn event_fixture(s: &SqliteStore) -> (Uuid, Uuid) {
  let sport = sport(s).await;
  let tour = s
    .get_or_create_tour(sport.sport_id, "Supercross Tour".into())
    .await
    .unwrap();
  let year = s
    .get_or_create_tour_year(sport.sport_id, tour.tour_id, "2025".into())
    .await
    .unwrap();
  let event = s
    .upsert_event(new_event(sport.sport_id, year.tour_year_id, json!({})))
    .await
    .unwrap();
  (sport.sport_id, event.event_id)
}

// ─── Natural keys ────────────────────────────────────────────────────────────

#[tokio::test]
async fn sport_get_or_create_is_idempotent() {
  let s = store().await;

  let first = sport(&s).await;
  let second = s
    .get_or_create_sport("sx".into(), "Ignored Name".into())
    .await
    .unwrap();

  assert_eq!(first.sport_id, second.sport_id);
  assert_eq!(second.name, "Supercross");
  assert_eq!(s.counts().await.unwrap().sports, 1);
}

#[tokio::test]
async fn tour_is_scoped_by_sport() {
  let s = store().await;
  let sx = sport(&s).await;
  let mx = s
    .get_or_create_sport("mx".into(), "Motocross".into())
    .await
    .unwrap();

  let a = s.get_or_create_tour(sx.sport_id, "Tour".into()).await.unwrap();
  let b = s.get_or_create_tour(mx.sport_id, "Tour".into()).await.unwrap();
  let c = s.get_or_create_tour(sx.sport_id, "Tour".into()).await.unwrap();

  assert_ne!(a.tour_id, b.tour_id);
  assert_eq!(a.tour_id, c.tour_id);
  assert_eq!(s.counts().await.unwrap().tours, 2);
}

#[tokio::test]
async fn round_codes_are_global() {
  let s = store().await;

  let a = s
    .get_or_create_round("RACE".into(), "Race".into())
    .await
    .unwrap();
  let b = s
    .get_or_create_round("RACE".into(), "Main Race".into())
    .await
    .unwrap();

  assert_eq!(a.round_id, b.round_id);
  assert_eq!(b.name, "Race");
}

#[tokio::test]
async fn upsert_event_overwrites_meta_only() {
  let s = store().await;
  let sp = sport(&s).await;
  let tour = s.get_or_create_tour(sp.sport_id, "T".into()).await.unwrap();
  let year = s
    .get_or_create_tour_year(sp.sport_id, tour.tour_id, "2025".into())
    .await
    .unwrap();

  let first = s
    .upsert_event(new_event(sp.sport_id, year.tour_year_id, json!({"rev": 1, "keep": true})))
    .await
    .unwrap();

  let mut again = new_event(sp.sport_id, year.tour_year_id, json!({"rev": 2}));
  again.venue = Some("Somewhere Else".into());
  let second = s.upsert_event(again).await.unwrap();

  assert_eq!(first.event_id, second.event_id);
  // Replaced, not merged.
  assert_eq!(second.meta, json!({"rev": 2}));
  assert_eq!(second.venue.as_deref(), Some("Angel Stadium"));
  assert_eq!(s.counts().await.unwrap().events, 1);

  let fetched = s.get_event(first.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.meta, json!({"rev": 2}));
}

// ─── Backfill ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn player_team_is_backfilled_once() {
  let s = store().await;
  let sp = sport(&s).await;
  let honda = s.get_or_create_team(sp.sport_id, "Honda".into()).await.unwrap();
  let ktm = s.get_or_create_team(sp.sport_id, "KTM".into()).await.unwrap();

  let bare = s
    .get_or_create_player(sp.sport_id, "J. Lawrence".into(), None)
    .await
    .unwrap();
  assert_eq!(bare.team_id, None);

  let filled = s
    .get_or_create_player(sp.sport_id, "J. Lawrence".into(), Some(honda.team_id))
    .await
    .unwrap();
  assert_eq!(filled.player_id, bare.player_id);
  assert_eq!(filled.team_id, Some(honda.team_id));

  let kept = s
    .get_or_create_player(sp.sport_id, "J. Lawrence".into(), Some(ktm.team_id))
    .await
    .unwrap();
  assert_eq!(kept.team_id, Some(honda.team_id));

  let still = s
    .get_or_create_player(sp.sport_id, "J. Lawrence".into(), None)
    .await
    .unwrap();
  assert_eq!(still.team_id, Some(honda.team_id));
}

#[tokio::test]
async fn participant_team_is_backfilled_once() {
  let s = store().await;
  let (sport_id, event_id) = event_fixture(&s).await;
  let team = s.get_or_create_team(sport_id, "Yamaha".into()).await.unwrap();
  let player = s
    .get_or_create_player(sport_id, "E. Tomac".into(), None)
    .await
    .unwrap();

  let input = |team_id| NewParticipant {
    sport_id,
    event_id,
    player_id: player.player_id,
    team_id,
    role: ParticipantRole::Driver,
  };

  let ep = s.get_or_create_event_participant(input(None)).await.unwrap();
  assert_eq!(ep.team_id, None);
  assert_eq!(ep.role, ParticipantRole::Driver);

  let ep2 = s
    .get_or_create_event_participant(input(Some(team.team_id)))
    .await
    .unwrap();
  assert_eq!(ep2.event_participant_id, ep.event_participant_id);
  assert_eq!(ep2.team_id, Some(team.team_id));
  assert_eq!(s.counts().await.unwrap().event_participants, 1);
}

// ─── Unit of work ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rows_are_visible_inside_uncommitted_unit() {
  let s = store().await;
  s.begin().await.unwrap();

  let sp = sport(&s).await;
  let team = s.get_or_create_team(sp.sport_id, "GasGas".into()).await.unwrap();
  let again = s.get_or_create_team(sp.sport_id, "GasGas".into()).await.unwrap();
  assert_eq!(team.team_id, again.team_id);

  s.commit().await.unwrap();
  assert_eq!(s.counts().await.unwrap().teams, 1);
}

#[tokio::test]
async fn rollback_discards_unit() {
  let s = store().await;
  s.begin().await.unwrap();
  sport(&s).await;
  s.rollback().await.unwrap();

  assert_eq!(s.counts().await.unwrap().sports, 0);
}

// ─── Raw payload capture ─────────────────────────────────────────────────────

#[test]
fn race_payload_merge_rules() {
  assert_eq!(
    with_race_payload(None, json!({"a": 1})),
    json!({"race_payloads": [{"a": 1}]})
  );
  assert_eq!(
    with_race_payload(Some(json!({"note": "x", "race_payloads": [1]})), json!(2)),
    json!({"note": "x", "race_payloads": [1, 2]})
  );
  assert_eq!(
    with_race_payload(Some(json!({"race_payloads": "odd"})), json!(2)),
    json!({"race_payloads": ["odd", 2]})
  );
  assert_eq!(
    with_race_payload(Some(json!([1, 2])), json!(3)),
    json!({"race_payloads": [3]})
  );
}

#[tokio::test]
async fn append_round_payload_accumulates_in_order() {
  let s = store().await;
  let (sport_id, event_id) = event_fixture(&s).await;
  let round = s
    .get_or_create_round("RACE".into(), "Race".into())
    .await
    .unwrap();
  let er = s
    .get_or_create_event_round(sport_id, event_id, round.round_id, None)
    .await
    .unwrap();
  assert_eq!(er.meta, None);

  s.append_round_payload(er.event_round_id, json!({"race": 1}))
    .await
    .unwrap();
  s.append_round_payload(er.event_round_id, json!({"race": 2}))
    .await
    .unwrap();

  let er = s.get_event_round(er.event_round_id).await.unwrap().unwrap();
  assert_eq!(
    er.meta,
    Some(json!({"race_payloads": [{"race": 1}, {"race": 2}]}))
  );
}

#[tokio::test]
async fn append_round_payload_unknown_round_errors() {
  let s = store().await;
  let err = s
    .append_round_payload(Uuid::new_v4(), json!({}))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::EventRoundNotFound(_)));
}

// ─── Scores ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scores_append_and_filter() {
  let s = store().await;
  let (sport_id, event_id) = event_fixture(&s).await;
  let player = s
    .get_or_create_player(sport_id, "C. Webb".into(), None)
    .await
    .unwrap();
  let ep = s
    .get_or_create_event_participant(NewParticipant {
      sport_id,
      event_id,
      player_id: player.player_id,
      team_id: None,
      role: ParticipantRole::Driver,
    })
    .await
    .unwrap();

  let run = Uuid::new_v4();
  let score = |key: MetricKey, value| NewScore {
    sport_id,
    event_id,
    event_round_id: None,
    event_participant_id: ep.event_participant_id,
    metric_key: key,
    metric_value: value,
    run_id: run,
  };

  // Identical facts are both kept.
  s.record_score(score(MetricKey::RaceLap, json!({"lap": 1}))).await.unwrap();
  s.record_score(score(MetricKey::RaceLap, json!({"lap": 1}))).await.unwrap();
  s.record_score(score(MetricKey::RaceDriver, json!({"name": "C. Webb"})))
    .await
    .unwrap();

  let laps = s
    .list_scores(&ScoreQuery {
      event_id: Some(event_id),
      metric_key: Some(MetricKey::RaceLap),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(laps.len(), 2);
  assert!(laps.iter().all(|sc| sc.metric_value == json!({"lap": 1})));

  let limited = s
    .list_scores(&ScoreQuery { run_id: Some(run), limit: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(limited.len(), 1);

  assert_eq!(s.counts().await.unwrap().scores, 3);
}

#[tokio::test]
async fn score_value_keeps_key_order() {
  let s = store().await;
  let (sport_id, event_id) = event_fixture(&s).await;
  let player = s
    .get_or_create_player(sport_id, "K. Roczen".into(), None)
    .await
    .unwrap();
  let ep = s
    .get_or_create_event_participant(NewParticipant {
      sport_id,
      event_id,
      player_id: player.player_id,
      team_id: None,
      role: ParticipantRole::Driver,
    })
    .await
    .unwrap();

  s.record_score(NewScore {
    sport_id,
    event_id,
    event_round_id: None,
    event_participant_id: ep.event_participant_id,
    metric_key: MetricKey::RaceResult,
    metric_value: json!({"z": 1, "a": 2}),
    run_id: Uuid::new_v4(),
  })
  .await
  .unwrap();

  let all = s.list_scores(&ScoreQuery::default()).await.unwrap();
  let keys: Vec<_> = all[0].metric_value.as_object().unwrap().keys().cloned().collect();
  assert_eq!(keys, ["z", "a"]);
}
