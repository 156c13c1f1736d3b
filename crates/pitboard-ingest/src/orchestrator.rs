//! The ingestion pipeline: event payloads in, warehouse rows out.
//!
//! Every operation is a straight-line sequence of awaits against one store
//! and one results source. Races and batch items are handled strictly one
//! after another; nothing is spawned.

use std::future::Future;

use pitboard_core::{
  entity::{Event, ParticipantRole, Sport},
  score::WinnerValue,
  source::{DiscoveredEvent, ResultsSource},
  store::{NewEvent, NewParticipant, WarehouseStore},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  error::{store_err, Error, Result},
  event::EventDescriptor,
  normalize::{extract_identity, Identity, RowShape},
  payload::{driver_laps, driver_objects, extract_race_ids, result_rows},
  record::{RaceScope, ScoreRecorder},
  seed::RACE_ROUND,
  unit::unit_of_work,
  winner::{final_position, WinnerTracker},
};

// ─── Summaries ───────────────────────────────────────────────────────────────

/// Result of [`Ingestor::ingest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
  /// Warehouse id of the event row.
  pub event_id:        Uuid,
  /// Upstream id the event was fetched by.
  pub source_event_id: i64,
  pub sport_code:      String,
  pub name:            String,
}

/// Result of [`Ingestor::ingest_full`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullIngestSummary {
  #[serde(flatten)]
  pub event:             IngestSummary,
  /// Race ids found in the event payload.
  pub races_found:       usize,
  /// Races whose results were fetched, parseable or not.
  pub races_processed:   usize,
  pub scores_recorded:   usize,
  /// Races kept verbatim on the event round because nothing parsed.
  pub payloads_captured: usize,
  /// Tag carried by every score this run wrote.
  pub run_id:            Uuid,
}

/// Outcome of one item in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
  Ingested(FullIngestSummary),
  Failed { event_id: i64, error: String },
  /// A listing entry without an event id.
  Skipped { title: String, url: String },
}

impl BatchItem {
  fn from_result(event_id: i64, result: Result<FullIngestSummary>) -> Self {
    match result {
      Ok(summary) => Self::Ingested(summary),
      Err(e) => {
        warn!(event_id, error = %e, "event ingestion failed");
        Self::Failed { event_id, error: e.to_string() }
      }
    }
  }
}

/// Result of [`Ingestor::ingest_many`] and [`Ingestor::ingest_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
  pub ingested:    usize,
  pub failed:      usize,
  pub skipped:     usize,
  /// The batch stopped early on an interrupt.
  pub interrupted: bool,
  pub items:       Vec<BatchItem>,
}

impl BatchSummary {
  fn push(&mut self, item: BatchItem) -> &BatchItem {
    match item {
      BatchItem::Ingested(_) => self.ingested += 1,
      BatchItem::Failed { .. } => self.failed += 1,
      BatchItem::Skipped { .. } => self.skipped += 1,
    }
    self.items.push(item);
    &self.items[self.items.len() - 1]
  }
}

/// Emitted by [`Ingestor::ingest_all`] after every listing entry.
#[derive(Debug, Serialize)]
pub struct Progress<'a> {
  /// 1-based position in the listing.
  pub index: usize,
  pub total: usize,
  pub title: &'a str,
  pub item:  &'a BatchItem,
}

/// Per-race tallies folded into [`FullIngestSummary`].
#[derive(Debug, Default)]
struct RaceOutcome {
  rows:     usize,
  scores:   usize,
  captured: bool,
}

struct WinnerCandidate {
  participant_id: Uuid,
  identity:       Identity,
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

/// Drives ingestion from a [`ResultsSource`] into a [`WarehouseStore`].
pub struct Ingestor<S, C> {
  store:  S,
  source: C,
}

impl<S, C> Ingestor<S, C>
where
  S: WarehouseStore,
  C: ResultsSource,
{
  pub fn new(store: S, source: C) -> Self { Self { store, source } }

  pub fn store(&self) -> &S { &self.store }

  pub fn source(&self) -> &C { &self.source }

  /// Fetch one event and upsert its sport, tour, season and event rows.
  #[tracing::instrument(skip(self))]
  pub async fn ingest(&self, event_id: i64) -> Result<IngestSummary> {
    let payload = self.fetch_event(event_id).await?;
    let summary = unit_of_work(&self.store, async {
      let (descriptor, _, event) = self.resolve_event(event_id, &payload).await?;
      Ok::<_, Error>(summarize(event_id, &descriptor, &event))
    })
    .await?;
    info!(event = %summary.event_id, name = %summary.name, "event ingested");
    Ok(summary)
  }

  /// [`ingest`](Self::ingest) plus every race reachable from the event.
  ///
  /// A race whose results cannot be fetched is skipped. All writes commit
  /// together at the end.
  #[tracing::instrument(skip(self))]
  pub async fn ingest_full(&self, event_id: i64) -> Result<FullIngestSummary> {
    let payload = self.fetch_event(event_id).await?;
    let run_id = Uuid::new_v4();

    let summary = unit_of_work(&self.store, async {
      let (descriptor, sport, event) = self.resolve_event(event_id, &payload).await?;
      let (code, name) = RACE_ROUND;
      let round = self
        .store
        .get_or_create_round(code.to_owned(), name.to_owned())
        .await
        .map_err(store_err)?;
      let event_round = self
        .store
        .get_or_create_event_round(sport.sport_id, event.event_id, round.round_id, None)
        .await
        .map_err(store_err)?;
      let scope = RaceScope {
        sport_id: sport.sport_id,
        event_id: event.event_id,
        event_round_id: event_round.event_round_id,
        run_id,
      };

      let race_ids = extract_race_ids(&payload);
      let mut summary = FullIngestSummary {
        event: summarize(event_id, &descriptor, &event),
        races_found: race_ids.len(),
        races_processed: 0,
        scores_recorded: 0,
        payloads_captured: 0,
        run_id,
      };

      for race_id in race_ids {
        let results = match self.source.get_race_results(race_id).await {
          Ok(results) => results,
          Err(e) => {
            warn!(race_id, error = %e, "race results unavailable; skipping race");
            continue;
          }
        };
        summary.races_processed += 1;

        let outcome = self.ingest_race(scope, race_id, &results).await?;
        debug!(race_id, rows = outcome.rows, scores = outcome.scores, "race ingested");
        summary.scores_recorded += outcome.scores;
        summary.payloads_captured += usize::from(outcome.captured);
      }
      Ok::<_, Error>(summary)
    })
    .await?;

    info!(
      event = %summary.event.event_id,
      races = summary.races_processed,
      scores = summary.scores_recorded,
      "event fully ingested"
    );
    Ok(summary)
  }

  /// [`ingest_full`](Self::ingest_full) for each id in turn. A failing event
  /// becomes a [`BatchItem::Failed`] entry and the batch carries on.
  #[tracing::instrument(skip_all)]
  pub async fn ingest_many<I>(&self, event_ids: I) -> BatchSummary
  where
    I: IntoIterator<Item = i64>,
  {
    let mut batch = BatchSummary::default();
    for event_id in event_ids {
      let result = self.ingest_full(event_id).await;
      batch.push(BatchItem::from_result(event_id, result));
    }
    info!(ingested = batch.ingested, failed = batch.failed, "batch finished");
    batch
  }

  /// [`ingest_full`](Self::ingest_full) for every listing entry with an id.
  ///
  /// `on_progress` is called after every entry. When `interrupt` completes
  /// the event in flight is abandoned and rolled back, and the summary so
  /// far is returned with `interrupted` set.
  #[tracing::instrument(skip_all, fields(total = events.len()))]
  pub async fn ingest_all<F, I>(
    &self,
    events: &[DiscoveredEvent],
    mut on_progress: F,
    interrupt: I,
  ) -> BatchSummary
  where
    F: FnMut(&Progress<'_>),
    I: Future<Output = ()>,
  {
    tokio::pin!(interrupt);
    let mut batch = BatchSummary::default();
    let total = events.len();

    for (index, entry) in events.iter().enumerate() {
      let item = match entry.id {
        None => {
          debug!(url = %entry.url, "listing entry has no event id; skipping");
          BatchItem::Skipped { title: entry.title.clone(), url: entry.url.clone() }
        }
        Some(event_id) => tokio::select! {
          biased;
          () = &mut interrupt => {
            warn!(event_id, "interrupted; abandoning event in flight");
            batch.interrupted = true;
            self.abandon_unit().await;
            break;
          }
          result = self.ingest_full(event_id) => BatchItem::from_result(event_id, result),
        },
      };

      let item = batch.push(item);
      on_progress(&Progress { index: index + 1, total, title: &entry.title, item });
    }

    info!(
      ingested = batch.ingested,
      failed = batch.failed,
      skipped = batch.skipped,
      interrupted = batch.interrupted,
      "listing ingestion finished"
    );
    batch
  }

  // ── Internals ─────────────────────────────────────────────────────────

  async fn fetch_event(&self, event_id: i64) -> Result<Value> {
    self
      .source
      .get_event_details(event_id)
      .await
      .map_err(|e| Error::Fetch { event_id, source: Box::new(e) })
  }

  async fn resolve_event(
    &self,
    event_id: i64,
    payload: &Value,
  ) -> Result<(EventDescriptor, Sport, Event)> {
    let descriptor = EventDescriptor::from_payload(event_id, payload);
    let store = &self.store;

    let sport = store
      .get_or_create_sport(
        descriptor.sport.code().to_owned(),
        descriptor.sport.display_name().to_owned(),
      )
      .await
      .map_err(store_err)?;
    let tour = store
      .get_or_create_tour(sport.sport_id, descriptor.tour_name())
      .await
      .map_err(store_err)?;
    let tour_year = store
      .get_or_create_tour_year(sport.sport_id, tour.tour_id, descriptor.season.clone())
      .await
      .map_err(store_err)?;
    let event = store
      .upsert_event(NewEvent {
        sport_id:     sport.sport_id,
        tour_year_id: tour_year.tour_year_id,
        name:         descriptor.name.clone(),
        start_date:   descriptor.start_date,
        end_date:     descriptor.end_date,
        venue:        descriptor.venue.clone(),
        meta:         payload.clone(),
      })
      .await
      .map_err(store_err)?;

    Ok((descriptor, sport, event))
  }

  /// Team, player and event participant for one identity.
  async fn resolve_participant(&self, scope: RaceScope, identity: &Identity) -> Result<Uuid> {
    let store = &self.store;
    let team_id = match &identity.team {
      Some(team) => Some(
        store
          .get_or_create_team(scope.sport_id, team.clone())
          .await
          .map_err(store_err)?
          .team_id,
      ),
      None => None,
    };
    let player = store
      .get_or_create_player(scope.sport_id, identity.name.clone(), team_id)
      .await
      .map_err(store_err)?;
    let participant = store
      .get_or_create_event_participant(NewParticipant {
        sport_id: scope.sport_id,
        event_id: scope.event_id,
        player_id: player.player_id,
        team_id,
        role: ParticipantRole::Driver,
      })
      .await
      .map_err(store_err)?;
    Ok(participant.event_participant_id)
  }

  /// Record one race's facts. The driver-object shape is tried first, the
  /// flat shape only if no driver parsed, and the raw payload is kept only
  /// if neither did.
  async fn ingest_race(
    &self,
    scope: RaceScope,
    race_id: i64,
    payload: &Value,
  ) -> Result<RaceOutcome> {
    let recorder = ScoreRecorder::new(&self.store, scope);
    let mut outcome = RaceOutcome::default();
    let mut winners = WinnerTracker::default();

    for driver in driver_objects(payload) {
      let Some(identity) = extract_identity(driver, RowShape::Driver) else {
        debug!(race_id, "driver without a name; skipping");
        continue;
      };
      let participant_id = self.resolve_participant(scope, &identity).await?;
      recorder.driver(participant_id, driver).await?;
      outcome.rows += 1;
      outcome.scores += 1;

      let laps = driver_laps(driver);
      for lap in &laps {
        recorder.lap(participant_id, lap).await?;
        outcome.scores += 1;
      }
      winners.observe(
        final_position(laps.iter().copied()),
        WinnerCandidate { participant_id, identity },
      );
    }

    if outcome.rows == 0 {
      for row in flat_rows(payload) {
        let Some(identity) = extract_identity(row, RowShape::Flat) else {
          debug!(race_id, "result row without a name; skipping");
          continue;
        };
        let participant_id = self.resolve_participant(scope, &identity).await?;
        recorder.result(participant_id, row).await?;
        outcome.rows += 1;
        outcome.scores += 1;
      }
    }

    if let Some(count) = winners.contested() {
      warn!(race_id, count, "several drivers finished first; keeping the last");
    }
    if let Some(WinnerCandidate { participant_id, identity }) = winners.into_winner() {
      let winner = WinnerValue {
        player_name: identity.name,
        team_name: identity.team,
        final_pos: 1,
        race_id,
      };
      recorder.winner(participant_id, &winner).await?;
      outcome.scores += 1;
    }

    if outcome.rows == 0 {
      debug!(race_id, "nothing parsed; keeping raw payload");
      outcome.captured = recorder.capture_raw(race_id, payload).await;
    }
    Ok(outcome)
  }

  /// Roll back whatever unit an abandoned future left open.
  async fn abandon_unit(&self) {
    if let Err(e) = self.store.rollback().await {
      debug!(error = %e, "no unit of work to roll back");
    }
  }
}

fn flat_rows(payload: &Value) -> impl Iterator<Item = &Map<String, Value>> {
  result_rows(payload)
    .unwrap_or_default()
    .iter()
    .filter_map(Value::as_object)
}

fn summarize(event_id: i64, descriptor: &EventDescriptor, event: &Event) -> IngestSummary {
  IngestSummary {
    event_id:        event.event_id,
    source_event_id: event_id,
    sport_code:      descriptor.sport.code().to_owned(),
    name:            event.name.clone(),
  }
}
