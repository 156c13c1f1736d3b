//! `pitboard`: motorsport results ingestion.
//!
//! # Usage
//!
//! ```text
//! pitboard seed
//! pitboard scrape
//! pitboard ingest-event-full 477866
//! pitboard ingest-many 477860-477870
//! pitboard ingest-all --limit 50
//! pitboard scores --metric winner --limit 10
//! ```
//!
//! Settings come from `pitboard.toml` (or `--config`) and `PITBOARD_*`
//! environment variables. Results are printed to stdout as JSON; logs go
//! to stderr and honour `RUST_LOG`.

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use pitboard_client::ApiClient;
use pitboard_core::{
  score::{MetricKey, ScoreQuery},
  source::ResultsSource as _,
  store::WarehouseStore as _,
};
use pitboard_ingest::{BatchItem, EventSelection, Ingestor, Progress, seed_reference_data};
use pitboard_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::{Settings, expand_tilde};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pitboard", version, about = "Motorsport results warehouse")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pitboard.toml", global = true)]
  config: PathBuf,

  /// SQLite database file; overrides `store_path` from the config.
  #[arg(long, env = "PITBOARD_STORE", global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the standard sports and round codes.
  Seed,
  /// List events found on the public listing.
  Scrape {
    #[arg(long, default_value_t = 25)]
    limit: usize,
  },
  /// Print the raw detail payload of one event.
  Event { id: i64 },
  /// Print the raw result payload of one race.
  Race { id: i64 },
  /// Ingest one event without its races.
  IngestEvent { id: i64 },
  /// Ingest one event and every race it links to.
  IngestEventFull { id: i64 },
  /// Fully ingest a list (`1,2,3`) or range (`10-20`) of event ids.
  IngestMany { ids: EventSelection },
  /// Fully ingest every event on the public listing. Ctrl-C stops early.
  IngestAll {
    /// Only the first N listing entries.
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Show recorded score facts, oldest first.
  Scores {
    #[arg(long)]
    event: Option<Uuid>,
    #[arg(long)]
    metric: Option<MetricKey>,
    #[arg(long)]
    run: Option<Uuid>,
    #[arg(long, default_value_t = 50)]
    limit: usize,
  },
  /// Row counts per table.
  Stats,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to read config from {}", cli.config.display()))?;
  let store_path = match &cli.store {
    Some(path) => expand_tilde(path),
    None => settings.store_path(),
  };

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let client = ApiClient::new(settings.api.clone()).context("failed to build API client")?;
  let ingestor = Ingestor::new(store, client);

  match cli.command {
    Command::Seed => print_json(&seed_reference_data(ingestor.store()).await?),

    Command::Scrape { limit } => {
      let mut events = ingestor.source().discover_events(&settings.listing_url).await?;
      events.truncate(limit);
      print_json(&events)
    }

    Command::Event { id } => print_json(&ingestor.source().get_event_details(id).await?),
    Command::Race { id } => print_json(&ingestor.source().get_race_results(id).await?),

    Command::IngestEvent { id } => print_json(
      &ingestor
        .ingest(id)
        .await
        .with_context(|| format!("ingesting event {id}"))?,
    ),
    Command::IngestEventFull { id } => print_json(
      &ingestor
        .ingest_full(id)
        .await
        .with_context(|| format!("ingesting event {id} with races"))?,
    ),

    Command::IngestMany { ids } => print_json(&ingestor.ingest_many(ids.ids()).await),

    Command::IngestAll { limit } => {
      let mut events = ingestor
        .source()
        .discover_events(&settings.listing_url)
        .await
        .context("event discovery failed")?;
      if let Some(limit) = limit {
        events.truncate(limit);
      }

      let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
          // Without a signal handler the batch just runs to the end.
          std::future::pending::<()>().await;
        }
      };
      let batch = ingestor
        .ingest_all(&events, |p| eprintln!("{}", progress_line(p)), interrupt)
        .await;
      print_json(&batch)
    }

    Command::Scores { event, metric, run, limit } => {
      let query = ScoreQuery {
        event_id:   event,
        metric_key: metric,
        run_id:     run,
        limit:      Some(limit),
      };
      print_json(&ingestor.store().list_scores(&query).await?)
    }

    Command::Stats => print_json(&ingestor.store().counts().await?),
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  let out = serde_json::to_string_pretty(value).context("serialising output")?;
  println!("{out}");
  Ok(())
}

fn progress_line(p: &Progress<'_>) -> String {
  let status = match p.item {
    BatchItem::Ingested(s) => {
      format!("ok ({} races, {} scores)", s.races_processed, s.scores_recorded)
    }
    BatchItem::Failed { error, .. } => format!("failed: {error}"),
    BatchItem::Skipped { .. } => "skipped (no event id)".to_owned(),
  };
  format!("[{}/{}] {}: {status}", p.index, p.total, p.title)
}
