//! SQL schema for the pitboard SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every reference table carries a UNIQUE constraint on its natural key so
/// the `INSERT ... ON CONFLICT DO NOTHING` get-or-create path cannot produce
/// duplicates.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sports (
    sport_id    TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,   -- 'sx' | 'mx' | 'smx'
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tours (
    tour_id     TEXT PRIMARY KEY,
    sport_id    TEXT NOT NULL REFERENCES sports(sport_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (sport_id, name)
);

CREATE TABLE IF NOT EXISTS tour_years (
    tour_year_id TEXT PRIMARY KEY,
    sport_id     TEXT NOT NULL REFERENCES sports(sport_id),
    tour_id      TEXT NOT NULL REFERENCES tours(tour_id),
    name         TEXT NOT NULL,   -- season label, e.g. '2025'
    created_at   TEXT NOT NULL,
    UNIQUE (sport_id, tour_id, name)
);

CREATE TABLE IF NOT EXISTS events (
    event_id     TEXT PRIMARY KEY,
    sport_id     TEXT NOT NULL REFERENCES sports(sport_id),
    tour_year_id TEXT NOT NULL REFERENCES tour_years(tour_year_id),
    name         TEXT NOT NULL,
    start_date   TEXT,
    end_date     TEXT,
    venue        TEXT,
    meta         TEXT NOT NULL,   -- raw event-detail payload, replaced on re-ingest
    created_at   TEXT NOT NULL,
    updated_at   TEXT,
    UNIQUE (sport_id, name)
);

CREATE TABLE IF NOT EXISTS teams (
    team_id     TEXT PRIMARY KEY,
    sport_id    TEXT NOT NULL REFERENCES sports(sport_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (sport_id, name)
);

CREATE TABLE IF NOT EXISTS players (
    player_id   TEXT PRIMARY KEY,
    sport_id    TEXT NOT NULL REFERENCES sports(sport_id),
    name        TEXT NOT NULL,
    team_id     TEXT REFERENCES teams(team_id),   -- backfilled once, never overwritten
    created_at  TEXT NOT NULL,
    UNIQUE (sport_id, name)
);

-- Round codes are global; they are not scoped by sport.
CREATE TABLE IF NOT EXISTS rounds (
    round_id    TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS event_rounds (
    event_round_id TEXT PRIMARY KEY,
    sport_id       TEXT NOT NULL REFERENCES sports(sport_id),
    event_id       TEXT NOT NULL REFERENCES events(event_id),
    round_id       TEXT NOT NULL REFERENCES rounds(round_id),
    parent_id      TEXT REFERENCES event_rounds(event_round_id),
    meta           TEXT,
    created_at     TEXT NOT NULL,
    UNIQUE (sport_id, event_id, round_id)
);

CREATE TABLE IF NOT EXISTS event_participants (
    event_participant_id TEXT PRIMARY KEY,
    sport_id             TEXT NOT NULL REFERENCES sports(sport_id),
    event_id             TEXT NOT NULL REFERENCES events(event_id),
    player_id            TEXT NOT NULL REFERENCES players(player_id),
    team_id              TEXT REFERENCES teams(team_id),
    role                 TEXT NOT NULL DEFAULT 'driver',
    created_at           TEXT NOT NULL,
    UNIQUE (sport_id, event_id, player_id)
);

-- Scores are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS scores (
    score_id             TEXT PRIMARY KEY,
    sport_id             TEXT NOT NULL REFERENCES sports(sport_id),
    event_id             TEXT NOT NULL REFERENCES events(event_id),
    event_round_id       TEXT REFERENCES event_rounds(event_round_id),
    event_participant_id TEXT NOT NULL REFERENCES event_participants(event_participant_id),
    metric_key           TEXT NOT NULL,
    metric_value         TEXT NOT NULL,   -- verbatim JSON
    run_id               TEXT NOT NULL,   -- ingestion run that wrote the row
    recorded_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS scores_event_idx  ON scores(event_id);
CREATE INDEX IF NOT EXISTS scores_metric_idx ON scores(metric_key);
CREATE INDEX IF NOT EXISTS scores_run_idx    ON scores(run_id);

PRAGMA user_version = 1;
";
