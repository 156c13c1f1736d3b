//! Error type for `pitboard-ingest`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The event-detail fetch failed; fatal for that event.
  #[error("fetching event {event_id} failed: {source}")]
  Fetch {
    event_id: i64,
    #[source]
    source:   BoxError,
  },

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("invalid event selection {input:?}: {reason}")]
  InvalidSelection { input: String, reason: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}
