//! Error types for `pitboard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown participant role: {0:?}")]
  UnknownRole(String),

  #[error("invalid metric key: {0:?}")]
  InvalidMetricKey(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
