//! Error type for `pitboard-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("request for {target} failed: {source}")]
  Request {
    target: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{target} returned {status}")]
  Status { target: String, status: StatusCode },

  #[error("{target} returned a body that is not JSON: {source}")]
  Decode {
    target: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("invalid URL {url:?}: {source}")]
  Url {
    url:    String,
    #[source]
    source: url::ParseError,
  },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
