//! The `ResultsSource` trait, the boundary to the upstream results API, and
//! the discovery listing type.
//!
//! Payloads are handed over as schema-less [`serde_json::Value`] trees; the
//! upstream shape is undocumented and the engine infers structure from it.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Abstraction over the upstream results API.
///
/// Implementations own transport, timeouts and retry on transient failures.
/// Any error returned here is final from the engine's point of view.
pub trait ResultsSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the detail payload of one event.
  fn get_event_details(
    &self,
    event_id: i64,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + '_;

  /// Fetch the result payload of one race.
  fn get_race_results(
    &self,
    race_id: i64,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + '_;
}

/// One entry of the public event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEvent {
  pub title: String,
  pub url:   String,
  /// Upstream event id, when one could be recovered from the URL.
  pub id:    Option<i64>,
}
