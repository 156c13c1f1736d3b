//! Async HTTP client for the results JSON export API.

use std::time::Duration;

use pitboard_core::source::{DiscoveredEvent, ResultsSource};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  discover::parse_listing,
  error::{ClientError, Result},
};

pub const DEFAULT_BASE_URL: &str = "https://results.supermotocross.com/results";
pub const DEFAULT_LISTING_URL: &str = "https://results.supermotocross.com/events/";

const USER_AGENT: &str = concat!("pitboard/", env!("CARGO_PKG_VERSION"));

/// Back-off between attempts after a transient failure, in seconds. Later
/// attempts reuse the last delay.
const RETRY_DELAYS_SECS: [u64; 4] = [5, 10, 15, 20];

/// Connection settings for the results API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url:     String,
  /// Sent as the `key` query parameter when non-empty.
  pub api_key:      String,
  pub timeout_secs: u64,
  /// Retries after the first attempt on rate limiting, server errors,
  /// connect failures and timeouts.
  pub max_retries:  usize,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url:     DEFAULT_BASE_URL.to_owned(),
      api_key:      String::new(),
      timeout_secs: 30,
      max_retries:  RETRY_DELAYS_SECS.len(),
    }
  }
}

/// Async HTTP client for the results service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(USER_AGENT)
      .build()
      .map_err(ClientError::Build)?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ApiConfig { &self.config }

  /// `GET {base_url}?export=json&p={page}&id={id}[&key=…]`
  async fn get_page(&self, page: &str, id: i64) -> Result<Value> {
    let target = format!("{page} {id}");
    let id = id.to_string();
    let mut query = vec![("export", "json"), ("p", page), ("id", id.as_str())];
    if !self.config.api_key.is_empty() {
      query.push(("key", self.config.api_key.as_str()));
    }

    let resp = self
      .send_with_backoff(&target, || {
        self
          .client
          .get(&self.config.base_url)
          .header(header::ACCEPT, "application/json")
          .query(&query)
      })
      .await?;
    resp
      .json()
      .await
      .map_err(|source| ClientError::Decode { target, source })
  }

  /// Send the request built by `build`, retrying transient failures.
  async fn send_with_backoff<F>(&self, target: &str, build: F) -> Result<Response>
  where
    F: Fn() -> RequestBuilder,
  {
    let mut attempt = 0;
    loop {
      let retry_after = match build().send().await {
        Ok(resp) if is_transient(resp.status()) && attempt < self.config.max_retries => {
          retry_after_secs(&resp)
        }
        Ok(resp) if resp.status().is_success() => return Ok(resp),
        Ok(resp) => {
          return Err(ClientError::Status { target: target.to_owned(), status: resp.status() });
        }
        Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.config.max_retries => None,
        Err(source) => {
          return Err(ClientError::Request { target: target.to_owned(), source });
        }
      };

      let delay = retry_delay(attempt, retry_after);
      warn!(target, attempt = attempt + 1, delay_secs = delay.as_secs(), "transient failure; retrying");
      attempt += 1;
      tokio::time::sleep(delay).await;
    }
  }

  /// Scrape the public event listing at `listing_url`.
  pub async fn discover_events(&self, listing_url: &str) -> Result<Vec<DiscoveredEvent>> {
    let resp = self
      .send_with_backoff(listing_url, || {
        self
          .client
          .get(listing_url)
          .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
      })
      .await?;
    let html = resp.text().await.map_err(|source| ClientError::Request {
      target: listing_url.to_owned(),
      source,
    })?;
    let events = parse_listing(&html, listing_url)?;
    debug!(count = events.len(), "listing parsed");
    Ok(events)
  }
}

impl ResultsSource for ApiClient {
  type Error = ClientError;

  async fn get_event_details(&self, event_id: i64) -> Result<Value> {
    self.get_page("view_event", event_id).await
  }

  async fn get_race_results(&self, race_id: i64) -> Result<Value> {
    self.get_page("view_race_result", race_id).await
  }
}

/// Rate limiting and server-side failures are worth another attempt.
fn is_transient(status: StatusCode) -> bool {
  status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after_secs(resp: &Response) -> Option<u64> {
  resp
    .headers()
    .get(header::RETRY_AFTER)
    .and_then(|h| h.to_str().ok())
    .and_then(|s| s.trim().parse().ok())
}

/// Delay before retry number `attempt + 1`; a longer `Retry-After` wins.
fn retry_delay(attempt: usize, retry_after: Option<u64>) -> Duration {
  let scheduled = RETRY_DELAYS_SECS[attempt.min(RETRY_DELAYS_SECS.len() - 1)];
  Duration::from_secs(retry_after.map_or(scheduled, |ra| ra.max(scheduled)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn delays_follow_schedule_then_plateau() {
    let secs: Vec<u64> = (0..6).map(|a| retry_delay(a, None).as_secs()).collect();
    assert_eq!(secs, vec![5, 10, 15, 20, 20, 20]);
  }

  #[test]
  fn longer_retry_after_wins() {
    assert_eq!(retry_delay(0, Some(60)), Duration::from_secs(60));
    assert_eq!(retry_delay(2, Some(1)), Duration::from_secs(15));
  }

  #[test]
  fn transient_statuses() {
    assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
    assert!(is_transient(StatusCode::BAD_GATEWAY));
    assert!(!is_transient(StatusCode::NOT_FOUND));
    assert!(!is_transient(StatusCode::OK));
  }

  #[test]
  fn default_config() {
    let config = ApiConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.max_retries, 4);
    assert!(ApiClient::new(config).is_ok());
  }
}
