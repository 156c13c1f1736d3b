//! HTTP access to the upstream results service.
//!
//! [`ApiClient`] implements
//! [`ResultsSource`](pitboard_core::source::ResultsSource) over the JSON
//! export API and scrapes the public event listing for discovery.

pub mod client;
pub mod discover;
pub mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::{ClientError, Result};
