//! The ingestion engine of the pitboard results warehouse.
//!
//! Pulls event and race payloads from a
//! [`ResultsSource`](pitboard_core::source::ResultsSource), infers their
//! structure and writes reference rows and score facts to a
//! [`WarehouseStore`](pitboard_core::store::WarehouseStore).

pub mod error;
pub mod event;
pub mod normalize;
pub mod orchestrator;
pub mod payload;
pub mod record;
pub mod seed;
pub mod selection;
mod unit;
pub mod winner;

pub use error::{Error, Result};
pub use orchestrator::{
  BatchItem, BatchSummary, FullIngestSummary, IngestSummary, Ingestor, Progress,
};
pub use seed::seed_reference_data;
pub use selection::EventSelection;
