//! Core types and trait definitions for the pitboard results warehouse.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend (`pitboard-store-sqlite`), the ingestion engine
//! (`pitboard-ingest`) and the results API client (`pitboard-client`) all
//! meet here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entity;
pub mod error;
pub mod score;
pub mod source;
pub mod store;

pub use error::{Error, Result};
