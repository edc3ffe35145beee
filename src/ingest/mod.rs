// src/ingest/mod.rs
//! Data sources: bounded file reads, HTTP JSON arrays, record validation and
//! the per-domain fetchers built on them.

pub mod countries;
pub mod http;
pub mod providers;
pub mod source;
pub mod types;
pub mod validate;

pub use types::{Fetcher, JsonRecord, LineRecord, Validate};
