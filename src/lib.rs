// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod collector;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod projection;
pub mod result;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::collector::{Collection, CollectTask, Collector, DomainTask, TaskOutcome};
pub use crate::config::CollectorConfig;
pub use crate::context::{CancelHandle, FetchContext};
pub use crate::domain::Domain;
pub use crate::error::{CancelReason, FetchError, IncompleteError, InvalidRecord};
pub use crate::result::{ResultSet, SharedResultSet, Verdict};
