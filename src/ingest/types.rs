// src/ingest/types.rs
use crate::context::FetchContext;
use crate::error::{FetchError, InvalidRecord};

/// One data source feeding one telemetry category.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    type Output: Send + 'static;

    async fn fetch(&self, ctx: &FetchContext) -> Result<Self::Output, FetchError>;
    fn name(&self) -> &'static str;
}

/// Domain rules a decoded record must satisfy before it is kept.
pub trait Validate {
    fn validate(&self) -> Result<(), InvalidRecord>;
}

/// Record parsed from one `;`-separated line of a file source.
pub trait LineRecord: Validate + Sized + Send + 'static {
    /// Human name used in logs ("SMS", "Voice", ...).
    const KIND: &'static str;

    /// Build a candidate from exactly the configured number of fields.
    /// `None` when a field cannot be parsed into its type.
    fn from_fields(fields: &[&str]) -> Option<Self>;
}

/// Record decoded from one element of a JSON array source.
pub trait JsonRecord: serde::de::DeserializeOwned + Validate + Send + 'static {
    const KIND: &'static str;
}
