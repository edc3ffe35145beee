use std::marker::PhantomData;

use async_trait::async_trait;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::ingest::http::{fetch_json_array, DEFAULT_MAX_BODY_BYTES};
use crate::ingest::types::{Fetcher, JsonRecord};

/// Fetcher for HTTP endpoints returning a JSON array of records.
pub struct JsonArrayFetcher<T> {
    client: reqwest::Client,
    url: String,
    fail_fast: bool,
    max_body_bytes: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T: JsonRecord> JsonArrayFetcher<T> {
    /// `client` is shared; cloning a `reqwest::Client` reuses its pool.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            fail_fast: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            _record: PhantomData,
        }
    }

    pub fn fail_fast(mut self, on: bool) -> Self {
        self.fail_fast = on;
        self
    }

    pub fn max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

#[async_trait]
impl<T: JsonRecord> Fetcher for JsonArrayFetcher<T> {
    type Output = Vec<T>;

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<T>, FetchError> {
        fetch_json_array(
            &self.client,
            &self.url,
            ctx,
            self.fail_fast,
            self.max_body_bytes,
        )
        .await
    }

    fn name(&self) -> &'static str {
        T::KIND
    }
}
