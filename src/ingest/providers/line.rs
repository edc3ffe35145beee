use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::ingest::source::{read_source, split_fields};
use crate::ingest::types::{Fetcher, LineRecord};

/// Fetcher for `;`-separated files with a fixed column count.
///
/// Lines with the wrong width, unparseable fields or failing validation are
/// dropped; only an unreadable or empty file fails the fetch.
pub struct LineFetcher<R> {
    path: PathBuf,
    width: usize,
    max_bytes: u64,
    _record: PhantomData<fn() -> R>,
}

impl<R: LineRecord> LineFetcher<R> {
    pub fn new(path: impl Into<PathBuf>, width: usize, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            width,
            max_bytes,
            _record: PhantomData,
        }
    }
}

pub fn parse_lines<R: LineRecord>(content: &str, width: usize) -> Vec<R> {
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for line in content.split('\n') {
        let Some(fields) = split_fields(line, width) else {
            if !line.trim_end_matches('\r').is_empty() {
                skipped += 1;
            }
            continue;
        };
        match R::from_fields(&fields) {
            Some(rec) if rec.validate().is_ok() => out.push(rec),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(kind = R::KIND, kept = out.len(), skipped, "dropped invalid lines");
    }
    out
}

#[async_trait]
impl<R: LineRecord> Fetcher for LineFetcher<R> {
    type Output = Vec<R>;

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<R>, FetchError> {
        let content = read_source(&self.path, self.max_bytes, ctx).await?;
        Ok(parse_lines(&content, self.width))
    }

    fn name(&self) -> &'static str {
        R::KIND
    }
}
