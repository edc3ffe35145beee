//! HTTP sources: GET a top-level JSON array and keep the elements that decode
//! strictly and validate.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, SeqAccess, Visitor};
use serde::Deserializer as _;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::ingest::types::Validate;

/// Default upper bound for an HTTP response body.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1 << 20;

/// GET `url`, read at most `max_body_bytes` of body and decode it with
/// [`decode_array`].
pub async fn fetch_json_array<T>(
    client: &reqwest::Client,
    url: &str,
    ctx: &FetchContext,
    fail_fast: bool,
    max_body_bytes: u64,
) -> Result<Vec<T>, FetchError>
where
    T: DeserializeOwned + Validate,
{
    let mut resp = ctx
        .run(client.get(url).send())
        .await?
        .map_err(|e| FetchError::unavailable(url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::unavailable(url, format!("status {status}")));
    }
    if let Some(len) = resp.content_length() {
        if len > max_body_bytes {
            return Err(FetchError::unavailable(
                url,
                format!("body is {len} bytes, limit is {max_body_bytes}"),
            ));
        }
    }

    // Content-Length may be absent or wrong, so the limit is enforced per chunk.
    let mut body = Vec::new();
    while let Some(chunk) = ctx
        .run(resp.chunk())
        .await?
        .map_err(|e| FetchError::unavailable(url, e))?
    {
        if (body.len() + chunk.len()) as u64 > max_body_bytes {
            return Err(FetchError::unavailable(
                url,
                format!("body exceeds limit of {max_body_bytes} bytes"),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    ctx.check()?;

    decode_array(url, &body, fail_fast)
}

/// Decode `body` as a JSON array of `T`.
///
/// Elements are decoded one at a time as the array is walked; the whole
/// array is never materialized as a value tree. Unknown fields are rejected
/// by the record types. Undecodable or invalid elements are skipped, or abort
/// the whole decode with `MalformedRecord` when `fail_fast` is set.
pub fn decode_array<T>(origin: &str, body: &[u8], fail_fast: bool) -> Result<Vec<T>, FetchError>
where
    T: DeserializeOwned + Validate,
{
    let mut rejected = None;
    let mut de = serde_json::Deserializer::from_slice(body);
    let visitor = ArrayVisitor {
        origin,
        fail_fast,
        rejected: &mut rejected,
        _record: PhantomData,
    };
    let decoded = (&mut de).deserialize_seq(visitor).and_then(|out| de.end().map(|()| out));

    match (decoded, rejected) {
        (_, Some(err)) => Err(err),
        (Ok(out), None) => Ok(out),
        (Err(e), None) => Err(FetchError::malformed(
            origin,
            format!("expected a JSON array: {e}"),
        )),
    }
}

struct ArrayVisitor<'a, T> {
    origin: &'a str,
    fail_fast: bool,
    /// Set when `fail_fast` stops the walk on a bad element.
    rejected: &'a mut Option<FetchError>,
    _record: PhantomData<fn() -> T>,
}

impl<T> ArrayVisitor<'_, T> {
    fn reject<E: de::Error>(&mut self, idx: usize, reason: impl fmt::Display) -> E {
        *self.rejected = Some(FetchError::malformed(
            self.origin,
            format!("element {idx}: {reason}"),
        ));
        E::custom("element rejected")
    }
}

impl<'de, T> Visitor<'de> for ArrayVisitor<'_, T>
where
    T: DeserializeOwned + Validate,
{
    type Value = Vec<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array")
    }

    fn visit_seq<A>(mut self, mut seq: A) -> Result<Vec<T>, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let origin = self.origin;
        let mut out = Vec::new();
        let mut idx = 0usize;
        while let Some(element) = seq.next_element::<serde_json::Value>()? {
            let at = idx;
            idx += 1;
            let rec = match serde_json::from_value::<T>(element) {
                Ok(rec) => rec,
                Err(e) => {
                    if self.fail_fast {
                        return Err(self.reject(at, e));
                    }
                    tracing::debug!(origin, idx = at, error = %e, "skipping undecodable element");
                    continue;
                }
            };
            if let Err(e) = rec.validate() {
                if self.fail_fast {
                    return Err(self.reject(at, e));
                }
                tracing::debug!(origin, idx = at, error = %e, "skipping invalid element");
                continue;
            }
            out.push(rec);
        }
        Ok(out)
    }
}
