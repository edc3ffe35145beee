//! File sources: bounded read and strict `;` splitting.

use std::path::Path;

use crate::context::FetchContext;
use crate::error::FetchError;

/// Field separator of every line-oriented source.
pub const FIELD_SEPARATOR: char = ';';

/// Read a whole source file after checking it exists, is a regular file and
/// is not larger than `max_bytes`. A zero-length file is `EmptySource`.
///
/// The context is checked around the I/O so a cancelled caller never pays
/// for parsing. Invalid UTF-8 is replaced rather than rejected; the garbled
/// line then fails record validation and is dropped on its own.
pub async fn read_source(
    path: &Path,
    max_bytes: u64,
    ctx: &FetchContext,
) -> Result<String, FetchError> {
    let origin = path.display().to_string();

    let meta = ctx
        .run(tokio::fs::metadata(path))
        .await?
        .map_err(|e| FetchError::unavailable(&origin, e))?;
    if !meta.is_file() {
        return Err(FetchError::unavailable(&origin, "not a regular file"));
    }
    if meta.len() == 0 {
        return Err(FetchError::EmptySource { origin });
    }
    if meta.len() > max_bytes {
        return Err(FetchError::unavailable(
            &origin,
            format!("file is {} bytes, limit is {max_bytes}", meta.len()),
        ));
    }

    let bytes = ctx
        .run(tokio::fs::read(path))
        .await?
        .map_err(|e| FetchError::unavailable(&origin, e))?;
    if bytes.is_empty() {
        return Err(FetchError::EmptySource { origin });
    }
    ctx.check()?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split `line` into exactly `width` fields. Trailing `\r` is dropped; empty
/// lines and lines with any other field count yield `None`.
pub fn split_fields(line: &str, width: usize) -> Option<Vec<&str>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() || width == 0 {
        return None;
    }
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    (fields.len() == width).then_some(fields)
}
