//! # Error Types
//!
//! Structured errors for fetching and validation. Per-record problems stay
//! inside a fetcher, per-domain problems stay inside the task wrapper, and only
//! `IncompleteError` reaches the final verdict.

use std::fmt;
use thiserror::Error;

use crate::domain::Domain;

/// Why a context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancellation (caller abort, process shutdown).
    Cancelled,
    /// A deadline on the context or one of its parents fired.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("context canceled"),
            CancelReason::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

/// Errors a fetcher can return for its whole source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("source unavailable: {origin}: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    #[error("source is empty: {origin}")]
    EmptySource { origin: String },

    #[error("malformed record in {origin}: {reason}")]
    MalformedRecord { origin: String, reason: String },

    #[error("{0}")]
    Cancelled(CancelReason),
}

impl FetchError {
    pub fn unavailable(origin: impl Into<String>, reason: impl fmt::Display) -> Self {
        FetchError::SourceUnavailable {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(origin: impl Into<String>, reason: impl fmt::Display) -> Self {
        FetchError::MalformedRecord {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// True for cancellation and deadline signals, which are not failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled(_))
    }
}

/// A single candidate record failed a domain rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct InvalidRecord {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidRecord {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// The merged result is missing a category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{domain} {detail}")]
pub struct IncompleteError {
    pub domain: Domain,
    pub detail: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_readable() {
        let e = FetchError::EmptySource {
            origin: "sms.data".into(),
        };
        assert_eq!(e.to_string(), "source is empty: sms.data");

        let c = FetchError::Cancelled(CancelReason::DeadlineExceeded);
        assert_eq!(c.to_string(), "context deadline exceeded");
        assert!(c.is_cancelled());
        assert!(!e.is_cancelled());

        let inc = IncompleteError {
            domain: Domain::Email,
            detail: "has empty bucket",
        };
        assert_eq!(inc.to_string(), "email has empty bucket");
    }
}
