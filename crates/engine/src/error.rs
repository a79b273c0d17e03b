use std::io;

use thiserror::Error;

/// Faults surfaced by scans, training, and validation.
///
/// Nothing here is retried in-process: a codec or I/O fault mid-scan
/// aborts the whole scan and no partial results are returned.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Out-of-range counts, dates, or limits.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Read or open failure on the feature index or an attached stream.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Truncated index, feature cap exceeded, or non-monotonic features.
    #[error("malformed feature index: {0}")]
    Malformed(&'static str),

    /// Document filter list not sorted strictly ascending.
    #[error("document filter list must be sorted ascending without duplicates")]
    InvalidExclusion,

    /// Labelled set empty, or too small for the requested fold count.
    #[error("labelled set too small: {0}")]
    EmptyLabelled(String),

    /// Cooperative cancellation observed between records.
    #[error("scan cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ScanError>;
