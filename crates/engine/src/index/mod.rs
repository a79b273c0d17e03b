use std::{fs::File, io, ops::Range, path::Path};

use memmap2::Mmap;

pub mod codec;
pub mod record;
pub mod writer;

pub use record::{RecordCursor, RecordHeader};
pub use writer::{IndexWriter, write_index_atomic};

use crate::{Result, ScanError};

pub type DocId = u32;
pub type FeatureId = u32;
/// Completion date as `YYYYMMDD`, compared as a plain integer.
pub type Date = u32;

/// Upper bound on features per document; decoding past it is malformed.
pub const FEATURE_CAP: usize = 1000;
/// Fixed bytes per record ahead of the payload: pmid, date, nbytes.
pub const RECORD_HEADER_BYTES: usize = 10;

/// Inclusive date window `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub min: Date,
    pub max: Date,
}

impl DateWindow {
    pub fn new(min: Date, max: Date) -> Result<Self> {
        if min > max {
            return Err(ScanError::Argument(format!("empty date window {min}..{max}")));
        }
        Ok(Self { min, max })
    }

    /// Window admitting every date.
    pub fn all() -> Self {
        Self { min: 0, max: Date::MAX }
    }

    #[inline]
    pub fn contains(&self, date: Date) -> bool {
        date >= self.min && date <= self.max
    }
}

/// Read-only handle to an on-disk feature index.
///
/// The file is a headerless sequence of records, mapped whole and walked
/// front to back. Multiple readers may hold the same file concurrently;
/// nothing here mutates it.
pub struct FeatureIndex {
    mmap: Option<Mmap>,
}

impl FeatureIndex {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // A zero-length mapping is rejected by several platforms; an
        // empty index is just an empty record stream.
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None });
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn cursor(&self) -> RecordCursor<'_> {
        RecordCursor::new(self.data())
    }
}

/// Split `data` into at most `nchunks` byte ranges aligned to record
/// boundaries, walking headers only. The parallel scan hands each range
/// to one worker; a malformed stream fails here before any worker runs.
pub fn chunk_bounds(data: &[u8], nchunks: usize) -> Result<Vec<Range<usize>>> {
    let mut offsets = Vec::new();
    let mut cursor = RecordCursor::new(data);
    loop {
        let pos = cursor.position();
        if cursor.skip_next()?.is_none() {
            break;
        }
        offsets.push(pos);
    }

    let mut bounds = Vec::new();
    if offsets.is_empty() {
        return Ok(bounds);
    }

    let nchunks = nchunks.clamp(1, offsets.len());
    let per_chunk = offsets.len().div_ceil(nchunks);
    let mut start = 0;
    while start < offsets.len() {
        let end = (start + per_chunk).min(offsets.len());
        let end_byte = if end == offsets.len() { data.len() } else { offsets[end] };
        bounds.push(offsets[start]..end_byte);
        start = end;
    }
    Ok(bounds)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
