use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::{Date, DocId, FeatureId, Result, ScanError, index::codec::encode_features};

/// Append-only writer emitting the on-disk record layout.
///
/// Exists for fixtures, benches, and offline rebuilds; the production
/// Medline indexer is a separate program that emits the same bytes.
pub struct IndexWriter<W: Write> {
    out: W,
    scratch: Vec<u8>,
    records: u64,
}

impl<W: Write> IndexWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scratch: Vec::with_capacity(4096),
            records: 0,
        }
    }

    /// Records appended so far. The total is persisted by the caller;
    /// the file itself carries no count.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub fn append(&mut self, doc: DocId, date: Date, features: &[FeatureId]) -> Result<()> {
        self.scratch.clear();
        encode_features(features, &mut self.scratch)?;
        let nbytes = u16::try_from(self.scratch.len())
            .map_err(|_| ScanError::Malformed("encoded payload exceeds u16 length"))?;

        self.out.write_all(&doc.to_le_bytes())?;
        self.out.write_all(&date.to_le_bytes())?;
        self.out.write_all(&nbytes.to_le_bytes())?;
        self.out.write_all(&self.scratch)?;
        self.records += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Write a whole index atomically: records go to a temp file beside the
/// target, which is then persisted over `path`. Returns the record count
/// for the caller to store.
pub fn write_index_atomic<F>(path: &Path, fill: F) -> Result<u64>
where
    F: FnOnce(&mut IndexWriter<BufWriter<&File>>) -> Result<()>,
{
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp = NamedTempFile::new_in(parent)?;
    let mut writer = IndexWriter::new(BufWriter::new(tmp.as_file()));
    fill(&mut writer)?;
    let records = writer.record_count();
    writer.finish()?;

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ScanError::Io(e.error))?;

    #[cfg(unix)]
    {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(records)
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
