use crate::{
    Date, DocId, FeatureId, RECORD_HEADER_BYTES, Result, ScanError,
    index::codec::decode_features,
};

/// Fixed-layout head of one index record: pmid, completion date, and the
/// byte length of the encoded feature payload, all little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    pub doc: DocId,
    pub date: Date,
    pub nbytes: u16,
}

/// Forward-only reader over the record stream of a feature index.
///
/// The file carries no framing beyond the per-record header, so the only
/// access pattern is a front-to-back walk. A partial trailing record is
/// malformed; the record count lives with the collaborator that built
/// the file.
pub struct RecordCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Byte offset of the next unread record.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_header(&mut self) -> Result<Option<RecordHeader>> {
        if self.pos == self.data.len() {
            return Ok(None);
        }
        let rest = &self.data[self.pos..];
        if rest.len() < RECORD_HEADER_BYTES {
            return Err(ScanError::Malformed("truncated record header"));
        }

        let doc = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let date = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
        let nbytes = u16::from_le_bytes([rest[8], rest[9]]);
        self.pos += RECORD_HEADER_BYTES;

        Ok(Some(RecordHeader { doc, date, nbytes }))
    }

    fn take_payload(&mut self, nbytes: u16) -> Result<&'a [u8]> {
        let len = nbytes as usize;
        if self.data.len() - self.pos < len {
            return Err(ScanError::Malformed("truncated record payload"));
        }
        let payload = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(payload)
    }

    /// Next record with its payload still encoded. `None` at clean EOF.
    ///
    /// Callers that filter on pmid or date use this to skip the decode
    /// for rejected records.
    pub fn read_next_raw(&mut self) -> Result<Option<(RecordHeader, &'a [u8])>> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };
        let payload = self.take_payload(header.nbytes)?;
        Ok(Some((header, payload)))
    }

    /// Decode the next record into `features`, a reusable buffer.
    pub fn read_next(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordHeader>> {
        match self.read_next_raw()? {
            Some((header, payload)) => {
                decode_features(payload, features)?;
                Ok(Some(header))
            }
            None => Ok(None),
        }
    }

    /// Advance past the next record without touching its payload.
    pub fn skip_next(&mut self) -> Result<Option<RecordHeader>> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };
        self.take_payload(header.nbytes)?;
        Ok(Some(header))
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
