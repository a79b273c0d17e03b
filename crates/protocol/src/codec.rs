use std::io::{self, Read, Write};

use bytemuck::{bytes_of, cast_slice, pod_collect_to_vec};

use crate::ResultEntry;

/// Read a feature-score vector: `num_features` IEEE-754 f64 values.
///
/// Scores are trained at f64 but scanned at f32, so they are narrowed
/// here on the way in.
pub fn read_score_vector<R: Read>(reader: &mut R, num_features: usize) -> io::Result<Vec<f32>> {
    let mut buf = vec![0u8; num_features * 8];
    reader.read_exact(&mut buf)?;
    let wide: Vec<f64> = pod_collect_to_vec(&buf);
    Ok(wide.into_iter().map(|score| score as f32).collect())
}

/// Write a feature-score vector at full width.
pub fn write_score_vector<W: Write>(writer: &mut W, scores: &[f64]) -> io::Result<()> {
    writer.write_all(cast_slice(scores))?;
    writer.flush()
}

/// Read `count` document ids. Sorting is the *caller's* contract: an
/// exclusion list must arrive ascending and is validated downstream.
pub fn read_doc_ids<R: Read>(reader: &mut R, count: usize) -> io::Result<Vec<u32>> {
    let mut buf = vec![0u8; count * 4];
    reader.read_exact(&mut buf)?;
    Ok(pod_collect_to_vec(&buf))
}

pub fn write_doc_ids<W: Write>(writer: &mut W, ids: &[u32]) -> io::Result<()> {
    writer.write_all(cast_slice(ids))?;
    writer.flush()
}

/// Write a ranked result stream, highest score first.
pub fn write_results<W: Write>(writer: &mut W, entries: &[ResultEntry]) -> io::Result<()> {
    writer.write_all(cast_slice(entries))?;
    writer.flush()
}

/// Read `count` result entries back.
pub fn read_results<R: Read>(reader: &mut R, count: usize) -> io::Result<Vec<ResultEntry>> {
    let mut buf = vec![0u8; count * 8];
    reader.read_exact(&mut buf)?;
    Ok(pod_collect_to_vec(&buf))
}

/// Write a count vector: contributing-document total, then one u32 per
/// feature.
pub fn write_counts<W: Write>(writer: &mut W, docs: u32, counts: &[u32]) -> io::Result<()> {
    writer.write_all(bytes_of(&docs))?;
    writer.write_all(cast_slice(counts))?;
    writer.flush()
}

/// Read a count vector over `num_features` features.
pub fn read_counts<R: Read>(reader: &mut R, num_features: usize) -> io::Result<(u32, Vec<u32>)> {
    let mut head = [0u8; 4];
    reader.read_exact(&mut head)?;
    let docs = u32::from_le_bytes(head);
    let counts = read_doc_ids(reader, num_features)?;
    Ok((docs, counts))
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
