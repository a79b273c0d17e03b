use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Args, Subcommand};
use mscan_engine::{Date, DocId, FeatureId, FeatureIndex, write_index_atomic};

#[derive(Debug, Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Debug, Subcommand)]
pub enum IndexAction {
    /// Build an index file from a text description.
    ///
    /// One record per line: `pmid date f1,f2,...` (features optional).
    /// Features are sorted and de-duplicated before encoding. Intended
    /// for fixtures and small rebuilds; the Medline indexer proper is a
    /// separate program.
    Build {
        /// Output index file.
        out: PathBuf,
        /// Text description of the records.
        records: PathBuf,
    },

    /// Print record and date statistics for an index file.
    Info {
        /// Feature-index file.
        fi: PathBuf,
    },
}

pub fn run(args: IndexArgs) -> ExitCode {
    super::finish(execute(args))
}

fn execute(args: IndexArgs) -> anyhow::Result<()> {
    match args.action {
        IndexAction::Build { out, records } => build(&out, &records),
        IndexAction::Info { fi } => info(&fi),
    }
}

fn build(out: &Path, records: &Path) -> anyhow::Result<()> {
    let text = fs::read_to_string(records)
        .with_context(|| format!("reading record file {}", records.display()))?;

    let mut parsed: Vec<(DocId, Date, Vec<FeatureId>)> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        parsed.push(
            parse_record_line(line)
                .with_context(|| format!("{}:{}", records.display(), lineno + 1))?,
        );
    }

    let count = write_index_atomic(out, |writer| {
        for (doc, date, features) in &parsed {
            writer.append(*doc, *date, features)?;
        }
        Ok(())
    })?;

    eprintln!("[mscan] wrote {count} records to {}", out.display());
    Ok(())
}

fn parse_record_line(line: &str) -> anyhow::Result<(DocId, Date, Vec<FeatureId>)> {
    let mut fields = line.split_whitespace();
    let doc: DocId = fields
        .next()
        .context("missing pmid")?
        .parse()
        .context("bad pmid")?;
    let date: Date = fields
        .next()
        .context("missing date")?
        .parse()
        .context("bad date")?;

    let mut features: Vec<FeatureId> = match fields.next() {
        Some(list) => list
            .split(',')
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<FeatureId>().context("bad feature id"))
            .collect::<anyhow::Result<_>>()?,
        None => Vec::new(),
    };
    features.sort_unstable();
    features.dedup();

    Ok((doc, date, features))
}

fn info(fi: &Path) -> anyhow::Result<()> {
    let index = FeatureIndex::open(fi)
        .with_context(|| format!("opening feature index {}", fi.display()))?;

    let mut records = 0u64;
    let mut payload_bytes = 0u64;
    let mut min_date = u32::MAX;
    let mut max_date = 0u32;

    let mut cursor = index.cursor();
    while let Some(header) = cursor.skip_next()? {
        records += 1;
        payload_bytes += u64::from(header.nbytes);
        min_date = min_date.min(header.date);
        max_date = max_date.max(header.date);
    }

    println!("location:  {}", fi.display());
    println!("records:   {records}");
    println!("file size: {} bytes", index.data().len());
    if records > 0 {
        println!("dates:     {min_date}..{max_date}");
        println!(
            "payload:   {payload_bytes} bytes ({:.1} per record)",
            payload_bytes as f64 / records as f64
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
