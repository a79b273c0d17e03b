use std::{
    io,
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Args;
use mscan_engine::{CancelToken, DateWindow, DocFilter, FeatureIndex, count_features};
use mscan_protocol::codec;

#[derive(Debug, Args)]
pub struct FeatCountArgs {
    /// Feature-index file.
    pub fi: PathBuf,

    /// Record count stored by the indexer.
    pub numdocs: u64,

    /// Feature universe size F.
    pub numfeats: usize,

    /// Earliest completion date, YYYYMMDD inclusive.
    pub mindate: u32,

    /// Latest completion date, YYYYMMDD inclusive.
    pub maxdate: u32,

    /// Number of excluded pmids to read from stdin.
    pub numexcluded: usize,
}

pub fn run(args: FeatCountArgs) -> ExitCode {
    super::finish(execute(args))
}

fn execute(args: FeatCountArgs) -> anyhow::Result<()> {
    let window = DateWindow::new(args.mindate, args.maxdate)?;

    let mut stdin = io::stdin().lock();
    let excluded = codec::read_doc_ids(&mut stdin, args.numexcluded)
        .context("reading exclusion list from stdin")?;

    // An unsorted exclusion list must fail before the index is opened.
    let filter = DocFilter::Exclude(&excluded);
    filter.validate()?;

    let index = FeatureIndex::open(&args.fi)
        .with_context(|| format!("opening feature index {}", args.fi.display()))?;

    let counts = count_features(&index, filter, window, args.numfeats, &CancelToken::new())?;

    let mut stdout = io::stdout().lock();
    codec::write_counts(&mut stdout, counts.docs, &counts.counts)
        .context("writing counts to stdout")?;
    Ok(())
}
