use std::{
    io,
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Args;
use log::warn;
use mscan_engine::{CancelToken, DateWindow, FeatureIndex, ScanParams, scan_top_scores};
use mscan_protocol::{ResultEntry, codec};

#[derive(Debug, Args)]
pub struct ScoreCalcArgs {
    /// Feature-index file.
    pub fi: PathBuf,

    /// Record count stored by the indexer; EOF still ends the scan.
    pub numdocs: u64,

    /// Feature universe size F.
    pub numfeats: usize,

    /// Trained base + prior, added to every document.
    #[arg(allow_hyphen_values = true)]
    pub offset: f32,

    /// Maximum number of results.
    pub limit: usize,

    /// Minimum score to report; accepts `-inf`.
    #[arg(allow_hyphen_values = true)]
    pub threshold: f32,

    /// Earliest completion date, YYYYMMDD inclusive.
    pub mindate: u32,

    /// Latest completion date, YYYYMMDD inclusive.
    pub maxdate: u32,

    /// Scan with this many worker threads.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,
}

pub fn run(args: ScoreCalcArgs) -> ExitCode {
    super::finish(execute(args))
}

fn execute(args: ScoreCalcArgs) -> anyhow::Result<()> {
    let window = DateWindow::new(args.mindate, args.maxdate)?;

    let mut stdin = io::stdin().lock();
    let scores = codec::read_score_vector(&mut stdin, args.numfeats)
        .context("reading feature scores from stdin")?;

    let index = FeatureIndex::open(&args.fi)
        .with_context(|| format!("opening feature index {}", args.fi.display()))?;

    let params = ScanParams {
        scores: &scores,
        offset: args.offset,
        threshold: args.threshold,
        limit: args.limit,
        window,
        threads: args.threads,
    };
    let outcome = scan_top_scores(&index, &params, &CancelToken::new())?;

    if outcome.records != args.numdocs {
        warn!(
            "index holds {} records but {} were declared",
            outcome.records, args.numdocs
        );
    }

    let entries: Vec<ResultEntry> = outcome
        .hits
        .iter()
        .map(|hit| ResultEntry { score: hit.score, pmid: hit.doc })
        .collect();

    let mut stdout = io::stdout().lock();
    codec::write_results(&mut stdout, &entries).context("writing results to stdout")?;
    Ok(())
}
