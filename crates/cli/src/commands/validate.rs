use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Args;
use mscan_engine::{
    CancelToken, CrossValidator, DateWindow, FeatureIndex, PerformanceReport, Smoothing,
    TrainConfig, ValidationConfig,
};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Feature-index file.
    #[arg(long, value_name = "FILE", default_value_os_t = mscan_runtime::config::default_index_path())]
    pub index: PathBuf,

    /// Feature universe size F.
    #[arg(long)]
    pub num_features: usize,

    /// File of positive pmids, one per line.
    #[arg(long, value_name = "FILE")]
    pub positives: PathBuf,

    /// File of negative pmids; sampled from the corpus when omitted.
    #[arg(long, value_name = "FILE")]
    pub negatives: Option<PathBuf>,

    /// How many negatives to sample when none are supplied.
    #[arg(long, default_value_t = 100_000)]
    pub num_negatives: usize,

    #[arg(long, default_value_t = 10)]
    pub nfolds: usize,

    /// Precision weight of the tuned F-measure.
    #[arg(long, default_value_t = 0.5)]
    pub alpha: f32,

    /// Utility ratio r; defaults to N/P.
    #[arg(long, allow_hyphen_values = true)]
    pub utility_r: Option<f32>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Earliest completion date, YYYYMMDD inclusive.
    #[arg(long, default_value_t = 0)]
    pub mindate: u32,

    /// Latest completion date, YYYYMMDD inclusive.
    #[arg(long, default_value_t = u32::MAX)]
    pub maxdate: u32,

    /// Fixed pseudocount; background frequency smoothing when omitted.
    #[arg(long)]
    pub pseudocount: Option<f32>,

    /// Drop features with fewer total occurrences.
    #[arg(long, default_value_t = 0)]
    pub min_count: u32,

    /// Drop features below this relative information gain.
    #[arg(long, default_value_t = 0.0)]
    pub min_infogain: f32,

    /// Override the ln(P/N) prior with a known prevalence logit.
    #[arg(long, allow_hyphen_values = true)]
    pub prior: Option<f32>,

    /// Write the full JSON report here.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

pub fn run(args: ValidateArgs) -> ExitCode {
    super::finish(execute(args))
}

fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let window = DateWindow::new(args.mindate, args.maxdate)?;

    let positives = read_pmid_file(&args.positives)?;
    let negatives = match &args.negatives {
        Some(path) => Some(read_pmid_file(path)?),
        None => None,
    };

    let index = FeatureIndex::open(&args.index)
        .with_context(|| format!("opening feature index {}", args.index.display()))?;

    let cfg = ValidationConfig {
        nfolds: args.nfolds,
        num_negatives: args.num_negatives,
        alpha: args.alpha,
        utility_r: args.utility_r,
        seed: args.seed,
        window,
        num_features: args.num_features,
        train: TrainConfig {
            smoothing: match args.pseudocount {
                Some(alpha) => Smoothing::Pseudocount(alpha),
                None => Smoothing::BackgroundFreq,
            },
            min_count: args.min_count,
            min_infogain: args.min_infogain,
            prior_override: args.prior,
        },
    };

    let validator = CrossValidator::new(&index, cfg);
    let report = validator.run(&positives, negatives.as_deref(), &CancelToken::new())?;

    print_summary(&report);

    if let Some(path) = &args.report {
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("writing report to {}", path.display()))?;
        eprintln!("[mscan] full report written to {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &PerformanceReport) {
    println!(
        "documents:    {} positive / {} negative",
        report.positives, report.negatives
    );
    println!(
        "roc auc:      {:.4} ± {:.4}",
        report.roc.area, report.roc.area_stderr
    );
    println!(
        "pr area:      {:.4}   average precision {:.4}",
        report.pr.area, report.pr.average_precision
    );
    println!("break-even:   {:.4}", report.pr.breakeven);
    println!(
        "threshold:    {:.4}   F(alpha={}) {:.4}",
        report.tuned.threshold, report.alpha, report.tuned.fscore
    );
    println!(
        "at threshold: precision {:.4}, recall {:.4}, utility {:.4}",
        report.tuned.precision, report.tuned.recall, report.tuned.utility
    );
    let c = report.tuned.confusion;
    println!(
        "confusion:    tp {} fp {} tn {} fn {}",
        c.true_pos, c.false_pos, c.true_neg, c.false_neg
    );
}

/// One pmid per line; blank lines and `#` comments are skipped.
fn read_pmid_file(path: &Path) -> anyhow::Result<Vec<u32>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading pmid file {}", path.display()))?;

    let mut ids = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id: u32 = line.parse().with_context(|| {
            format!("{}:{}: not a pmid: {line:?}", path.display(), lineno + 1)
        })?;
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
