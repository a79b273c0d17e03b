pub mod count;
pub mod index;
pub mod score;
pub mod validate;

use std::process::ExitCode;

use clap::Subcommand;
use mscan_engine::ScanError;

pub use count::FeatCountArgs;
pub use index::IndexArgs;
pub use score::ScoreCalcArgs;
pub use validate::ValidateArgs;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score every indexed citation against a feature-score vector and
    /// emit the top hits.
    ///
    /// Reads `numfeats` little-endian f64 scores from stdin and writes
    /// binary (f32 score, u32 pmid) records to stdout, best first.
    ///
    /// Example:
    ///   mscan score-calc features.idx 16000000 550000 -4.5 1000 0.0 \
    ///       19650101 20061231 < feat_scores > results
    #[command(name = "score-calc")]
    ScoreCalc(ScoreCalcArgs),

    /// Count feature occurrences over the non-excluded citations.
    ///
    /// Reads `numexcluded` little-endian u32 pmids from stdin (sorted
    /// ascending) and writes `ndocs` plus one u32 count per feature to
    /// stdout.
    #[command(name = "feat-count")]
    FeatCount(FeatCountArgs),

    /// Cross-validate a labelled topic and report performance curves.
    Validate(ValidateArgs),

    /// Build or inspect feature-index files.
    Index(IndexArgs),
}

/// Exit codes shared with callers: 0 success, 1 argument or validation
/// problems, 2 I/O, 3 malformed index, 4 cancelled.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let code = match err.downcast_ref::<ScanError>() {
        Some(ScanError::Argument(_) | ScanError::InvalidExclusion | ScanError::EmptyLabelled(_)) => 1,
        Some(ScanError::Io(_)) => 2,
        Some(ScanError::Malformed(_)) => 3,
        Some(ScanError::Cancelled) => 4,
        None => {
            if err.downcast_ref::<std::io::Error>().is_some() {
                2
            } else {
                1
            }
        }
    };
    ExitCode::from(code)
}

/// Shared tail of every command handler.
pub fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("[mscan] {err:#}");
            exit_code(&err)
        }
    }
}
