mod cancel;
mod count;
mod error;
mod index;
mod score;
mod train;
mod validate;

pub use cancel::CancelToken;
pub use count::{DocFilter, FeatureCounts, count_features};
pub use error::{Result, ScanError};
pub use index::*;
pub use score::{ScanOutcome, ScanParams, ScoredDoc, TopK, scan_top_scores, score_features};
pub use train::{FeatureScores, Smoothing, TrainConfig, train};
pub use validate::*;
