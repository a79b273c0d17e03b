//! Stratified k-fold cross-validation over a labelled topic.
//!
//! One pass over the index gathers the feature vectors of every labelled
//! document (and the candidate pool when negatives are sampled); folds
//! then train and score entirely in memory, through the same accumulator
//! production retrieval uses.

pub mod metrics;

pub use metrics::{
    Confusion, FscoreCurve, Histogram, PerformanceReport, PrCurve, RocCurve, ScoredLabel,
    TunedThreshold, performance,
};

use hashbrown::HashSet;
use log::{debug, warn};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use smallvec::SmallVec;

use crate::{
    CancelToken, DocId, FeatureCounts, FeatureId, FeatureIndex, Result, ScanError, TrainConfig,
    index::DateWindow, score::score_features, train::train,
};

/// Feature vector of one labelled document, held in memory across folds.
type DocFeatures = SmallVec<[FeatureId; 16]>;

#[derive(Clone, Copy, Debug)]
pub struct ValidationConfig {
    pub nfolds: usize,
    /// Negatives drawn from the corpus when none are supplied.
    pub num_negatives: usize,
    /// Precision weight of the tuned F-measure.
    pub alpha: f32,
    /// Utility ratio r; defaults to N/P.
    pub utility_r: Option<f32>,
    pub seed: u64,
    pub window: DateWindow,
    pub num_features: usize,
    pub train: TrainConfig,
}

pub struct CrossValidator<'a> {
    index: &'a FeatureIndex,
    cfg: ValidationConfig,
}

impl<'a> CrossValidator<'a> {
    pub fn new(index: &'a FeatureIndex, cfg: ValidationConfig) -> Self {
        Self { index, cfg }
    }

    /// Validate `positives` against supplied or sampled negatives and
    /// derive the performance report. Identical seeds give identical
    /// samples, fold assignments, and therefore identical reports.
    pub fn run(
        &self,
        positives: &[DocId],
        negatives: Option<&[DocId]>,
        cancel: &CancelToken,
    ) -> Result<PerformanceReport> {
        if self.cfg.nfolds < 2 {
            return Err(ScanError::Argument(format!(
                "nfolds must be at least 2, got {}",
                self.cfg.nfolds
            )));
        }
        if positives.len() < self.cfg.nfolds {
            return Err(ScanError::EmptyLabelled(format!(
                "{} positives cannot stratify into {} folds",
                positives.len(),
                self.cfg.nfolds
            )));
        }

        let mut pos_ids = positives.to_vec();
        pos_ids.sort_unstable();
        pos_ids.dedup();

        let mut rng = StdRng::seed_from_u64(self.cfg.seed);

        let (mut pos_vecs, mut neg_vecs) = match negatives {
            Some(supplied) => {
                let mut neg_ids = supplied.to_vec();
                neg_ids.sort_unstable();
                neg_ids.dedup();
                neg_ids.retain(|id| pos_ids.binary_search(id).is_err());
                self.collect_labelled(&pos_ids, &neg_ids, cancel)?
            }
            None => self.collect_sampled(&pos_ids, &mut rng, cancel)?,
        };

        if pos_vecs.len() < self.cfg.nfolds {
            return Err(ScanError::EmptyLabelled(format!(
                "only {} positives fall inside the index window",
                pos_vecs.len()
            )));
        }
        if neg_vecs.len() < self.cfg.nfolds {
            return Err(ScanError::EmptyLabelled(format!(
                "only {} negatives fall inside the index window",
                neg_vecs.len()
            )));
        }

        pos_vecs.shuffle(&mut rng);
        neg_vecs.shuffle(&mut rng);

        let scored = self.run_folds(&pos_vecs, &neg_vecs, cancel)?;
        metrics::performance(scored, self.cfg.alpha, self.cfg.utility_r)
    }

    /// One pass collecting the feature vectors of both labelled sets.
    fn collect_labelled(
        &self,
        pos_ids: &[DocId],
        neg_ids: &[DocId],
        cancel: &CancelToken,
    ) -> Result<(Vec<DocFeatures>, Vec<DocFeatures>)> {
        let mut pos_vecs = Vec::with_capacity(pos_ids.len());
        let mut neg_vecs = Vec::with_capacity(neg_ids.len());
        let mut features: Vec<FeatureId> = Vec::with_capacity(crate::FEATURE_CAP);
        let mut cursor = self.index.cursor();

        while let Some((header, payload)) = cursor.read_next_raw()? {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if !self.cfg.window.contains(header.date) {
                continue;
            }
            let bucket = if pos_ids.binary_search(&header.doc).is_ok() {
                &mut pos_vecs
            } else if neg_ids.binary_search(&header.doc).is_ok() {
                &mut neg_vecs
            } else {
                continue;
            };
            crate::index::codec::decode_features(payload, &mut features)?;
            bucket.push(DocFeatures::from_slice(&features));
        }

        debug!(
            "collected {}/{} positives, {}/{} negatives",
            pos_vecs.len(),
            pos_ids.len(),
            neg_vecs.len(),
            neg_ids.len()
        );
        Ok((pos_vecs, neg_vecs))
    }

    /// Two passes: gather positive vectors and the candidate pool, draw
    /// the sample without replacement, then fetch the sampled vectors.
    fn collect_sampled(
        &self,
        pos_ids: &[DocId],
        rng: &mut StdRng,
        cancel: &CancelToken,
    ) -> Result<(Vec<DocFeatures>, Vec<DocFeatures>)> {
        if self.cfg.num_negatives == 0 {
            return Err(ScanError::Argument(
                "num_negatives must be positive when sampling".into(),
            ));
        }

        let mut pos_vecs = Vec::with_capacity(pos_ids.len());
        let mut pool: Vec<DocId> = Vec::new();
        let mut features: Vec<FeatureId> = Vec::with_capacity(crate::FEATURE_CAP);
        let mut cursor = self.index.cursor();

        while let Some((header, payload)) = cursor.read_next_raw()? {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if !self.cfg.window.contains(header.date) {
                continue;
            }
            if pos_ids.binary_search(&header.doc).is_ok() {
                crate::index::codec::decode_features(payload, &mut features)?;
                pos_vecs.push(DocFeatures::from_slice(&features));
            } else {
                pool.push(header.doc);
            }
        }

        let wanted = self.cfg.num_negatives;
        if pool.len() < wanted {
            warn!("corpus offers {} negatives of {wanted} requested", pool.len());
        }
        let draw = wanted.min(pool.len());
        let sampled: HashSet<DocId> = rand::seq::index::sample(rng, pool.len(), draw)
            .into_iter()
            .map(|i| pool[i])
            .collect();

        let mut neg_vecs = Vec::with_capacity(draw);
        let mut cursor = self.index.cursor();
        while let Some((header, payload)) = cursor.read_next_raw()? {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if !self.cfg.window.contains(header.date) || !sampled.contains(&header.doc) {
                continue;
            }
            crate::index::codec::decode_features(payload, &mut features)?;
            neg_vecs.push(DocFeatures::from_slice(&features));
        }

        Ok((pos_vecs, neg_vecs))
    }

    fn run_folds(
        &self,
        pos: &[DocFeatures],
        neg: &[DocFeatures],
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredLabel>> {
        let nfolds = self.cfg.nfolds;
        let mut scored = Vec::with_capacity(pos.len() + neg.len());

        for fold in 0..nfolds {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let (pos_test, pos_train) = fold_split(pos, fold, nfolds);
            let (neg_test, neg_train) = fold_split(neg, fold, nfolds);

            let pos_counts = accumulate(pos_train, self.cfg.num_features)?;
            let neg_counts = accumulate(neg_train, self.cfg.num_features)?;
            let model = train(&pos_counts, &neg_counts, &self.cfg.train)?;
            let offset = model.offset();

            for feats in pos_test {
                scored.push(ScoredLabel {
                    score: score_features(&model.scores, offset, feats)?,
                    positive: true,
                });
            }
            for feats in neg_test {
                scored.push(ScoredLabel {
                    score: score_features(&model.scores, offset, feats)?,
                    positive: false,
                });
            }

            debug!(
                "fold {}/{nfolds}: trained on {}+{} docs, held out {}",
                fold + 1,
                pos_counts.docs,
                neg_counts.docs,
                pos_test.len() + neg_test.len()
            );
        }

        Ok(scored)
    }
}

/// Contiguous stratified split: fold `i` holds out `docs[lo..hi]` and
/// trains on everything else.
fn fold_split(
    docs: &[DocFeatures],
    fold: usize,
    nfolds: usize,
) -> (&[DocFeatures], [&[DocFeatures]; 2]) {
    let lo = fold * docs.len() / nfolds;
    let hi = (fold + 1) * docs.len() / nfolds;
    (&docs[lo..hi], [&docs[..lo], &docs[hi..]])
}

fn accumulate(parts: [&[DocFeatures]; 2], num_features: usize) -> Result<FeatureCounts> {
    let mut counts = FeatureCounts::zeroed(num_features);
    for part in parts {
        for feats in part {
            counts.add_doc(feats)?;
        }
    }
    Ok(counts)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
