//! Naive Bayes feature-score training with pseudocount smoothing and
//! feature selection.
//!
//! Probabilities are worked in f64 and the published scores narrowed to
//! f32, the width the scan loop accumulates in.

use log::debug;

use crate::{FeatureCounts, Result, ScanError};

/// Smoothed probabilities are clamped into `[P_FLOOR, 1 - P_FLOOR]`.
/// A unit pseudocount on a feature present in every positive document
/// would otherwise reach p = 1 and an infinite log-ratio.
const P_FLOOR: f64 = 1e-9;

/// How per-feature pseudocounts are chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smoothing {
    /// α_i is the feature's background frequency across both classes.
    BackgroundFreq,
    /// One fixed α for every feature.
    Pseudocount(f32),
}

#[derive(Clone, Copy, Debug)]
pub struct TrainConfig {
    pub smoothing: Smoothing,
    /// Features with fewer total occurrences are dropped.
    pub min_count: u32,
    /// When positive, features with lower relative information gain are
    /// dropped as well.
    pub min_infogain: f32,
    /// Replaces `ln(pos_docs / neg_docs)` when the true prevalence of
    /// the topic is known.
    pub prior_override: Option<f32>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::BackgroundFreq,
            min_count: 0,
            min_infogain: 0.0,
            prior_override: None,
        }
    }
}

/// A trained feature-score vector.
///
/// `scores[i]` is the full log-likelihood-ratio delta for feature `i`
/// being present (presence term minus absence term); `base` collects the
/// absence terms of every selected feature. A document therefore scores
/// `base + prior + Σ scores[f]` with a single addition per feature.
#[derive(Clone, Debug)]
pub struct FeatureScores {
    pub scores: Vec<f32>,
    pub base: f32,
    pub prior: f32,
    pub selected: Vec<bool>,
}

impl FeatureScores {
    /// The scalar the scanner adds to every document.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.base + self.prior
    }

    pub fn num_selected(&self) -> usize {
        self.selected.iter().filter(|&&keep| keep).count()
    }
}

pub fn train(
    pos: &FeatureCounts,
    neg: &FeatureCounts,
    cfg: &TrainConfig,
) -> Result<FeatureScores> {
    if pos.docs == 0 {
        return Err(ScanError::EmptyLabelled("no positive documents".into()));
    }
    if neg.docs == 0 {
        return Err(ScanError::EmptyLabelled("no negative documents".into()));
    }
    if pos.counts.len() != neg.counts.len() {
        return Err(ScanError::Argument(format!(
            "count vectors disagree on the feature universe: {} vs {}",
            pos.counts.len(),
            neg.counts.len()
        )));
    }

    let num_features = pos.counts.len();
    let pos_docs = f64::from(pos.docs);
    let neg_docs = f64::from(neg.docs);
    let class_pos = pos_docs / (pos_docs + neg_docs);
    let class_entropy = entropy(class_pos);

    let mut scores = vec![0.0f32; num_features];
    let mut selected = vec![false; num_features];
    let mut base = 0.0f64;

    for i in 0..num_features {
        if pos.counts[i] + neg.counts[i] < cfg.min_count {
            continue;
        }

        let pos_count = f64::from(pos.counts[i]);
        let neg_count = f64::from(neg.counts[i]);

        let alpha = match cfg.smoothing {
            Smoothing::Pseudocount(a) => f64::from(a),
            Smoothing::BackgroundFreq => (pos_count + neg_count) / (pos_docs + neg_docs),
        };

        let p_pos = clamp_prob((pos_count + alpha) / (pos_docs + 1.0));
        let p_neg = clamp_prob((neg_count + alpha) / (neg_docs + 1.0));

        if cfg.min_infogain > 0.0 {
            let gain = relative_infogain(p_pos, p_neg, class_pos, class_entropy);
            if gain < f64::from(cfg.min_infogain) {
                continue;
            }
        }

        let absent = ((1.0 - p_pos) / (1.0 - p_neg)).ln();
        let present = (p_pos / p_neg).ln();

        scores[i] = (present - absent) as f32;
        selected[i] = true;
        base += absent;
    }

    let prior = match cfg.prior_override {
        Some(prior) => prior,
        None => (pos_docs / neg_docs).ln() as f32,
    };

    debug!(
        "trained on {}+{} docs, selected {} of {num_features} features",
        pos.docs,
        neg.docs,
        selected.iter().filter(|&&keep| keep).count()
    );

    Ok(FeatureScores { scores, base: base as f32, prior, selected })
}

#[inline]
fn clamp_prob(p: f64) -> f64 {
    p.clamp(P_FLOOR, 1.0 - P_FLOOR)
}

/// Binary entropy in nats, with 0·ln 0 = 0.
fn entropy(p: f64) -> f64 {
    let mut h = 0.0;
    if p > 0.0 {
        h -= p * p.ln();
    }
    let q = 1.0 - p;
    if q > 0.0 {
        h -= q * q.ln();
    }
    h
}

/// Information gain of the class given one feature, as a fraction of the
/// class entropy. Built from the same smoothed probabilities as scoring.
fn relative_infogain(p_pos: f64, p_neg: f64, class_pos: f64, class_entropy: f64) -> f64 {
    if class_entropy <= 0.0 {
        return 0.0;
    }

    let p_feat = (p_pos * class_pos + p_neg * (1.0 - class_pos)).clamp(P_FLOOR, 1.0 - P_FLOOR);

    let pos_given_present = (p_pos * class_pos / p_feat).clamp(0.0, 1.0);
    let pos_given_absent = ((1.0 - p_pos) * class_pos / (1.0 - p_feat)).clamp(0.0, 1.0);

    let conditional =
        p_feat * entropy(pos_given_present) + (1.0 - p_feat) * entropy(pos_given_absent);

    ((class_entropy - conditional) / class_entropy).max(0.0)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
